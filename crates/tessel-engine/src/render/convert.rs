//! Mesh lists to GPU vertex/instance arrays.
//!
//! Pure functions: each returns a fresh array and leaves the mesh untouched.
//! Fully transparent primitives are dropped here so they never reach the GPU.

use crate::scene::{Dot, Lin, Tri};

use super::vertex::{DotInstance, LinInstance, TriVertexGpu};

/// Three vertices per triangle with at least one visible corner.
pub fn tri_vertices(tris: &[Tri]) -> Vec<TriVertexGpu> {
    let mut out = Vec::with_capacity(tris.len() * 3);
    for tri in tris {
        if !tri.verts.iter().any(|v| v.col.is_visible()) {
            continue;
        }
        out.extend(tri.verts.iter().map(|v| TriVertexGpu {
            col: v.col.to_array(),
            pos: v.pos.to_array(),
            norm: v.norm.to_array(),
            uv: v.uv.to_array(),
        }));
    }
    out
}

/// One instance per dominant, visible segment.
///
/// Neighbour tangents come from `prev`/`next`; a missing or out-of-range
/// neighbour is replaced by the segment itself.
pub fn lin_instances(lins: &[Lin]) -> Vec<LinInstance> {
    let neighbour = |link: Option<u32>, own: &Lin| -> glam::Vec3 {
        link.and_then(|i| lins.get(i as usize))
            .unwrap_or(own)
            .tangent()
    };

    lins.iter()
        .filter(|l| l.dominant)
        .filter(|l| l.a.col.is_visible() || l.b.col.is_visible())
        .map(|l| LinInstance {
            start_col: l.a.col.to_array(),
            end_col: l.b.col.to_array(),
            start: l.a.pos.to_array(),
            end: l.b.pos.to_array(),
            prev_tan: neighbour(l.prev, l).to_array(),
            tangent: l.tangent().to_array(),
            next_tan: neighbour(l.next, l).to_array(),
        })
        .collect()
}

pub fn dot_instances(dots: &[Dot]) -> Vec<DotInstance> {
    dots.iter()
        .filter(|d| d.col.is_visible())
        .map(|d| DotInstance {
            col: d.col.to_array(),
            pos: d.pos.to_array(),
            norm: d.norm.to_array(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::coords::{ALPHA_EPSILON, ColorRgba};
    use crate::scene::{LinVertex, Mesh, TriVertex};

    fn vert(alpha: f32) -> TriVertex {
        TriVertex {
            pos: Vec3::ZERO,
            norm: Vec3::Z,
            uv: Vec2::ZERO,
            col: ColorRgba::new(1.0, 1.0, 1.0, alpha),
        }
    }

    fn lin(a: Vec3, b: Vec3, alpha: f32) -> Lin {
        let col = ColorRgba::new(0.0, 0.0, 0.0, alpha);
        Lin::new(LinVertex { pos: a, col }, LinVertex { pos: b, col })
    }

    #[test]
    fn transparent_triangles_are_culled() {
        let hidden = Tri {
            verts: [vert(0.0), vert(ALPHA_EPSILON / 2.0), vert(0.0)],
        };
        let shown = Tri {
            verts: [vert(0.0), vert(0.0), vert(ALPHA_EPSILON)],
        };

        assert!(tri_vertices(&[hidden]).is_empty());
        assert_eq!(tri_vertices(&[shown]).len(), 3);
        assert_eq!(tri_vertices(&[hidden, shown, shown]).len(), 6);
    }

    #[test]
    fn triangle_vertex_fields_are_copied() {
        let mut v = vert(1.0);
        v.pos = Vec3::new(1.0, 2.0, 3.0);
        v.uv = Vec2::new(0.25, 0.75);
        let out = tri_vertices(&[Tri { verts: [v; 3] }]);
        assert_eq!(out[0].pos, [1.0, 2.0, 3.0]);
        assert_eq!(out[0].norm, [0.0, 0.0, 1.0]);
        assert_eq!(out[0].uv, [0.25, 0.75]);
        assert_eq!(out[0].col, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn transparent_and_non_dominant_lines_are_culled() {
        let mut back = lin(Vec3::X, Vec3::ZERO, 1.0);
        back.dominant = false;
        let hidden = lin(Vec3::ZERO, Vec3::X, 0.0);
        let mut half = lin(Vec3::ZERO, Vec3::X, 0.0);
        half.b.col.a = 1.0;

        assert!(lin_instances(&[back, hidden]).is_empty());
        assert_eq!(lin_instances(&[half]).len(), 1);
    }

    #[test]
    fn chained_segments_report_neighbour_tangents() {
        let (a, b, c, d) = (
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(4.0, 2.0, 1.0),
        );
        let mut mesh = Mesh::new();
        mesh.push_polyline(&[a, b, c, d], ColorRgba::white(), false);

        let out = lin_instances(&mesh.lins);
        assert_eq!(out.len(), 3);

        let bc = &out[1];
        assert_eq!(bc.tangent, (c - b).to_array());
        assert_eq!(bc.prev_tan, (b - a).to_array());
        assert_eq!(bc.next_tan, (d - c).to_array());
    }

    #[test]
    fn isolated_segment_uses_its_own_tangent() {
        let seg = lin(Vec3::new(1.0, 1.0, 0.0), Vec3::new(3.0, 0.0, 0.0), 1.0);
        let out = lin_instances(&[seg]);
        let own = [2.0, -1.0, 0.0];
        assert_eq!(out[0].tangent, own);
        assert_eq!(out[0].prev_tan, own);
        assert_eq!(out[0].next_tan, own);
    }

    #[test]
    fn dangling_neighbour_index_falls_back_to_self() {
        let mut seg = lin(Vec3::ZERO, Vec3::Y, 1.0);
        seg.prev = Some(42);
        let out = lin_instances(&[seg]);
        assert_eq!(out[0].prev_tan, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn transparent_dots_are_culled() {
        let dot = |alpha| Dot {
            pos: Vec3::ZERO,
            norm: Vec3::Z,
            col: ColorRgba::new(1.0, 0.0, 0.0, alpha),
            angle: 0.0,
        };
        assert!(dot_instances(&[dot(0.0)]).is_empty());
        assert_eq!(dot_instances(&[dot(0.0), dot(1.0), dot(0.5)]).len(), 2);
    }
}
