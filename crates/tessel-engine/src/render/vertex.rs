//! GPU-side vertex, instance and uniform layouts.
//!
//! Every struct here is `#[repr(C)]` and matches a WGSL input or uniform
//! block in `shaders/` field for field.

use bytemuck::{Pod, Zeroable};

// ── mesh primitives ───────────────────────────────────────────────────────

/// Triangle vertex (48 bytes), three per input triangle.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TriVertexGpu {
    pub col: [f32; 4],
    pub pos: [f32; 3],
    pub norm: [f32; 3],
    pub uv: [f32; 2],
}

impl TriVertexGpu {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x4, // col
        1 => Float32x3, // pos
        2 => Float32x3, // norm
        3 => Float32x2  // uv
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TriVertexGpu>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Stroke segment instance layout (92 bytes):
///
///  offset  0  start_col  [f32; 4]   loc 1
///  offset 16  end_col    [f32; 4]   loc 2
///  offset 32  start      [f32; 3]   loc 3
///  offset 44  end        [f32; 3]   loc 4
///  offset 56  prev_tan   [f32; 3]   loc 5
///  offset 68  tangent    [f32; 3]   loc 6
///  offset 80  next_tan   [f32; 3]   loc 7
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LinInstance {
    pub start_col: [f32; 4],
    pub end_col: [f32; 4],
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub prev_tan: [f32; 3],
    pub tangent: [f32; 3],
    pub next_tan: [f32; 3],
}

impl LinInstance {
    const ATTRS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x3,
        4 => Float32x3,
        5 => Float32x3,
        6 => Float32x3,
        7 => Float32x3
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LinInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Dot instance (40 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DotInstance {
    pub col: [f32; 4],
    pub pos: [f32; 3],
    pub norm: [f32; 3],
}

impl DotInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x4,
        2 => Float32x3,
        3 => Float32x3
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DotInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

// ── shared templates ──────────────────────────────────────────────────────

/// Corner id of the stroke template. Corners 0, 1 sit at the segment start,
/// 2, 3 at the end, and 4, 5 at the end joint.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct LineCorner {
    pub corner: i32,
}

impl LineCorner {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Sint32];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineCorner>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(crate) const LINE_CORNERS: [LineCorner; 6] = [
    LineCorner { corner: 0 },
    LineCorner { corner: 1 },
    LineCorner { corner: 2 },
    LineCorner { corner: 3 },
    LineCorner { corner: 4 },
    LineCorner { corner: 5 },
];

/// Body quad followed by the joint wedge.
pub(crate) const LINE_INDICES: [u16; 12] = [0, 1, 2, 0, 2, 3, 3, 2, 4, 3, 4, 5];

/// Angle of one perimeter vertex of the dot fan.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct DotCorner {
    pub theta: f32,
}

impl DotCorner {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DotCorner>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Evenly spaced perimeter angles, fanned from the first vertex.
pub(crate) fn dot_fan(segments: u32) -> (Vec<DotCorner>, Vec<u16>) {
    let count = segments.max(3);
    let corners = (0..count)
        .map(|i| DotCorner {
            theta: i as f32 * std::f32::consts::TAU / count as f32,
        })
        .collect();
    let indices = (0..count - 2)
        .flat_map(|i| [0, i + 1, i + 2].map(|v| v as u16))
        .collect();
    (corners, indices)
}

/// Chrome vertex in normalized device coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameVertex {
    pub pos: [f32; 2],
    pub col: [f32; 4],
}

impl FrameVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x4
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FrameVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// Per-mesh vertex-stage uniform (224 bytes). Matrices are column-major.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertUniform {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub viewport_size: [f32; 2],
    pub inlet_size: [f32; 2],
    pub stroke_radius: f32,
    pub max_miter_scale: f32,
    pub dot_radius: f32,
    pub z_offset: f32,
}

/// Per-mesh fragment-stage uniform (16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FragUniform {
    pub opacity: f32,
    pub gloss: f32,
    pub _pad: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_shader_strides() {
        assert_eq!(std::mem::size_of::<TriVertexGpu>(), 48);
        assert_eq!(std::mem::size_of::<LinInstance>(), 92);
        assert_eq!(std::mem::size_of::<DotInstance>(), 40);
        assert_eq!(std::mem::size_of::<FrameVertex>(), 24);
        assert_eq!(std::mem::size_of::<VertUniform>(), 224);
        assert_eq!(std::mem::size_of::<FragUniform>(), 16);
    }

    #[test]
    fn dot_fan_covers_polygon() {
        let (corners, indices) = dot_fan(8);
        assert_eq!(corners.len(), 8);
        assert_eq!(indices.len(), 6 * 3);
        assert_eq!(&indices[..3], &[0, 1, 2]);
        assert_eq!(&indices[indices.len() - 3..], &[0, 6, 7]);
        assert_eq!(dot_fan(1).0.len(), 3);
    }
}
