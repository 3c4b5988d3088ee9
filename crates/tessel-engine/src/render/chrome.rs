use crate::coords::ColorRgba;
use crate::scene::ViewportState;

use super::projection::Inlet;
use super::vertex::FrameVertex;

pub(crate) const CHROME_VERTEX_COUNT: usize = 24;

/// Border colour around the inlet. Presentation mode and a matched inlet are always black.
pub fn chrome_color(state: ViewportState, presentation: bool, match_inlet: bool) -> ColorRgba {
    if presentation || match_inlet {
        ColorRgba::black()
    } else {
        state.chrome_tint()
    }
}

/// Four bands framing the inlet: bottom, top, left, right.
pub fn chrome_vertices(inlet: &Inlet, color: ColorRgba) -> [FrameVertex; CHROME_VERTEX_COUNT] {
    let (u, v) = (inlet.u, inlet.v);
    let bands = [
        (-1.0, -1.0, 1.0, -v),
        (-1.0, v, 1.0, 1.0),
        (-1.0, -v, -u, v),
        (u, -v, 1.0, v),
    ];

    let col = color.to_array();
    let mut out = [FrameVertex {
        pos: [0.0; 2],
        col,
    }; CHROME_VERTEX_COUNT];

    for (band, (x0, y0, x1, y1)) in bands.into_iter().enumerate() {
        let quad = [[x0, y0], [x1, y0], [x1, y1], [x0, y0], [x1, y1], [x0, y1]];
        for (i, pos) in quad.into_iter().enumerate() {
            out[band * 6 + i] = FrameVertex { pos, col };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PixelSize;

    #[test]
    fn presentation_and_matched_inlet_force_black() {
        let state = ViewportState::RuntimeError;
        assert_eq!(chrome_color(state, true, false), ColorRgba::black());
        assert_eq!(chrome_color(state, false, true), ColorRgba::black());
        assert_eq!(chrome_color(state, false, false), state.chrome_tint());
    }

    #[test]
    fn bands_stop_at_the_inlet_edge() {
        let inlet = Inlet::compute(PixelSize::new(800, 400), 1.0, 20.0, false);
        let verts = chrome_vertices(&inlet, ColorRgba::white());

        // bottom band reaches up to -v, left band reaches right to -u
        assert!(verts[..6].iter().any(|v| v.pos[1] == -inlet.v));
        assert!(verts[12..18].iter().all(|v| v.pos[0] <= -inlet.u));
        assert!(verts[18..].iter().all(|v| v.pos[0] >= inlet.u));
        assert!(verts.iter().all(|v| v.col == [1.0; 4]));
    }
}
