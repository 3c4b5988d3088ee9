/// Alpha below which a color contributes nothing and is culled before upload.
pub const ALPHA_EPSILON: f32 = f32::EPSILON;

/// Straight-alpha RGBA color.
///
/// Values are passed to the GPU unchanged; the render target is a plain
/// `Bgra8Unorm` surface, so no sRGB conversion happens on output.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// True when alpha reaches [`ALPHA_EPSILON`].
    #[inline]
    pub fn is_visible(self) -> bool {
        self.a >= ALPHA_EPSILON
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    /// Quantizes to a packed BGRA8 pixel, the layout `Renderer::blit` emits.
    #[inline]
    pub fn to_bgra8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.b), q(self.g), q(self.r), q(self.a)]
    }
}

impl From<glam::Vec4> for ColorRgba {
    #[inline]
    fn from(v: glam::Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_alpha_is_not_visible() {
        assert!(!ColorRgba::new(1.0, 1.0, 1.0, 0.0).is_visible());
        assert!(ColorRgba::new(0.0, 0.0, 0.0, ALPHA_EPSILON).is_visible());
    }

    #[test]
    fn bgra8_swaps_red_and_blue() {
        assert_eq!(ColorRgba::new(1.0, 0.0, 0.0, 1.0).to_bgra8(), [0, 0, 255, 255]);
        assert_eq!(ColorRgba::new(0.0, 0.0, 1.0, 0.0).to_bgra8(), [255, 0, 0, 0]);
    }
}
