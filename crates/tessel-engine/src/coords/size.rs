/// Render target size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Byte length of a tightly packed 4-byte-per-pixel image of this size.
    #[inline]
    pub fn packed_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    #[inline]
    pub fn to_extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}
