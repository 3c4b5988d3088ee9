use anyhow::{Result, bail};

use crate::coords::PixelSize;

/// Output format of an export run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }
}

impl ExportSettings {
    /// Video encoders want even dimensions, so odd ones are refused here
    /// rather than after the first frame.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("export size {}x{} has a zero dimension", self.width, self.height);
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            bail!("export size {}x{} must be even", self.width, self.height);
        }
        if self.fps == 0 {
            bail!("export frame rate must be positive");
        }
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Timestamp of frame `index` in seconds.
    #[inline]
    pub fn frame_time(&self, index: u64) -> f64 {
        index as f64 / self.fps.max(1) as f64
    }
}
