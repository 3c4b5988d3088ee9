use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use image::RgbaImage;

use crate::coords::PixelSize;
use crate::scene::Viewport;

/// Drives the scene between exported frames.
pub trait FrameSource {
    /// Scene the exporter renders.
    fn viewport(&self) -> Arc<Viewport>;

    /// Brings the scene to frame `index` at `time` seconds.
    /// Returns `false` once there are no more frames.
    fn advance(&mut self, index: u64, time: f64) -> Result<bool>;
}

/// Receives finished frames as tightly packed BGRA8.
pub trait FrameSink {
    fn write_frame(&mut self, index: u64, size: PixelSize, bgra: &[u8]) -> Result<()>;
}

/// Writes every frame to `<dir>/frame_NNNNN.png`.
#[derive(Debug)]
pub struct PngSequence {
    dir: PathBuf,
    scratch: Vec<u8>,
}

impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        Ok(Self {
            dir,
            scratch: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngSequence {
    fn write_frame(&mut self, index: u64, size: PixelSize, bgra: &[u8]) -> Result<()> {
        ensure!(
            bgra.len() == size.packed_len(),
            "frame {index} has {} bytes, expected {}",
            bgra.len(),
            size.packed_len()
        );

        self.scratch.clear();
        self.scratch.extend(
            bgra.chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0], px[3]]),
        );

        let image = RgbaImage::from_raw(size.width, size.height, std::mem::take(&mut self.scratch))
            .context("frame buffer does not match its size")?;
        let path = self.frame_path(index);
        let saved = image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()));
        self.scratch = image.into_raw();
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_frames_are_rgba_on_disk() {
        let dir = std::env::temp_dir().join(format!("tessel-png-seq-{}", std::process::id()));
        let mut sink = PngSequence::new(&dir).unwrap();

        // one blue pixel, one half-transparent red pixel
        let bgra = [255, 0, 0, 255, 0, 0, 255, 128];
        sink.write_frame(3, PixelSize::new(2, 1), &bgra).unwrap();

        let back = image::open(sink.frame_path(3)).unwrap().to_rgba8();
        assert_eq!(back.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(back.get_pixel(1, 0).0, [255, 0, 0, 128]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn wrong_length_is_an_error() {
        let dir = std::env::temp_dir().join(format!("tessel-png-len-{}", std::process::id()));
        let mut sink = PngSequence::new(&dir).unwrap();
        assert!(sink.write_frame(0, PixelSize::new(2, 2), &[0; 4]).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
