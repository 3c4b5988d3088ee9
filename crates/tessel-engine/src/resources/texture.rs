use std::path::Path;

use anyhow::{Context, Result, bail};
use image::{Rgba, RgbaImage};

const CHECKER_SIZE: u32 = 16;
const CHECKER_CELL: u32 = 4;

/// Decodes an image file into tightly packed RGBA8.
pub(crate) fn decode(path: &Path, max_dimension: u32) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?
        .to_rgba8();

    if image.width() == 0 || image.height() == 0 {
        bail!("image {} has no pixels", path.display());
    }
    if image.width() > max_dimension || image.height() > max_dimension {
        bail!(
            "image {} is {}x{}, larger than the device limit {max_dimension}",
            path.display(),
            image.width(),
            image.height()
        );
    }
    Ok(image)
}

/// 1x1 opaque white. Untextured meshes sample this so vertex colour passes through.
pub(crate) fn blank_image() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]))
}

/// Magenta/black checkerboard bound where a texture failed to load.
pub(crate) fn missing_image() -> RgbaImage {
    RgbaImage::from_fn(CHECKER_SIZE, CHECKER_SIZE, |x, y| {
        if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_have_expected_pixels() {
        assert_eq!(blank_image().get_pixel(0, 0), &Rgba([255, 255, 255, 255]));

        let missing = missing_image();
        assert_eq!(missing.get_pixel(0, 0), &Rgba([255, 0, 255, 255]));
        assert_eq!(missing.get_pixel(CHECKER_CELL, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(
            missing.get_pixel(CHECKER_CELL, CHECKER_CELL),
            &Rgba([255, 0, 255, 255])
        );
    }

    #[test]
    fn decode_of_missing_file_fails() {
        let err = decode(Path::new("/definitely/not/here.png"), 4096).unwrap_err();
        assert!(format!("{err:#}").contains("not/here.png"));
    }

    #[test]
    fn decode_reads_png_from_disk() {
        let path = std::env::temp_dir().join(format!("tessel-decode-{}.png", std::process::id()));
        missing_image().save(&path).unwrap();

        let decoded = decode(&path, 4096).unwrap();
        assert_eq!(decoded.dimensions(), (CHECKER_SIZE, CHECKER_SIZE));
        assert!(decode(&path, 8).is_err());

        let _ = std::fs::remove_file(path);
    }
}
