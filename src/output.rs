// Image encoding and writing
//
// The destination path and the canvas are explicit parameters; the file
// extension alone picks the container format.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("unsupported image extension on '{0}' (use .png or .jpg)")]
    Extension(String),

    #[error("failed to encode or write image: {0}")]
    Encode(#[from] image::ImageError),
}

// Container formats the canvas can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

// Pick the container format from the path's extension. Called up front by
// the CLI so a typo'd path fails before minutes of scanning, and again by
// write_image.
pub fn format_for(path: &Path) -> Result<ImageFormat, OutputError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(ImageFormat::Png),
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            Ok(ImageFormat::Jpeg)
        }
        _ => Err(OutputError::Extension(path.display().to_string())),
    }
}

// Write the finished canvas to `path`.
//
// PNG keeps the alpha channel (transparent backgrounds survive); JPEG has
// no alpha, so the canvas is flattened to RGB first.
pub fn write_image(path: &Path, image: &RgbaImage) -> Result<(), OutputError> {
    match format_for(path)? {
        ImageFormat::Png => image.save(path)?,
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_for(Path::new("map.png")).unwrap(), ImageFormat::Png);
        assert_eq!(format_for(Path::new("map.PNG")).unwrap(), ImageFormat::Png);
        assert_eq!(format_for(Path::new("map.jpg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for(Path::new("map.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(
            format_for(Path::new("a/b/map.png")).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_unsupported_extensions_fail() {
        for path in ["map.gif", "map.bmp", "map", "map.png.tmp"] {
            assert!(
                matches!(format_for(Path::new(path)), Err(OutputError::Extension(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_png_roundtrip_keeps_pixels() {
        let mut canvas = RgbaImage::new(4, 4);
        canvas.put_pixel(1, 2, Rgba([255, 0, 0, 255]));
        canvas.put_pixel(3, 3, Rgba([0, 0, 255, 128]));

        let path = std::env::temp_dir().join("netmap_output_test.png");
        write_image(&path, &canvas).expect("png write should succeed");

        let reread = image::open(&path).expect("png should reopen").to_rgba8();
        assert_eq!(reread.dimensions(), (4, 4));
        assert_eq!(*reread.get_pixel(1, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*reread.get_pixel(3, 3), Rgba([0, 0, 255, 128]));
        let _ = std::fs::remove_file(&path);
    }
}
