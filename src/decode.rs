//! Image decoding into comparison units.
//!
//! Every still image is decoded to 8-bit RGB regardless of its source pixel
//! format, so metrics always see the same layout on both sides of a pair.

use std::path::Path;

use imgref::ImgVec;
use rgb::RGB8;

use crate::error::{Error, Result};

/// Decode an image file into an RGB8 buffer.
///
/// # Errors
///
/// Returns [`Error::ImageLoad`] if the file is missing or cannot be decoded.
pub fn load_image(path: &Path) -> Result<ImgVec<RGB8>> {
    let img = image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let pixels: Vec<RGB8> = rgb
        .pixels()
        .map(|p| RGB8::new(p.0[0], p.0[1], p.0[2]))
        .collect();

    Ok(ImgVec::new(pixels, width as usize, height as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut buf = image::RgbImage::new(3, 2);
        buf.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        buf.save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 2);
        assert_eq!(img[(2usize, 1usize)], RGB8::new(10, 20, 30));
    }

    #[test]
    fn test_missing_file() {
        let result = load_image(Path::new("/no/such/image.png"));
        assert!(matches!(result, Err(Error::ImageLoad { .. })));
    }
}
