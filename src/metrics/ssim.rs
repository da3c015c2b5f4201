//! Structural similarity via `dssim-core`.
//!
//! dssim-core reports structural *dis*similarity, `DSSIM = 1/SSIM - 1`, so
//! the SSIM score is recovered as `1 / (1 + DSSIM)`: 1.0 for identical
//! units, falling towards 0 as structure diverges.

use dssim_core::Dssim;
use imgref::{ImgRef, ImgVec};
use rgb::{RGB8, RGBA};

use crate::error::{Error, Result};

/// Calculate SSIM between two RGB8 units. Higher is better.
pub fn calculate_ssim(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> Result<f64> {
    let dssim = calculate_dssim(reference, test)?;
    Ok(1.0 / (1.0 + dssim))
}

/// Calculate DSSIM between two RGB8 units (0 = identical).
///
/// # Errors
///
/// Returns an error if the units have different dimensions or dssim-core
/// cannot build an image from them.
pub fn calculate_dssim(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> Result<f64> {
    if reference.width() != test.width() || reference.height() != test.height() {
        return Err(Error::DimensionMismatch {
            expected: (reference.width(), reference.height()),
            actual: (test.width(), test.height()),
        });
    }

    let dssim = Dssim::new();

    let ref_image = dssim
        .create_image(&to_dssim_image(reference))
        .ok_or_else(|| Error::MetricCalculation {
            metric: "SSIM".to_string(),
            reason: "Failed to create reference image".to_string(),
        })?;

    let test_image = dssim
        .create_image(&to_dssim_image(test))
        .ok_or_else(|| Error::MetricCalculation {
            metric: "SSIM".to_string(),
            reason: "Failed to create test image".to_string(),
        })?;

    let (dssim_val, _ssim_maps) = dssim.compare(&ref_image, test_image);

    Ok(f64::from(dssim_val))
}

fn to_dssim_image(img: ImgRef<'_, RGB8>) -> ImgVec<RGBA<f32>> {
    let pixels: Vec<RGBA<f32>> = img
        .pixels()
        .map(|p| RGBA {
            r: f32::from(p.r) / 255.0,
            g: f32::from(p.g) / 255.0,
            b: f32::from(p.b) / 255.0,
            a: 1.0,
        })
        .collect();

    ImgVec::new(pixels, img.width(), img.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(offset: u8) -> ImgVec<RGB8> {
        let pixels = (0..64 * 64)
            .map(|i| {
                let v = ((i % 64) as u8).wrapping_mul(4).wrapping_add(offset);
                RGB8::new(v, v, v)
            })
            .collect();
        ImgVec::new(pixels, 64, 64)
    }

    #[test]
    fn test_identical_images() {
        let img = gradient(0);
        let ssim = calculate_ssim(img.as_ref(), img.as_ref()).unwrap();
        assert!(ssim > 0.9999, "identical images should score ~1.0, got {ssim}");
    }

    #[test]
    fn test_different_images() {
        let reference = gradient(0);
        let noisy: Vec<RGB8> = reference
            .pixels()
            .enumerate()
            .map(|(i, p)| if i % 3 == 0 { RGB8::new(255 - p.r, p.g, p.b) } else { p })
            .collect();
        let test = ImgVec::new(noisy, 64, 64);

        let ssim = calculate_ssim(reference.as_ref(), test.as_ref()).unwrap();
        assert!(ssim < 1.0);
        assert!(ssim > 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let small = ImgVec::new(vec![RGB8::new(0, 0, 0); 16 * 16], 16, 16);
        let large = gradient(0);
        let result = calculate_ssim(small.as_ref(), large.as_ref());
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }
}
