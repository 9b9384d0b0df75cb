use std::path::Path;

use anyhow::{Context, Result};
use image::Luma;
use ndarray::{Array2, ArrayD};

/// Load any supported image as grayscale `f32` in `[0, 1]`, shape
/// `(height, width)`.
pub fn load_gray(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_luma32f();
    let (w, h) = img.dimensions();
    let data = Array2::from_shape_vec((h as usize, w as usize), img.into_raw())
        .with_context(|| format!("Unexpected pixel buffer size in {}", path.display()))?;
    Ok(data)
}

/// Save a 2D array as 16-bit grayscale, rescaled to its own value range.
pub fn save_gray16(data: &ArrayD<f32>, path: &Path) -> Result<()> {
    let data = data
        .view()
        .into_dimensionality::<ndarray::Ix2>()
        .context("Only two-dimensional results can be written as images")?;
    let (h, w) = data.dim();

    let (lo, hi) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = if hi > lo { hi - lo } else { 1.0 };

    let pixels: Vec<u16> = data
        .iter()
        .map(|&v| (((v - lo) / range).clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .context("Pixel buffer does not match image dimensions")?;
    img.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
