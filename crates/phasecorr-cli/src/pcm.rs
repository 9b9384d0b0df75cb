//! Frequency-domain side of the registration: pad both images into a common
//! extent, transform them and invert their normalized cross-power spectrum.

use anyhow::{ensure, Result};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use num_complex::Complex64;
use rayon::ThreadPool;
use tracing::{debug, warn};

use phasecorr_core::extension::{extended_size, extension_by_factor, padding_origins};
use phasecorr_core::spectrum::cross_power_spectrum;

use crate::fft::{fft_nd, ifft_nd_real, Direction};

/// Zero-pad `img` into a complex array of extent `dims`, low corner at
/// `origin`.
fn pad_complex(img: &ArrayViewD<'_, f32>, dims: &[usize], origin: &[usize]) -> ArrayD<Complex64> {
    let mut padded = ArrayD::<Complex64>::zeros(IxDyn(dims));
    let mut target = vec![0usize; dims.len()];
    for (index, &value) in img.indexed_iter() {
        for (d, t) in target.iter_mut().enumerate() {
            *t = index[d] + origin[d];
        }
        padded[&*target] = Complex64::new(value as f64, 0.0);
    }
    padded
}

/// PCM extent for two images, padded by `extension_factor` of the larger
/// extent on each side.
pub fn pcm_dims(dims1: &[usize], dims2: &[usize], extension_factor: f64) -> Vec<usize> {
    let larger: Vec<usize> = dims1.iter().zip(dims2).map(|(&a, &b)| a.max(b)).collect();
    let extension = extension_by_factor(&larger, extension_factor);
    extended_size(dims1, dims2, &extension)
}

/// Phase correlation matrix of `img1` and `img2`.
pub fn build_pcm(
    img1: &ArrayViewD<'_, f32>,
    img2: &ArrayViewD<'_, f32>,
    extension_factor: f64,
    normalization_threshold: f64,
    pool: &ThreadPool,
) -> Result<ArrayD<f64>> {
    ensure!(
        img1.ndim() == img2.ndim(),
        "Images have different dimensionality ({} vs {})",
        img1.ndim(),
        img2.ndim()
    );

    let dims = pcm_dims(img1.shape(), img2.shape(), extension_factor);
    let (origin1, origin2) = padding_origins(&dims, img1.shape(), img2.shape());
    debug!(pcm = ?dims, origin1 = ?origin1, origin2 = ?origin2, "Padding images");

    let mut fft1 = pad_complex(img1, &dims, &origin1);
    let mut fft2 = pad_complex(img2, &dims, &origin2);
    pool.install(|| {
        fft_nd(&mut fft1, Direction::Forward);
        fft_nd(&mut fft2, Direction::Forward);
    });

    let (spectrum, failed) =
        cross_power_spectrum(&fft1.view(), &fft2.view(), normalization_threshold, pool)?;
    if failed > 0 {
        warn!(failed, "Cross-power spectrum is incomplete");
    }

    Ok(pool.install(|| ifft_nd_real(spectrum)))
}
