#![allow(dead_code)]

use ndarray::{s, Array2, ArrayD, IxDyn};
use rayon::ThreadPool;

use phasecorr_core::parallel::build_pool;

/// Deterministic white noise in `[0, 1)`, reproducible from `seed`.
pub fn noise(h: usize, w: usize, seed: u64) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        let mut x = seed
            .wrapping_add((r as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add((c as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
        x ^= x >> 30;
        x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^= x >> 31;
        (x >> 40) as f32 / (1u64 << 24) as f32
    })
}

/// Owned `h`x`w` crop of `scene` starting at `(r0, c0)`.
pub fn crop(scene: &Array2<f32>, r0: usize, c0: usize, h: usize, w: usize) -> ArrayD<f32> {
    scene.slice(s![r0..r0 + h, c0..c0 + w]).to_owned().into_dyn()
}

/// Noise PCM in `[0, 1)` for search tests.
pub fn noise_pcm(h: usize, w: usize, seed: u64) -> ArrayD<f64> {
    noise(h, w, seed).mapv(f64::from).into_dyn()
}

/// All-zero PCM with isolated spikes.
pub fn spike_pcm(dims: &[usize], spikes: &[(Vec<i64>, f64)]) -> ArrayD<f64> {
    let mut pcm = ArrayD::<f64>::zeros(IxDyn(dims));
    for (position, value) in spikes {
        let index: Vec<usize> = position.iter().map(|&p| p as usize).collect();
        pcm[index.as_slice()] = *value;
    }
    pcm
}

pub fn pool(threads: usize) -> ThreadPool {
    build_pool(Some(threads)).unwrap()
}
