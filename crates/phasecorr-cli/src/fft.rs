use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewMutD, Axis, Zip};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use phasecorr_core::consts::PARALLEL_SAMPLE_THRESHOLD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// In-place n-dimensional FFT: one 1D transform per lane along each axis.
///
/// The inverse is unnormalized; see [`ifft_nd_real`].
pub fn fft_nd(data: &mut ArrayD<Complex64>, direction: Direction) {
    let mut planner = FftPlanner::new();
    let parallel = data.len() >= PARALLEL_SAMPLE_THRESHOLD;

    for axis in 0..data.ndim() {
        let len = data.shape()[axis];
        if len <= 1 {
            continue;
        }
        let fft = match direction {
            Direction::Forward => planner.plan_fft_forward(len),
            Direction::Inverse => planner.plan_fft_inverse(len),
        };
        if parallel {
            fft_axis_parallel(data.view_mut(), axis, &fft);
        } else {
            fft_axis_sequential(data.view_mut(), axis, &fft);
        }
    }
}

fn fft_axis_parallel(mut data: ArrayViewMutD<'_, Complex64>, axis: usize, fft: &Arc<dyn Fft<f64>>) {
    Zip::from(data.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
        let mut buffer: Vec<Complex64> = lane.iter().copied().collect();
        fft.process(&mut buffer);
        for (dst, src) in lane.iter_mut().zip(buffer) {
            *dst = src;
        }
    });
}

fn fft_axis_sequential(mut data: ArrayViewMutD<'_, Complex64>, axis: usize, fft: &Arc<dyn Fft<f64>>) {
    let len = data.shape()[axis];
    let mut buffer = vec![Complex64::new(0.0, 0.0); len];
    for mut lane in data.lanes_mut(Axis(axis)) {
        for (dst, src) in buffer.iter_mut().zip(lane.iter()) {
            *dst = *src;
        }
        fft.process(&mut buffer);
        for (dst, src) in lane.iter_mut().zip(&buffer) {
            *dst = *src;
        }
    }
}

/// Inverse n-dimensional FFT, returning the real part normalized by `1/N`.
pub fn ifft_nd_real(mut data: ArrayD<Complex64>) -> ArrayD<f64> {
    fft_nd(&mut data, Direction::Inverse);
    let scale = 1.0 / data.len().max(1) as f64;
    data.mapv(|c| c.re * scale)
}
