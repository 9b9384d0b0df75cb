//! Parallel elementwise operations on complex spectra.
//!
//! Each operation splits its output into portions and runs one task per
//! portion on the caller's pool. When every operand is in standard
//! (row-major, contiguous) layout the portions co-iterate the raw slices;
//! otherwise each output sample looks its operands up by index.

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Dimension};
use num_complex::Complex64;
use rayon::ThreadPool;

use crate::consts::DEFAULT_NORMALIZATION_THRESHOLD;
use crate::error::{PhaseCorrError, Result};
use crate::parallel::{run_tasks_mut, split_view_mut};
use crate::portion::{divide_into_portions, portion_count, Portion};

/// Complex product `c1 * c2`.
pub fn multiply_complex(c1: Complex64, c2: Complex64) -> Complex64 {
    Complex64::new(c1.re * c2.re - c1.im * c2.im, c1.re * c2.im + c1.im * c2.re)
}

/// Complex conjugate.
pub fn complex_conj(c: Complex64) -> Complex64 {
    Complex64::new(c.re, -c.im)
}

/// Scale `c` to unit magnitude, or zero it when its magnitude does not exceed
/// `threshold`.
pub fn normalize(c: Complex64, threshold: f64) -> Complex64 {
    let len = c.norm();
    if len > threshold {
        Complex64::new(c.re / len, c.im / len)
    } else {
        Complex64::new(0.0, 0.0)
    }
}

fn check_shapes(expected: &[usize], operands: &[&[usize]]) -> Result<()> {
    for shape in operands {
        if shape.len() != expected.len() {
            return Err(PhaseCorrError::DimensionMismatch {
                expected: expected.len(),
                got: shape.len(),
            });
        }
        if *shape != expected {
            return Err(PhaseCorrError::ShapeMismatch {
                left: expected.to_vec(),
                right: shape.to_vec(),
            });
        }
    }
    Ok(())
}

/// Write `op(inputs[0][i], .., inputs[N-1][i])` into `res[i]` for every `i`.
///
/// Returns the number of portions whose task failed; their output samples are
/// left as they were.
fn apply_elementwise<const N: usize, F>(
    inputs: [&ArrayViewD<'_, Complex64>; N],
    mut res: ArrayViewMutD<'_, Complex64>,
    pool: &ThreadPool,
    op: F,
) -> Result<usize>
where
    F: Fn([Complex64; N]) -> Complex64 + Sync,
{
    let shapes: Vec<&[usize]> = inputs.iter().map(|a| a.shape()).collect();
    check_shapes(res.shape(), &shapes)?;

    let total = res.len();
    if total == 0 {
        return Ok(0);
    }
    let parts = portion_count(total);

    let slices: Option<Vec<&[Complex64]>> = inputs.iter().map(|a| a.as_slice()).collect();
    if let (Some(slices), Some(out)) = (slices, res.as_slice_mut()) {
        let mut chunks: Vec<(Portion, &mut [Complex64])> = Vec::new();
        let mut rest = out;
        for portion in divide_into_portions(total, parts) {
            let (head, tail) = rest.split_at_mut(portion.len);
            chunks.push((portion, head));
            rest = tail;
        }

        let failed = run_tasks_mut(pool, &mut chunks, |(portion, chunk)| {
            for (offset, value) in chunk.iter_mut().enumerate() {
                let i = portion.start + offset;
                *value = op(std::array::from_fn(|k| slices[k][i]));
            }
        });
        return Ok(failed.len());
    }

    let n = res.ndim();
    let mut pieces = split_view_mut(res.view_mut(), parts);
    let failed = run_tasks_mut(pool, &mut pieces, |piece| {
        let mut index = vec![0usize; n];
        let axis = piece.axis;
        let offset = piece.offset;
        for (local, value) in piece.view.indexed_iter_mut() {
            index.copy_from_slice(local.slice());
            if let Some(axis) = axis {
                index[axis] += offset;
            }
            *value = op(std::array::from_fn(|k| inputs[k][&*index]));
        }
    });
    Ok(failed.len())
}

/// `res = img1 * img2`, elementwise.
pub fn multiply_complex_intervals(
    img1: &ArrayViewD<'_, Complex64>,
    img2: &ArrayViewD<'_, Complex64>,
    res: ArrayViewMutD<'_, Complex64>,
    pool: &ThreadPool,
) -> Result<usize> {
    apply_elementwise([img1, img2], res, pool, |[a, b]| multiply_complex(a, b))
}

/// `res = conj(img)`, elementwise.
pub fn complex_conj_interval(
    img: &ArrayViewD<'_, Complex64>,
    res: ArrayViewMutD<'_, Complex64>,
    pool: &ThreadPool,
) -> Result<usize> {
    apply_elementwise([img], res, pool, |[c]| complex_conj(c))
}

/// `res = normalize(img, threshold)`, elementwise.
pub fn normalize_interval(
    img: &ArrayViewD<'_, Complex64>,
    res: ArrayViewMutD<'_, Complex64>,
    threshold: f64,
    pool: &ThreadPool,
) -> Result<usize> {
    apply_elementwise([img], res, pool, |[c]| normalize(c, threshold))
}

/// [`normalize_interval`] with the default threshold.
pub fn normalize_interval_default(
    img: &ArrayViewD<'_, Complex64>,
    res: ArrayViewMutD<'_, Complex64>,
    pool: &ThreadPool,
) -> Result<usize> {
    normalize_interval(img, res, DEFAULT_NORMALIZATION_THRESHOLD, pool)
}

/// Normalized cross-power spectrum `normalize(fft1) * conj(normalize(fft2))`.
///
/// This is the spectrum whose inverse transform is the PCM. Returns the
/// spectrum and the number of failed portions across all steps.
pub fn cross_power_spectrum(
    fft1: &ArrayViewD<'_, Complex64>,
    fft2: &ArrayViewD<'_, Complex64>,
    threshold: f64,
    pool: &ThreadPool,
) -> Result<(ArrayD<Complex64>, usize)> {
    let mut unit1 = ArrayD::<Complex64>::zeros(fft1.raw_dim());
    let mut unit2 = ArrayD::<Complex64>::zeros(fft2.raw_dim());
    let mut failed = normalize_interval(fft1, unit1.view_mut(), threshold, pool)?;
    failed += normalize_interval(fft2, unit2.view_mut(), threshold, pool)?;

    let mut conj2 = ArrayD::<Complex64>::zeros(fft2.raw_dim());
    failed += complex_conj_interval(&unit2.view(), conj2.view_mut(), pool)?;

    let mut result = ArrayD::<Complex64>::zeros(fft1.raw_dim());
    failed += multiply_complex_intervals(&unit1.view(), &conj2.view(), result.view_mut(), pool)?;
    Ok((result, failed))
}
