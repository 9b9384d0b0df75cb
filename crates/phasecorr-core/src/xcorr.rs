//! Real-space cross-correlation of two images under a candidate shift.

use ndarray::ArrayViewD;
use num_traits::AsPrimitive;
use rayon::ThreadPool;
use tracing::{debug, warn};

use crate::error::{PhaseCorrError, Result};
use crate::filter::{accepts, PeakFilter};
use crate::interpolate::nlinear_sample;
use crate::interval::Interval;
use crate::overlap::overlap_intervals;
use crate::parallel::{build_pool, run_tasks, run_tasks_mut};
use crate::params::MinOverlap;
use crate::peak::PhaseCorrelationPeak;
use crate::portion::{portion_count, split_along_largest_dimension};

/// How shift hypotheses are scored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XcorrOptions {
    pub min_overlap: MinOverlap,
    /// Sample image2 at the subpixel shift instead of the integer one.
    pub interpolate_subpixel: bool,
}

/// Zero-mean correlation coefficient over an overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correlation {
    pub value: f64,
    pub n_pixel: u64,
    /// Partial sums lost to panicking tasks.
    pub failed_tasks: usize,
}

/// Source of sample values for one side of the correlation.
enum Sampler<'a, 'b, T> {
    Grid(&'b ArrayViewD<'a, T>),
    /// Continuous samples displaced by `-fraction` from the grid position.
    Shifted {
        data: &'b ArrayViewD<'a, T>,
        fraction: &'b [f64],
    },
}

impl<T> Sampler<'_, '_, T>
where
    T: AsPrimitive<f64>,
{
    fn sample(&self, position: &[i64], index: &mut [usize], real: &mut [f64]) -> f64 {
        match self {
            Sampler::Grid(data) => {
                for (slot, &p) in index.iter_mut().zip(position) {
                    *slot = p as usize;
                }
                data[&*index].as_()
            }
            Sampler::Shifted { data, fraction } => {
                for ((slot, &p), f) in real.iter_mut().zip(position).zip(fraction.iter()) {
                    *slot = p as f64 - f;
                }
                nlinear_sample(data, real, index)
            }
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Sums {
    a: f64,
    b: f64,
    ab: f64,
}

fn correlation_with<T, S>(
    region1: &Interval,
    region2: &Interval,
    sampler1: &Sampler<'_, '_, T>,
    sampler2: &Sampler<'_, '_, S>,
    pool: &ThreadPool,
) -> Correlation
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    let n = region1.ndim();
    let n_pixel = region1.size() as u64;
    if n_pixel == 0 {
        return Correlation {
            value: f64::NEG_INFINITY,
            n_pixel: 0,
            failed_tasks: 0,
        };
    }

    let to_region2: Vec<i64> = region2
        .min()
        .iter()
        .zip(region1.min())
        .map(|(b, a)| b - a)
        .collect();
    let slabs = split_along_largest_dimension(region1, portion_count(region1.size()));

    // Walks one slab of the overlap, handing each pair of samples to `visit`.
    let walk = |slab: &Interval, visit: &mut dyn FnMut(f64, f64)| {
        let mut index1 = vec![0usize; n];
        let mut index2 = vec![0usize; n];
        let mut real = vec![0f64; n];
        let mut position2 = vec![0i64; n];
        slab.for_each(|position1| {
            for (d, p) in position2.iter_mut().enumerate() {
                *p = position1[d] + to_region2[d];
            }
            let a = sampler1.sample(position1, &mut index1, &mut real);
            let b = sampler2.sample(&position2, &mut index2, &mut real);
            visit(a, b);
        });
    };

    let totals = run_tasks(pool, &slabs, |slab| {
        let mut sums = Sums::default();
        walk(slab, &mut |a, b| {
            sums.a += a;
            sums.b += b;
        });
        sums
    });
    let (sum1, sum2) = totals
        .results
        .iter()
        .fold((0.0, 0.0), |(s1, s2), s| (s1 + s.a, s2 + s.b));
    let mean1 = sum1 / n_pixel as f64;
    let mean2 = sum2 / n_pixel as f64;

    let squares = run_tasks(pool, &slabs, |slab| {
        let mut sums = Sums::default();
        walk(slab, &mut |a, b| {
            let da = a - mean1;
            let db = b - mean2;
            sums.a += da * da;
            sums.b += db * db;
            sums.ab += da * db;
        });
        sums
    });
    let total = squares.results.iter().fold(Sums::default(), |acc, s| Sums {
        a: acc.a + s.a,
        b: acc.b + s.b,
        ab: acc.ab + s.ab,
    });

    // A uniform overlap is almost always an artifact (e.g. empty background),
    // so it scores zero even when both sides are identical.
    let value = if total.a == 0.0 || total.b == 0.0 {
        0.0
    } else {
        total.ab / (total.a * total.b).sqrt()
    };

    Correlation {
        value,
        n_pixel,
        failed_tasks: totals.failed + squares.failed,
    }
}

/// Correlation of `img1` over `region1` with `img2` over `region2`.
///
/// Both regions must have the same extents; they are walked in lockstep.
pub fn correlation<T, S>(
    img1: &ArrayViewD<'_, T>,
    img2: &ArrayViewD<'_, S>,
    region1: &Interval,
    region2: &Interval,
    pool: &ThreadPool,
) -> Result<Correlation>
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    if region1.dimensions() != region2.dimensions() {
        return Err(PhaseCorrError::ShapeMismatch {
            left: region1.dimensions(),
            right: region2.dimensions(),
        });
    }
    Ok(correlation_with(
        region1,
        region2,
        &Sampler::Grid(img1),
        &Sampler::Grid(img2),
        pool,
    ))
}

/// Score one shift hypothesis in place.
///
/// The candidate is rejected (`NEG_INFINITY`, zero samples) when it has no
/// shift yet, when the images do not overlap under it, when the overlap is
/// below `options.min_overlap`, or when the overlap holds a NaN sample. Returns the number of failed partial tasks.
pub fn calculate_cross_corr<T, S>(
    peak: &mut PhaseCorrelationPeak,
    img1: &ArrayViewD<'_, T>,
    img2: &ArrayViewD<'_, S>,
    options: &XcorrOptions,
    pool: &ThreadPool,
) -> usize
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    let Some(shift) = peak.shift.as_ref() else {
        warn!(position = ?peak.pcm_position, "Scoring a peak that was never expanded");
        peak.reject();
        return 0;
    };

    let Some((region1, region2)) = overlap_intervals(img1.shape(), img2.shape(), shift) else {
        peak.reject();
        return 0;
    };
    if !options.min_overlap.is_satisfied_by(&region1) {
        peak.reject();
        return 0;
    }

    let fraction: Option<Vec<f64>> = if options.interpolate_subpixel {
        peak.subpixel_shift.as_ref().map(|sub| {
            sub.iter()
                .zip(shift)
                .map(|(s, &i)| s - i as f64)
                .collect()
        })
    } else {
        None
    };

    let sampler1 = Sampler::Grid(img1);
    let result = match fraction.as_deref() {
        Some(fraction) => correlation_with(
            &region1,
            &region2,
            &sampler1,
            &Sampler::Shifted {
                data: img2,
                fraction,
            },
            pool,
        ),
        None => correlation_with(&region1, &region2, &sampler1, &Sampler::Grid(img2), pool),
    };

    if result.value.is_nan() {
        warn!(shift = ?shift, "Overlap contains non-finite samples, rejecting shift");
        peak.reject();
        return result.failed_tasks;
    }
    peak.cross_correlation = result.value;
    peak.n_pixel = result.n_pixel;
    result.failed_tasks
}

/// Score every candidate on `pool`, one task per candidate.
///
/// Candidates whose integer shift fails `filter` are rejected without being
/// scored. Each task owns exactly one candidate; a candidate whose task
/// panicked is rejected. Returns the number of failed tasks.
pub fn calculate_cross_corr_parallel<T, S>(
    peaks: &mut [PhaseCorrelationPeak],
    img1: &ArrayViewD<'_, T>,
    img2: &ArrayViewD<'_, S>,
    options: &XcorrOptions,
    filter: Option<&dyn PeakFilter>,
    pool: &ThreadPool,
) -> Result<usize>
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    if img1.ndim() != img2.ndim() {
        return Err(PhaseCorrError::DimensionMismatch {
            expected: img1.ndim(),
            got: img2.ndim(),
        });
    }

    let partial_failures = std::sync::atomic::AtomicUsize::new(0);
    let failed = run_tasks_mut(pool, peaks, |peak| {
        let passes = peak
            .shift_f64()
            .is_some_and(|shift| accepts(filter, &shift));
        if passes {
            let lost = calculate_cross_corr(peak, img1, img2, options, pool);
            partial_failures.fetch_add(lost, std::sync::atomic::Ordering::Relaxed);
        } else {
            peak.reject();
        }
    });
    for &index in &failed {
        peaks[index].reject();
    }

    let partial = partial_failures.into_inner();
    debug!(
        candidates = peaks.len(),
        failed = failed.len(),
        partial,
        "Cross-correlation scoring complete"
    );
    Ok(failed.len() + partial)
}

/// [`calculate_cross_corr_parallel`] on a temporary pool sized to the
/// hardware, without a filter.
pub fn calculate_cross_corr_default<T, S>(
    peaks: &mut [PhaseCorrelationPeak],
    img1: &ArrayViewD<'_, T>,
    img2: &ArrayViewD<'_, S>,
    min_overlap: MinOverlap,
) -> Result<usize>
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    let pool = build_pool(None)?;
    let options = XcorrOptions {
        min_overlap,
        interpolate_subpixel: false,
    };
    calculate_cross_corr_parallel(peaks, img1, img2, &options, None, &pool)
}
