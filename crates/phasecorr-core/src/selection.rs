//! Peak aggregation: maxima → shift hypotheses → filter → score → rank.

use ndarray::ArrayViewD;
use num_traits::AsPrimitive;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::error::{PhaseCorrError, Result};
use crate::expand::ShiftGeometry;
use crate::filter::PeakFilter;
use crate::maxima::{pcm_maxima, FilterContext};
use crate::parallel::build_pool;
use crate::params::RegistrationParams;
use crate::peak::{rank_by_cross_correlation, PhaseCorrelationPeak};
use crate::xcorr::{calculate_cross_corr_parallel, XcorrOptions};

/// Outcome of registering one image pair.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    /// Every scored shift hypothesis, best first. Rejected candidates sort
    /// last.
    pub peaks: Vec<PhaseCorrelationPeak>,
    /// Parallel tasks that panicked along the way. A non-zero count means
    /// the ranking may be missing candidates.
    pub failed_tasks: usize,
}

impl Registration {
    /// The winning candidate, if any hypothesis overlapped and was scored.
    pub fn best(&self) -> Option<&PhaseCorrelationPeak> {
        self.peaks.first().filter(|p| p.is_valid())
    }

    pub fn is_partial(&self) -> bool {
        self.failed_tasks > 0
    }
}

/// Register `img2` against `img1` from their precomputed PCM.
///
/// The PCM and both images must share the same dimensionality. `pool` is
/// borrowed, never shut down.
pub fn register_pcm<T, S>(
    pcm: ArrayViewD<'_, f64>,
    img1: ArrayViewD<'_, T>,
    img2: ArrayViewD<'_, S>,
    params: &RegistrationParams,
    filter: Option<&dyn PeakFilter>,
    pool: &ThreadPool,
) -> Result<Registration>
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    if img1.is_empty() || img2.is_empty() {
        return Err(PhaseCorrError::EmptyImage);
    }
    let geometry = ShiftGeometry::new(pcm.shape(), img1.shape(), img2.shape())?;
    if params.max_peaks == 0 {
        return Ok(Registration::default());
    }

    let context = filter.map(|filter| FilterContext {
        filter,
        geometry: &geometry,
    });
    let maxima = pcm_maxima(pcm, pool, params.max_peaks, params.subpixel, context);

    let mut peaks = geometry.expand_all(&maxima.peaks);
    debug!(
        maxima = maxima.peaks.len(),
        hypotheses = peaks.len(),
        offset = ?geometry.offset(),
        "Expanded PCM maxima into shift hypotheses"
    );

    let options = XcorrOptions {
        min_overlap: params.min_overlap.clone(),
        interpolate_subpixel: params.interpolate_subpixel,
    };
    let scoring_failures =
        calculate_cross_corr_parallel(&mut peaks, &img1, &img2, &options, filter, pool)?;

    peaks.sort_by(rank_by_cross_correlation);

    let registration = Registration {
        peaks,
        failed_tasks: maxima.failed_tasks + scoring_failures,
    };
    match registration.best() {
        Some(best) => info!(
            shift = ?best.best_shift(),
            cross_correlation = best.cross_correlation,
            n_pixel = best.n_pixel,
            phase_correlation = best.phase_correlation,
            "Selected shift"
        ),
        None => info!("No shift hypothesis overlapped both images"),
    }
    Ok(registration)
}

/// [`register_pcm`] without a filter, on a temporary pool sized by
/// `params.threads` that is dropped before returning.
pub fn register_pcm_default<T, S>(
    pcm: ArrayViewD<'_, f64>,
    img1: ArrayViewD<'_, T>,
    img2: ArrayViewD<'_, S>,
    params: &RegistrationParams,
) -> Result<Registration>
where
    T: AsPrimitive<f64> + Sync,
    S: AsPrimitive<f64> + Sync,
{
    let pool = build_pool(params.threads)?;
    register_pcm(pcm, img1, img2, params, None, &pool)
}
