//! Multi-threaded local-maxima search over a periodic PCM.

use ndarray::ArrayViewD;
use rayon::ThreadPool;
use tracing::debug;

use crate::consts::TASKS_PER_THREAD;
use crate::error::Result;
use crate::expand::ShiftGeometry;
use crate::filter::PeakFilter;
use crate::interval::Interval;
use crate::parallel::{build_pool, run_tasks};
use crate::peak::{rank_by_phase_correlation, PhaseCorrelationPeak};
use crate::periodic::PeriodicView;
use crate::portion::{available_parallelism, split_along_largest_dimension};
use crate::subpixel::refine_peak_quadratic;

/// A filter together with the extents needed to turn PCM positions into the
/// real-space shifts it judges.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub filter: &'a dyn PeakFilter,
    pub geometry: &'a ShiftGeometry,
}

impl FilterContext<'_> {
    /// At least one shift hypothesis of `position` passes the filter.
    pub fn accepts_position(&self, position: &[i64]) -> bool {
        self.geometry
            .possible_shifts(position)
            .iter()
            .any(|shift| {
                let shift: Vec<f64> = shift.iter().map(|&s| s as f64).collect();
                self.filter.accept(&shift)
            })
    }
}

/// Maxima found by a parallel search.
#[derive(Clone, Debug, Default)]
pub struct Maxima {
    /// Highest PCM value first.
    pub peaks: Vec<PhaseCorrelationPeak>,
    /// Search tasks that panicked; their slabs were not searched.
    pub failed_tasks: usize,
}

/// Descending top-`capacity` list of maxima.
struct TopMaxima {
    capacity: usize,
    items: Vec<PhaseCorrelationPeak>,
}

impl TopMaxima {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity + 1),
        }
    }

    /// Slot `value` would occupy, or `None` if it would fall off the end.
    fn slot(&self, position: &[i64], value: f64) -> Option<usize> {
        let slot = self.items.partition_point(|item| {
            item.phase_correlation > value
                || (item.phase_correlation == value && item.pcm_position.as_slice() < position)
        });
        (slot < self.capacity).then_some(slot)
    }

    fn insert(&mut self, slot: usize, position: &[i64], value: f64) {
        self.items
            .insert(slot, PhaseCorrelationPeak::new(position.to_vec(), value));
        self.items.truncate(self.capacity);
    }
}

/// Whether no direct periodic neighbour of `position` exceeds `value`.
///
/// Equal neighbours do not disqualify a position, so every sample of a
/// plateau counts as a maximum.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn is_local_maximum(pcm: &PeriodicView<'_>, position: &[i64], value: f64, index: &mut [usize]) -> bool {
    (0..pcm.ndim()).all(|d| {
        !(value < pcm.neighbor(position, d, 1, index))
            && !(value < pcm.neighbor(position, d, -1, index))
    })
}

/// Serial scan of `region`, keeping the `max_n` highest local maxima.
pub fn find_peaks(
    pcm: &PeriodicView<'_>,
    region: &Interval,
    max_n: usize,
    filter: Option<FilterContext<'_>>,
) -> Vec<PhaseCorrelationPeak> {
    if max_n == 0 {
        return Vec::new();
    }

    let mut top = TopMaxima::new(max_n);
    let mut index = vec![0usize; pcm.ndim()];

    region.for_each(|position| {
        let value = pcm.get(position, &mut index);
        if !is_local_maximum(pcm, position, value, &mut index) {
            return;
        }
        let Some(slot) = top.slot(position, value) else {
            return;
        };
        if let Some(ctx) = filter {
            if !ctx.accepts_position(position) {
                return;
            }
        }
        top.insert(slot, position, value);
    });

    top.items
}

/// Merge per-task lists into the global top-`max_n`.
pub fn merge_maxima(
    partial: Vec<Vec<PhaseCorrelationPeak>>,
    max_n: usize,
) -> Vec<PhaseCorrelationPeak> {
    let mut all: Vec<PhaseCorrelationPeak> = partial.into_iter().flatten().collect();
    all.sort_by(rank_by_phase_correlation);
    all.truncate(max_n);
    all
}

/// Search `region` in `n_tasks` slabs on `pool` and merge the results.
pub fn find_peaks_mt(
    pcm: &PeriodicView<'_>,
    region: &Interval,
    max_n: usize,
    n_tasks: usize,
    pool: &ThreadPool,
    filter: Option<FilterContext<'_>>,
) -> Maxima {
    if max_n == 0 || region.is_empty() {
        return Maxima::default();
    }

    let slabs = split_along_largest_dimension(region, n_tasks);
    debug!(tasks = slabs.len(), max_n, "Searching PCM for local maxima");

    let report = run_tasks(pool, &slabs, |slab| find_peaks(pcm, slab, max_n, filter));

    Maxima {
        peaks: merge_maxima(report.results, max_n),
        failed_tasks: report.failed,
    }
}

/// Find the `max_n` strongest maxima of a PCM.
///
/// With `filter`, only positions with at least one accepted shift hypothesis
/// are kept. With `subpixel`, each maximum gets a refined PCM position.
pub fn pcm_maxima(
    pcm: ArrayViewD<'_, f64>,
    pool: &ThreadPool,
    max_n: usize,
    subpixel: bool,
    filter: Option<FilterContext<'_>>,
) -> Maxima {
    let view = PeriodicView::new(pcm);
    let region = Interval::from_shape(view.shape());
    let n_tasks = TASKS_PER_THREAD * available_parallelism();

    let mut maxima = find_peaks_mt(&view, &region, max_n, n_tasks, pool, filter);
    if subpixel {
        for peak in &mut maxima.peaks {
            peak.subpixel_pcm_position = Some(refine_peak_quadratic(&view, &peak.pcm_position));
        }
    }
    debug!(found = maxima.peaks.len(), "PCM maxima located");
    maxima
}

/// [`pcm_maxima`] on a temporary pool sized to the hardware, without a
/// filter.
pub fn pcm_maxima_default(
    pcm: ArrayViewD<'_, f64>,
    max_n: usize,
    subpixel: bool,
) -> Result<Vec<PhaseCorrelationPeak>> {
    let pool = build_pool(None)?;
    Ok(pcm_maxima(pcm, &pool, max_n, subpixel, None).peaks)
}
