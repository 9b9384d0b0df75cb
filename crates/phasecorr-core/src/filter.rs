use serde::{Deserialize, Serialize};

/// Acceptance test for a candidate real-space shift.
///
/// Filters are invoked concurrently from the maxima search and the
/// cross-correlation workers with no external synchronization. They must be
/// `Send + Sync`, and any interior state they mutate has to be protected by
/// the filter itself.
///
/// Any `Fn(&[f64]) -> bool + Send + Sync` closure is a filter.
pub trait PeakFilter: Send + Sync {
    /// Whether a peak whose image2-relative-to-image1 shift is `shift` should
    /// be kept.
    fn accept(&self, shift: &[f64]) -> bool;
}

impl<F> PeakFilter for F
where
    F: Fn(&[f64]) -> bool + Send + Sync,
{
    fn accept(&self, shift: &[f64]) -> bool {
        self(shift)
    }
}

/// Apply an optional filter; no filter accepts everything.
pub fn accepts(filter: Option<&dyn PeakFilter>, shift: &[f64]) -> bool {
    filter.map_or(true, |f| f.accept(shift))
}

/// Accepts shifts inside an axis-aligned box (bounds inclusive).
///
/// Axes beyond the length of the bounds are unconstrained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftRangeFilter {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl ShiftRangeFilter {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        Self { min, max }
    }

    /// Box centered on zero shift, `max_abs[d]` wide on each side.
    pub fn symmetric(max_abs: &[f64]) -> Self {
        Self {
            min: max_abs.iter().map(|m| -m.abs()).collect(),
            max: max_abs.iter().map(|m| m.abs()).collect(),
        }
    }

    /// Box centered on an expected shift.
    pub fn around(expected: &[f64], max_deviation: &[f64]) -> Self {
        Self {
            min: expected
                .iter()
                .zip(max_deviation)
                .map(|(e, m)| e - m.abs())
                .collect(),
            max: expected
                .iter()
                .zip(max_deviation)
                .map(|(e, m)| e + m.abs())
                .collect(),
        }
    }
}

impl PeakFilter for ShiftRangeFilter {
    fn accept(&self, shift: &[f64]) -> bool {
        shift
            .iter()
            .zip(self.min.iter().zip(&self.max))
            .all(|(s, (lo, hi))| s >= lo && s <= hi)
    }
}
