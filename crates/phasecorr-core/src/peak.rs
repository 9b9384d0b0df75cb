use std::cmp::Ordering;

use crate::consts::UNSCORED_CROSS_CORRELATION;

/// A PCM maximum and, once expanded, one real-space shift hypothesis for it.
///
/// The PCM position alone is ambiguous; `shift` is only set after the peak
/// has been expanded against the image extents. Scoring writes
/// `cross_correlation` and `n_pixel` in place; a rejected candidate carries
/// `f64::NEG_INFINITY` and zero samples.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseCorrelationPeak {
    /// Integer position in the PCM.
    pub pcm_position: Vec<i64>,
    /// PCM value at `pcm_position`.
    pub phase_correlation: f64,
    /// Refined PCM position, when subpixel localization ran.
    pub subpixel_pcm_position: Option<Vec<f64>>,
    /// Displacement of image2 relative to image1.
    pub shift: Option<Vec<i64>>,
    /// `shift` plus the fractional part of the subpixel PCM position.
    pub subpixel_shift: Option<Vec<f64>>,
    pub cross_correlation: f64,
    /// Number of overlapping samples the score was computed over.
    pub n_pixel: u64,
}

impl PhaseCorrelationPeak {
    pub fn new(pcm_position: Vec<i64>, phase_correlation: f64) -> Self {
        Self {
            pcm_position,
            phase_correlation,
            subpixel_pcm_position: None,
            shift: None,
            subpixel_shift: None,
            cross_correlation: UNSCORED_CROSS_CORRELATION,
            n_pixel: 0,
        }
    }

    pub fn ndim(&self) -> usize {
        self.pcm_position.len()
    }

    /// Integer shift as floating point, the form handed to peak filters.
    pub fn shift_f64(&self) -> Option<Vec<f64>> {
        self.shift
            .as_ref()
            .map(|s| s.iter().map(|&v| v as f64).collect())
    }

    /// Subpixel shift when available, otherwise the integer shift.
    pub fn best_shift(&self) -> Option<Vec<f64>> {
        self.subpixel_shift.clone().or_else(|| self.shift_f64())
    }

    /// Fractional offset of the refined PCM position from the integer one.
    pub fn subpixel_offset(&self) -> Option<Vec<f64>> {
        self.subpixel_pcm_position.as_ref().map(|sub| {
            sub.iter()
                .zip(&self.pcm_position)
                .map(|(s, &p)| s - p as f64)
                .collect()
        })
    }

    /// Mark as rejected: outside a filter, no overlap or too little overlap.
    pub fn reject(&mut self) {
        self.cross_correlation = f64::NEG_INFINITY;
        self.n_pixel = 0;
    }

    pub fn is_rejected(&self) -> bool {
        self.cross_correlation == f64::NEG_INFINITY
    }

    /// Scored over at least one overlapping sample.
    pub fn is_valid(&self) -> bool {
        self.n_pixel > 0 && self.cross_correlation.is_finite()
    }
}

/// Ranking by PCM value: highest first, then lowest PCM position.
pub fn rank_by_phase_correlation(a: &PhaseCorrelationPeak, b: &PhaseCorrelationPeak) -> Ordering {
    b.phase_correlation
        .total_cmp(&a.phase_correlation)
        .then_with(|| a.pcm_position.cmp(&b.pcm_position))
}

// NaN scores rank with the rejected ones.
fn score_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Ranking by real-space evidence: highest cross-correlation first, then
/// more overlapping samples, then higher PCM value, then lowest PCM position,
/// then lowest shift.
pub fn rank_by_cross_correlation(a: &PhaseCorrelationPeak, b: &PhaseCorrelationPeak) -> Ordering {
    score_key(b.cross_correlation)
        .total_cmp(&score_key(a.cross_correlation))
        .then_with(|| b.n_pixel.cmp(&a.n_pixel))
        .then_with(|| b.phase_correlation.total_cmp(&a.phase_correlation))
        .then_with(|| a.pcm_position.cmp(&b.pcm_position))
        .then_with(|| a.shift.cmp(&b.shift))
}
