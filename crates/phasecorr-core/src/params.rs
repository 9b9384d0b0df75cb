use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_EXTENSION_FACTOR, DEFAULT_MAX_PEAKS, DEFAULT_NORMALIZATION_THRESHOLD};
use crate::interval::Interval;

/// Smallest overlap a shift hypothesis needs before it is scored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MinOverlap {
    /// Any non-empty overlap is scored.
    #[default]
    Any,
    /// At least this many overlapping samples in total.
    Total(u64),
    /// At least `min[d]` overlapping samples along axis `d`.
    PerDimension(Vec<usize>),
}

impl MinOverlap {
    pub fn is_satisfied_by(&self, overlap: &Interval) -> bool {
        match self {
            MinOverlap::Any => !overlap.is_empty(),
            MinOverlap::Total(min) => overlap.size() as u64 >= *min && !overlap.is_empty(),
            MinOverlap::PerDimension(min) => {
                !overlap.is_empty()
                    && min
                        .iter()
                        .enumerate()
                        .take(overlap.ndim())
                        .all(|(d, &m)| overlap.dimension(d) >= m)
            }
        }
    }
}

impl std::fmt::Display for MinOverlap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinOverlap::Any => write!(f, "Any"),
            MinOverlap::Total(n) => write!(f, "{n} samples"),
            MinOverlap::PerDimension(dims) => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "{} per axis", parts.join("x"))
            }
        }
    }
}

/// Parameters of one pairwise registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    /// Number of PCM maxima to expand and score.
    pub max_peaks: usize,
    /// Refine maxima to subpixel PCM positions.
    pub subpixel: bool,
    /// Score subpixel shifts by interpolating image2.
    pub interpolate_subpixel: bool,
    pub min_overlap: MinOverlap,
    /// Worker threads for the convenience entry points; `None` uses all
    /// hardware threads.
    pub threads: Option<usize>,
    /// Spectral magnitude below which normalization yields zero.
    pub normalization_threshold: f64,
    /// Per-side padding as a fraction of the larger image extent, used when
    /// the PCM is built from raw images.
    pub extension_factor: f64,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            max_peaks: DEFAULT_MAX_PEAKS,
            subpixel: true,
            interpolate_subpixel: false,
            min_overlap: MinOverlap::Any,
            threads: None,
            normalization_threshold: DEFAULT_NORMALIZATION_THRESHOLD,
            extension_factor: DEFAULT_EXTENSION_FACTOR,
        }
    }
}
