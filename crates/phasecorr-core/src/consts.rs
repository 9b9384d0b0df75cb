/// Number of search tasks submitted per available hardware thread.
pub const TASKS_PER_THREAD: usize = 4;

/// Default magnitude below which a spectral coefficient is zeroed during
/// normalization instead of being scaled to unit length.
pub const DEFAULT_NORMALIZATION_THRESHOLD: f64 = 1e-5;

/// Cross-correlation score of a candidate that has not been evaluated yet.
pub const UNSCORED_CROSS_CORRELATION: f64 = -1.0;

/// Default number of PCM maxima kept per registration.
pub const DEFAULT_MAX_PEAKS: usize = 5;

/// Default fraction of the larger image extent added as padding on each side
/// when building a PCM.
pub const DEFAULT_EXTENSION_FACTOR: f64 = 0.1;

/// Curvature magnitude below which a quadratic fit is treated as flat.
pub const SUBPIXEL_CURVATURE_EPSILON: f64 = 1e-12;

/// Maximum subpixel correction (in samples) applied along one axis.
pub const SUBPIXEL_MAX_OFFSET: f64 = 0.5;

/// Minimum sample count before a single elementwise or correlation pass is
/// split into more than one portion.
pub const PARALLEL_SAMPLE_THRESHOLD: usize = 16_384;
