pub mod consts;
pub mod error;
pub mod expand;
pub mod extension;
pub mod filter;
pub mod fuse;
pub mod interpolate;
pub mod interval;
pub mod maxima;
pub mod overlap;
pub mod parallel;
pub mod params;
pub mod peak;
pub mod periodic;
pub mod portion;
pub mod selection;
pub mod spectrum;
pub mod subpixel;
pub mod xcorr;

pub use error::{PhaseCorrError, Result};
pub use expand::ShiftGeometry;
pub use filter::{PeakFilter, ShiftRangeFilter};
pub use interval::Interval;
pub use params::{MinOverlap, RegistrationParams};
pub use peak::PhaseCorrelationPeak;
pub use selection::{register_pcm, register_pcm_default, Registration};
