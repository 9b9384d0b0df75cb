use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaseCorrError {
    #[error("Dimensionality mismatch: expected {expected} dimensions, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("Image has no samples")]
    EmptyImage,

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, PhaseCorrError>;
