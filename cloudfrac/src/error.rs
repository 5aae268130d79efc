//! Error types for the cloud-scaling pipeline.

use thiserror::Error;

/// Errors that can occur anywhere in the smoothing → counting → regression
/// pipeline.
///
/// Each stage validates its own preconditions and fails fast with one of
/// these kinds rather than producing a silently wrong number. None of the
/// failures are transient, so nothing is retried.
#[derive(Error, Debug)]
pub enum FractalError {
    /// A caller-supplied parameter is outside its valid domain
    /// (non-positive kernel width, fewer than two requested scales, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The image or the aggregated table does not carry enough information
    /// for the requested computation (too few valid pixels, zero dynamic
    /// range, fewer than two usable scale points).
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// All log-scale values coincide, so the regression slope is undefined.
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
}
