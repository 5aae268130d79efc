//! Fractal dimension estimation for cloud structure in telescope images.
//!
//! Dust and gas clouds shaped by turbulence are approximately self-similar:
//! the number of distinct cloud features N visible at blur scale r follows
//! a power law N(r) ~ C * r^(-D), and the exponent D is the fractal
//! dimension of the structure. This crate measures D from a calibrated
//! intensity image:
//!
//! 1. **Smoothing** ([`image_proc::smooth`]): Gaussian convolution at each
//!    requested kernel width, with masked (missing/saturated) pixels
//!    interpolated by weight renormalization.
//! 2. **Detection** ([`image_proc::detect_clouds`]): Otsu thresholding and
//!    connected-component labeling of bright regions.
//! 3. **Aggregation** ([`scaling::aggregate`]): the (width, count) table
//!    across all scales, computed in parallel.
//! 4. **Regression** ([`regression::estimate_fractal_dimension`]): log-log
//!    least squares; D is the negated slope.
//!
//! Image loading, calibration, and visualization are the caller's concern;
//! the input here is a [`MaskedImage`] and the output a [`FractalResult`].

pub mod error;
pub mod image_proc;
pub mod regression;
pub mod scaling;

pub use error::FractalError;
pub use image_proc::{Connectivity, MaskedImage};
pub use regression::FractalResult;
pub use scaling::{ScaleCount, ScaleCountTable, ScalingConfig};

/// Everything one pipeline run produces: the fitted dimension and the
/// table it was fitted to, for diagnostic reporting.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: ScaleCountTable,
    pub fit: FractalResult,
}

/// Run the full pipeline: aggregate scale counts, then fit the dimension.
///
/// # Errors
///
/// Propagates any [`FractalError`] from aggregation or regression; see
/// those modules for the specific conditions.
pub fn analyze(image: &MaskedImage, config: &ScalingConfig) -> Result<Analysis, FractalError> {
    let table = scaling::aggregate(image, config)?;
    let fit = regression::estimate_fractal_dimension(&table)?;
    Ok(Analysis { table, fit })
}
