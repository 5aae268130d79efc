//! Gaussian smoothing with missing-data handling.
//!
//! This module implements the smoothing stage of the pipeline: convolution
//! with a normalized 2D Gaussian kernel, parallelized over output pixels
//! with rayon. Invalid input pixels contribute neither value nor weight to
//! the sum, and each output pixel is divided by the weight actually
//! gathered from valid pixels. Image borders are handled the same way, by
//! truncating the kernel and renormalizing, so one mechanism covers both
//! masked holes and edges and stays identical across all blur scales.

use log::debug;
use ndarray::{Array2, Zip};

use crate::error::FractalError;
use crate::image_proc::image::MaskedImage;

/// Options for the smoothing stage.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingOptions {
    /// Minimum fraction of valid pixels required in the image, in [0, 1].
    pub min_valid_fraction: f64,
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self {
            min_valid_fraction: 0.1,
        }
    }
}

/// Smallest odd kernel size whose radius covers ±4 sigma.
pub fn kernel_size_for_sigma(sigma: f64) -> usize {
    let radius = (4.0 * sigma).ceil().max(1.0) as usize;
    2 * radius + 1
}

/// Create a normalized Gaussian kernel for convolution.
///
/// # Arguments
///
/// * `size` - Kernel size (must be odd)
/// * `sigma` - Standard deviation of the Gaussian
///
/// # Returns
///
/// A 2D array containing the Gaussian kernel, summing to 1.0
pub fn gaussian_kernel(size: usize, sigma: f64) -> Array2<f64> {
    assert!(size % 2 == 1, "Kernel size must be odd");

    let center = size / 2;
    let mut kernel = Array2::zeros((size, size));
    let mut sum = 0.0;

    for i in 0..size {
        for j in 0..size {
            let y = i as isize - center as isize;
            let x = j as isize - center as isize;
            let value = (-((x * x + y * y) as f64) / (2.0 * sigma * sigma)).exp();
            kernel[[i, j]] = value;
            sum += value;
        }
    }

    kernel.mapv_inplace(|v| v / sum);

    kernel
}

/// Smooth a masked image with a Gaussian of the given standard deviation.
///
/// Per output pixel the kernel-weighted sum runs over valid input pixels
/// only and is divided by the weight those pixels contributed, so masked
/// holes are filled by interpolation instead of biasing the result toward
/// zero. The output has the input's dimensions and contains no invalid
/// cells.
///
/// # Arguments
///
/// * `image` - Input image with validity mask
/// * `kernel_width` - Gaussian standard deviation in pixels (must be > 0)
/// * `options` - Smoothing options
///
/// # Errors
///
/// * `FractalError::InvalidParameter` - kernel_width is not a positive finite number
/// * `FractalError::InsufficientData` - too few valid pixels overall, or some
///   pixel has no valid neighbor within the kernel support
pub fn smooth(
    image: &MaskedImage,
    kernel_width: f64,
    options: &SmoothingOptions,
) -> Result<Array2<f64>, FractalError> {
    if !kernel_width.is_finite() || kernel_width <= 0.0 {
        return Err(FractalError::InvalidParameter(format!(
            "Kernel width must be a positive finite number, got {kernel_width}"
        )));
    }

    let valid_fraction = image.valid_fraction();
    if valid_fraction < options.min_valid_fraction {
        return Err(FractalError::InsufficientData(format!(
            "Only {:.1}% of pixels are valid, need at least {:.1}%",
            100.0 * valid_fraction,
            100.0 * options.min_valid_fraction
        )));
    }

    let kernel = gaussian_kernel(kernel_size_for_sigma(kernel_width), kernel_width);
    let (rows, cols) = image.dim();
    let (kernel_rows, kernel_cols) = kernel.dim();
    let kr = kernel_rows / 2;
    let kc = kernel_cols / 2;

    debug!(
        "Smoothing {}x{} image with sigma {} ({}x{} kernel)",
        rows, cols, kernel_width, kernel_rows, kernel_cols
    );

    let data = image.data();
    let valid = image.valid();
    let mut output = Array2::zeros((rows, cols));

    Zip::indexed(&mut output).par_for_each(|(i, j), out| {
        let mut sum = 0.0;
        let mut weight = 0.0;

        for ki in 0..kernel_rows {
            for kj in 0..kernel_cols {
                let ii = i as isize + ki as isize - kr as isize;
                let jj = j as isize + kj as isize - kc as isize;

                if ii < 0 || ii >= rows as isize || jj < 0 || jj >= cols as isize {
                    continue;
                }

                let (ii, jj) = (ii as usize, jj as usize);
                if valid[[ii, jj]] {
                    let w = kernel[[ki, kj]];
                    sum += w * data[[ii, jj]];
                    weight += w;
                }
            }
        }

        // A zero weight means no valid pixel fell inside the support; mark
        // it and reject the whole result below rather than inventing data.
        *out = if weight > 0.0 { sum / weight } else { f64::NAN };
    });

    if output.iter().any(|v| !v.is_finite()) {
        return Err(FractalError::InsufficientData(format!(
            "Some pixels have no valid neighbor within the {kernel_rows}x{kernel_cols} kernel support"
        )));
    }

    Ok(output)
}
