//! Scale-count aggregation: run smoothing and cloud detection at every
//! requested kernel width and collect the (width, count) table the
//! regression consumes.
//!
//! Scale computations are independent, so they run in parallel with rayon;
//! the table is assembled only after every scale has finished.

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::FractalError;
use crate::image_proc::{detect_clouds, smooth, Connectivity, MaskedImage, SmoothingOptions};

/// Configuration for one aggregation run.
#[derive(Debug, Clone)]
pub struct ScalingConfig {
    /// Gaussian kernel widths (standard deviations) to evaluate. At least
    /// two distinct, strictly positive values.
    pub kernel_widths: Vec<f64>,
    /// Pixel neighborhood for cloud labeling, fixed for the whole run.
    pub connectivity: Connectivity,
    /// Minimum fraction of valid pixels required of the input image.
    pub min_valid_fraction: f64,
}

impl ScalingConfig {
    pub fn new(kernel_widths: Vec<f64>) -> Self {
        Self {
            kernel_widths,
            ..Default::default()
        }
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            kernel_widths: Vec::new(),
            connectivity: Connectivity::Eight,
            min_valid_fraction: SmoothingOptions::default().min_valid_fraction,
        }
    }
}

/// One usable (kernel width, cloud count) observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCount {
    pub kernel_width: f64,
    pub cloud_count: u32,
}

/// The aggregated scale-count observations for one run.
#[derive(Debug, Clone)]
pub struct ScaleCountTable {
    /// Usable observations (count > 0), in the order the widths were
    /// requested.
    pub entries: Vec<ScaleCount>,
    /// Widths whose scale produced zero clouds and was excluded.
    pub dropped: Vec<f64>,
}

impl ScaleCountTable {
    /// Assemble a table from raw per-scale results, dropping zero-count
    /// scales (their logarithm is undefined).
    ///
    /// # Errors
    ///
    /// * `FractalError::InsufficientData` - fewer than two usable points remain
    pub fn from_pairs(pairs: Vec<(f64, u32)>) -> Result<Self, FractalError> {
        let mut entries = Vec::with_capacity(pairs.len());
        let mut dropped = Vec::new();

        for (kernel_width, cloud_count) in pairs {
            if cloud_count == 0 {
                warn!("Dropping scale {kernel_width}: zero clouds detected");
                dropped.push(kernel_width);
            } else {
                entries.push(ScaleCount {
                    kernel_width,
                    cloud_count,
                });
            }
        }

        if entries.len() < 2 {
            return Err(FractalError::InsufficientData(format!(
                "Only {} usable scale(s) after dropping zero-count scales, need at least 2",
                entries.len()
            )));
        }

        let table = Self { entries, dropped };
        table.check_monotonicity();
        Ok(table)
    }

    /// Counts should not grow as the image gets blurrier. A rise indicates
    /// a detector or threshold anomaly; flag it but keep the data.
    fn check_monotonicity(&self) {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.kernel_width.total_cmp(&b.kernel_width));

        for pair in sorted.windows(2) {
            if pair[1].cloud_count > pair[0].cloud_count {
                warn!(
                    "Cloud count rose from {} to {} between scales {} and {}",
                    pair[0].cloud_count,
                    pair[1].cloud_count,
                    pair[0].kernel_width,
                    pair[1].kernel_width
                );
            }
        }
    }
}

/// Run smoothing and cloud detection at every requested kernel width.
///
/// The source image is shared read-only across the parallel per-scale
/// computations; each smoothed image lives only long enough to be counted.
///
/// # Errors
///
/// * `FractalError::InvalidParameter` - fewer than two widths, or a width
///   that is not a positive finite number
/// * `FractalError::InsufficientData` - propagated from smoothing or
///   detection, or fewer than two usable points after zero-count filtering
pub fn aggregate(
    image: &MaskedImage,
    config: &ScalingConfig,
) -> Result<ScaleCountTable, FractalError> {
    if config.kernel_widths.len() < 2 {
        return Err(FractalError::InvalidParameter(format!(
            "Need at least 2 kernel widths, got {}",
            config.kernel_widths.len()
        )));
    }
    for &width in &config.kernel_widths {
        if !width.is_finite() || width <= 0.0 {
            return Err(FractalError::InvalidParameter(format!(
                "Kernel width must be a positive finite number, got {width}"
            )));
        }
    }

    let options = SmoothingOptions {
        min_valid_fraction: config.min_valid_fraction,
    };

    let pairs: Vec<(f64, u32)> = config
        .kernel_widths
        .par_iter()
        .map(|&width| {
            let smoothed = smooth(image, width, &options)?;
            let segmentation = detect_clouds(smoothed.view(), config.connectivity)?;
            debug!(
                "Scale {width}: {} clouds (threshold {:.6})",
                segmentation.count, segmentation.threshold
            );
            Ok((width, segmentation.count))
        })
        .collect::<Result<_, FractalError>>()?;

    ScaleCountTable::from_pairs(pairs)
}
