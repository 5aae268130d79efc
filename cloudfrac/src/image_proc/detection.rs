//! Cloud detection: threshold a smoothed image and count connected bright
//! regions.

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::error::FractalError;
use crate::image_proc::thresholding::{
    apply_threshold, connected_components, otsu_threshold, Connectivity,
};

/// Result of segmenting one smoothed image into clouds.
#[derive(Debug, Clone)]
pub struct CloudSegmentation {
    /// Number of distinct connected bright regions.
    pub count: u32,
    /// Label map: background 0, clouds 1..=count.
    pub labels: Array2<u32>,
    /// The Otsu threshold that produced the mask, for diagnostics.
    pub threshold: f64,
}

impl CloudSegmentation {
    /// Pixel area of each labeled cloud, indexed by label - 1.
    pub fn component_areas(&self) -> Vec<usize> {
        let mut areas = vec![0usize; self.count as usize];
        for &label in self.labels.iter() {
            if label > 0 {
                areas[(label - 1) as usize] += 1;
            }
        }
        areas
    }
}

/// Detect clouds in a smoothed image.
///
/// Computes an Otsu threshold, masks pixels strictly above it, and labels
/// connected foreground regions. A count of zero (nothing above threshold)
/// is a valid outcome; the caller decides how to treat it.
///
/// # Errors
///
/// * `FractalError::InsufficientData` - the image is empty or has zero
///   dynamic range, so no threshold exists
pub fn detect_clouds(
    image: ArrayView2<f64>,
    connectivity: Connectivity,
) -> Result<CloudSegmentation, FractalError> {
    let threshold = otsu_threshold(image, None)?;
    let mask = apply_threshold(image, threshold);
    let (labels, count) = connected_components(mask.view(), connectivity);

    debug!("Detected {count} clouds at threshold {threshold:.6}");

    Ok(CloudSegmentation {
        count,
        labels,
        threshold,
    })
}
