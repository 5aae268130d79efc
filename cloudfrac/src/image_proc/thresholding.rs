//! Automatic thresholding and connected-component labeling.
//!
//! The threshold is chosen by Otsu's method: the histogram bipartition that
//! maximizes between-class variance (equivalently, minimizes within-class
//! variance). Labeling uses an iterative flood fill with a configurable
//! pixel neighborhood.

use ndarray::{Array2, ArrayView2};

use crate::error::FractalError;

/// Pixel neighborhood used when labeling connected components.
///
/// The choice must stay fixed across all scales of a run; switching it
/// mid-run would make the scale-count regression meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-adjacent neighbors only.
    Four,
    /// Edge- and corner-adjacent neighbors. Conventional for blob-like
    /// cloud features, and the default.
    #[default]
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Connectivity::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

/// Calculate Otsu's threshold for a grayscale image.
///
/// # Arguments
///
/// * `image` - Input grayscale image
/// * `bins` - Number of histogram bins (default 256)
///
/// # Errors
///
/// * `FractalError::InsufficientData` - the image is empty or has zero
///   dynamic range, so no bipartition exists
pub fn otsu_threshold(image: ArrayView2<f64>, bins: Option<usize>) -> Result<f64, FractalError> {
    let bins = bins.unwrap_or(256);

    if image.is_empty() {
        return Err(FractalError::InsufficientData(
            "Cannot threshold an empty image".to_string(),
        ));
    }

    let min_val = image.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_val = image.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    if (max_val - min_val).abs() < 1e-12 {
        return Err(FractalError::InsufficientData(format!(
            "Image has zero dynamic range (all pixels ~{min_val})"
        )));
    }

    // Histogram over [min, max]
    let mut histogram = vec![0u32; bins];
    let scale = (bins as f64 - 1.0) / (max_val - min_val);

    for &pixel in image.iter() {
        let bin = ((pixel - min_val) * scale).round() as usize;
        histogram[bin.min(bins - 1)] += 1;
    }

    let total_pixels = image.len() as f64;

    let weighted_hist: Vec<f64> = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| (i as f64) * (count as f64))
        .collect();
    let total_mean = weighted_hist.iter().sum::<f64>() / total_pixels;

    let mut cum_sum = 0u32;
    let mut cum_mean = 0.0;
    let mut best_threshold = 0;
    let mut max_variance = 0.0;

    for t in 0..bins - 1 {
        cum_sum += histogram[t];
        cum_mean += weighted_hist[t];

        let w_bg = cum_sum as f64 / total_pixels;
        if w_bg == 0.0 || w_bg == 1.0 {
            continue;
        }
        let w_fg = 1.0 - w_bg;

        let mean_bg = cum_mean / (cum_sum as f64);
        let mean_fg = (total_mean * total_pixels - cum_mean) / (total_pixels - cum_sum as f64);

        let variance = w_bg * w_fg * (mean_bg - mean_fg).powi(2);
        if variance > max_variance {
            max_variance = variance;
            best_threshold = t;
        }
    }

    Ok(min_val + (best_threshold as f64) / scale)
}

/// Apply thresholding to an image and return a binary mask.
///
/// A pixel is foreground iff its intensity is strictly above the threshold.
pub fn apply_threshold(image: ArrayView2<f64>, threshold: f64) -> Array2<bool> {
    image.mapv(|v| v > threshold)
}

/// Find connected components in a binary mask.
///
/// Iterative flood fill; each component gets a unique label starting at 1,
/// background keeps label 0. The labeling is deterministic: components are
/// numbered in row-major order of their first pixel.
///
/// # Returns
///
/// The label map and the number of components.
pub fn connected_components(
    mask: ArrayView2<bool>,
    connectivity: Connectivity,
) -> (Array2<u32>, u32) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::zeros((rows, cols));
    let mut label_counter = 0;

    let neighbors = connectivity.offsets();

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] || labels[[i, j]] != 0 {
                continue;
            }

            label_counter += 1;
            let mut stack = vec![(i, j)];

            while let Some((y, x)) = stack.pop() {
                if !mask[[y, x]] || labels[[y, x]] != 0 {
                    continue;
                }

                labels[[y, x]] = label_counter;

                for &(dy, dx) in neighbors {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;

                    if ny >= 0 && ny < rows as isize && nx >= 0 && nx < cols as isize {
                        let (ny, nx) = (ny as usize, nx as usize);
                        if mask[[ny, nx]] && labels[[ny, nx]] == 0 {
                            stack.push((ny, nx));
                        }
                    }
                }
            }
        }
    }

    (labels, label_counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn test_otsu_separates_bimodal() {
        // Half the pixels at 1.0, half at 9.0; the threshold must fall
        // strictly between the modes.
        let mut data = Array2::from_elem((10, 10), 1.0);
        for i in 0..5 {
            for j in 0..10 {
                data[[i, j]] = 9.0;
            }
        }

        let threshold = otsu_threshold(data.view(), None).unwrap();
        assert!(threshold > 1.0 && threshold < 9.0, "got {threshold}");
    }

    #[test]
    fn test_otsu_uniform_image_rejected() {
        let data = Array2::from_elem((10, 10), 4.2);
        assert!(matches!(
            otsu_threshold(data.view(), None),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_otsu_empty_image_rejected() {
        let data = Array2::<f64>::zeros((0, 0));
        assert!(matches!(
            otsu_threshold(data.view(), None),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_otsu_deterministic() {
        let data = arr2(&[[0.0, 1.0, 5.0], [4.0, 2.0, 8.0], [1.0, 0.5, 7.0]]);
        let a = otsu_threshold(data.view(), None).unwrap();
        let b = otsu_threshold(data.view(), None).unwrap();
        assert_relative_eq!(a, b);
    }

    #[test]
    fn test_apply_threshold() {
        let image = arr2(&[[0.1, 0.9], [0.8, 0.2]]);
        let mask = apply_threshold(image.view(), 0.5);

        assert!(!mask[[0, 0]]);
        assert!(mask[[0, 1]]);
        assert!(mask[[1, 0]]);
        assert!(!mask[[1, 1]]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let image = arr2(&[[0.5, 0.6]]);
        let mask = apply_threshold(image.view(), 0.5);
        assert!(!mask[[0, 0]]);
        assert!(mask[[0, 1]]);
    }

    #[test]
    fn test_connected_components_eight() {
        let mask = arr2(&[
            [false, true, true, false],
            [false, true, false, false],
            [false, false, false, true],
            [false, false, true, true],
        ]);

        let (labels, count) = connected_components(mask.view(), Connectivity::Eight);
        assert_eq!(count, 2);

        assert_eq!(labels[[0, 1]], labels[[0, 2]]);
        assert_eq!(labels[[0, 1]], labels[[1, 1]]);
        assert_eq!(labels[[2, 3]], labels[[3, 3]]);
        assert_eq!(labels[[2, 3]], labels[[3, 2]]);
        assert_ne!(labels[[0, 1]], labels[[2, 3]]);
    }

    #[test]
    fn test_diagonal_split_by_connectivity() {
        // Two pixels touching only at a corner: one component under Eight,
        // two under Four.
        let mask = arr2(&[[true, false], [false, true]]);

        let (_, eight) = connected_components(mask.view(), Connectivity::Eight);
        let (_, four) = connected_components(mask.view(), Connectivity::Four);

        assert_eq!(eight, 1);
        assert_eq!(four, 2);
    }

    #[test]
    fn test_empty_mask_has_no_components() {
        let mask = Array2::from_elem((5, 5), false);
        let (labels, count) = connected_components(mask.view(), Connectivity::Eight);
        assert_eq!(count, 0);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_background_is_label_zero() {
        let mask = arr2(&[[true, false], [false, false]]);
        let (labels, count) = connected_components(mask.view(), Connectivity::Eight);
        assert_eq!(count, 1);
        assert_eq!(labels[[0, 0]], 1);
        assert_eq!(labels[[0, 1]], 0);
    }
}
