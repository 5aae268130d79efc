//! Image processing stages of the cloud-scaling pipeline: masked images,
//! Gaussian smoothing with missing-data handling, thresholding, and
//! connected-component cloud detection.

pub mod convolve2d;
pub mod detection;
pub mod image;
pub mod thresholding;

// Re-export key functionality for easier access
pub use convolve2d::{gaussian_kernel, kernel_size_for_sigma, smooth, SmoothingOptions};
pub use detection::{detect_clouds, CloudSegmentation};
pub use image::MaskedImage;
pub use thresholding::{apply_threshold, connected_components, otsu_threshold, Connectivity};
