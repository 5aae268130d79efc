//! Calibrated intensity grid with an explicit validity mask.
//!
//! Calibration pipelines commonly mark saturated or missing pixels with a
//! NaN sentinel. Downstream numeric code should not depend on NaN
//! propagation semantics, so the image type here carries a parallel boolean
//! mask and the rest of the pipeline branches on it explicitly.

use ndarray::Array2;

use crate::error::FractalError;

/// A 2D intensity image with per-pixel validity.
///
/// The intensity array and the mask always have identical shape. Intensity
/// values under invalid cells are never read by the pipeline.
#[derive(Debug, Clone)]
pub struct MaskedImage {
    data: Array2<f64>,
    valid: Array2<bool>,
}

impl MaskedImage {
    /// Build an image from an intensity grid and a validity mask.
    ///
    /// # Errors
    /// * `FractalError::InvalidParameter` - shapes differ or the arrays are empty
    pub fn from_parts(data: Array2<f64>, valid: Array2<bool>) -> Result<Self, FractalError> {
        if data.dim() != valid.dim() {
            return Err(FractalError::InvalidParameter(format!(
                "Intensity shape {:?} does not match mask shape {:?}",
                data.dim(),
                valid.dim()
            )));
        }
        if data.is_empty() {
            return Err(FractalError::InvalidParameter(
                "Image must have at least one pixel".to_string(),
            ));
        }
        Ok(Self { data, valid })
    }

    /// Build a fully valid image from an intensity grid.
    pub fn from_array(data: Array2<f64>) -> Result<Self, FractalError> {
        let valid = Array2::from_elem(data.dim(), true);
        Self::from_parts(data, valid)
    }

    /// Build an image treating every non-finite intensity as invalid.
    ///
    /// This is the adapter for calibration outputs that use NaN as a
    /// missing-data sentinel.
    pub fn from_sentinel_array(data: Array2<f64>) -> Result<Self, FractalError> {
        let valid = data.mapv(|v| v.is_finite());
        Self::from_parts(data, valid)
    }

    /// Image dimensions as (rows, cols).
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// The intensity grid. Values under invalid cells are unspecified.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// The validity mask.
    pub fn valid(&self) -> &Array2<bool> {
        &self.valid
    }

    /// Fraction of pixels that are valid, in [0, 1].
    pub fn valid_fraction(&self) -> f64 {
        let valid_count = self.valid.iter().filter(|&&v| v).count();
        valid_count as f64 / self.valid.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_shape_mismatch_rejected() {
        let data = Array2::zeros((4, 4));
        let valid = Array2::from_elem((4, 5), true);
        assert!(matches!(
            MaskedImage::from_parts(data, valid),
            Err(FractalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_empty_rejected() {
        let data = Array2::zeros((0, 4));
        let valid = Array2::from_elem((0, 4), true);
        assert!(matches!(
            MaskedImage::from_parts(data, valid),
            Err(FractalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sentinel_marks_non_finite() {
        let data = arr2(&[[1.0, f64::NAN], [f64::INFINITY, 4.0]]);
        let image = MaskedImage::from_sentinel_array(data).unwrap();

        assert!(image.valid()[[0, 0]]);
        assert!(!image.valid()[[0, 1]]);
        assert!(!image.valid()[[1, 0]]);
        assert!(image.valid()[[1, 1]]);
        assert_eq!(image.valid_fraction(), 0.5);
    }

    #[test]
    fn test_valid_fraction_full() {
        let image = MaskedImage::from_array(Array2::zeros((8, 8))).unwrap();
        assert_eq!(image.valid_fraction(), 1.0);
    }
}
