//! Log-log least-squares fit of the scale-count table.
//!
//! If cloud structure is self-similar, N(r) follows a power law C * r^(-D),
//! so ln N is linear in ln r with slope -D. The fit is ordinary least
//! squares; R-squared reports how well the power-law assumption holds.

use float_cmp::approx_eq;

use crate::error::FractalError;
use crate::scaling::ScaleCountTable;

/// The fitted fractal dimension and its diagnostics.
///
/// `dimension` near 1 indicates filament-like structure; near 2,
/// plane-filling complexity. An `r_squared` well below 1 means the
/// self-similarity assumption is weak for this image.
#[derive(Debug, Clone, Copy)]
pub struct FractalResult {
    /// Fractal dimension D = -slope of the log-log fit.
    pub dimension: f64,
    /// Intercept of the log-log fit (ln of the count prefactor).
    pub intercept: f64,
    /// Coefficient of determination of the fit.
    pub r_squared: f64,
}

/// Fit ln(count) against ln(kernel width) and derive the fractal dimension.
///
/// # Errors
///
/// * `FractalError::InsufficientData` - fewer than two usable points
/// * `FractalError::DegenerateFit` - all log-widths coincide, so the slope
///   is undefined
pub fn estimate_fractal_dimension(table: &ScaleCountTable) -> Result<FractalResult, FractalError> {
    let points: Vec<(f64, f64)> = table
        .entries
        .iter()
        .filter(|e| e.cloud_count > 0)
        .map(|e| (e.kernel_width.ln(), f64::from(e.cloud_count).ln()))
        .collect();

    if points.len() < 2 {
        return Err(FractalError::InsufficientData(format!(
            "Regression needs at least 2 points with nonzero counts, got {}",
            points.len()
        )));
    }

    let x0 = points[0].0;
    if points
        .iter()
        .all(|&(x, _)| approx_eq!(f64, x, x0, ulps = 4))
    {
        return Err(FractalError::DegenerateFit(format!(
            "All {} scales have the same log kernel width {x0}",
            points.len()
        )));
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|&(x, _)| x).sum::<f64>() / n;
    let y_mean = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|&(x, _)| (x - x_mean).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|&(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    if sxx == 0.0 {
        return Err(FractalError::DegenerateFit(
            "Zero variance in log kernel widths".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = points.iter().map(|&(_, y)| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|&(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();

    // All counts equal: the zero-slope line passes through every point
    // exactly, so the fit is perfect rather than undefined.
    let r_squared = if ss_tot < f64::EPSILON {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(FractalResult {
        dimension: -slope,
        intercept,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::ScaleCount;
    use approx::assert_relative_eq;

    fn table(pairs: &[(f64, u32)]) -> ScaleCountTable {
        ScaleCountTable {
            entries: pairs
                .iter()
                .map(|&(kernel_width, cloud_count)| ScaleCount {
                    kernel_width,
                    cloud_count,
                })
                .collect(),
            dropped: Vec::new(),
        }
    }

    #[test]
    fn test_recovers_exact_power_law() {
        // N(r) = 64 * r^-1 at r = 2, 4, 8, 16 gives integer counts.
        let t = table(&[(2.0, 32), (4.0, 16), (8.0, 8), (16.0, 4)]);
        let fit = estimate_fractal_dimension(&t).unwrap();

        assert_relative_eq!(fit.dimension, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 64.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_recovers_fractional_dimension() {
        // N(r) = 4096 * r^-1.5 at r = 4, 16, 64.
        let t = table(&[(4.0, 512), (16.0, 64), (64.0, 8)]);
        let fit = estimate_fractal_dimension(&t).unwrap();

        assert_relative_eq!(fit.dimension, 1.5, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 4096.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_noisy_power_law() {
        // Roughly D = 2 with integer-rounding noise.
        let t = table(&[(2.0, 100), (4.0, 26), (8.0, 6)]);
        let fit = estimate_fractal_dimension(&t).unwrap();

        assert!(fit.dimension > 1.8 && fit.dimension < 2.2);
        assert!(fit.r_squared > 0.99 && fit.r_squared < 1.0);
    }

    #[test]
    fn test_flat_counts_fit_perfectly() {
        let t = table(&[(2.0, 7), (4.0, 7), (8.0, 7)]);
        let fit = estimate_fractal_dimension(&t).unwrap();

        assert_relative_eq!(fit.dimension, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_identical_scales_degenerate() {
        let t = table(&[(5.0, 9), (5.0, 7), (5.0, 3)]);
        assert!(matches!(
            estimate_fractal_dimension(&t),
            Err(FractalError::DegenerateFit(_))
        ));
    }

    #[test]
    fn test_single_point_rejected() {
        let t = table(&[(2.0, 9)]);
        assert!(matches!(
            estimate_fractal_dimension(&t),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_zero_counts_ignored() {
        // Zero-count entries cannot contribute a logarithm; with only one
        // nonzero point left the fit must fail.
        let t = table(&[(2.0, 9), (4.0, 0), (8.0, 0)]);
        assert!(matches!(
            estimate_fractal_dimension(&t),
            Err(FractalError::InsufficientData(_))
        ));
    }
}
