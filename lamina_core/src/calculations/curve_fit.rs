//! # Polynomial Curve Fitting
//!
//! Least-squares polynomial fits of a sampled deflection curve. The design
//! matrix is solved through its SVD, which stays well behaved on the small
//! x ranges of a blade (x ≤ L, so high powers shrink quickly).
//!
//! ## Model
//!
//! ```text
//! y ≈ c₀ xⁿ + c₁ xⁿ⁻¹ + ... + cₙ
//! ```
//!
//! Coefficients are stored highest power first.
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::calculations::curve_fit::fit_polynomial;
//!
//! let x = [0.0, 1.0, 2.0, 3.0];
//! let y = [1.0, 3.0, 5.0, 7.0];
//! let fit = fit_polynomial(&x, &y, 1).unwrap();
//! assert!((fit.coefficients[0] - 2.0).abs() < 1e-12);
//! assert!((fit.coefficients[1] - 1.0).abs() < 1e-12);
//! ```

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::calculations::deflection::{to_mm, DeflectionCurve, DeflectionResult, LoadScenario};
use crate::charts::{Chart, LineStyle, Marker, Series, SeriesStyle};
use crate::equations::registry::{Equation, EquationTracker};
use crate::errors::{CalcError, CalcResult};

/// Degrees fitted when none are configured: linear and quadratic
pub const DEFAULT_FIT_DEGREES: [usize; 2] = [1, 2];

// Condition number above which a warning is logged
const ILL_CONDITIONED: f64 = 1e12;

/// Result of one least-squares polynomial fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    pub degree: usize,
    /// Highest power first
    pub coefficients: Vec<f64>,
    /// Sum of squared residuals
    pub residual_sum_squares: f64,
    /// Root-mean-square residual
    pub rmse: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Parameter covariance, same ordering as `coefficients`.
    /// `None` when there are no spare degrees of freedom.
    pub covariance: Option<Vec<Vec<f64>>>,
}

impl PolynomialFit {
    /// Evaluate the polynomial at x (Horner's scheme)
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// One-sigma standard errors of the coefficients
    pub fn standard_errors(&self) -> Option<Vec<f64>> {
        self.covariance
            .as_ref()
            .map(|cov| cov.iter().enumerate().map(|(k, row)| row[k].max(0.0).sqrt()).collect())
    }

    pub fn name(&self) -> String {
        match self.degree {
            0 => "Constant fit".to_string(),
            1 => "Linear fit".to_string(),
            2 => "Quadratic fit".to_string(),
            3 => "Cubic fit".to_string(),
            n => format!("Degree {} fit", n),
        }
    }

    /// Human-readable formula, e.g. `y = -1.2500e-1 x^2 + 3.0000e-3 x + 0.0000e0`
    pub fn formula(&self) -> String {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let power = self.degree - k;
                match power {
                    0 => format!("{:.4e}", c),
                    1 => format!("{:.4e} x", c),
                    p => format!("{:.4e} x^{}", c, p),
                }
            })
            .collect();
        format!("y = {}", terms.join(" + ")).replace("+ -", "- ")
    }
}

/// Fit a polynomial of `degree` to the points (x, y) by least squares.
///
/// # Errors
///
/// * `InvalidInput` - if x and y differ in length, hold non-finite values, or
///   have fewer than `degree + 1` points
/// * `CalculationFailed` - if the x values cannot determine the polynomial
///   (fewer distinct x values than coefficients)
pub fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> CalcResult<PolynomialFit> {
    if x.len() != y.len() {
        return Err(CalcError::invalid_input(
            "y",
            format!("{} values", y.len()),
            format!("Expected {} values to match x", x.len()),
        ));
    }

    let n = x.len();
    let params = degree + 1;

    if n < params {
        return Err(CalcError::invalid_input(
            "points",
            n.to_string(),
            format!("A degree {} fit needs at least {} points", degree, params),
        ));
    }

    if let Some(bad) = x.iter().chain(y).find(|v| !v.is_finite()) {
        return Err(CalcError::invalid_input(
            "points",
            bad.to_string(),
            "All x and y values must be finite",
        ));
    }

    // Vandermonde matrix, highest power in column 0
    let a = DMatrix::from_fn(n, params, |row, col| x[row].powi((degree - col) as i32));
    let b = DVector::from_column_slice(y);

    let svd = a.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    let min_sv = svd.singular_values.min();
    let tolerance = max_sv * n.max(params) as f64 * f64::EPSILON;

    if max_sv == 0.0 || min_sv <= tolerance {
        return Err(CalcError::calculation_failed(
            "Polynomial fit",
            format!("x values do not determine a degree {} polynomial", degree),
        ));
    }

    let condition = max_sv / min_sv;
    if condition > ILL_CONDITIONED {
        warn!("Degree {} fit is ill-conditioned (condition number {:.3e})", degree, condition);
    }

    let solution = svd
        .solve(&b, tolerance)
        .map_err(|e| CalcError::calculation_failed("Polynomial fit", e))?;
    let coefficients: Vec<f64> = solution.iter().copied().collect();

    let residuals = &b - &a * &solution;
    let ssr = residuals.norm_squared();
    let rmse = (ssr / n as f64).sqrt();

    let mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let scale: f64 = y.iter().map(|v| v * v).sum();
    let r_squared = if sst <= f64::EPSILON * scale {
        // Flat data: exact when the residuals vanish too
        if ssr <= f64::EPSILON * scale {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ssr / sst
    };

    // s² (AᵀA)⁻¹ = s² V Σ⁻² Vᵀ
    let covariance = match (&svd.v_t, n > params) {
        (Some(v_t), true) => {
            let s2 = ssr / (n - params) as f64;
            let cov: Vec<Vec<f64>> = (0..params)
                .map(|i| {
                    (0..params)
                        .map(|j| {
                            (0..params)
                                .map(|k| v_t[(k, i)] * v_t[(k, j)] / svd.singular_values[k].powi(2))
                                .sum::<f64>()
                                * s2
                        })
                        .collect::<Vec<f64>>()
                })
                .collect();
            Some(cov)
        }
        _ => None,
    };

    debug!(
        "Degree {} fit over {} points: SSR={:.4e}, R^2={:.6}",
        degree, n, ssr, r_squared
    );

    Ok(PolynomialFit {
        degree,
        coefficients,
        residual_sum_squares: ssr,
        rmse,
        r_squared,
        covariance,
    })
}

/// Polynomial fits of one deflection curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFit {
    pub source: LoadScenario,
    pub label: String,
    /// The fitted (x, y) points in metres
    pub points: Vec<(f64, f64)>,
    pub fits: Vec<PolynomialFit>,
}

impl CurveFit {
    pub fn fit(&self, degree: usize) -> Option<&PolynomialFit> {
        self.fits.iter().find(|f| f.degree == degree)
    }

    pub fn record_equations(&self, tracker: &mut EquationTracker, case_label: &str) {
        let context = format!("Fit of {}", self.source.display_name().to_lowercase());
        tracker.record_for_case(Equation::LeastSquaresPolynomial, context.clone(), case_label);
        tracker.record_for_case(Equation::CoefficientOfDetermination, context.clone(), case_label);
        if self.fits.iter().any(|f| f.covariance.is_some()) {
            tracker.record_for_case(Equation::ParameterCovariance, context, case_label);
        }
    }

    /// Source curve as a line and each fit as markers, deflection in mm.
    pub fn chart(&self) -> Chart {
        let mut chart = Chart::new(
            format!("Fitting the {} curve", self.source.display_name().to_lowercase()),
            "Blade length (m)",
            "Deflection (mm)",
        )
        .with_zero_line()
        .with_series(Series::new(
            self.label.clone(),
            to_mm(&self.points),
            SeriesStyle::line("#7f7f7f", LineStyle::Solid),
        ));

        let xs: Vec<f64> = self.points.iter().map(|&(x, _)| x).collect();
        for fit in &self.fits {
            let style = match fit.degree {
                1 => SeriesStyle::markers("#d62728", Marker::Plus),
                2 => SeriesStyle::markers("#1f77b4", Marker::Dot),
                _ => SeriesStyle::markers("#9467bd", Marker::Dot),
            };
            let points: Vec<(f64, f64)> = xs.iter().map(|&x| (x, fit.evaluate(x))).collect();
            chart = chart.with_series(Series::new(fit.name(), to_mm(&points), style));
        }
        chart
    }
}

/// Fit each requested degree to a deflection curve.
pub fn fit_curve(curve: &DeflectionCurve, degrees: &[usize]) -> CalcResult<CurveFit> {
    if degrees.is_empty() {
        return Err(CalcError::invalid_input("degrees", "[]", "At least one fit degree is required"));
    }

    let x: Vec<f64> = curve.points.iter().map(|&(x, _)| x).collect();
    let y = curve.deflections();

    let fits = degrees
        .iter()
        .map(|&degree| fit_polynomial(&x, &y, degree))
        .collect::<CalcResult<Vec<_>>>()?;

    Ok(CurveFit {
        source: curve.scenario,
        label: curve.label.clone(),
        points: curve.points.clone(),
        fits,
    })
}

/// Fit the point-load-at-midspan curve, the one studied in the report.
pub fn fit_midspan_curve(result: &DeflectionResult, degrees: &[usize]) -> CalcResult<CurveFit> {
    fit_curve(&result.midspan_load, degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::beam::BeamInput;
    use crate::calculations::deflection::calculate;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_quadratic_recovered() {
        let x: Vec<f64> = (0..20).map(|k| k as f64 * 0.015).collect();
        let y: Vec<f64> = x.iter().map(|&v| -0.4 * v * v + 0.02 * v - 0.001).collect();

        let fit = fit_polynomial(&x, &y, 2).unwrap();
        assert_relative_eq!(fit.coefficients[0], -0.4, max_relative = 1e-8);
        assert_relative_eq!(fit.coefficients[1], 0.02, max_relative = 1e-8);
        assert_relative_eq!(fit.coefficients[2], -0.001, max_relative = 1e-8);
        assert!(fit.residual_sum_squares < 1e-20);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_fit_residuals() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 1.0, 3.0];
        let fit = fit_polynomial(&x, &y, 1).unwrap();
        // Normal equations: slope 0.9, intercept -0.1
        assert_relative_eq!(fit.coefficients[0], 0.9, max_relative = 1e-12);
        assert_relative_eq!(fit.coefficients[1], -0.1, epsilon = 1e-12);
        assert_relative_eq!(fit.residual_sum_squares, 0.7, max_relative = 1e-12);
        assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);

        let errors = fit.standard_errors().unwrap();
        assert_eq!(errors.len(), 2);
        // s^2 = 0.35, (A^T A)^-1[0][0] = 4 / 20
        assert_relative_eq!(errors[0], (0.35_f64 * 0.2).sqrt(), max_relative = 1e-10);
    }

    #[test]
    fn test_evaluate_horner() {
        let fit = PolynomialFit {
            degree: 2,
            coefficients: vec![2.0, -3.0, 1.0],
            residual_sum_squares: 0.0,
            rmse: 0.0,
            r_squared: 1.0,
            covariance: None,
        };
        assert_eq!(fit.evaluate(0.0), 1.0);
        assert_eq!(fit.evaluate(2.0), 3.0);
        assert_eq!(fit.evaluate_all(&[1.0]), vec![0.0]);
    }

    #[test]
    fn test_zero_curve_fits_exactly() {
        let x = [0.0, 0.1, 0.2, 0.3];
        let y = [0.0; 4];
        let fit = fit_polynomial(&x, &y, 2).unwrap();
        assert!(fit.coefficients.iter().all(|&c| c.abs() < 1e-300));
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_degree_zero_is_mean() {
        let fit = fit_polynomial(&[0.0, 1.0, 2.0], &[1.0, 2.0, 6.0], 0).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, max_relative = 1e-12);
        assert_eq!(fit.name(), "Constant fit");
    }

    #[test]
    fn test_no_covariance_without_spare_points() {
        let fit = fit_polynomial(&[0.0, 1.0], &[1.0, 3.0], 1).unwrap();
        assert!(fit.covariance.is_none());
        assert!(fit.standard_errors().is_none());
    }

    #[test]
    fn test_errors() {
        let err = fit_polynomial(&[0.0, 1.0], &[1.0], 1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = fit_polynomial(&[0.0, 1.0], &[1.0, 2.0], 2).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = fit_polynomial(&[0.0, f64::NAN, 2.0], &[1.0, 2.0, 3.0], 1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        // Repeated x cannot determine a line
        let err = fit_polynomial(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_midspan_fits() {
        let result = calculate(&BeamInput::default(), 50).unwrap();
        let fits = fit_midspan_curve(&result, &DEFAULT_FIT_DEGREES).unwrap();

        assert_eq!(fits.source, LoadScenario::MidspanLoad);
        let linear = fits.fit(1).unwrap();
        let quadratic = fits.fit(2).unwrap();

        // Downward load: the fitted line slopes down
        assert!(linear.coefficients[0] < 0.0);
        assert!(quadratic.r_squared >= linear.r_squared);
        assert!(quadratic.r_squared > 0.99, "R^2 = {}", quadratic.r_squared);
        assert!(quadratic.covariance.is_some());
    }

    #[test]
    fn test_fit_chart_styles() {
        let result = calculate(&BeamInput::default(), 20).unwrap();
        let chart = fit_midspan_curve(&result, &[1, 2]).unwrap().chart();

        assert_eq!(chart.title, "Fitting the load at midspan curve");
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[1].style.marker, Marker::Plus);
        assert_eq!(chart.series[2].style.marker, Marker::Dot);
        assert_eq!(chart.series[2].label, "Quadratic fit");
    }

    #[test]
    fn test_no_degrees() {
        let result = calculate(&BeamInput::default(), 10).unwrap();
        assert!(fit_curve(&result.tip_load, &[]).is_err());
    }

    #[test]
    fn test_formula() {
        let fit = fit_polynomial(&[0.0, 1.0, 2.0], &[1.0, -1.0, -3.0], 1).unwrap();
        let formula = fit.formula();
        assert!(formula.starts_with("y = -2.0000e0 x"), "{}", formula);
    }
}
