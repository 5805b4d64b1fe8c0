//! # Ideal Beam Comparison
//!
//! Compares the exact point-load curve of a cantilever blade with its
//! straight-line approximation, with and without self-weight superposed.
//!
//! The approximation is the tangent line the blade follows beyond the load
//! point, extended over the whole length:
//!
//! ```text
//! y(x) ≈ P a² (3x - a) / (6EI)
//! ```
//!
//! It matches the exact curve for x ≥ a and departs from it towards the root.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::calculations::beam::Support;
use crate::calculations::deflection::{to_mm, DeflectionResult};
use crate::charts::{Chart, LineStyle, Series, SeriesStyle};
use crate::equations::beam::cantilever_point_linear_continuation;
use crate::equations::registry::{Equation, EquationTracker};
use crate::errors::{CalcError, CalcResult};

/// The four comparison curves, (x, y) in metres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealBeamComparison {
    pub label: String,
    /// Exact point-load curve
    pub ideal: Vec<(f64, f64)>,
    /// Straight-line approximation
    pub ideal_approx: Vec<(f64, f64)>,
    /// Exact curve plus self-weight
    pub ideal_with_mass: Vec<(f64, f64)>,
    /// Approximation plus self-weight
    pub ideal_with_mass_approx: Vec<(f64, f64)>,
    /// Tip-load maximum plus self-weight maximum (m)
    pub combined_max_deflection_m: f64,
    /// Free-end deflection under the point load at a plus self-weight (m)
    pub combined_tip_deflection_m: f64,
}

impl IdealBeamComparison {
    /// Largest gap between the exact curve and its approximation (m)
    pub fn max_approximation_error_m(&self) -> f64 {
        self.ideal
            .iter()
            .zip(&self.ideal_approx)
            .map(|(exact, approx)| (exact.1 - approx.1).abs())
            .fold(0.0, f64::max)
    }

    /// Exact curves dashed, approximations solid, deflection in mm.
    pub fn chart(&self) -> Chart {
        const WITHOUT_MASS: &str = "#d62728";
        const WITH_MASS: &str = "#1f77b4";

        Chart::new("Ideal beam", "Blade length (m)", "Deflection (mm)")
            .with_zero_line()
            .with_series(Series::new(
                "Ideal",
                to_mm(&self.ideal),
                SeriesStyle::line(WITHOUT_MASS, LineStyle::Dashed),
            ))
            .with_series(Series::new(
                "Ideal (approx)",
                to_mm(&self.ideal_approx),
                SeriesStyle::line(WITHOUT_MASS, LineStyle::Solid),
            ))
            .with_series(Series::new(
                "Ideal with mass",
                to_mm(&self.ideal_with_mass),
                SeriesStyle::line(WITH_MASS, LineStyle::Dashed),
            ))
            .with_series(Series::new(
                "Ideal with mass (approx)",
                to_mm(&self.ideal_with_mass_approx),
                SeriesStyle::line(WITH_MASS, LineStyle::Solid),
            ))
    }
}

/// Build the comparison from a cantilever deflection result.
///
/// # Errors
///
/// * `InvalidInput` - for a simply-supported blade, where the straight-line
///   continuation does not exist
pub fn compare(result: &DeflectionResult) -> CalcResult<IdealBeamComparison> {
    if result.support != Support::Cantilever {
        return Err(CalcError::invalid_input(
            "support",
            result.support.display_name(),
            "The ideal beam comparison needs a cantilever blade",
        ));
    }

    let p = result.point_load_n;
    let a = result.load_position_m;
    let e = result.youngs_modulus_pa;
    let i = result.moment_of_inertia_m4;

    let ideal = result.midspan_load.points.clone();
    let ideal_approx: Vec<(f64, f64)> = result
        .x_m
        .iter()
        .map(|&x| (x, cantilever_point_linear_continuation(p, a, x, e, i)))
        .collect();

    let with_mass = |curve: &[(f64, f64)]| -> Vec<(f64, f64)> {
        curve
            .iter()
            .zip(&result.self_weight.points)
            .map(|(&(x, y), &(_, w))| (x, y + w))
            .collect()
    };

    let comparison = IdealBeamComparison {
        label: result.label.clone(),
        ideal_with_mass: with_mass(&ideal),
        ideal_with_mass_approx: with_mass(&ideal_approx),
        ideal,
        ideal_approx,
        combined_max_deflection_m: result.max.tip_load_m + result.max.self_weight_m,
        combined_tip_deflection_m: result.max.midspan_load_m + result.max.self_weight_m,
    };

    debug!(
        "Ideal beam '{}': combined max {:.5e} m, max approximation error {:.5e} m",
        comparison.label,
        comparison.combined_max_deflection_m,
        comparison.max_approximation_error_m()
    );

    Ok(comparison)
}

/// Record the formulas behind the comparison for the report appendix.
pub fn record_equations(tracker: &mut EquationTracker, case_label: &str) {
    tracker.record_for_case(Equation::CantileverPointLinearContinuation, "Ideal beam", case_label);
    tracker.record_for_case(Equation::Superposition, "Ideal beam with mass", case_label);
}
