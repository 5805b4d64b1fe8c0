//! # Blade Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(...) -> CalcResult<*Result>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`beam`] - Blade geometry, stiffness and loading
//! - [`deflection`] - Deflection curves for the three load scenarios
//! - [`curve_fit`] - Polynomial least-squares fits of a curve
//! - [`ideal_beam`] - Exact curve against its straight-line approximation
//!
//! [`analyze`] runs all of them for one case, the way the CLI and the report
//! consume them.

pub mod beam;
pub mod curve_fit;
pub mod deflection;
pub mod ideal_beam;

use log::info;
use serde::{Deserialize, Serialize};

use crate::equations::registry::EquationTracker;
use crate::errors::CalcResult;
use crate::study::StudySettings;

pub use beam::{BeamInput, SelfWeight, Support};
pub use curve_fit::{fit_curve, fit_midspan_curve, fit_polynomial, CurveFit, PolynomialFit};
pub use deflection::{calculate, DeflectionCurve, DeflectionResult, LoadScenario, MaxDeflections};
pub use ideal_beam::{compare, IdealBeamComparison};

/// Everything computed for one blade case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnalysis {
    pub input: BeamInput,
    pub deflection: DeflectionResult,
    pub fits: CurveFit,
    /// `None` for a simply-supported blade
    pub ideal: Option<IdealBeamComparison>,
}

/// Run deflection, curve fitting and (for cantilevers) the ideal beam
/// comparison for one case, recording every formula used.
pub fn analyze(
    input: &BeamInput,
    settings: &StudySettings,
    tracker: &mut EquationTracker,
) -> CalcResult<CaseAnalysis> {
    settings.validate()?;

    let deflection = deflection::calculate_with_tracker(input, settings.samples, tracker)?;

    let fits = fit_midspan_curve(&deflection, &settings.fit_degrees)?;
    fits.record_equations(tracker, &input.label);

    let ideal = match input.support {
        Support::Cantilever => {
            ideal_beam::record_equations(tracker, &input.label);
            Some(compare(&deflection)?)
        }
        Support::SimplySupported => None,
    };

    info!(
        "Analyzed '{}': tip-load max {:.5} m, {} fit(s)",
        input.label,
        deflection.max.tip_load_m,
        fits.fits.len()
    );

    Ok(CaseAnalysis {
        input: input.clone(),
        deflection,
        fits,
        ideal,
    })
}
