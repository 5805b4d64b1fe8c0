//! # Deflection Curves
//!
//! Samples the deflection of a blade along its length for three load
//! scenarios, each applied on its own:
//!
//! 1. Point load P at `a = load_position_ratio × L` ("midspan load")
//! 2. Point load P at the free end ("tip load")
//! 3. Self-weight line load w over the whole length
//!
//! For a simply-supported blade the "tip" of a pinned-roller beam sits on a
//! support, so the tip-load curve is identically zero.
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::calculations::beam::BeamInput;
//! use lamina_core::calculations::deflection::calculate;
//!
//! let result = calculate(&BeamInput::default(), 50).unwrap();
//! assert_eq!(result.x_m.len(), 50);
//! // P L³ / 3EI = -2 × 0.027 / 3.375
//! assert!((result.max.tip_load_m + 0.016).abs() < 1e-12);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::calculations::beam::{BeamInput, SelfWeight, Support};
use crate::charts::{Chart, LineStyle, Series, SeriesStyle};
use crate::equations::beam::{
    cantilever_point_deflection, cantilever_point_max_deflection, cantilever_tip_deflection,
    cantilever_tip_max_deflection, cantilever_uniform_deflection, cantilever_uniform_max_deflection,
    simply_supported_point_deflection, simply_supported_point_max_deflection,
    simply_supported_uniform_deflection, simply_supported_uniform_max_deflection,
};
use crate::equations::registry::{Equation, EquationTracker};
use crate::errors::{CalcError, CalcResult};
use crate::units::meters_to_mm;

/// Default number of stations along the blade
pub const DEFAULT_SAMPLES: usize = 50;

/// Decimal places (of metres) in the stored curve summaries
const SUMMARY_DECIMALS: usize = 5;

/// Load scenario a curve belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadScenario {
    MidspanLoad,
    TipLoad,
    SelfWeight,
}

impl LoadScenario {
    pub const ALL: [LoadScenario; 3] = [LoadScenario::MidspanLoad, LoadScenario::TipLoad, LoadScenario::SelfWeight];

    pub fn display_name(&self) -> &'static str {
        match self {
            LoadScenario::MidspanLoad => "Load at midspan",
            LoadScenario::TipLoad => "Load at tip",
            LoadScenario::SelfWeight => "Self-weight",
        }
    }

    /// Chart color for this scenario
    pub fn color(&self) -> &'static str {
        match self {
            LoadScenario::MidspanLoad => "#d62728",
            LoadScenario::TipLoad => "#1f77b4",
            LoadScenario::SelfWeight => "#2ca02c",
        }
    }
}

/// Sampled deflection curve for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeflectionCurve {
    pub scenario: LoadScenario,
    pub label: String,
    /// (x, y) pairs in metres
    pub points: Vec<(f64, f64)>,
    /// Maximum deflection in words, e.g. "Load at tip: max deflection -0.01600 m"
    #[serde(default)]
    pub summary: String,
}

impl DeflectionCurve {
    fn sample(scenario: LoadScenario, x_m: &[f64], f: impl Fn(f64) -> f64) -> Self {
        DeflectionCurve {
            scenario,
            label: scenario.display_name().to_string(),
            points: x_m.iter().map(|&x| (x, f(x))).collect(),
            summary: String::new(),
        }
    }

    fn summarized(mut self, max_m: f64) -> Self {
        self.summary = format!(
            "{}: max deflection {:.*} m",
            self.label,
            SUMMARY_DECIMALS,
            round_to(max_m, SUMMARY_DECIMALS)
        );
        self
    }

    pub fn deflections(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, y)| y).collect()
    }

    /// Sampled point with the largest |y|, if any
    pub fn extreme(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
    }

    /// Last sampled deflection (x = L)
    pub fn end_value(&self) -> f64 {
        self.points.last().map(|&(_, y)| y).unwrap_or(0.0)
    }
}

/// Closed-form maximum deflection of each scenario (m)
///
/// For a cantilever these are free-end values. For a simply-supported blade
/// they are the span maxima and the tip-load value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxDeflections {
    pub midspan_load_m: f64,
    pub tip_load_m: f64,
    pub self_weight_m: f64,
}

impl MaxDeflections {
    pub fn get(&self, scenario: LoadScenario) -> f64 {
        match scenario {
            LoadScenario::MidspanLoad => self.midspan_load_m,
            LoadScenario::TipLoad => self.tip_load_m,
            LoadScenario::SelfWeight => self.self_weight_m,
        }
    }

    /// Copy with every value rounded to `decimals` places (of metres).
    pub fn rounded(&self, decimals: usize) -> Self {
        MaxDeflections {
            midspan_load_m: round_to(self.midspan_load_m, decimals),
            tip_load_m: round_to(self.tip_load_m, decimals),
            self_weight_m: round_to(self.self_weight_m, decimals),
        }
    }
}

/// Deflection curves and maxima for one blade.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Blade",
///   "support": "Cantilever",
///   "x_m": [0.0, 0.0061, ...],
///   "midspan_load": {
///     "scenario": "MidspanLoad",
///     "label": "Load at midspan",
///     "points": [[0.0, 0.0], ...],
///     "summary": "Load at midspan: max deflection -0.00500 m"
///   },
///   "tip_load": { ... },
///   "self_weight": { ... },
///   "max": { "midspan_load_m": -0.005, "tip_load_m": -0.016, "self_weight_m": -9.0e-5 },
///   "youngs_modulus_pa": 2.7e11,
///   "moment_of_inertia_m4": 4.1667e-12,
///   "flexural_rigidity_nm2": 1.125,
///   "load_position_m": 0.15,
///   "point_load_n": -2.0,
///   "self_weight_n_per_m": -0.1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeflectionResult {
    pub label: String,
    pub support: Support,
    /// Stations along the blade, 0 to L inclusive
    pub x_m: Vec<f64>,
    pub midspan_load: DeflectionCurve,
    pub tip_load: DeflectionCurve,
    pub self_weight: DeflectionCurve,
    pub max: MaxDeflections,
    pub youngs_modulus_pa: f64,
    pub moment_of_inertia_m4: f64,
    pub flexural_rigidity_nm2: f64,
    pub load_position_m: f64,
    pub point_load_n: f64,
    pub self_weight_n_per_m: f64,
}

impl DeflectionResult {
    pub fn curve(&self, scenario: LoadScenario) -> &DeflectionCurve {
        match scenario {
            LoadScenario::MidspanLoad => &self.midspan_load,
            LoadScenario::TipLoad => &self.tip_load,
            LoadScenario::SelfWeight => &self.self_weight,
        }
    }

    pub fn curves(&self) -> [&DeflectionCurve; 3] {
        [&self.midspan_load, &self.tip_load, &self.self_weight]
    }

    /// One-line summary per scenario, values in mm.
    pub fn summaries(&self, decimals: usize) -> Vec<String> {
        LoadScenario::ALL
            .iter()
            .map(|&s| {
                format!(
                    "{}: max deflection {:.*} mm",
                    s.display_name(),
                    decimals,
                    meters_to_mm(self.max.get(s))
                )
            })
            .collect()
    }

    /// All three curves on one chart, deflection in mm.
    pub fn chart(&self) -> Chart {
        let mut chart = Chart::new("Beam deflection", "Blade length (m)", "Deflection (mm)").with_zero_line();
        for curve in self.curves() {
            chart = chart.with_series(Series::new(
                curve.label.clone(),
                to_mm(&curve.points),
                SeriesStyle::line(curve.scenario.color(), LineStyle::Solid),
            ));
        }
        chart
    }
}

/// Convert (m, m) points to (m, mm) for plotting
pub(crate) fn to_mm(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points.iter().map(|&(x, y)| (x, meters_to_mm(y))).collect()
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The last value is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { end } else { start + step * k as f64 })
                .collect()
        }
    }
}

/// Round to a number of decimal places.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Compute the three deflection curves and their maxima.
///
/// # Arguments
///
/// * `input` - Blade parameters
/// * `samples` - Number of stations from 0 to L inclusive (at least 2)
///
/// # Errors
///
/// * `InvalidInput` - if the blade fails validation or `samples < 2`
pub fn calculate(input: &BeamInput, samples: usize) -> CalcResult<DeflectionResult> {
    let mut tracker = EquationTracker::new();
    calculate_with_tracker(input, samples, &mut tracker)
}

/// Same as [`calculate`], recording every formula applied.
pub fn calculate_with_tracker(
    input: &BeamInput,
    samples: usize,
    tracker: &mut EquationTracker,
) -> CalcResult<DeflectionResult> {
    input.validate()?;

    if samples < 2 {
        return Err(CalcError::invalid_input(
            "samples",
            samples.to_string(),
            "At least 2 sample points are required",
        ));
    }

    let l = input.length_m;
    let e = input.youngs_modulus_pa;
    let i = input.moment_of_inertia_m4();
    let a = input.load_position_m();
    let p = input.point_load_n;
    let w = input.self_weight_n_per_m();

    debug!(
        "Deflection '{}': L={} m, I={:.4e} m^4, EI={:.4e} N m^2, a={} m, P={} N, w={} N/m, {} samples",
        input.label,
        l,
        i,
        e * i,
        a,
        p,
        w,
        samples
    );

    let label = input.label.clone();
    tracker.record_for_case(Equation::RectangularMomentOfInertia, "Section", label.clone());
    if matches!(input.self_weight, SelfWeight::FromDensity { .. }) {
        tracker.record_for_case(Equation::SelfWeightLineLoad, "Self-weight", label.clone());
    }

    let x_m = linspace(0.0, l, samples);

    let (midspan_load, tip_load, self_weight, max) = match input.support {
        Support::Cantilever => {
            tracker.record_for_case(Equation::CantileverPointDeflection, "Load at midspan", label.clone());
            tracker.record_for_case(Equation::CantileverTipDeflection, "Load at tip", label.clone());
            tracker.record_for_case(Equation::CantileverUniformDeflection, "Self-weight", label.clone());
            tracker.record_for_case(Equation::CantileverPointMaxDeflection, "Load at midspan", label.clone());
            tracker.record_for_case(Equation::CantileverTipMaxDeflection, "Load at tip", label.clone());
            tracker.record_for_case(Equation::CantileverUniformMaxDeflection, "Self-weight", label.clone());

            (
                DeflectionCurve::sample(LoadScenario::MidspanLoad, &x_m, |x| {
                    cantilever_point_deflection(p, a, x, e, i)
                }),
                DeflectionCurve::sample(LoadScenario::TipLoad, &x_m, |x| cantilever_tip_deflection(p, l, x, e, i)),
                DeflectionCurve::sample(LoadScenario::SelfWeight, &x_m, |x| {
                    cantilever_uniform_deflection(w, l, x, e, i)
                }),
                MaxDeflections {
                    midspan_load_m: cantilever_point_max_deflection(p, a, l, e, i),
                    tip_load_m: cantilever_tip_max_deflection(p, l, e, i),
                    self_weight_m: cantilever_uniform_max_deflection(w, l, e, i),
                },
            )
        }
        Support::SimplySupported => {
            tracker.record_for_case(Equation::SimplySupportedPointDeflection, "Load at midspan", label.clone());
            tracker.record_for_case(Equation::SimplySupportedUniformDeflection, "Self-weight", label.clone());
            tracker.record_for_case(Equation::SimplySupportedPointMaxDeflection, "Load at midspan", label.clone());
            tracker.record_for_case(Equation::SimplySupportedUniformMaxDeflection, "Self-weight", label.clone());

            (
                DeflectionCurve::sample(LoadScenario::MidspanLoad, &x_m, |x| {
                    simply_supported_point_deflection(p, a, l, x, e, i)
                }),
                // A load over the roller goes straight into the support
                DeflectionCurve::sample(LoadScenario::TipLoad, &x_m, |_| 0.0),
                DeflectionCurve::sample(LoadScenario::SelfWeight, &x_m, |x| {
                    simply_supported_uniform_deflection(w, l, x, e, i)
                }),
                MaxDeflections {
                    midspan_load_m: simply_supported_point_max_deflection(p, a, l, e, i),
                    tip_load_m: 0.0,
                    self_weight_m: simply_supported_uniform_max_deflection(w, l, e, i),
                },
            )
        }
    };

    Ok(DeflectionResult {
        label,
        support: input.support,
        x_m,
        midspan_load: midspan_load.summarized(max.midspan_load_m),
        tip_load: tip_load.summarized(max.tip_load_m),
        self_weight: self_weight.summarized(max.self_weight_m),
        max,
        youngs_modulus_pa: e,
        moment_of_inertia_m4: i,
        flexural_rigidity_nm2: e * i,
        load_position_m: a,
        point_load_n: p,
        self_weight_n_per_m: w,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace_endpoints() {
        let xs = linspace(0.0, 0.3, 50);
        assert_eq!(xs.len(), 50);
        assert_eq!(xs[0], 0.0);
        assert_eq!(xs[49], 0.3);
        assert_relative_eq!(xs[1], 0.3 / 49.0);
    }

    #[test]
    fn test_linspace_small_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert_eq!(linspace(0.0, 1.0, 2), vec![0.0, 1.0]);
    }

    #[test]
    fn test_default_blade_maxima() {
        let result = calculate(&BeamInput::default(), DEFAULT_SAMPLES).unwrap();

        // EI = 2.7e11 * 4.1667e-12 = 1.125 N m^2
        assert_relative_eq!(result.flexural_rigidity_nm2, 1.125, max_relative = 1e-12);
        // P L^3 / 3EI = -2 * 0.027 / 3.375
        assert_relative_eq!(result.max.tip_load_m, -0.016, max_relative = 1e-9);
        // P a^2 (3L - a) / 6EI = -2 * 0.0225 * 0.75 / 6.75
        assert_relative_eq!(result.max.midspan_load_m, -0.005, max_relative = 1e-9);
        // w L^4 / 8EI = -0.1 * 0.0081 / 9
        assert_relative_eq!(result.max.self_weight_m, -9.0e-5, max_relative = 1e-9);
    }

    #[test]
    fn test_curves_start_at_zero_and_end_at_max() {
        let result = calculate(&BeamInput::default(), DEFAULT_SAMPLES).unwrap();
        for curve in result.curves() {
            assert_eq!(curve.points.len(), DEFAULT_SAMPLES);
            assert_eq!(curve.points[0], (0.0, 0.0), "{} should start at the root", curve.label);
            assert_relative_eq!(
                curve.end_value(),
                result.max.get(curve.scenario),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_curves_monotonic_downward() {
        let result = calculate(&BeamInput::default(), DEFAULT_SAMPLES).unwrap();
        for curve in result.curves() {
            let ys = curve.deflections();
            for pair in ys.windows(2) {
                assert!(pair[1] <= pair[0], "{} is not monotonic: {:?}", curve.label, pair);
            }
        }
    }

    #[test]
    fn test_zero_loads_give_zero_curves() {
        let input = BeamInput {
            point_load_n: 0.0,
            self_weight: SelfWeight::LineLoad { n_per_m: 0.0 },
            ..Default::default()
        };
        let result = calculate(&input, 10).unwrap();
        for curve in result.curves() {
            assert!(curve.deflections().iter().all(|&y| y == 0.0));
        }
        assert_eq!(result.max.tip_load_m, 0.0);
    }

    #[test]
    fn test_load_at_tip_matches_tip_curve() {
        let input = BeamInput {
            load_position_ratio: 1.0,
            ..Default::default()
        };
        let result = calculate(&input, 25).unwrap();
        for (m, t) in result.midspan_load.points.iter().zip(&result.tip_load.points) {
            assert_relative_eq!(m.1, t.1, max_relative = 1e-12);
        }
        assert_relative_eq!(result.max.midspan_load_m, result.max.tip_load_m, max_relative = 1e-12);
    }

    #[test]
    fn test_positive_load_deflects_upward() {
        let input = BeamInput {
            point_load_n: 2.0,
            ..Default::default()
        };
        let result = calculate(&input, 10).unwrap();
        assert!(result.max.tip_load_m > 0.0);
        assert!(result.max.midspan_load_m > 0.0);
    }

    #[test]
    fn test_too_few_samples() {
        let err = calculate(&BeamInput::default(), 1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_invalid_input_propagates() {
        let input = BeamInput {
            width_m: -0.05,
            ..Default::default()
        };
        assert!(calculate(&input, 50).is_err());
    }

    #[test]
    fn test_simply_supported() {
        let input = BeamInput {
            support: Support::SimplySupported,
            ..Default::default()
        };
        let result = calculate(&input, 51).unwrap();

        assert!(result.tip_load.deflections().iter().all(|&y| y == 0.0));
        assert_eq!(result.max.tip_load_m, 0.0);

        // P L^3 / 48EI
        let expected = -2.0 * 0.027 / (48.0 * 1.125);
        assert_relative_eq!(result.max.midspan_load_m, expected, max_relative = 1e-9);
        // Odd sample count puts a station exactly at midspan
        assert_relative_eq!(result.midspan_load.points[25].1, expected, max_relative = 1e-9);
        assert!(result.self_weight.end_value().abs() < 1e-15);
    }

    #[test]
    fn test_tracker_records_cantilever_equations() {
        let mut tracker = EquationTracker::new();
        calculate_with_tracker(&BeamInput::default(), 10, &mut tracker).unwrap();
        let used = tracker.unique_equations();
        assert!(used.contains(&Equation::CantileverTipMaxDeflection));
        assert!(used.contains(&Equation::RectangularMomentOfInertia));
        assert!(!used.contains(&Equation::SelfWeightLineLoad));
    }

    #[test]
    fn test_rounded_maxima() {
        let result = calculate(&BeamInput::default(), 10).unwrap();
        let rounded = result.max.rounded(5);
        assert_eq!(rounded.tip_load_m, -0.016);
        assert_eq!(rounded.self_weight_m, -0.00009);
    }

    #[test]
    fn test_chart_has_three_series_in_mm() {
        let result = calculate(&BeamInput::default(), 10).unwrap();
        let chart = result.chart();
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.title, "Beam deflection");
        let tip = &chart.series[1];
        assert_relative_eq!(tip.points[9].1, -16.0, max_relative = 1e-9);
    }

    #[test]
    fn test_stored_summaries() {
        let result = calculate(&BeamInput::default(), 10).unwrap();
        assert_eq!(result.tip_load.summary, "Load at tip: max deflection -0.01600 m");
        assert_eq!(result.midspan_load.summary, "Load at midspan: max deflection -0.00500 m");
        assert_eq!(result.self_weight.summary, "Self-weight: max deflection -0.00009 m");

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"summary\":\"Load at tip: max deflection -0.01600 m\""));
    }

    #[test]
    fn test_tiny_deflections_chart() {
        let input = BeamInput {
            point_load_n: -1e-12,
            self_weight: SelfWeight::LineLoad { n_per_m: 0.0 },
            ..Default::default()
        };
        let result = calculate(&input, DEFAULT_SAMPLES).unwrap();
        assert!(result.max.tip_load_m < 0.0 && result.max.tip_load_m > -1e-13);

        let chart = result.chart();
        let (_, y_axis) = chart.axes();
        assert!(y_axis.max > y_axis.min);
        assert!(y_axis.min < 0.0);

        let markup = chart.to_typst(400.0, 240.0);
        assert!(markup.contains("curve.line"));
        assert!(!markup.contains("NaN"));
    }

    #[test]
    fn test_summaries() {
        let result = calculate(&BeamInput::default(), 10).unwrap();
        let lines = result.summaries(3);
        assert_eq!(lines[1], "Load at tip: max deflection -16.000 mm");
    }
}
