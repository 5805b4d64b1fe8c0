//! # Equation Registry
//!
//! Central registry of the formulas used by the deflection study. Each
//! equation carries its reference, Typst and plain-text formula, variable
//! definitions and assumptions, so reports can list exactly what was applied.
//!
//! ## Usage
//!
//! ```rust
//! use lamina_core::equations::registry::{Equation, EquationTracker};
//!
//! let mut tracker = EquationTracker::new();
//! tracker.record_for_case(Equation::CantileverTipMaxDeflection, "Maximum deflection", "Blade");
//!
//! let meta = Equation::CantileverTipMaxDeflection.metadata();
//! assert!(meta.formula_plain.contains("PL^3/(3EI)"));
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::pdf::escape_typst;

// ============================================================================
// References
// ============================================================================

/// Source of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeReference {
    /// Roark's Formulas for Stress and Strain
    Roarks {
        edition: u8,
        table: &'static str,
        case: &'static str,
    },
    /// Gere & Goodno, Mechanics of Materials
    GereGoodno { edition: u8, appendix: &'static str },
    /// Linear least-squares regression
    LeastSquares,
    /// Fundamental mechanics (no specific reference needed)
    Mechanics,
}

impl CodeReference {
    /// Format the reference for display in reports
    pub fn citation(&self) -> String {
        match self {
            CodeReference::Roarks { edition, table, case } => {
                format!("Roark's {}ed, {}, Case {}", edition, table, case)
            }
            CodeReference::GereGoodno { edition, appendix } => {
                format!("Gere & Goodno {}ed, Appendix {}", edition, appendix)
            }
            CodeReference::LeastSquares => "Ordinary least squares".to_string(),
            CodeReference::Mechanics => "Fundamental Mechanics".to_string(),
        }
    }
}

// ============================================================================
// Equation Categories
// ============================================================================

/// Categories for grouping equations in the report appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquationCategory {
    /// Section properties and self-weight
    SectionProperties,
    /// Deflection curves y(x)
    Deflections,
    /// Closed-form maximum deflections
    MaximumDeflections,
    /// Polynomial approximation of sampled curves
    CurveFitting,
}

impl EquationCategory {
    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            EquationCategory::SectionProperties => "Section Properties",
            EquationCategory::Deflections => "Deflection Curves",
            EquationCategory::MaximumDeflections => "Maximum Deflections",
            EquationCategory::CurveFitting => "Curve Fitting",
        }
    }

    /// Sort order for the appendix (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            EquationCategory::SectionProperties => 1,
            EquationCategory::Deflections => 2,
            EquationCategory::MaximumDeflections => 3,
            EquationCategory::CurveFitting => 4,
        }
    }
}

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in an equation.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Symbol in Typst math notation (e.g., "P", "y_max")
    pub symbol: &'static str,
    /// Description
    pub description: &'static str,
    /// Units (e.g., "m", "N", "Pa")
    pub units: &'static str,
}

impl Variable {
    pub const fn new(symbol: &'static str, description: &'static str, units: &'static str) -> Self {
        Self { symbol, description, units }
    }
}

// ============================================================================
// Equation Metadata
// ============================================================================

/// Complete metadata for one formula.
#[derive(Debug, Clone)]
pub struct EquationMetadata {
    /// Human-readable name
    pub name: &'static str,
    /// What the equation calculates
    pub description: &'static str,
    /// Formula in Typst markup (math segments wrapped in `$`)
    pub formula_typst: &'static str,
    /// Formula in plain text for markdown
    pub formula_plain: &'static str,
    /// Reference
    pub reference: CodeReference,
    /// Variable definitions
    pub variables: Vec<Variable>,
    /// Assumptions or limitations
    pub assumptions: Vec<&'static str>,
    /// Category for grouping
    pub category: EquationCategory,
    /// Source module where the equation is implemented
    pub source_module: &'static str,
    /// Function implementing the equation
    pub source_function: &'static str,
}

// ============================================================================
// Equation Enum
// ============================================================================

/// All formulas used in Lamina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Equation {
    // Section properties
    /// I = bt^3/12
    RectangularMomentOfInertia,
    /// w = rho g b t
    SelfWeightLineLoad,

    // Cantilever curves
    /// Piecewise curve for point load at a
    CantileverPointDeflection,
    /// Straight line beyond the load point
    CantileverPointLinearContinuation,
    /// Curve for point load at the free end
    CantileverTipDeflection,
    /// Curve for uniform load
    CantileverUniformDeflection,

    // Simply-supported curves
    /// Roark case 1e curve
    SimplySupportedPointDeflection,
    /// Roark case 2e curve
    SimplySupportedUniformDeflection,

    // Maxima
    /// Pa^2(3L - a)/(6EI)
    CantileverPointMaxDeflection,
    /// PL^3/(3EI)
    CantileverTipMaxDeflection,
    /// wL^4/(8EI)
    CantileverUniformMaxDeflection,
    /// Pb(L^2 - b^2)^(3/2)/(9 sqrt(3) EIL)
    SimplySupportedPointMaxDeflection,
    /// 5wL^4/(384EI)
    SimplySupportedUniformMaxDeflection,
    /// Sum of load-case deflections
    Superposition,

    // Curve fitting
    /// Least-squares polynomial coefficients
    LeastSquaresPolynomial,
    /// R^2 goodness of fit
    CoefficientOfDetermination,
    /// s^2 (A^T A)^-1
    ParameterCovariance,
}

impl Equation {
    /// Get the full metadata for this equation
    pub fn metadata(&self) -> EquationMetadata {
        match self {
            Equation::RectangularMomentOfInertia => EquationMetadata {
                name: "Rectangular Second Moment of Area",
                description: "Second moment of area of the blade section about its bending axis",
                formula_typst: r#"$I = (b t^3) / 12$"#,
                formula_plain: "I = bt^3/12",
                reference: CodeReference::Roarks { edition: 8, table: "Table A.1", case: "4" },
                variables: vec![
                    Variable::new("b", "Section width", "m"),
                    Variable::new("t", "Section thickness (bending depth)", "m"),
                    Variable::new("I", "Second moment of area", "m^4"),
                ],
                assumptions: vec!["Solid rectangular section", "Bending through the thickness"],
                category: EquationCategory::SectionProperties,
                source_module: "equations/section.rs",
                source_function: "rectangular_moment_of_inertia",
            },

            Equation::SelfWeightLineLoad => EquationMetadata {
                name: "Self-Weight Line Load",
                description: "Uniform line load produced by the blade's own weight",
                formula_typst: r#"$w = rho g b t$"#,
                formula_plain: "w = rho * g * b * t",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("rho", "Density", "kg/m^3"),
                    Variable::new("g", "Standard gravity", "m/s^2"),
                    Variable::new("w", "Line load", "N/m"),
                ],
                assumptions: vec!["Prismatic blade", "Only used when the load is derived from density"],
                category: EquationCategory::SectionProperties,
                source_module: "equations/section.rs",
                source_function: "self_weight_line_load",
            },

            Equation::CantileverPointDeflection => EquationMetadata {
                name: "Cantilever Point Load Deflection",
                description: "Deflection curve of a cantilever with a point load at distance a from the root",
                formula_typst: r#"$y(x) = (P x^2 (3 a - x)) / (6 E I)$ for $x <= a$, $y(x) = (P a^2 (3 x - a)) / (6 E I)$ for $x > a$"#,
                formula_plain: "y(x) = Px^2(3a - x)/(6EI) for x <= a, y(x) = Pa^2(3x - a)/(6EI) for x > a",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" },
                variables: vec![
                    Variable::new("P", "Point load (signed)", "N"),
                    Variable::new("a", "Load position from the fixed end", "m"),
                    Variable::new("x", "Position from the fixed end", "m"),
                    Variable::new("E", "Young's modulus", "Pa"),
                    Variable::new("I", "Second moment of area", "m^4"),
                ],
                assumptions: vec!["Linear elastic material", "Small deflections", "Fixed at x = 0, free at x = L"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_point_deflection",
            },

            Equation::CantileverPointLinearContinuation => EquationMetadata {
                name: "Cantilever Linear Continuation",
                description: "Straight line followed by the unloaded segment beyond a point load",
                formula_typst: r#"$y(x) = (P a^2 (3 x - a)) / (6 E I)$"#,
                formula_plain: "y(x) = Pa^2(3x - a)/(6EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" },
                variables: vec![
                    Variable::new("P", "Point load (signed)", "N"),
                    Variable::new("a", "Load position from the fixed end", "m"),
                ],
                assumptions: vec!["Exact for x >= a, an extrapolated line for x < a"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_point_linear_continuation",
            },

            Equation::CantileverTipDeflection => EquationMetadata {
                name: "Cantilever Tip Load Deflection",
                description: "Deflection curve of a cantilever with a point load at the free end",
                formula_typst: r#"$y(x) = (P x^2 (3 L - x)) / (6 E I)$"#,
                formula_plain: "y(x) = Px^2(3L - x)/(6EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" },
                variables: vec![
                    Variable::new("P", "Tip load (signed)", "N"),
                    Variable::new("L", "Blade length", "m"),
                ],
                assumptions: vec!["Linear elastic material", "Small deflections"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_tip_deflection",
            },

            Equation::CantileverUniformDeflection => EquationMetadata {
                name: "Cantilever Uniform Load Deflection",
                description: "Deflection curve of a cantilever under a uniform line load",
                formula_typst: r#"$y(x) = (w x^2 (x^2 + 6 L^2 - 4 L x)) / (24 E I)$"#,
                formula_plain: "y(x) = wx^2(x^2 + 6L^2 - 4Lx)/(24EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "2a" },
                variables: vec![
                    Variable::new("w", "Line load (signed)", "N/m"),
                    Variable::new("L", "Blade length", "m"),
                ],
                assumptions: vec!["Load covers the full length"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_uniform_deflection",
            },

            Equation::SimplySupportedPointDeflection => EquationMetadata {
                name: "Simply-Supported Point Load Deflection",
                description: "Deflection curve of a pin-roller beam with a point load at a",
                formula_typst: r#"$y(x) = (P b x (L^2 - b^2 - x^2)) / (6 E I L)$ for $x <= a$"#,
                formula_plain: "y(x) = Pbx(L^2 - b^2 - x^2)/(6EIL) for x <= a",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1e" },
                variables: vec![
                    Variable::new("b", "L - a", "m"),
                    Variable::new("x", "Position from the left support", "m"),
                ],
                assumptions: vec!["Pin at x = 0, roller at x = L"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "simply_supported_point_deflection",
            },

            Equation::SimplySupportedUniformDeflection => EquationMetadata {
                name: "Simply-Supported Uniform Load Deflection",
                description: "Deflection curve of a pin-roller beam under a uniform line load",
                formula_typst: r#"$y(x) = (w x (L^3 - 2 L x^2 + x^3)) / (24 E I)$"#,
                formula_plain: "y(x) = wx(L^3 - 2Lx^2 + x^3)/(24EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "2e" },
                variables: vec![
                    Variable::new("w", "Line load (signed)", "N/m"),
                ],
                assumptions: vec!["Pin at x = 0, roller at x = L"],
                category: EquationCategory::Deflections,
                source_module: "equations/beam.rs",
                source_function: "simply_supported_uniform_deflection",
            },

            Equation::CantileverPointMaxDeflection => EquationMetadata {
                name: "Cantilever Point Load Maximum Deflection",
                description: "Free-end deflection of a cantilever with a point load at a",
                formula_typst: r#"$y_max = (P a^2 (3 L - a)) / (6 E I)$"#,
                formula_plain: "y_max = Pa^2(3L - a)/(6EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" },
                variables: vec![
                    Variable::new("y_max", "Free-end deflection", "m"),
                ],
                assumptions: vec!["Maximum occurs at the free end"],
                category: EquationCategory::MaximumDeflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_point_max_deflection",
            },

            Equation::CantileverTipMaxDeflection => EquationMetadata {
                name: "Cantilever Tip Load Maximum Deflection",
                description: "Free-end deflection of a cantilever with a point load at the free end",
                formula_typst: r#"$y_max = (P L^3) / (3 E I)$"#,
                formula_plain: "y_max = PL^3/(3EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" },
                variables: vec![
                    Variable::new("y_max", "Free-end deflection", "m"),
                ],
                assumptions: vec!["Maximum occurs at the free end"],
                category: EquationCategory::MaximumDeflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_tip_max_deflection",
            },

            Equation::CantileverUniformMaxDeflection => EquationMetadata {
                name: "Cantilever Uniform Load Maximum Deflection",
                description: "Free-end deflection of a cantilever under a uniform line load",
                formula_typst: r#"$y_max = (w L^4) / (8 E I)$"#,
                formula_plain: "y_max = wL^4/(8EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "2a" },
                variables: vec![
                    Variable::new("y_max", "Free-end deflection", "m"),
                ],
                assumptions: vec!["Maximum occurs at the free end"],
                category: EquationCategory::MaximumDeflections,
                source_module: "equations/beam.rs",
                source_function: "cantilever_uniform_max_deflection",
            },

            Equation::SimplySupportedPointMaxDeflection => EquationMetadata {
                name: "Simply-Supported Point Load Maximum Deflection",
                description: "Largest deflection of a pin-roller beam with a point load at a",
                formula_typst: r#"$y_max = (P b (L^2 - b^2)^(3 / 2)) / (9 sqrt(3) E I L)$"#,
                formula_plain: "y_max = Pb(L^2 - b^2)^(3/2)/(9*sqrt(3)*EIL), b = min(a, L - a)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1e" },
                variables: vec![
                    Variable::new("b", "Shorter of a and L - a", "m"),
                ],
                assumptions: vec!["Reduces to PL^3/(48EI) for a midspan load"],
                category: EquationCategory::MaximumDeflections,
                source_module: "equations/beam.rs",
                source_function: "simply_supported_point_max_deflection",
            },

            Equation::SimplySupportedUniformMaxDeflection => EquationMetadata {
                name: "Simply-Supported Uniform Load Maximum Deflection",
                description: "Midspan deflection of a pin-roller beam under a uniform line load",
                formula_typst: r#"$y_max = (5 w L^4) / (384 E I)$"#,
                formula_plain: "y_max = 5wL^4/(384EI)",
                reference: CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "2e" },
                variables: vec![
                    Variable::new("y_max", "Midspan deflection", "m"),
                ],
                assumptions: vec!["Maximum occurs at midspan"],
                category: EquationCategory::MaximumDeflections,
                source_module: "equations/beam.rs",
                source_function: "simply_supported_uniform_max_deflection",
            },

            Equation::Superposition => EquationMetadata {
                name: "Superposition of Load Cases",
                description: "Combined deflection as the sum of the individual load-case deflections",
                formula_typst: r#"$y(x) = sum_k y_k (x)$"#,
                formula_plain: "y(x) = sum of y_k(x)",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("y_k", "Deflection from load case k", "m"),
                ],
                assumptions: vec!["Linear elastic material", "Small deflections"],
                category: EquationCategory::MaximumDeflections,
                source_module: "calculations/ideal_beam.rs",
                source_function: "compare",
            },

            Equation::LeastSquaresPolynomial => EquationMetadata {
                name: "Least-Squares Polynomial",
                description: "Polynomial coefficients minimizing the squared residuals of a sampled curve",
                formula_typst: r#"$min_c ||A c - y||^2$, $A_(i j) = x_i^(n - j)$"#,
                formula_plain: "minimize ||Ac - y||^2, A_ij = x_i^(n-j)",
                reference: CodeReference::LeastSquares,
                variables: vec![
                    Variable::new("c", "Coefficients, highest power first", "-"),
                    Variable::new("n", "Polynomial degree", "-"),
                ],
                assumptions: vec!["Solved by singular value decomposition"],
                category: EquationCategory::CurveFitting,
                source_module: "calculations/curve_fit.rs",
                source_function: "fit_polynomial",
            },

            Equation::CoefficientOfDetermination => EquationMetadata {
                name: "Coefficient of Determination",
                description: "Share of the curve's variance explained by the fit",
                formula_typst: r#"$R^2 = 1 - S_r / S_t$"#,
                formula_plain: "R^2 = 1 - SSR/SST",
                reference: CodeReference::LeastSquares,
                variables: vec![
                    Variable::new("S_r", "Residual sum of squares", "m^2"),
                    Variable::new("S_t", "Total sum of squares about the mean", "m^2"),
                ],
                assumptions: vec!["Defined as 1 for a constant curve fitted exactly"],
                category: EquationCategory::CurveFitting,
                source_module: "calculations/curve_fit.rs",
                source_function: "fit_polynomial",
            },

            Equation::ParameterCovariance => EquationMetadata {
                name: "Parameter Covariance",
                description: "Estimated covariance of the fitted coefficients",
                formula_typst: r#"$C = s^2 (A^T A)^(-1)$, $s^2 = S_r / (m - p)$"#,
                formula_plain: "C = s^2 (A^T A)^-1, s^2 = SSR/(m - p)",
                reference: CodeReference::LeastSquares,
                variables: vec![
                    Variable::new("m", "Number of samples", "-"),
                    Variable::new("p", "Number of coefficients", "-"),
                ],
                assumptions: vec!["Only reported when m > p"],
                category: EquationCategory::CurveFitting,
                source_module: "calculations/curve_fit.rs",
                source_function: "fit_polynomial",
            },
        }
    }

    /// Get all equations in a given category
    pub fn in_category(category: EquationCategory) -> Vec<Equation> {
        ALL_EQUATIONS
            .iter()
            .filter(|eq| eq.metadata().category == category)
            .copied()
            .collect()
    }

    /// Get all categories in appendix order
    pub fn all_categories() -> Vec<EquationCategory> {
        use EquationCategory::*;
        let mut cats = vec![SectionProperties, Deflections, MaximumDeflections, CurveFitting];
        cats.sort_by_key(|c| c.sort_order());
        cats
    }
}

/// All equations in the registry (for iteration)
pub static ALL_EQUATIONS: &[Equation] = &[
    Equation::RectangularMomentOfInertia,
    Equation::SelfWeightLineLoad,
    Equation::CantileverPointDeflection,
    Equation::CantileverPointLinearContinuation,
    Equation::CantileverTipDeflection,
    Equation::CantileverUniformDeflection,
    Equation::SimplySupportedPointDeflection,
    Equation::SimplySupportedUniformDeflection,
    Equation::CantileverPointMaxDeflection,
    Equation::CantileverTipMaxDeflection,
    Equation::CantileverUniformMaxDeflection,
    Equation::SimplySupportedPointMaxDeflection,
    Equation::SimplySupportedUniformMaxDeflection,
    Equation::Superposition,
    Equation::LeastSquaresPolynomial,
    Equation::CoefficientOfDetermination,
    Equation::ParameterCovariance,
];

// ============================================================================
// Equation Usage Tracking
// ============================================================================

/// Record of an equation being applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationUsage {
    /// The equation that was used
    pub equation: Equation,
    /// Where/why it was used (e.g., "Midspan load curve")
    pub context: String,
    /// Label of the beam case it was applied to
    pub case_label: Option<String>,
}

impl EquationUsage {
    /// Create a new equation usage record
    pub fn new(equation: Equation, context: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
            case_label: None,
        }
    }

    /// Create usage record with a case label
    pub fn for_case(equation: Equation, context: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
            case_label: Some(label.into()),
        }
    }
}

/// Collector for equation usage during a calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquationTracker {
    usages: Vec<EquationUsage>,
}

impl EquationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an equation was used
    pub fn record(&mut self, equation: Equation, context: impl Into<String>) {
        self.usages.push(EquationUsage::new(equation, context));
    }

    /// Record equation usage for a specific case
    pub fn record_for_case(&mut self, equation: Equation, context: impl Into<String>, label: impl Into<String>) {
        self.usages.push(EquationUsage::for_case(equation, context, label));
    }

    /// Get all recorded usages
    pub fn usages(&self) -> &[EquationUsage] {
        &self.usages
    }

    /// Get unique equations used, in first-use order
    pub fn unique_equations(&self) -> Vec<Equation> {
        let mut seen = HashSet::new();
        self.usages
            .iter()
            .filter(|u| seen.insert(u.equation))
            .map(|u| u.equation)
            .collect()
    }

    /// Group usages by equation
    pub fn by_equation(&self) -> HashMap<Equation, Vec<&EquationUsage>> {
        let mut map: HashMap<Equation, Vec<&EquationUsage>> = HashMap::new();
        for usage in &self.usages {
            map.entry(usage.equation).or_default().push(usage);
        }
        map
    }

    /// Group unique equations by category, in appendix order
    pub fn by_category(&self) -> Vec<(EquationCategory, Vec<Equation>)> {
        let mut by_cat: HashMap<EquationCategory, Vec<Equation>> = HashMap::new();
        for eq in self.unique_equations() {
            by_cat.entry(eq.metadata().category).or_default().push(eq);
        }

        let mut result: Vec<_> = by_cat.into_iter().collect();
        result.sort_by_key(|(cat, _)| cat.sort_order());
        result
    }

    /// Merge another tracker into this one
    pub fn merge(&mut self, other: EquationTracker) {
        self.usages.extend(other.usages);
    }
}

// ============================================================================
// Typst Appendix Generation
// ============================================================================

impl EquationTracker {
    /// Generate Typst markup for the "List of Equations" appendix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lamina_core::equations::registry::{Equation, EquationTracker};
    ///
    /// let mut tracker = EquationTracker::new();
    /// tracker.record_for_case(Equation::CantileverUniformMaxDeflection, "Self-weight", "Blade");
    ///
    /// let typst = tracker.generate_appendix_typst();
    /// assert!(typst.contains("Cantilever Uniform Load Maximum Deflection"));
    /// ```
    pub fn generate_appendix_typst(&self) -> String {
        let mut output = String::new();

        output.push_str(r##"
#pagebreak()

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Appendix: List of Equations]
  ]
]

#v(12pt)

#text(size: 10pt)[
  Formulas applied in this study, with their references and the cases they were applied to.
]

#v(16pt)
"##);

        let by_category = self.by_category();

        if by_category.is_empty() {
            output.push_str("#text(style: \"italic\")[No equations recorded for this study.]\n");
            return output;
        }

        let usage_by_eq = self.by_equation();

        for (category, equations) in by_category {
            output.push_str(&format!("\n== {}\n\n", category.display_name()));

            for equation in equations {
                let meta = equation.metadata();

                output.push_str(&format!("=== {}\n\n", meta.name));
                output.push_str(&format!("#text(size: 10pt)[{}]\n\n", meta.description));
                output.push_str(&format!("*Formula:* {}\n\n", meta.formula_typst));
                output.push_str(&format!("*Reference:* {}\n\n", meta.reference.citation()));

                if !meta.variables.is_empty() {
                    output.push_str("*Variables:*\n");
                    output.push_str("#table(\n");
                    output.push_str("  columns: (auto, 1fr, auto),\n");
                    output.push_str("  inset: 6pt,\n");
                    output.push_str("  stroke: 0.5pt,\n");
                    output.push_str("  align: (left, left, left),\n");
                    output.push_str("  table.header([*Symbol*], [*Description*], [*Units*]),\n");

                    for var in &meta.variables {
                        output.push_str(&format!(
                            "  [${}$], [{}], [{}],\n",
                            escape_typst_math(var.symbol),
                            var.description,
                            var.units
                        ));
                    }
                    output.push_str(")\n\n");
                }

                if let Some(usages) = usage_by_eq.get(&equation) {
                    let mut labels: Vec<String> = usages
                        .iter()
                        .filter_map(|u| u.case_label.as_deref())
                        .map(escape_typst)
                        .collect();
                    labels.sort_unstable();
                    labels.dedup();

                    if !labels.is_empty() {
                        output.push_str(&format!("*Applied to:* {}\n\n", labels.join(", ")));
                    }
                }

                if !meta.assumptions.is_empty() {
                    output.push_str("*Assumptions:*\n");
                    for assumption in &meta.assumptions {
                        output.push_str(&format!("- {}\n", assumption));
                    }
                    output.push('\n');
                }

                output.push_str("#v(8pt)\n");
                output.push_str("#line(length: 100%, stroke: 0.25pt + gray)\n");
                output.push_str("#v(8pt)\n\n");
            }
        }

        output
    }
}

/// Generate a "List of Equations" appendix for a fixed set of equations.
pub fn generate_static_equations_appendix_typst(equations: &[Equation]) -> String {
    let mut tracker = EquationTracker::new();
    for &eq in equations {
        tracker.record(eq, "Reference");
    }
    tracker.generate_appendix_typst()
}

/// Escape characters that break Typst math mode
fn escape_typst_math(s: &str) -> String {
    s.replace('\\', "\\\\")
}

// ============================================================================
// Markdown Generation for EQUATIONS.md
// ============================================================================

/// Generate the EQUATIONS.md reference document.
///
/// # Example
///
/// ```rust
/// use lamina_core::equations::registry::generate_equations_markdown;
///
/// let markdown = generate_equations_markdown();
/// assert!(markdown.contains("Lamina Equations Reference"));
/// ```
pub fn generate_equations_markdown() -> String {
    let mut output = String::with_capacity(16_000);

    output.push_str(r#"# Lamina Equations Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-equations`

Every formula used by Lamina, with its reference, source location and assumptions.

## Sign Convention

Loads and deflections share one vertical axis. A negative (downward) load
produces a negative (downward) deflection.

---

"#);

    let categories = Equation::all_categories();

    for category in &categories {
        let equations = Equation::in_category(*category);
        if equations.is_empty() {
            continue;
        }

        output.push_str(&format!("## {}\n\n", category.display_name()));

        for equation in equations {
            let meta = equation.metadata();

            output.push_str(&format!("### {}\n\n", meta.name));
            output.push_str(&format!("{}\n\n", meta.description));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));

            if !meta.variables.is_empty() {
                output.push_str("**Variables:**\n\n");
                output.push_str("| Symbol | Description | Units |\n");
                output.push_str("|--------|-------------|-------|\n");
                for var in &meta.variables {
                    output.push_str(&format!("| {} | {} | {} |\n", var.symbol, var.description, var.units));
                }
                output.push('\n');
            }

            output.push_str(&format!("**Reference:** {}\n\n", meta.reference.citation()));
            output.push_str(&format!(
                "**Source:** [`{}`]({})\n\n",
                meta.source_function, meta.source_module
            ));

            if !meta.assumptions.is_empty() {
                output.push_str("**Assumptions:**\n");
                for assumption in &meta.assumptions {
                    output.push_str(&format!("- {}\n", assumption));
                }
                output.push('\n');
            }

            output.push_str("---\n\n");
        }
    }

    output.push_str(&format!(
        "## Statistics\n\n- **Total Equations:** {}\n- **Categories:** {}\n",
        ALL_EQUATIONS.len(),
        categories.len()
    ));

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_equations_have_metadata() {
        assert_eq!(ALL_EQUATIONS.len(), 17);

        for eq in ALL_EQUATIONS {
            let meta = eq.metadata();
            assert!(!meta.name.is_empty(), "Equation {:?} has no name", eq);
            assert!(!meta.formula_typst.is_empty(), "Equation {:?} has no formula", eq);
            assert!(!meta.formula_plain.is_empty(), "Equation {:?} has no plain formula", eq);
            assert!(!meta.variables.is_empty(), "Equation {:?} has no variables", eq);
            assert!(!meta.source_function.is_empty(), "Equation {:?} has no source", eq);
        }

        let tip = Equation::CantileverTipMaxDeflection.metadata();
        assert!(tip.formula_plain.contains("PL^3/(3EI)"));

        let uniform = Equation::CantileverUniformMaxDeflection.metadata();
        assert!(uniform.formula_plain.contains("wL^4/(8EI)"));
    }

    #[test]
    fn test_code_reference_citation() {
        let roark = CodeReference::Roarks { edition: 8, table: "Table 8.1", case: "1a" };
        assert_eq!(roark.citation(), "Roark's 8ed, Table 8.1, Case 1a");
        assert_eq!(CodeReference::LeastSquares.citation(), "Ordinary least squares");
    }

    #[test]
    fn test_equation_tracker() {
        let mut tracker = EquationTracker::new();
        tracker.record(Equation::CantileverTipDeflection, "Case A");
        tracker.record(Equation::CantileverTipMaxDeflection, "Case A");
        tracker.record(Equation::CantileverTipDeflection, "Case B");

        assert_eq!(tracker.usages().len(), 3);
        assert_eq!(tracker.unique_equations().len(), 2);
        assert_eq!(tracker.by_equation()[&Equation::CantileverTipDeflection].len(), 2);
    }

    #[test]
    fn test_by_category_sorted() {
        let mut tracker = EquationTracker::new();
        tracker.record(Equation::LeastSquaresPolynomial, "fit");
        tracker.record(Equation::CantileverUniformDeflection, "curve");
        tracker.record(Equation::RectangularMomentOfInertia, "section");

        let cats: Vec<_> = tracker.by_category().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            cats,
            vec![
                EquationCategory::SectionProperties,
                EquationCategory::Deflections,
                EquationCategory::CurveFitting,
            ]
        );
    }

    #[test]
    fn test_merge() {
        let mut a = EquationTracker::new();
        a.record(Equation::Superposition, "a");
        let mut b = EquationTracker::new();
        b.record(Equation::ParameterCovariance, "b");
        a.merge(b);
        assert_eq!(a.usages().len(), 2);
    }

    #[test]
    fn test_generate_appendix_typst() {
        let mut tracker = EquationTracker::new();
        tracker.record_for_case(Equation::CantileverPointDeflection, "Midspan load", "Blade A");
        tracker.record_for_case(Equation::CantileverPointDeflection, "Midspan load", "Blade B");
        tracker.record_for_case(Equation::LeastSquaresPolynomial, "Fit", "Blade A");

        let typst = tracker.generate_appendix_typst();
        assert!(typst.contains("Appendix: List of Equations"));
        assert!(typst.contains("Cantilever Point Load Deflection"));
        assert!(typst.contains("Least-Squares Polynomial"));
        assert!(typst.contains("*Applied to:* Blade A, Blade B"));
        assert!(typst.contains("Roark's"));
    }

    #[test]
    fn test_appendix_escapes_case_labels() {
        let mut tracker = EquationTracker::new();
        tracker.record_for_case(Equation::CantileverTipDeflection, "Load at tip", "Blade $2 *thin* [B]");

        let typst = tracker.generate_appendix_typst();
        assert!(typst.contains("*Applied to:* Blade \\$2 \\*thin\\* \\[B\\]"));
    }

    #[test]
    fn test_generate_appendix_empty_tracker() {
        let typst = EquationTracker::new().generate_appendix_typst();
        assert!(typst.contains("No equations recorded"));
    }

    #[test]
    fn test_static_appendix() {
        let typst = generate_static_equations_appendix_typst(&[Equation::Superposition]);
        assert!(typst.contains("Superposition of Load Cases"));
    }

    #[test]
    fn test_generate_equations_markdown() {
        let markdown = generate_equations_markdown();
        assert!(markdown.contains("## Section Properties"));
        assert!(markdown.contains("## Deflection Curves"));
        assert!(markdown.contains("## Maximum Deflections"));
        assert!(markdown.contains("## Curve Fitting"));
        assert!(markdown.contains("`I = bt^3/12`"));
        assert!(markdown.contains("**Total Equations:** 17"));
        assert!(markdown.contains("**Categories:** 4"));
        assert!(markdown.contains("equations/beam.rs"));
    }
}
