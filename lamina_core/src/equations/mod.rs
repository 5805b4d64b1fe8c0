//! # Beam Equations
//!
//! All closed-form formulas used by the deflection study live here, so they
//! can be checked against their references in one place.
//!
//! ## Modules
//!
//! - [`beam`] - Cantilever and simply-supported deflection formulas
//! - [`section`] - Rectangular section properties and self-weight
//! - [`registry`] - Equation metadata and tracking for the report appendix
//!
//! ## Sign Convention
//!
//! Loads and deflections share one vertical axis: a negative (downward) load
//! gives a negative (downward) deflection.
//!
//! ## References
//!
//! - Roark's Formulas for Stress and Strain, 8th Edition
//! - Gere & Goodno, Mechanics of Materials

pub mod beam;
pub mod registry;
pub mod section;

pub use beam::{
    // Cantilever formulas
    cantilever_point_deflection,
    cantilever_point_linear_continuation,
    cantilever_point_max_deflection,
    cantilever_tip_deflection,
    cantilever_tip_max_deflection,
    cantilever_uniform_deflection,
    cantilever_uniform_max_deflection,
    // Simply-supported formulas
    simply_supported_point_deflection,
    simply_supported_point_max_deflection,
    simply_supported_uniform_deflection,
    simply_supported_uniform_max_deflection,
};

pub use section::{rectangular_area, rectangular_moment_of_inertia, self_weight_line_load};

pub use registry::{
    CodeReference,
    Equation,
    EquationCategory,
    EquationMetadata,
    EquationTracker,
    EquationUsage,
    Variable,
    ALL_EQUATIONS,
    generate_equations_markdown,
    generate_static_equations_appendix_typst,
};
