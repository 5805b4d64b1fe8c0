//! # lamina_core - Blade Deflection Engine
//!
//! `lamina_core` computes the deflection of thin rectangular blades under a
//! point load and their own weight, fits polynomials to the resulting curves
//! and renders the whole study to PDF. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Traceable**: Every formula is registered with its reference
//!
//! ## Quick Start
//!
//! ```rust
//! use lamina_core::calculations::{calculate, BeamInput};
//!
//! let result = calculate(&BeamInput::default(), 50).unwrap();
//! println!("Tip load: {:.5} m", result.max.tip_load_m);
//!
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("tip_load_m"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Deflection curves, curve fits, ideal beam comparison
//! - [`equations`] - Closed-form formulas and the equation registry
//! - [`charts`] - Chart model rendered into reports
//! - [`pdf`] - Typst-based PDF reports
//! - [`study`] - Study container, metadata and settings
//! - [`file_io`] - Atomic study saves and versioned loads
//! - [`materials`] - Material presets
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod charts;
pub mod equations;
pub mod errors;
pub mod file_io;
pub mod materials;
pub mod pdf;
pub mod study;
pub mod units;

pub use errors::{CalcError, CalcResult};
pub use file_io::{load_study, save_study};
pub use study::{Study, StudyMetadata, StudySettings};
