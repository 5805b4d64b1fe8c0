//! # Error Types
//!
//! Structured error types for lamina_core. Every variant carries enough
//! context (field names, values, paths) to explain what went wrong without
//! a debugger, and serializes to tagged JSON for machine consumers.
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_m: f64) -> CalcResult<()> {
//!     if length_m <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "length_m".to_string(),
//!             value: length_m.to_string(),
//!             reason: "Length must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for lamina_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Calculation failed (singular fit, degenerate data, etc.)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (report compilation, etc.)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("thickness_m", "-0.001", "Thickness must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::internal("boom").error_code(), "INTERNAL_ERROR");
        assert_eq!(
            CalcError::calculation_failed("Polynomial fit", "singular").error_code(),
            "CALCULATION_FAILED"
        );
    }

    #[test]
    fn test_display_includes_context() {
        let error = CalcError::file_error("open", "/tmp/missing.lam", "not found");
        let text = error.to_string();
        assert!(text.contains("open"));
        assert!(text.contains("/tmp/missing.lam"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let error: CalcError = parse_err.into();
        assert_eq!(error.error_code(), "SERIALIZATION_ERROR");
    }
}
