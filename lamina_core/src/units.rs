//! # Unit Types
//!
//! Type-safe wrappers for SI engineering units. Calculations run on plain
//! `f64` values in base SI units (m, N, Pa); these newtypes mark the
//! conversions made for display (mm, GPa, mm^4).
//!
//! ## Base Units
//!
//! - Length: metres (m), millimetres (mm)
//! - Modulus: pascals (Pa), gigapascals (GPa)
//! - Second moment of area: m^4, mm^4
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::units::{Meters, Millimeters};
//!
//! let deflection = Meters(-0.0125);
//! let shown: Millimeters = deflection.into();
//! assert!((shown.0 + 12.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Standard gravity (m/s^2), used to turn density into self-weight
pub const STANDARD_GRAVITY: f64 = 9.80665;

// ============================================================================
// Length Units
// ============================================================================

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress or modulus in pascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pascals(pub f64);

/// Stress or modulus in gigapascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gigapascals(pub f64);

impl From<Pascals> for Gigapascals {
    fn from(pa: Pascals) -> Self {
        Gigapascals(pa.0 / 1e9)
    }
}

// ============================================================================
// Section Properties
// ============================================================================

/// Second moment of area in m^4
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct M4(pub f64);

/// Second moment of area in mm^4
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mm4(pub f64);

impl From<M4> for Mm4 {
    fn from(m4: M4) -> Self {
        Mm4(m4.0 * 1e12)
    }
}

macro_rules! impl_value {
    ($($type:ty),*) => {
        $(
            impl $type {
                /// Get the raw f64 value
                pub fn value(self) -> f64 {
                    self.0
                }
            }
        )*
    };
}

impl_value!(Meters, Millimeters, Pascals, Gigapascals, M4, Mm4);

/// Metres to millimetres, for plotted and tabulated deflections
pub fn meters_to_mm(meters: f64) -> f64 {
    Millimeters::from(Meters(meters)).value()
}

/// Format a length in metres as millimetres with the given precision
pub fn format_mm(meters: f64, decimals: usize) -> String {
    format!("{:.*} mm", decimals, meters_to_mm(meters))
}

/// Format a modulus in pascals as gigapascals
pub fn format_gpa(pascals: f64) -> String {
    let gpa: Gigapascals = Pascals(pascals).into();
    format!("{:.1} GPa", gpa.value())
}

/// Format a second moment of area in m^4 as mm^4
pub fn format_mm4(m4: f64) -> String {
    let mm4: Mm4 = M4(m4).into();
    format!("{:.4} mm^4", mm4.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_millimeters() {
        let m = Meters(0.3);
        let mm: Millimeters = m.into();
        assert!((mm.0 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_pascals_to_gigapascals() {
        let e = Pascals(2.7e11);
        let gpa: Gigapascals = e.into();
        assert!((gpa.0 - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_moment_conversion() {
        // 50 mm x 1 mm blade: I = 50 * 1^3 / 12 mm^4
        let i = M4(0.05 * 0.001_f64.powi(3) / 12.0);
        let mm4: Mm4 = i.into();
        assert!((mm4.0 - 50.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_meters_to_mm() {
        assert!((meters_to_mm(-0.016) + 16.0).abs() < 1e-12);
        assert_eq!(meters_to_mm(0.0), 0.0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_mm(-0.0125, 2), "-12.50 mm");
        assert_eq!(format_gpa(2.7e11), "270.0 GPa");
        assert_eq!(format_mm4(0.05 * 0.001_f64.powi(3) / 12.0), "4.1667 mm^4");
    }

    #[test]
    fn test_serialization() {
        let l = Meters(0.3);
        let json = serde_json::to_string(&l).unwrap();
        assert_eq!(json, "0.3");

        let roundtrip: Meters = serde_json::from_str(&json).unwrap();
        assert_eq!(l, roundtrip);
    }
}
