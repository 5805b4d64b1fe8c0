//! # Cross-Section Property Formulas
//!
//! Geometric properties of the solid rectangular blade section.
//!
//! ## Notation
//!
//! - `A` = Cross-sectional area
//! - `I` = Second moment of area about the bending axis
//! - `b` = Width of section (in the plane of the blade)
//! - `t` = Thickness (the bending depth)
//!
//! ## References
//!
//! - Roark's Formulas for Stress and Strain, 8th Edition, Table A.1

/// Cross-sectional area of a rectangular section
///
/// # Formula
/// A = b × t
///
/// # Example
/// ```rust
/// use lamina_core::equations::section::rectangular_area;
///
/// // 50 mm x 1 mm blade
/// let area = rectangular_area(0.05, 0.001);
/// assert!((area - 5e-5).abs() < 1e-15);
/// ```
#[inline]
pub fn rectangular_area(b: f64, t: f64) -> f64 {
    b * t
}

/// Second moment of area of a rectangular section about its centroidal axis
///
/// The blade bends through its thickness, so thickness is the cubed term:
///
/// ```text
///     ┌───────────────────────┐
///   t │═══════════════════════│ ← neutral axis at t/2
///     └───────────────────────┘
///                 b
/// ```
///
/// # Formula
/// I = b t³ / 12
///
/// # Example
/// ```rust
/// use lamina_core::equations::section::rectangular_moment_of_inertia;
///
/// let i = rectangular_moment_of_inertia(0.05, 0.001);
/// assert!((i - 4.1666666e-12).abs() < 1e-18);
/// ```
#[inline]
pub fn rectangular_moment_of_inertia(b: f64, t: f64) -> f64 {
    b * t.powi(3) / 12.0
}

/// Self-weight line load of a prismatic blade
///
/// # Formula
/// w = ρ g A
///
/// Returned as a magnitude (positive); the caller applies the sign convention.
#[inline]
pub fn self_weight_line_load(density_kg_m3: f64, area_m2: f64, gravity: f64) -> f64 {
    density_kg_m3 * gravity * area_m2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area() {
        assert!((rectangular_area(0.05, 0.002) - 1e-4).abs() < 1e-15);
    }

    #[test]
    fn test_inertia_scales_with_thickness_cubed() {
        let thin = rectangular_moment_of_inertia(0.05, 0.001);
        let thick = rectangular_moment_of_inertia(0.05, 0.002);
        assert!((thick / thin - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_weight() {
        // 7850 kg/m^3 * 9.81 * 5e-5 m^2 = 3.85 N/m
        let w = self_weight_line_load(7850.0, 5e-5, 9.81);
        assert!((w - 3.850425).abs() < 1e-6);
    }
}
