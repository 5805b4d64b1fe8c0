//! # Beam Deflection Formulas
//!
//! Closed-form Euler-Bernoulli deflection formulas for a prismatic beam with
//! constant flexural rigidity EI.
//!
//! ## Notation
//!
//! - `L` = Span length
//! - `x` = Position along beam from the fixed end (cantilever) or left support
//! - `a` = Load position from the same origin
//! - `P` = Point load magnitude
//! - `w` = Uniform load intensity (force per unit length)
//! - `y` = Deflection
//! - `E` = Young's modulus
//! - `I` = Second moment of area
//!
//! ## Sign Convention
//!
//! Loads and deflections share one axis: a negative (downward) load gives a
//! negative (downward) deflection. Nothing in this module flips signs.
//!
//! ## References
//!
//! - Roark's Formulas for Stress and Strain, 8th Edition, Table 8.1
//! - Gere & Goodno, Mechanics of Materials, Appendix G

// =============================================================================
// CANTILEVER FORMULAS
// Fixed at x = 0, free at x = L
// =============================================================================

/// Deflection at position x for a cantilever with point load P at position a
///
/// ```text
///    ▌         P
///    ▌         ↓
///    ▌═════════╪══════════
///    ▌←── a ──→
///    ▌←──────── L ───────→
/// ```
///
/// # Formulas (Roark's Table 8.1, Case 1a)
///
/// For x ≤ a:
/// ```text
/// y(x) = P x² (3a - x) / (6EI)
/// ```
///
/// For x > a (the unloaded segment stays straight):
/// ```text
/// y(x) = P a² (3x - a) / (6EI)
/// ```
#[inline]
pub fn cantilever_point_deflection(p: f64, a: f64, x: f64, e: f64, i: f64) -> f64 {
    if x <= a {
        p * x * x * (3.0 * a - x) / (6.0 * e * i)
    } else {
        cantilever_point_linear_continuation(p, a, x, e, i)
    }
}

/// Straight-line continuation of a cantilever point-load curve
///
/// Beyond the load point the blade carries no moment, so it follows the
/// tangent at x = a:
/// ```text
/// y(x) = P a² (3x - a) / (6EI)
/// ```
///
/// Evaluated for any x, including x < a where it is only the extrapolated line.
#[inline]
pub fn cantilever_point_linear_continuation(p: f64, a: f64, x: f64, e: f64, i: f64) -> f64 {
    p * a * a * (3.0 * x - a) / (6.0 * e * i)
}

/// Free-end deflection of a cantilever with point load P at position a
///
/// # Formula
/// ```text
/// y_max = P a² (3L - a) / (6EI)   at x = L
/// ```
#[inline]
pub fn cantilever_point_max_deflection(p: f64, a: f64, l: f64, e: f64, i: f64) -> f64 {
    p * a * a * (3.0 * l - a) / (6.0 * e * i)
}

/// Deflection at position x for a cantilever with point load P at the free end
///
/// # Formula (Roark's Table 8.1, Case 1a with a = L)
/// ```text
/// y(x) = P x² (3L - x) / (6EI)
/// ```
#[inline]
pub fn cantilever_tip_deflection(p: f64, l: f64, x: f64, e: f64, i: f64) -> f64 {
    p * x * x * (3.0 * l - x) / (6.0 * e * i)
}

/// Free-end deflection of a cantilever with point load P at the free end
///
/// # Formula
/// ```text
/// y_max = P L³ / (3EI)
/// ```
#[inline]
pub fn cantilever_tip_max_deflection(p: f64, l: f64, e: f64, i: f64) -> f64 {
    p * l.powi(3) / (3.0 * e * i)
}

/// Deflection at position x for a cantilever under uniform load w
///
/// ```text
///    ▌↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ w
///    ▌═════════════════════
///    ▌←──────── L ───────→
/// ```
///
/// # Formula (Roark's Table 8.1, Case 2a)
/// ```text
/// y(x) = w x² (x² + 6L² - 4Lx) / (24EI)
/// ```
#[inline]
pub fn cantilever_uniform_deflection(w: f64, l: f64, x: f64, e: f64, i: f64) -> f64 {
    w * x * x * (x * x + 6.0 * l * l - 4.0 * l * x) / (24.0 * e * i)
}

/// Free-end deflection of a cantilever under uniform load w
///
/// # Formula
/// ```text
/// y_max = w L⁴ / (8EI)
/// ```
#[inline]
pub fn cantilever_uniform_max_deflection(w: f64, l: f64, e: f64, i: f64) -> f64 {
    w * l.powi(4) / (8.0 * e * i)
}

// =============================================================================
// SIMPLY-SUPPORTED FORMULAS
// Pin at x = 0, roller at x = L
// =============================================================================

/// Deflection at position x for a simply-supported beam with point load P at a
///
/// # Formulas (Roark's Table 8.1, Case 1e)
///
/// For x ≤ a:
/// ```text
/// y(x) = P b x (L² - b² - x²) / (6EIL)
/// ```
///
/// For x > a:
/// ```text
/// y(x) = P a (L - x) (2Lx - x² - a²) / (6EIL)
/// ```
///
/// where b = L - a
#[inline]
pub fn simply_supported_point_deflection(p: f64, a: f64, l: f64, x: f64, e: f64, i: f64) -> f64 {
    let b = l - a;
    let ei = e * i;

    if x <= a {
        p * b * x * (l * l - b * b - x * x) / (6.0 * ei * l)
    } else {
        p * a * (l - x) * (2.0 * l * x - x * x - a * a) / (6.0 * ei * l)
    }
}

/// Maximum deflection of a simply-supported beam with point load P at a
///
/// The maximum lies in the longer segment, at x = √((L² - b²)/3) measured from
/// the far support, where b is the shorter of a and L - a:
/// ```text
/// y_max = P b (L² - b²)^(3/2) / (9√3 EIL)
/// ```
///
/// For a = L/2 this reduces to P L³ / (48EI).
#[inline]
pub fn simply_supported_point_max_deflection(p: f64, a: f64, l: f64, e: f64, i: f64) -> f64 {
    let b = a.min(l - a);
    p * b * (l * l - b * b).powf(1.5) / (9.0 * 3.0_f64.sqrt() * e * i * l)
}

/// Deflection at position x for a simply-supported beam under uniform load w
///
/// # Formula (Roark's Table 8.1, Case 2e)
/// ```text
/// y(x) = w x (L³ - 2Lx² + x³) / (24EI)
/// ```
#[inline]
pub fn simply_supported_uniform_deflection(w: f64, l: f64, x: f64, e: f64, i: f64) -> f64 {
    w * x * (l.powi(3) - 2.0 * l * x * x + x.powi(3)) / (24.0 * e * i)
}

/// Maximum deflection of a simply-supported beam under uniform load (midspan)
///
/// # Formula
/// ```text
/// y_max = 5 w L⁴ / (384EI)
/// ```
#[inline]
pub fn simply_supported_uniform_max_deflection(w: f64, l: f64, e: f64, i: f64) -> f64 {
    5.0 * w * l.powi(4) / (384.0 * e * i)
}

// =============================================================================
// UNIT TESTS
// =============================================================================
