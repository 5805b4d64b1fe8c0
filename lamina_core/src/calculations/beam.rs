//! # Blade Model
//!
//! Input parameters for a thin prismatic blade: geometry, stiffness, the
//! applied point load and the self-weight line load.
//!
//! ## Assumptions
//!
//! - Solid rectangular section, bending through the thickness
//! - Linear elastic material, small deflections (Euler-Bernoulli)
//! - Cantilever (fixed at x = 0) unless `support` says otherwise
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::calculations::beam::BeamInput;
//!
//! let blade = BeamInput::default();
//! blade.validate().unwrap();
//!
//! // 50 mm x 1 mm section
//! assert!((blade.moment_of_inertia_m4() - 4.1666666e-12).abs() < 1e-18);
//! ```

use serde::{Deserialize, Serialize};

use crate::equations::section::{rectangular_area, rectangular_moment_of_inertia, self_weight_line_load};
use crate::errors::{CalcError, CalcResult};
use crate::materials::Material;
use crate::units::STANDARD_GRAVITY;

/// Boundary conditions of the blade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Support {
    /// Fixed at x = 0, free at x = L
    #[default]
    Cantilever,
    /// Pin at x = 0, roller at x = L
    SimplySupported,
}

impl Support {
    pub fn display_name(&self) -> &'static str {
        match self {
            Support::Cantilever => "Cantilever",
            Support::SimplySupported => "Simply supported",
        }
    }
}

/// How the self-weight line load is specified
///
/// ## JSON
///
/// ```json
/// { "LineLoad": { "n_per_m": -0.1 } }
/// { "FromDensity": { "density_kg_m3": 7850.0 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelfWeight {
    /// Signed line load (N/m), negative = downward
    LineLoad { n_per_m: f64 },
    /// Derived from density as -(rho g b t)
    FromDensity { density_kg_m3: f64 },
}

impl Default for SelfWeight {
    fn default() -> Self {
        SelfWeight::LineLoad { n_per_m: -0.1 }
    }
}

/// Input parameters for one blade case.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Blade",
///   "length_m": 0.3,
///   "width_m": 0.05,
///   "thickness_m": 0.001,
///   "youngs_modulus_pa": 270000000000.0,
///   "point_load_n": -2.0,
///   "self_weight": { "LineLoad": { "n_per_m": -0.1 } },
///   "support": "Cantilever",
///   "load_position_ratio": 0.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamInput {
    /// User label for this case
    pub label: String,

    /// Blade length L (m)
    pub length_m: f64,

    /// Section width b (m)
    pub width_m: f64,

    /// Section thickness t (m), the bending depth
    pub thickness_m: f64,

    /// Young's modulus E (Pa)
    pub youngs_modulus_pa: f64,

    /// Point load P (N), negative = downward
    pub point_load_n: f64,

    /// Self-weight line load
    #[serde(default)]
    pub self_weight: SelfWeight,

    /// Boundary conditions
    #[serde(default)]
    pub support: Support,

    /// Position of the intermediate point load as a fraction of L
    #[serde(default = "default_load_position_ratio")]
    pub load_position_ratio: f64,

    /// Material preset the stiffness came from, for reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
}

fn default_load_position_ratio() -> f64 {
    0.5
}

impl Default for BeamInput {
    fn default() -> Self {
        BeamInput {
            label: "Blade".to_string(),
            length_m: 0.3,
            width_m: 0.05,
            thickness_m: 0.001,
            youngs_modulus_pa: 2.7e11,
            point_load_n: -2.0,
            self_weight: SelfWeight::default(),
            support: Support::Cantilever,
            load_position_ratio: default_load_position_ratio(),
            material: None,
        }
    }
}

impl BeamInput {
    /// Take stiffness and self-weight from a material preset.
    pub fn with_material(mut self, material: Material) -> Self {
        let props = material.properties();
        self.youngs_modulus_pa = props.youngs_modulus_pa;
        self.self_weight = SelfWeight::FromDensity {
            density_kg_m3: props.density_kg_m3,
        };
        self.material = Some(material);
        self
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        positive("length_m", self.length_m, "Length must be positive")?;
        positive("width_m", self.width_m, "Width must be positive")?;
        positive("thickness_m", self.thickness_m, "Thickness must be positive")?;
        positive("youngs_modulus_pa", self.youngs_modulus_pa, "Young's modulus must be positive")?;

        if !self.point_load_n.is_finite() {
            return Err(CalcError::invalid_input(
                "point_load_n",
                self.point_load_n.to_string(),
                "Point load must be finite",
            ));
        }

        match self.self_weight {
            SelfWeight::LineLoad { n_per_m } if !n_per_m.is_finite() => {
                return Err(CalcError::invalid_input(
                    "self_weight.n_per_m",
                    n_per_m.to_string(),
                    "Line load must be finite",
                ));
            }
            SelfWeight::FromDensity { density_kg_m3 } if !(density_kg_m3.is_finite() && density_kg_m3 >= 0.0) => {
                return Err(CalcError::invalid_input(
                    "self_weight.density_kg_m3",
                    density_kg_m3.to_string(),
                    "Density must be zero or positive",
                ));
            }
            _ => {}
        }

        let ratio = self.load_position_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(CalcError::invalid_input(
                "load_position_ratio",
                ratio.to_string(),
                "Load position must be in (0, 1] as a fraction of the length",
            ));
        }

        Ok(())
    }

    /// Cross-sectional area A = bt (m^2)
    pub fn area_m2(&self) -> f64 {
        rectangular_area(self.width_m, self.thickness_m)
    }

    /// Second moment of area I = bt^3/12 (m^4)
    pub fn moment_of_inertia_m4(&self) -> f64 {
        rectangular_moment_of_inertia(self.width_m, self.thickness_m)
    }

    /// Flexural rigidity EI (N m^2)
    pub fn flexural_rigidity_nm2(&self) -> f64 {
        self.youngs_modulus_pa * self.moment_of_inertia_m4()
    }

    /// Distance a from x = 0 to the intermediate point load (m)
    pub fn load_position_m(&self) -> f64 {
        self.load_position_ratio * self.length_m
    }

    /// Signed self-weight line load w (N/m), negative = downward
    pub fn self_weight_n_per_m(&self) -> f64 {
        match self.self_weight {
            SelfWeight::LineLoad { n_per_m } => n_per_m,
            SelfWeight::FromDensity { density_kg_m3 } => {
                -self_weight_line_load(density_kg_m3, self.area_m2(), STANDARD_GRAVITY)
            }
        }
    }
}

fn positive(field: &str, value: f64, reason: &str) -> CalcResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_blade() {
        let blade = BeamInput::default();
        assert!(blade.validate().is_ok());
        assert_relative_eq!(blade.load_position_m(), 0.15);
        assert_relative_eq!(blade.flexural_rigidity_nm2(), 1.125, max_relative = 1e-12);
        assert_eq!(blade.self_weight_n_per_m(), -0.1);
    }

    #[test]
    fn test_invalid_thickness() {
        let blade = BeamInput {
            thickness_m: 0.0,
            ..Default::default()
        };
        let err = blade.validate().unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "thickness_m"));
    }

    #[test]
    fn test_nan_rejected() {
        let blade = BeamInput {
            point_load_n: f64::NAN,
            ..Default::default()
        };
        assert!(blade.validate().is_err());

        let blade = BeamInput {
            length_m: f64::INFINITY,
            ..Default::default()
        };
        assert!(blade.validate().is_err());
    }

    #[test]
    fn test_load_position_bounds() {
        let at_tip = BeamInput {
            load_position_ratio: 1.0,
            ..Default::default()
        };
        assert!(at_tip.validate().is_ok());

        let at_root = BeamInput {
            load_position_ratio: 0.0,
            ..Default::default()
        };
        assert!(at_root.validate().is_err());
    }

    #[test]
    fn test_self_weight_from_material() {
        let blade = BeamInput::default().with_material(Material::Steel);
        assert_eq!(blade.youngs_modulus_pa, 200e9);
        // 7850 * 9.80665 * 5e-5 = 3.849 N/m downward
        assert_relative_eq!(blade.self_weight_n_per_m(), -3.849_110_125, max_relative = 1e-9);
        assert_eq!(blade.material, Some(Material::Steel));
    }

    #[test]
    fn test_json_defaults_fill_optional_fields() {
        let json = r#"{
            "label": "B",
            "length_m": 0.2,
            "width_m": 0.02,
            "thickness_m": 0.0005,
            "youngs_modulus_pa": 2.0e11,
            "point_load_n": -1.0
        }"#;
        let blade: BeamInput = serde_json::from_str(json).unwrap();
        assert_eq!(blade.support, Support::Cantilever);
        assert_eq!(blade.load_position_ratio, 0.5);
        assert_eq!(blade.self_weight, SelfWeight::LineLoad { n_per_m: -0.1 });
        assert!(blade.material.is_none());
    }
}
