//! # Materials
//!
//! Linear-elastic material presets for thin blades and strips. A material
//! supplies Young's modulus for the flexural rigidity and a density from
//! which the blade's self-weight line load can be derived.
//!
//! ## JSON Serialization
//!
//! ```json
//! { "type": "SpringSteel" }
//! { "type": "Custom", "youngs_modulus_pa": 2.7e11, "density_kg_m3": 7850.0 }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::materials::Material;
//!
//! let steel: Material = "steel".parse().unwrap();
//! let props = steel.properties();
//! assert_eq!(props.youngs_modulus_pa, 200e9);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Elastic properties used by the deflection formulas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticProperties {
    /// Young's modulus E (Pa)
    pub youngs_modulus_pa: f64,
    /// Mass density (kg/m^3)
    pub density_kg_m3: f64,
}

/// Material presets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Material {
    /// Structural carbon steel
    Steel,
    /// Austenitic stainless steel (304)
    StainlessSteel,
    /// Hardened spring steel strip
    SpringSteel,
    /// Aluminium alloy (6061-T6)
    Aluminum,
    /// Cartridge brass
    Brass,
    /// Titanium alloy (Ti-6Al-4V)
    Titanium,
    /// User-defined properties
    Custom {
        youngs_modulus_pa: f64,
        density_kg_m3: f64,
    },
}

impl Material {
    /// Reference elastic properties for this material
    pub fn properties(&self) -> ElasticProperties {
        let (youngs_modulus_pa, density_kg_m3) = match self {
            Material::Steel => (200e9, 7850.0),
            Material::StainlessSteel => (193e9, 8000.0),
            Material::SpringSteel => (210e9, 7850.0),
            Material::Aluminum => (68.9e9, 2700.0),
            Material::Brass => (110e9, 8530.0),
            Material::Titanium => (113.8e9, 4430.0),
            Material::Custom {
                youngs_modulus_pa,
                density_kg_m3,
            } => (*youngs_modulus_pa, *density_kg_m3),
        };
        ElasticProperties {
            youngs_modulus_pa,
            density_kg_m3,
        }
    }

    /// Human-readable name for reports
    pub fn display_name(&self) -> String {
        match self {
            Material::Steel => "Steel".to_string(),
            Material::StainlessSteel => "Stainless steel 304".to_string(),
            Material::SpringSteel => "Spring steel".to_string(),
            Material::Aluminum => "Aluminium 6061-T6".to_string(),
            Material::Brass => "Brass".to_string(),
            Material::Titanium => "Ti-6Al-4V".to_string(),
            Material::Custom {
                youngs_modulus_pa, ..
            } => format!("Custom (E = {:.3e} Pa)", youngs_modulus_pa),
        }
    }

    /// Names accepted by [`FromStr`]
    pub fn preset_names() -> &'static [&'static str] {
        &["steel", "stainless", "spring-steel", "aluminum", "brass", "titanium"]
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Material {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steel" => Ok(Material::Steel),
            "stainless" | "stainless-steel" | "304" => Ok(Material::StainlessSteel),
            "spring-steel" | "spring" => Ok(Material::SpringSteel),
            "aluminum" | "aluminium" | "6061" => Ok(Material::Aluminum),
            "brass" => Ok(Material::Brass),
            "titanium" | "ti-6al-4v" => Ok(Material::Titanium),
            other => Err(CalcError::invalid_input(
                "material",
                other,
                format!("Unknown material, expected one of: {}", Material::preset_names().join(", ")),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presets() {
        for name in Material::preset_names() {
            assert!(name.parse::<Material>().is_ok(), "preset '{}' should parse", name);
        }
        assert_eq!("Aluminium".parse::<Material>().unwrap(), Material::Aluminum);
    }

    #[test]
    fn test_unknown_material() {
        let err = "unobtainium".parse::<Material>().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_custom_properties() {
        let mat = Material::Custom {
            youngs_modulus_pa: 2.7e11,
            density_kg_m3: 7900.0,
        };
        let props = mat.properties();
        assert_eq!(props.youngs_modulus_pa, 2.7e11);
        assert_eq!(props.density_kg_m3, 7900.0);
    }

    #[test]
    fn test_material_serialization() {
        let json = serde_json::to_string(&Material::SpringSteel).unwrap();
        assert_eq!(json, r#"{"type":"SpringSteel"}"#);

        let custom = Material::Custom {
            youngs_modulus_pa: 1e9,
            density_kg_m3: 1000.0,
        };
        let roundtrip: Material = serde_json::from_str(&serde_json::to_string(&custom).unwrap()).unwrap();
        assert_eq!(custom, roundtrip);
    }
}
