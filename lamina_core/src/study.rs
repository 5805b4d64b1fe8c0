//! # Study Data Structures
//!
//! A `Study` groups blade cases that share report metadata and analysis
//! settings. Studies serialize to `.lam` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Study
//! ├── meta: StudyMetadata (version, engineer, job info, timestamps)
//! ├── settings: StudySettings (samples, fit degrees, display precision)
//! └── cases: HashMap<Uuid, BeamInput>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::calculations::BeamInput;
//! use lamina_core::study::Study;
//!
//! let mut study = Study::new("Jane Engineer", "26-014", "Blade stiffness");
//! study.add_case(BeamInput::default());
//!
//! let json = serde_json::to_string_pretty(&study).unwrap();
//! assert!(json.contains("Blade stiffness"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::curve_fit::DEFAULT_FIT_DEGREES;
use crate::calculations::deflection::DEFAULT_SAMPLES;
use crate::calculations::BeamInput;
use crate::errors::{CalcError, CalcResult};

/// Current schema version for .lam files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// File extension for study files
pub const STUDY_EXTENSION: &str = "lam";

/// Root study container, serialized to `.lam` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub meta: StudyMetadata,

    #[serde(default)]
    pub settings: StudySettings,

    /// Blade cases, keyed by UUID
    pub cases: HashMap<Uuid, BeamInput>,
}

impl Study {
    /// Create a new empty study.
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Study {
            meta: StudyMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                title: title.into(),
                created: now,
                modified: now,
            },
            settings: StudySettings::default(),
            cases: HashMap::new(),
        }
    }

    /// A study holding only the default blade, used by `lamina init`.
    pub fn with_default_case(engineer: impl Into<String>, job_id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut study = Study::new(engineer, job_id, title);
        study.add_case(BeamInput::default());
        study
    }

    /// Add a case and return its UUID.
    pub fn add_case(&mut self, case: BeamInput) -> Uuid {
        let id = Uuid::new_v4();
        self.cases.insert(id, case);
        self.touch();
        id
    }

    /// Remove a case by UUID.
    pub fn remove_case(&mut self, id: &Uuid) -> Option<BeamInput> {
        let case = self.cases.remove(id);
        if case.is_some() {
            self.touch();
        }
        case
    }

    pub fn get_case(&self, id: &Uuid) -> Option<&BeamInput> {
        self.cases.get(id)
    }

    /// Find a case by its label (first match in label order).
    pub fn find_case(&self, label: &str) -> Option<&BeamInput> {
        self.sorted_cases().into_iter().find(|case| case.label == label)
    }

    /// Cases ordered by label, for stable output.
    pub fn sorted_cases(&self) -> Vec<&BeamInput> {
        let mut cases: Vec<&BeamInput> = self.cases.values().collect();
        cases.sort_by(|a, b| a.label.cmp(&b.label));
        cases
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for Study {
    fn default() -> Self {
        Study::new("", "", "")
    }
}

/// Study metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub engineer: String,
    pub job_id: String,
    /// Report title
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Analysis settings shared by every case in a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySettings {
    /// Stations along the blade, 0 to L inclusive
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Polynomial degrees fitted to the midspan load curve
    #[serde(default = "default_fit_degrees")]
    pub fit_degrees: Vec<usize>,

    /// Decimal places for printed deflections (in metres)
    #[serde(default = "default_display_decimals")]
    pub display_decimals: usize,
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

fn default_fit_degrees() -> Vec<usize> {
    DEFAULT_FIT_DEGREES.to_vec()
}

fn default_display_decimals() -> usize {
    5
}

impl Default for StudySettings {
    fn default() -> Self {
        StudySettings {
            samples: default_samples(),
            fit_degrees: default_fit_degrees(),
            display_decimals: default_display_decimals(),
        }
    }
}

impl StudySettings {
    pub fn validate(&self) -> CalcResult<()> {
        if self.samples < 2 {
            return Err(CalcError::invalid_input(
                "samples",
                self.samples.to_string(),
                "At least 2 sample points are required",
            ));
        }
        if self.fit_degrees.is_empty() {
            return Err(CalcError::invalid_input(
                "fit_degrees",
                "[]",
                "At least one fit degree is required",
            ));
        }
        if let Some(&degree) = self.fit_degrees.iter().find(|&&d| d >= self.samples) {
            return Err(CalcError::invalid_input(
                "fit_degrees",
                degree.to_string(),
                format!("Degree must be below the sample count ({})", self.samples),
            ));
        }
        if self.display_decimals > 12 {
            return Err(CalcError::invalid_input(
                "display_decimals",
                self.display_decimals.to_string(),
                "At most 12 decimal places",
            ));
        }
        Ok(())
    }
}
