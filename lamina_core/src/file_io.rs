//! # File I/O Module
//!
//! Study file operations:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **Version validation**: Reject files written by a newer schema
//!
//! ## File Format
//!
//! Studies are saved as `.lam` files containing pretty-printed JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lamina_core::file_io::{load_study, save_study};
//! use lamina_core::study::Study;
//! use std::path::Path;
//!
//! let study = Study::with_default_case("Engineer", "26-001", "Blade study");
//! save_study(&study, Path::new("blade.lam")).unwrap();
//!
//! let loaded = load_study(Path::new("blade.lam")).unwrap();
//! assert_eq!(loaded.case_count(), 1);
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::{CalcError, CalcResult};
use crate::study::{Study, SCHEMA_VERSION, STUDY_EXTENSION};

/// Temporary path used while saving `path`
fn tmp_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| format!("{}.tmp", STUDY_EXTENSION));
    path.with_extension(extension)
}

/// Save a study to a file with atomic write semantics.
///
/// 1. Serialize the study to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename over the target (atomic on most filesystems)
pub fn save_study(study: &Study, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(study)?;

    let tmp_path = tmp_path_for(path);
    debug!("Writing study to {}", tmp_path.display());

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!("Saved study '{}' ({} cases) to {}", study.meta.title, study.case_count(), path.display());
    Ok(())
}

/// Load a study from a file.
///
/// # Returns
///
/// * `Ok(Study)` - Successfully loaded study
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_study(path: &Path) -> CalcResult<Study> {
    let mut file = File::open(path).map_err(|e| {
        CalcError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let study: Study = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&study.meta.version)?;

    debug!("Loaded study '{}' with {} cases", study.meta.title, study.case_count());
    Ok(study)
}

/// Validate that a file version is compatible with the current schema.
///
/// The major version must match. While the schema is 0.x, a file with a
/// newer minor version is rejected too.
pub fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |v: &str| -> Option<Vec<u32>> { v.split('.').map(|p| p.parse().ok()).collect() };

    let file_parts = parse(file_version).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;
    let current_parts = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    if current_parts[0] == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BeamInput;
    use std::env::temp_dir;

    fn temp_study_path(name: &str) -> PathBuf {
        temp_dir().join(format!("lamina_test_{}.lam", name))
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(tmp_path_for(Path::new("/a/blade.lam")), Path::new("/a/blade.lam.tmp"));
        assert_eq!(tmp_path_for(Path::new("/a/blade")), Path::new("/a/blade.lam.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_study_path("roundtrip");

        let mut study = Study::new("Test Engineer", "TEST-001", "Roundtrip");
        study.add_case(BeamInput {
            label: "Thin".to_string(),
            thickness_m: 0.0005,
            ..Default::default()
        });
        save_study(&study, &path).unwrap();

        let loaded = load_study(&path).unwrap();
        assert_eq!(loaded.meta.engineer, "Test Engineer");
        assert_eq!(loaded.find_case("Thin").map(|c| c.thickness_m), Some(0.0005));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_study_path("atomic");
        let tmp_path = tmp_path_for(&path);

        save_study(&Study::default(), &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_study(&temp_study_path("does_not_exist")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_study_path("invalid_json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_study(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let path = temp_study_path("newer_schema");
        let mut study = Study::default();
        study.meta.version = "0.9.0".to_string();
        save_study(&study, &path).unwrap();

        let err = load_study(&path).unwrap_err();
        assert!(matches!(err, CalcError::VersionMismatch { .. }));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("").is_err());
        assert!(validate_version("abc").is_err());
    }
}
