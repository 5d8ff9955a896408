//! Artifact persistence: the training/serving handoff.
//!
//! Training writes the scaler, one file per model, the performance
//! report, and the feature importances into a single directory. The
//! write is staged and swapped in by rename, so a reader never sees a
//! half-written artifact set. Serving reads the directory once at
//! startup and never writes it.

use crate::error::{PedonError, Result};
use crate::metrics::PerformanceReport;
use crate::preprocessing::StandardScaler;
use crate::regressor::Regressor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Scaler artifact file name.
pub const SCALER_FILE: &str = "scaler.json";
/// Performance report file name.
pub const PERFORMANCE_FILE: &str = "performance.json";
/// Gradient boosting feature importance file name.
pub const IMPORTANCE_FILE: &str = "feature_importance.json";

/// Artifact file name for a model, derived from its external name.
#[must_use]
pub fn model_file(name: &str) -> String {
    format!("{name}.json")
}

/// Everything the serving pipeline needs, loaded from disk.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    /// Fitted scaler
    pub scaler: StandardScaler,
    /// All four fitted models, roster order
    pub models: Vec<Regressor>,
}

/// Reads and writes one artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store for the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the artifact directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sibling path built by appending to the directory's final
    /// component, so `models` and `models.v2` never share a staging
    /// location.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .dir
            .file_name()
            .map_or_else(|| std::ffi::OsString::from("artifacts"), ToOwned::to_owned);
        name.push(suffix);
        self.dir.with_file_name(name)
    }

    fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(dir.join(name), json)?;
        Ok(())
    }

    /// Persists a complete artifact set atomically.
    ///
    /// All files are written to a staging sibling of the target
    /// directory; the staging directory then replaces the target by
    /// rename. A previous artifact set is either fully replaced or
    /// left intact.
    ///
    /// # Errors
    ///
    /// Returns an error on any I/O or serialization failure.
    pub fn save(
        &self,
        scaler: &StandardScaler,
        models: &[Regressor],
        report: &PerformanceReport,
        importances: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let staging = self.sibling(".staging");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        Self::write_json(&staging, SCALER_FILE, scaler)?;
        for model in models {
            Self::write_json(&staging, &model_file(model.name()), model)?;
        }
        Self::write_json(&staging, PERFORMANCE_FILE, report)?;
        Self::write_json(&staging, IMPORTANCE_FILE, importances)?;

        // Swap in: move the old set aside, rename staging into place,
        // then drop the old set.
        let old = self.sibling(".old");
        if old.exists() {
            fs::remove_dir_all(&old)?;
        }
        if self.dir.exists() {
            fs::rename(&self.dir, &old)?;
        }
        fs::rename(&staging, &self.dir)?;
        if old.exists() {
            fs::remove_dir_all(&old)?;
        }
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        name: &str,
        missing: &mut Vec<String>,
    ) -> Option<T> {
        let path = self.dir.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => {
                missing.push(name.to_string());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(_) => {
                missing.push(name.to_string());
                None
            }
        }
    }

    /// Loads the scaler and all four models.
    ///
    /// Every required file is attempted before failing, so the error
    /// names the complete set of missing or unreadable artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`PedonError::ArtifactLoad`] if any required artifact
    /// is missing or corrupt.
    pub fn load(&self) -> Result<ArtifactSet> {
        let mut missing = Vec::new();

        let scaler: Option<StandardScaler> = self.read_json(SCALER_FILE, &mut missing);
        let models: Vec<Option<Regressor>> = crate::regressor::MODEL_NAMES
            .iter()
            .map(|name| self.read_json(&model_file(name), &mut missing))
            .collect();

        if !missing.is_empty() {
            return Err(PedonError::ArtifactLoad {
                dir: self.dir.clone(),
                missing,
            });
        }

        // All files were readable at this point.
        let scaler =
            scaler.ok_or_else(|| PedonError::prediction("scaler missing after load"))?;
        let models: Vec<Regressor> = models.into_iter().flatten().collect();

        Ok(ArtifactSet { scaler, models })
    }

    /// Loads the persisted performance report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is missing or unreadable.
    pub fn load_report(&self) -> Result<PerformanceReport> {
        let contents = fs::read_to_string(self.dir.join(PERFORMANCE_FILE))?;
        Ok(serde_json::from_str(&contents)?)
    }
}
