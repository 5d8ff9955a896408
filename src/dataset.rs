//! CSV dataset loading for the training pipeline.
//!
//! The training table carries eight covariate columns (terrain and
//! spectral indices) and the SOC target. Columns are selected by
//! header name, so extra columns in the file are ignored and column
//! order doesn't matter.

use crate::error::{PedonError, Result};
use crate::primitives::{Matrix, Vector};
use std::path::Path;

/// The eight covariates, in the fixed order used for every matrix row,
/// every scaler parameter vector, and every inference request.
pub const FEATURE_NAMES: [&str; 8] = [
    "TPI",
    "TRI",
    "TWI",
    "VDepth",
    "VIS",
    "NDVI_max",
    "NDVI_median",
    "NDVI_sd",
];

/// Header of the target column.
pub const TARGET_COLUMN: &str = "SOC (%)";

/// A loaded training table: feature matrix plus target vector, row
/// indices aligned.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Covariates, one row per sample, columns in [`FEATURE_NAMES`] order
    pub features: Matrix,
    /// Raw SOC target, aligned with the feature rows
    pub target: Vector,
    /// Rows discarded because a needed cell was missing or non-numeric
    pub n_dropped: usize,
}

impl Dataset {
    /// Number of usable samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.target.len()
    }
}

/// Resolves each needed column to its index, erroring with the list of
/// available headers when one is absent.
fn resolve_columns(headers: &csv::StringRecord) -> Result<(Vec<usize>, usize)> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut feature_cols = Vec::with_capacity(FEATURE_NAMES.len());
    let mut missing: Vec<&str> = Vec::new();

    for name in FEATURE_NAMES {
        match find(name) {
            Some(idx) => feature_cols.push(idx),
            None => missing.push(name),
        }
    }

    let target_col = find(TARGET_COLUMN);
    if target_col.is_none() {
        missing.push(TARGET_COLUMN);
    }

    if !missing.is_empty() {
        let available: Vec<&str> = headers.iter().map(str::trim).collect();
        return Err(PedonError::config(format!(
            "required column(s) [{}] not found; available columns: [{}]",
            missing.join(", "),
            available.join(", ")
        )));
    }

    let target_col =
        target_col.ok_or_else(|| PedonError::config("target column not found"))?;
    Ok((feature_cols, target_col))
}

fn parse_cell(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    let cell = record.get(idx)?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Loads the training table from a CSV file.
///
/// Rows with a missing or non-numeric value in any needed column are
/// dropped (and counted), matching how the training data is cleaned
/// upstream.
///
/// # Errors
///
/// Returns an error if the file can't be read, a required column is
/// absent, or no usable rows remain.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            PedonError::config(format!("cannot open dataset {}: {e}", path.display()))
        })?;

    let headers = reader.headers()?.clone();
    let (feature_cols, target_col) = resolve_columns(&headers)?;

    let mut features: Vec<f64> = Vec::new();
    let mut target: Vec<f64> = Vec::new();
    let mut n_dropped = 0;

    for record in reader.records() {
        let record = record?;

        let row: Option<Vec<f64>> = feature_cols
            .iter()
            .map(|&idx| parse_cell(&record, idx))
            .collect();
        let y = parse_cell(&record, target_col);

        match (row, y) {
            (Some(row), Some(y)) => {
                features.extend_from_slice(&row);
                target.push(y);
            }
            _ => n_dropped += 1,
        }
    }

    if target.is_empty() {
        return Err(PedonError::config(format!(
            "dataset {} has no usable rows",
            path.display()
        )));
    }

    let n_samples = target.len();
    Ok(Dataset {
        features: Matrix::from_vec(n_samples, FEATURE_NAMES.len(), features)?,
        target: Vector::from_vec(target),
        n_dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const HEADER: &str = "TPI,TRI,TWI,VDepth,VIS,NDVI_max,NDVI_median,NDVI_sd,SOC (%)";

    #[test]
    fn test_load_basic() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             0.1,0.2,8.0,12.0,0.3,0.8,0.6,0.05,2.4\n\
             -0.2,0.1,7.5,10.0,0.2,0.7,0.5,0.04,1.8\n"
        ));
        let ds = load_csv(file.path()).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_dropped, 0);
        assert_eq!(ds.features.shape(), (2, 8));
        assert_eq!(ds.target[0], 2.4);
        assert_eq!(ds.features.get(1, 2), 7.5);
    }

    #[test]
    fn test_columns_selected_by_name_not_position() {
        // Shuffled column order plus an extra column to ignore
        let file = write_csv(
            "SOC (%),NDVI_sd,TPI,TRI,TWI,VDepth,VIS,NDVI_max,NDVI_median,extra\n\
             3.0,0.05,0.1,0.2,8.0,12.0,0.3,0.8,0.6,999\n",
        );
        let ds = load_csv(file.path()).unwrap();
        assert_eq!(ds.target[0], 3.0);
        assert_eq!(ds.features.get(0, 0), 0.1); // TPI
        assert_eq!(ds.features.get(0, 7), 0.05); // NDVI_sd
    }

    #[test]
    fn test_missing_target_column_lists_available() {
        let file = write_csv(
            "TPI,TRI,TWI,VDepth,VIS,NDVI_max,NDVI_median,NDVI_sd,carbon\n\
             0.1,0.2,8.0,12.0,0.3,0.8,0.6,0.05,2.4\n",
        );
        let err = load_csv(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SOC (%)"));
        assert!(msg.contains("carbon"), "should list available columns");
    }

    #[test]
    fn test_missing_feature_column() {
        let file = write_csv(
            "TPI,TRI,TWI,VDepth,VIS,NDVI_max,NDVI_median,SOC (%)\n\
             0.1,0.2,8.0,12.0,0.3,0.8,0.6,2.4\n",
        );
        let err = load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("NDVI_sd"));
    }

    #[test]
    fn test_rows_with_bad_cells_dropped() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             0.1,0.2,8.0,12.0,0.3,0.8,0.6,0.05,2.4\n\
             0.1,,8.0,12.0,0.3,0.8,0.6,0.05,2.4\n\
             0.1,0.2,8.0,12.0,0.3,0.8,0.6,0.05,n/a\n\
             0.2,0.3,7.0,11.0,0.2,0.7,0.5,0.04,1.9\n"
        ));
        let ds = load_csv(file.path()).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_dropped, 2);
    }

    #[test]
    fn test_no_usable_rows_errors() {
        let file = write_csv(&format!("{HEADER}\n,,,,,,,,\n"));
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_nonexistent_file_is_config_error() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PedonError::Config { .. }));
    }
}
