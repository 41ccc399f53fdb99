use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the funding dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// No source workbook could be located. Fatal at startup.
    #[error("No workbook found (searched: {searched})")]
    WorkbookMissing { searched: String },

    /// The workbook exists but could not be opened or parsed.
    #[error("Failed to read workbook {path}: {message}")]
    WorkbookRead { path: PathBuf, message: String },

    /// An expected sheet is absent from the workbook. Non-fatal; the
    /// corresponding dataset is skipped.
    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    /// A mapping table is internally inconsistent.
    #[error("Invalid schema for '{dataset}': {message}")]
    InvalidSchema { dataset: String, message: String },

    /// A filter or aggregation referenced a field the dataset does not have.
    #[error("Unknown field '{field}' for dataset '{dataset}'")]
    UnknownField { dataset: String, field: String },

    /// CSV serialization failure from the exporter.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Pass-through for raw I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Build a [`DashboardError::WorkbookMissing`] from the candidate paths
    /// that were checked.
    pub fn workbook_missing(searched: &[PathBuf]) -> Self {
        let joined = searched
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        DashboardError::WorkbookMissing { searched: joined }
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
