//! Session assembly: one call that loads and normalizes everything.
//!
//! [`load_session`] validates the mapping tables, reads the workbook, runs
//! the normalizer over every sheet that was present and returns the
//! [`DashboardSession`] context the rest of the application works from.
//! There is no global loaded-file state anywhere; consumers receive the
//! session explicitly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use funding_core::error::Result;
use funding_core::models::{Dataset, ProgramKind};
use funding_core::schema;
use tracing::debug;

use crate::normalizer::{normalize_sheet, NormalizedSheet};
use crate::workbook::{load_workbook, WorkbookData};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the loaded session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoadMetadata {
    /// ISO-8601 timestamp when the session was loaded.
    pub generated_at: String,
    /// Number of sheets found and normalized.
    pub sheets_loaded: usize,
    /// Total records across all datasets after normalization.
    pub records_loaded: usize,
    /// Total rows dropped during normalization.
    pub rows_skipped: usize,
    /// Wall-clock seconds spent loading and normalizing.
    pub load_time_seconds: f64,
}

/// Session-scoped context holding every normalized dataset.
///
/// Built once per workbook load and discarded wholesale when a new file is
/// loaded; datasets inside are immutable.
#[derive(Debug)]
pub struct DashboardSession {
    /// The workbook the session was loaded from.
    pub source: PathBuf,
    datasets: BTreeMap<ProgramKind, Dataset>,
    /// Expected sheets that were absent from the workbook.
    pub skipped_sheets: Vec<String>,
    /// Per-dataset count of rows dropped during normalization.
    pub skipped_rows: BTreeMap<ProgramKind, usize>,
    pub metadata: LoadMetadata,
}

impl DashboardSession {
    /// The dataset for `kind`, when its sheet was present.
    pub fn dataset(&self, kind: ProgramKind) -> Option<&Dataset> {
        self.datasets.get(&kind)
    }

    /// All loaded datasets, in [`ProgramKind`] order.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }

    /// Number of loaded datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load the workbook at `path` and normalize every expected sheet.
///
/// 1. Validate all mapping tables (a bad table is a programmer error and
///    fails before any data is read).
/// 2. Read the workbook; absent sheets are recorded, not fatal.
/// 3. Normalize each raw sheet into its canonical dataset.
/// 4. Return the session context plus load metadata.
pub fn load_session(path: &Path) -> Result<DashboardSession> {
    schema::validate_all()?;
    let workbook = load_workbook(path)?;
    Ok(build_session(workbook))
}

/// Normalize every raw sheet in `workbook` into a session context.
pub fn build_session(workbook: WorkbookData) -> DashboardSession {
    let start = std::time::Instant::now();

    let mut datasets = BTreeMap::new();
    let mut skipped_rows = BTreeMap::new();
    let mut records_loaded = 0usize;
    let mut rows_skipped = 0usize;

    for raw in &workbook.sheets {
        let NormalizedSheet {
            dataset,
            skipped_rows: skipped,
            dropped_columns,
        } = normalize_sheet(raw);

        debug!(
            "Normalized '{}': {} records, {} skipped rows, {} dropped columns",
            raw.kind.sheet_name(),
            dataset.len(),
            skipped,
            dropped_columns.len()
        );

        records_loaded += dataset.len();
        rows_skipped += skipped;
        if skipped > 0 {
            skipped_rows.insert(raw.kind, skipped);
        }
        datasets.insert(raw.kind, dataset);
    }

    let metadata = LoadMetadata {
        generated_at: Utc::now().to_rfc3339(),
        sheets_loaded: datasets.len(),
        records_loaded,
        rows_skipped,
        load_time_seconds: start.elapsed().as_secs_f64(),
    };

    DashboardSession {
        source: workbook.path,
        datasets,
        skipped_sheets: workbook.missing_sheets,
        skipped_rows,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
