//! Workbook discovery and raw sheet extraction.
//!
//! Opens the source spreadsheet with `calamine` and pulls each expected
//! funding-program sheet into a [`RawSheet`] for the normalizer. A missing
//! sheet degrades the session (the dataset is skipped with a warning); a
//! missing or unreadable workbook is fatal.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use funding_core::error::{DashboardError, Result};
use funding_core::models::ProgramKind;
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// One sheet exactly as read from the workbook: a header row plus cell rows.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub kind: ProgramKind,
    /// Source column headers, in sheet order.
    pub headers: Vec<String>,
    /// Data rows below the header row.
    pub rows: Vec<Vec<Data>>,
}

/// Everything extracted from one workbook.
#[derive(Debug)]
pub struct WorkbookData {
    pub path: PathBuf,
    /// Raw sheets for every expected sheet that was present.
    pub sheets: Vec<RawSheet>,
    /// Expected sheet names that were absent (reported, not fatal).
    pub missing_sheets: Vec<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find workbook files (`.xlsx` / `.xls`) recursively under `dir`, sorted by
/// path.
pub fn find_workbook_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        let ext = ext.to_ascii_lowercase();
                        ext == "xlsx" || ext == "xls"
                    })
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every expected funding-program sheet from the workbook at `path`.
///
/// Sheets are matched by their exact workbook name (see
/// [`ProgramKind::sheet_name`]). Absent sheets are recorded in
/// `missing_sheets` and logged; everything found is returned raw for the
/// normalizer.
pub fn load_workbook(path: &Path) -> Result<WorkbookData> {
    if !path.exists() {
        return Err(DashboardError::workbook_missing(&[path.to_path_buf()]));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| DashboardError::WorkbookRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let available = workbook.sheet_names().to_vec();
    let mut sheets = Vec::new();
    let mut missing_sheets = Vec::new();

    for kind in ProgramKind::ALL {
        let name = kind.sheet_name();
        if !available.iter().any(|s| s == name) {
            warn!("{}", DashboardError::SheetNotFound(name.to_string()));
            missing_sheets.push(name.to_string());
            continue;
        }

        let range = workbook
            .worksheet_range(name)
            .map_err(|e| DashboardError::WorkbookRead {
                path: path.to_path_buf(),
                message: format!("sheet '{}': {}", name, e),
            })?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => {
                debug!("Sheet '{}' is empty", name);
                Vec::new()
            }
        };
        let rows: Vec<Vec<Data>> = rows_iter.map(|r| r.to_vec()).collect();

        debug!(
            "Sheet '{}': {} columns, {} data rows",
            name,
            headers.len(),
            rows.len()
        );
        sheets.push(RawSheet {
            kind,
            headers,
            rows,
        });
    }

    Ok(WorkbookData {
        path: path.to_path_buf(),
        sheets,
        missing_sheets,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Render a header cell as text; non-string cells fall back to their display
/// form so numeric headers still produce a usable name.
fn header_text(cell: &Data) -> String {
    cell.as_string().unwrap_or_else(|| cell.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── find_workbook_files ───────────────────────────────────────────────────

    #[test]
    fn test_find_workbook_files_filters_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("b.xls"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = find_workbook_files(dir.path());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_find_workbook_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("archive");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(dir.path().join("z.xlsx"), b"x").unwrap();
        std::fs::write(sub.join("a.xlsx"), b"x").unwrap();

        let files = find_workbook_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_find_workbook_files_nonexistent_dir() {
        let files = find_workbook_files(Path::new("/tmp/does-not-exist-funding-test"));
        assert!(files.is_empty());
    }

    #[test]
    fn test_find_workbook_files_case_insensitive_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("DATA.XLSX"), b"x").unwrap();

        let files = find_workbook_files(dir.path());
        assert_eq!(files.len(), 1);
    }

    // ── load_workbook error paths ─────────────────────────────────────────────

    #[test]
    fn test_load_workbook_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_workbook(&dir.path().join("Data.xlsx"));
        assert!(matches!(
            result,
            Err(DashboardError::WorkbookMissing { .. })
        ));
    }

    #[test]
    fn test_load_workbook_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.xlsx");
        std::fs::write(&path, b"this is not a spreadsheet").unwrap();

        let result = load_workbook(&path);
        assert!(matches!(result, Err(DashboardError::WorkbookRead { .. })));
    }

    // ── header_text ───────────────────────────────────────────────────────────

    #[test]
    fn test_header_text_string_cell() {
        assert_eq!(header_text(&Data::String("State".into())), "State");
    }

    #[test]
    fn test_header_text_numeric_cell_falls_back_to_display() {
        assert_eq!(header_text(&Data::Int(2024)), "2024");
    }
}
