use std::path::{Path, PathBuf};

use funding_data::workbook::find_workbook_files;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.funding-dashboard/` directory hierarchy exists.
///
/// Creates the following directories if absent (including missing parents):
/// - `~/.funding-dashboard/`
/// - `~/.funding-dashboard/exports/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let dashboard_dir = home.join(".funding-dashboard");
    std::fs::create_dir_all(&dashboard_dir)?;
    std::fs::create_dir_all(dashboard_dir.join("exports"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` uses Python-style level names which are mapped to `tracing`
/// directives; unrecognised values fall back to `"info"`. All output goes to
/// stderr so reports on stdout stay clean.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let upper = log_level.to_uppercase();
    let directive = match upper.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Workbook discovery ─────────────────────────────────────────────────────────

/// Candidate locations checked when no `--file` argument is given, in order.
pub fn workbook_search_locations() -> Vec<PathBuf> {
    vec![PathBuf::from("Data.xlsx"), PathBuf::from("data")]
}

/// Locate the source workbook.
///
/// An explicit path always wins, even if it does not exist (the loader
/// reports the missing file properly). Otherwise checks `Data.xlsx` in the
/// working directory, then the first workbook file found under `./data/`.
///
/// Returns `None` when no candidate exists.
pub fn discover_workbook(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let direct = PathBuf::from("Data.xlsx");
    if direct.exists() {
        return Some(direct);
    }

    find_workbook_files(Path::new("data")).into_iter().next()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── ensure_directories ────────────────────────────────────────────────────

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");

        // Override HOME so that dirs::home_dir() resolves to our temp dir.
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories();

        // Restore HOME.
        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");

        let dashboard_dir = tmp.path().join(".funding-dashboard");
        assert!(dashboard_dir.is_dir(), ".funding-dashboard dir must exist");
        assert!(
            dashboard_dir.join("exports").is_dir(),
            "exports subdir must exist"
        );
    }

    // ── discover_workbook ─────────────────────────────────────────────────────

    #[test]
    fn test_discover_workbook_explicit_path_wins() {
        let path = PathBuf::from("/somewhere/else/Custom.xlsx");
        assert_eq!(discover_workbook(Some(&path)), Some(path));
    }

    #[test]
    fn test_discover_workbook_explicit_path_returned_even_if_absent() {
        // The loader owns the missing-file error, not discovery.
        let path = PathBuf::from("/does/not/exist.xlsx");
        assert_eq!(discover_workbook(Some(&path)), Some(path));
    }

    #[test]
    fn test_workbook_search_locations_listed_for_remediation() {
        let locations = workbook_search_locations();
        assert!(!locations.is_empty());
        assert_eq!(locations[0], PathBuf::from("Data.xlsx"));
    }
}
