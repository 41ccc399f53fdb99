//! Plain-text report rendering for the dashboard views.
//!
//! Keeps stdout presentation in one place: the overview metrics block, the
//! per-dataset summary with grouped totals and the top-prospect ranking,
//! and the workbook structure inspection.

use std::fmt::Write as _;

use funding_core::formatting::{
    format_compact_currency, format_currency, format_number, truncate_label,
};
use funding_core::models::FieldType;
use funding_data::aggregator::{portfolio_totals, ViewAggregator};
use funding_data::analysis::DashboardSession;
use funding_data::filter::FilteredView;

/// Render the portfolio overview: headline metrics plus one line per
/// loaded dataset.
pub fn render_overview(session: &DashboardSession) -> String {
    let totals = portfolio_totals(session.datasets());
    let mut out = String::new();

    let _ = writeln!(out, "WiFi Funding Intelligence Dashboard");
    let _ = writeln!(out, "Source: {}", session.source.display());
    let _ = writeln!(
        out,
        "Loaded {} datasets in {:.2}s",
        session.metadata.sheets_loaded, session.metadata.load_time_seconds
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total Funding    {} ({})",
        format_currency(totals.total_funding),
        format_compact_currency(totals.total_funding)
    );
    let _ = writeln!(out, "Data Sources     {}", totals.dataset_count);
    let _ = writeln!(
        out,
        "Total Records    {}",
        format_number(totals.record_count as f64, 0)
    );
    let _ = writeln!(out, "States Covered   {}", totals.states_covered);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<30} {:>8} {:>7}  Sample Fields",
        "Dataset", "Records", "Fields"
    );
    for dataset in session.datasets() {
        let names: Vec<&str> = dataset.field_names().collect();
        let mut sample = names[..names.len().min(4)].join(", ");
        if names.len() > 4 {
            sample.push_str(", ...");
        }
        let _ = writeln!(
            out,
            "{:<30} {:>8} {:>7}  {}",
            truncate_label(dataset.kind().sheet_name(), 30),
            dataset.len(),
            names.len(),
            sample
        );
    }

    if !session.skipped_sheets.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Skipped sheets: {}",
            session.skipped_sheets.join(", ")
        );
    }
    if session.metadata.rows_skipped > 0 {
        let _ = writeln!(
            out,
            "Rows skipped during load: {}",
            session.metadata.rows_skipped
        );
    }

    out
}

/// Render the per-dataset view over an already-filtered `view`: summary
/// metrics, boolean-field rates, grouped totals and the top-N ranking.
pub fn render_dataset(view: &FilteredView, top_n: usize) -> String {
    let dataset = view.dataset();
    let schema = dataset.schema;
    let summary = ViewAggregator::summarize(view);
    let mut out = String::new();

    let title = dataset.kind().sheet_name();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
    let _ = writeln!(out, "Records: {} of {}", view.len(), dataset.len());

    if let Some(amount_field) = schema.amount_field {
        let _ = writeln!(
            out,
            "Total {}: {}",
            amount_field,
            format_currency(summary.total_amount)
        );
        let _ = writeln!(out, "Mean: {}", format_currency(summary.mean_amount));
    }
    if schema.state_field.is_some() {
        let _ = writeln!(out, "States covered: {}", summary.states_covered);
    }
    if let Some(label_field) = schema.fields.first() {
        if let Ok(count) = ViewAggregator::distinct_count(view, label_field.name) {
            let _ = writeln!(out, "Unique {}: {}", label_field.name, count);
        }
    }

    for field in schema.fields.iter().filter(|f| f.field_type == FieldType::Bool) {
        if let Ok((count, rate)) = ViewAggregator::bool_rate(view, field.name) {
            let _ = writeln!(out, "{}: {} of {} ({}%)", field.name, count, view.len(), rate);
        }
    }

    if let Some(category) = schema.category_field {
        if let Ok(groups) = ViewAggregator::sum_by(view, category) {
            if !groups.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Totals by {}:", category);
                for (key, amount) in groups {
                    let _ = writeln!(
                        out,
                        "  {:<28} {:>16}",
                        truncate_label(&key, 28),
                        format_currency(amount)
                    );
                }
            }
        }
    }

    if let Some(amount_field) = schema.amount_field {
        let top = ViewAggregator::top_by_amount(view, top_n);
        if !top.is_empty() {
            let state_idx = schema.state_field.and_then(|f| dataset.field_index(f));
            let _ = writeln!(out);
            let _ = writeln!(out, "Top {} by {}:", top.len(), amount_field);
            for (rank, record) in top.iter().enumerate() {
                let label = record.value(0).to_string();
                let state = state_idx
                    .map(|idx| record.value(idx).to_string())
                    .unwrap_or_default();
                let amount = dataset
                    .field_index(amount_field)
                    .and_then(|idx| record.value(idx).as_number())
                    .unwrap_or(0.0);
                let _ = writeln!(
                    out,
                    "  {:>2}. {:<32} {:<4} {:>16}",
                    rank + 1,
                    truncate_label(&label, 32),
                    state,
                    format_currency(amount)
                );
            }
        }
    }

    out
}

/// Render the workbook structure report: dimensions, fields, types and null
/// counts per dataset.
pub fn render_inspect(session: &DashboardSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== WORKBOOK STRUCTURE ===");
    let _ = writeln!(out, "Source: {}", session.source.display());

    for dataset in session.datasets() {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- {} ---", dataset.kind().sheet_name());
        let _ = writeln!(
            out,
            "Shape: {} rows x {} fields",
            dataset.len(),
            dataset.schema.fields.len()
        );
        for (idx, field) in dataset.schema.fields.iter().enumerate() {
            let nulls = dataset
                .records
                .iter()
                .filter(|r| r.value(idx).is_null())
                .count();
            let _ = writeln!(
                out,
                "  {:<24} {:<8} {:>6} nulls",
                field.name, field.field_type, nulls
            );
        }
    }

    if !session.skipped_sheets.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Missing sheets: {}",
            session.skipped_sheets.join(", ")
        );
    }

    out
}

/// List every dataset slug with its sheet name, for CLI error messages.
pub fn dataset_slug_help() -> String {
    funding_core::models::ProgramKind::ALL
        .iter()
        .map(|k| format!("  {:<16} {}", k.slug(), k.sheet_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;
    use funding_data::analysis::build_session;
    use funding_data::filter::FilterSpec;
    use funding_data::workbook::{RawSheet, WorkbookData};
    use funding_core::models::ProgramKind;

    fn sample_session() -> DashboardSession {
        let sheet = RawSheet {
            kind: ProgramKind::PublicHousing,
            headers: vec![
                "Development_Name".to_string(),
                "State".to_string(),
                "Award_Amount_USD".to_string(),
                "Connected".to_string(),
            ],
            rows: vec![
                vec![
                    Data::String("Alder Court".to_string()),
                    Data::String("WA".to_string()),
                    Data::Float(250_000.0),
                    Data::Bool(true),
                ],
                vec![
                    Data::String("Birch Row".to_string()),
                    Data::String("Oregon".to_string()),
                    Data::String("$98,000".to_string()),
                    Data::Bool(false),
                ],
            ],
        };
        build_session(WorkbookData {
            path: "Data.xlsx".into(),
            sheets: vec![sheet],
            missing_sheets: vec!["Industry News".to_string()],
        })
    }

    #[test]
    fn test_render_overview_headline_metrics() {
        let session = sample_session();
        let report = render_overview(&session);

        assert!(report.contains("Total Funding    $348,000.00"));
        assert!(report.contains("Data Sources     1"));
        assert!(report.contains("States Covered   2"));
        assert!(report.contains("Public Housing Funding"));
    }

    #[test]
    fn test_render_overview_reports_skipped_sheets() {
        let session = sample_session();
        let report = render_overview(&session);
        assert!(report.contains("Skipped sheets: Industry News"));
    }

    #[test]
    fn test_render_dataset_summary_and_top_ranking() {
        let session = sample_session();
        let dataset = session.dataset(ProgramKind::PublicHousing).unwrap();
        let view = FilterSpec::new().apply(dataset).unwrap();
        let report = render_dataset(&view, 10);

        assert!(report.contains("Records: 2 of 2"));
        assert!(report.contains("Total funding_amount: $348,000.00"));
        assert!(report.contains("Unique development_name: 2"));
        assert!(report.contains("connected: 1 of 2 (50%)"));
        assert!(report.contains("Top 2 by funding_amount"));
        // Descending by amount: Alder Court first.
        let alder = report.find("Alder Court").unwrap();
        let birch = report.find("Birch Row").unwrap();
        assert!(alder < birch);
    }

    #[test]
    fn test_render_inspect_shows_shape_and_null_counts() {
        let session = sample_session();
        let report = render_inspect(&session);

        assert!(report.contains("--- Public Housing Funding ---"));
        assert!(report.contains("Shape: 2 rows x 6 fields"));
        // in_building_wifi and award_date were never provided.
        assert!(report.contains("in_building_wifi"));
        assert!(report.contains("Missing sheets: Industry News"));
    }

    #[test]
    fn test_dataset_slug_help_lists_every_kind() {
        let help = dataset_slug_help();
        for kind in ProgramKind::ALL {
            assert!(help.contains(kind.slug()));
        }
    }
}
