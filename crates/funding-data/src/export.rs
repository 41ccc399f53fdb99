//! CSV serialization of filtered views.
//!
//! Values are written in round-trippable form: numbers use the shortest
//! decimal representation, dates are ISO `YYYY-MM-DD`, booleans are
//! `true`/`false` and nulls are empty cells. [`read_csv`] parses such a file
//! back into a dataset, which the tests use to prove exact round-tripping.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use funding_core::error::{DashboardError, Result};
use funding_core::models::{Dataset, FieldType, FieldValue, ProgramKind, Record};
use funding_core::schema::schema_for;

use crate::filter::FilteredView;

// ── Export ────────────────────────────────────────────────────────────────────

/// Write `view` as CSV: one header row of canonical field names in schema
/// order, then one row per record.
pub fn write_csv<W: Write>(view: &FilteredView, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(view.dataset().field_names())
        .map_err(csv_err)?;
    for record in view.records() {
        out.write_record(record.values.iter().map(render_value))
            .map_err(csv_err)?;
    }
    out.flush()?;
    Ok(())
}

/// Write `view` to a file at `path`. I/O failures propagate unchanged.
pub fn export_csv_file(view: &FilteredView, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(view, file)
}

// ── Import ────────────────────────────────────────────────────────────────────

/// Parse a CSV previously produced by [`write_csv`] back into a dataset for
/// `kind`. Columns are matched to canonical field names exactly; cells are
/// parsed per the schema's field types, with empty cells becoming `Null`.
pub fn read_csv<R: Read>(reader: R, kind: ProgramKind) -> Result<Dataset> {
    let schema = schema_for(kind);
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    // Canonical field index → CSV column index.
    let mapping: Vec<Option<usize>> = schema
        .fields
        .iter()
        .map(|f| headers.iter().position(|h| h == f.name))
        .collect();

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(csv_err)?;
        let values = schema
            .fields
            .iter()
            .zip(&mapping)
            .map(|(field, source)| {
                source
                    .and_then(|col| row.get(col))
                    .map(|cell| parse_value(cell, field.field_type))
                    .unwrap_or(FieldValue::Null)
            })
            .collect();
        records.push(Record::new(values));
    }

    Ok(Dataset::new(schema, records))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Render one cell in its round-trippable text form.
fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Null => String::new(),
    }
}

/// Parse one CSV cell per the target field type; empty cells are `Null`.
fn parse_value(cell: &str, ty: FieldType) -> FieldValue {
    if cell.is_empty() {
        return FieldValue::Null;
    }
    match ty {
        FieldType::Text => FieldValue::Text(cell.to_string()),
        FieldType::Number => cell
            .parse::<f64>()
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null),
        FieldType::Date => NaiveDate::parse_from_str(cell, "%Y-%m-%d")
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Null),
        FieldType::Bool => match cell {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => FieldValue::Null,
        },
    }
}

fn csv_err(err: csv::Error) -> DashboardError {
    DashboardError::Csv(err.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
