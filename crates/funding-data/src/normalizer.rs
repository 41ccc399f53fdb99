//! Sheet normalization: raw workbook cells → canonical typed datasets.
//!
//! Column matching is driven entirely by the declarative [`SheetSchema`]
//! tables. Ingestion is best-effort: unknown columns are dropped, cells that
//! fail coercion become `Null`, and rows missing a required field are
//! skipped and counted rather than failing the sheet.

use calamine::{Data, DataType};
use chrono::NaiveDate;
use funding_core::models::{Dataset, FieldType, FieldValue, Record};
use funding_core::schema::{schema_for, SheetSchema};
use funding_core::states::normalize_state;
use tracing::{debug, warn};

use crate::workbook::RawSheet;

/// Date spellings accepted for plain-text cells, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of normalizing one raw sheet.
#[derive(Debug, Clone)]
pub struct NormalizedSheet {
    pub dataset: Dataset,
    /// Rows dropped because a required field was missing or unparseable.
    pub skipped_rows: usize,
    /// Source headers with no schema counterpart.
    pub dropped_columns: Vec<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize `raw` into the canonical dataset for its sheet kind.
pub fn normalize_sheet(raw: &RawSheet) -> NormalizedSheet {
    let schema = schema_for(raw.kind);

    // Canonical field index → source column index.
    let mut mapping: Vec<Option<usize>> = vec![None; schema.fields.len()];
    let mut dropped_columns = Vec::new();
    for (col, header) in raw.headers.iter().enumerate() {
        match schema.match_field(header) {
            Some(idx) if mapping[idx].is_none() => mapping[idx] = Some(col),
            _ => {
                debug!(
                    "Sheet '{}': dropping unmapped column '{}'",
                    raw.kind.sheet_name(),
                    header
                );
                dropped_columns.push(header.clone());
            }
        }
    }

    for (field, source) in schema.fields.iter().zip(&mapping) {
        if field.required && source.is_none() {
            warn!(
                "Sheet '{}': required column '{}' not found; all rows will be skipped",
                raw.kind.sheet_name(),
                field.name
            );
        }
    }

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut skipped_rows = 0usize;
    'rows: for row in &raw.rows {
        let mut values = Vec::with_capacity(schema.fields.len());
        for (field, source) in schema.fields.iter().zip(&mapping) {
            let value = source
                .and_then(|col| row.get(col))
                .map(|cell| coerce_value(cell, field.field_type, field.name, schema))
                .unwrap_or(FieldValue::Null);

            if field.required && value.is_null() {
                skipped_rows += 1;
                continue 'rows;
            }
            values.push(value);
        }
        records.push(Record::new(values));
    }

    if skipped_rows > 0 {
        warn!(
            "Sheet '{}': skipped {} of {} rows with missing required fields",
            raw.kind.sheet_name(),
            skipped_rows,
            raw.rows.len()
        );
    }

    NormalizedSheet {
        dataset: Dataset::new(schema, records),
        skipped_rows,
        dropped_columns,
    }
}

// ── Coercion ──────────────────────────────────────────────────────────────────

/// Coerce one workbook cell to the canonical type of its target field.
///
/// Unparseable cells become `Null`; the caller decides whether that is
/// row-fatal (required fields) or kept as a hole (optional fields).
fn coerce_value(cell: &Data, ty: FieldType, field: &str, schema: &SheetSchema) -> FieldValue {
    if cell.is_empty() {
        return FieldValue::Null;
    }

    match ty {
        FieldType::Text => {
            let text = match cell.as_string() {
                Some(s) => s,
                None => return FieldValue::Null,
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return FieldValue::Null;
            }
            if schema.state_field == Some(field) {
                FieldValue::Text(normalize_state(trimmed))
            } else {
                FieldValue::Text(trimmed.to_string())
            }
        }
        FieldType::Number => cell
            .as_f64()
            .or_else(|| cell.get_string().and_then(parse_currency))
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null),
        FieldType::Date => cell
            .as_date()
            .or_else(|| cell.get_string().and_then(parse_date_text))
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Null),
        FieldType::Bool => {
            if let Some(b) = cell.get_bool() {
                FieldValue::Bool(b)
            } else if let Some(i) = cell.get_int() {
                match i {
                    0 => FieldValue::Bool(false),
                    1 => FieldValue::Bool(true),
                    _ => FieldValue::Null,
                }
            } else if let Some(s) = cell.get_string() {
                parse_bool_text(s)
                    .map(FieldValue::Bool)
                    .unwrap_or(FieldValue::Null)
            } else {
                FieldValue::Null
            }
        }
    }
}

/// Parse a currency-ish string: `"$1,234.56"` → `1234.56`, accounting
/// parentheses mark negatives: `"(500)"` → `-500`.
fn parse_currency(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (body, negative) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (&trimmed[1..trimmed.len() - 1], true)
    } else {
        (trimmed, false)
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a plain-text date cell, trying [`DATE_FORMATS`] in order.
fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Map the boolean spellings the source sheets actually use.
fn parse_bool_text(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
