use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::SheetSchema;

/// Identifies one of the funding-program sheets expected in the source workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramKind {
    /// Emergency Connectivity Fund applications.
    EmergencyConnectivity,
    /// E-Rate funding commitments.
    ERate,
    /// Public housing WiFi awards.
    PublicHousing,
    /// Lifeline Program disbursements.
    Lifeline,
    /// Federal broadband grants.
    FederalGrants,
    /// Tribal funding awards.
    TribalFunding,
    /// Tribal Priority Capital Fund projects.
    TribalPriorityCapital,
    /// Nonprofit WiFi spending survey.
    NonprofitWifi,
    /// Marketing intelligence prospects.
    MarketingIntelligence,
    /// Industry news clippings.
    IndustryNews,
}

impl ProgramKind {
    /// Every expected sheet, in workbook order.
    pub const ALL: [ProgramKind; 10] = [
        ProgramKind::EmergencyConnectivity,
        ProgramKind::ERate,
        ProgramKind::PublicHousing,
        ProgramKind::Lifeline,
        ProgramKind::FederalGrants,
        ProgramKind::TribalFunding,
        ProgramKind::TribalPriorityCapital,
        ProgramKind::NonprofitWifi,
        ProgramKind::MarketingIntelligence,
        ProgramKind::IndustryNews,
    ];

    /// The sheet name exactly as it appears in the source workbook.
    pub fn sheet_name(self) -> &'static str {
        match self {
            ProgramKind::EmergencyConnectivity => "Emergency Connectivity Fund",
            ProgramKind::ERate => "E-Rate",
            ProgramKind::PublicHousing => "Public Housing Funding",
            ProgramKind::Lifeline => "Lifeline Program",
            ProgramKind::FederalGrants => "Federal Grants",
            ProgramKind::TribalFunding => "Tribal Funding",
            ProgramKind::TribalPriorityCapital => "Tribal Priority Capital Fund",
            ProgramKind::NonprofitWifi => "Nonprofit WiFi Spending",
            ProgramKind::MarketingIntelligence => "Marketing Intelligence",
            ProgramKind::IndustryNews => "Industry News",
        }
    }

    /// Short identifier used for CLI selection and export file names.
    pub fn slug(self) -> &'static str {
        match self {
            ProgramKind::EmergencyConnectivity => "ecf",
            ProgramKind::ERate => "erate",
            ProgramKind::PublicHousing => "public-housing",
            ProgramKind::Lifeline => "lifeline",
            ProgramKind::FederalGrants => "federal-grants",
            ProgramKind::TribalFunding => "tribal",
            ProgramKind::TribalPriorityCapital => "tribal-capital",
            ProgramKind::NonprofitWifi => "nonprofit",
            ProgramKind::MarketingIntelligence => "marketing",
            ProgramKind::IndustryNews => "news",
        }
    }

    /// Look up a kind by its workbook sheet name.
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.sheet_name() == name)
    }

    /// Look up a kind by its CLI slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// The value type a canonical field carries after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Bool => "bool",
        };
        f.write_str(s)
    }
}

/// A single typed cell in a normalized record.
///
/// `Null` marks a value that was absent or could not be coerced; required
/// fields never hold `Null` (the normalizer drops such rows instead).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    Null,
}

static NULL: FieldValue = FieldValue::Null;

impl FieldValue {
    /// The text content, when this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content, when this is a `Number` value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The date content, when this is a `Date` value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The boolean content, when this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => Ok(()),
        }
    }
}

/// One normalized row.
///
/// Values are positionally aligned with the owning dataset's field list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub values: Vec<FieldValue>,
}

impl Record {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    /// The value at `index`; `Null` when the index is out of range.
    pub fn value(&self, index: usize) -> &FieldValue {
        self.values.get(index).unwrap_or(&NULL)
    }
}

/// A normalized in-memory table for one funding-program sheet.
///
/// Immutable once built: a new workbook load replaces the whole dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// The declarative schema every record conforms to.
    pub schema: &'static SheetSchema,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from already-normalized records.
    ///
    /// Every record must have exactly one value per schema field.
    pub fn new(schema: &'static SheetSchema, records: Vec<Record>) -> Self {
        debug_assert!(
            records.iter().all(|r| r.values.len() == schema.fields.len()),
            "record arity must match the schema field count"
        );
        Self { schema, records }
    }

    pub fn kind(&self) -> ProgramKind {
        self.schema.kind
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `field` in the canonical field order.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.schema.field_index(field)
    }

    /// Canonical field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schema.fields.iter().map(|f| f.name)
    }

    /// The value of `field` in record `row`; `Null` when either is absent.
    pub fn value(&self, row: usize, field: &str) -> &FieldValue {
        match (self.records.get(row), self.field_index(field)) {
            (Some(record), Some(idx)) => record.value(idx),
            _ => &NULL,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_for;

    // ── ProgramKind ───────────────────────────────────────────────────────────

    #[test]
    fn test_program_kind_all_has_ten_sheets() {
        assert_eq!(ProgramKind::ALL.len(), 10);
    }

    #[test]
    fn test_program_kind_sheet_name_round_trip() {
        for kind in ProgramKind::ALL {
            assert_eq!(ProgramKind::from_sheet_name(kind.sheet_name()), Some(kind));
        }
    }

    #[test]
    fn test_program_kind_slug_round_trip() {
        for kind in ProgramKind::ALL {
            assert_eq!(ProgramKind::from_slug(kind.slug()), Some(kind));
        }
    }

    #[test]
    fn test_program_kind_unknown_sheet_name() {
        assert!(ProgramKind::from_sheet_name("Municipal Broadband").is_none());
    }

    #[test]
    fn test_program_kind_slugs_are_unique() {
        let mut slugs: Vec<&str> = ProgramKind::ALL.iter().map(|k| k.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 10);
    }

    #[test]
    fn test_program_kind_display_uses_sheet_name() {
        assert_eq!(
            ProgramKind::EmergencyConnectivity.to_string(),
            "Emergency Connectivity Fund"
        );
    }

    // ── FieldValue ────────────────────────────────────────────────────────────

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::Text("WA".into()).as_text(), Some("WA"));
        assert_eq!(FieldValue::Number(12.5).as_number(), Some(12.5));
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert!(FieldValue::Null.is_null());
    }

    #[test]
    fn test_field_value_accessors_reject_wrong_type() {
        assert!(FieldValue::Number(1.0).as_text().is_none());
        assert!(FieldValue::Text("1".into()).as_number().is_none());
        assert!(FieldValue::Null.as_date().is_none());
    }

    #[test]
    fn test_field_value_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "2024-03-01");
        assert_eq!(FieldValue::Number(1500.0).to_string(), "1500");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    // ── Record / Dataset ──────────────────────────────────────────────────────

    #[test]
    fn test_record_value_out_of_range_is_null() {
        let record = Record::new(vec![FieldValue::Number(1.0)]);
        assert!(record.value(5).is_null());
    }

    #[test]
    fn test_dataset_field_lookup() {
        let schema = schema_for(ProgramKind::PublicHousing);
        let dataset = Dataset::new(schema, vec![]);

        assert!(dataset.field_index("funding_amount").is_some());
        assert!(dataset.field_index("nonexistent").is_none());
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_dataset_value_lookup() {
        let schema = schema_for(ProgramKind::PublicHousing);
        let arity = schema.fields.len();
        let mut values = vec![FieldValue::Null; arity];
        values[0] = FieldValue::Text("Riverside Commons".into());
        let dataset = Dataset::new(schema, vec![Record::new(values)]);

        assert_eq!(
            dataset.value(0, "development_name").as_text(),
            Some("Riverside Commons")
        );
        assert!(dataset.value(0, "missing_field").is_null());
        assert!(dataset.value(9, "development_name").is_null());
    }
}
