//! Filter engine: pure predicate evaluation over one normalized dataset.
//!
//! A [`FilterSpec`] holds at most one predicate per field; applying it keeps
//! the records for which every predicate holds (logical AND). Application is
//! purely functional: the dataset is never touched, and the resulting
//! [`FilteredView`] borrows records instead of copying them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use funding_core::error::{DashboardError, Result};
use funding_core::models::{Dataset, FieldValue, Record};

// ── Predicate ─────────────────────────────────────────────────────────────────

/// A single field-level predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match against one value.
    Equals(FieldValue),
    /// Match any of the given values (set membership).
    OneOf(Vec<FieldValue>),
    /// Inclusive numeric range; `None` ends are unbounded.
    AmountRange { min: Option<f64>, max: Option<f64> },
    /// Inclusive date range; `None` ends are unbounded.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Predicate {
    /// True when `value` satisfies this predicate.
    ///
    /// `Null` never matches anything, including an `Equals(Null)` probe.
    pub fn matches(&self, value: &FieldValue) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            Predicate::Equals(expected) => value == expected,
            Predicate::OneOf(candidates) => candidates.contains(value),
            Predicate::AmountRange { min, max } => match value.as_number() {
                Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
                None => false,
            },
            Predicate::DateRange { from, to } => match value.as_date() {
                Some(d) => from.map_or(true, |lo| d >= lo) && to.map_or(true, |hi| d <= hi),
                None => false,
            },
        }
    }
}

// ── FilterSpec ────────────────────────────────────────────────────────────────

/// User-chosen predicate set restricting a dataset.
///
/// Invariant: may only reference fields present in the target dataset's
/// schema; enforced by [`FilterSpec::apply`] before any record is touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Add or replace the predicate for `field`.
    pub fn set(&mut self, field: impl Into<String>, predicate: Predicate) -> &mut Self {
        self.predicates.insert(field.into(), predicate);
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.set(field, predicate);
        self
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check that every referenced field exists in `dataset`'s schema.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        for field in self.predicates.keys() {
            if dataset.field_index(field).is_none() {
                return Err(DashboardError::UnknownField {
                    dataset: dataset.kind().sheet_name().to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Apply this spec to `dataset`, producing the filtered view.
    ///
    /// An empty spec returns the full dataset.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Result<FilteredView<'a>> {
        self.validate(dataset)?;

        let resolved: Vec<(usize, &Predicate)> = self
            .predicates
            .iter()
            .map(|(field, predicate)| {
                let idx = dataset
                    .field_index(field)
                    .expect("validated field must resolve");
                (idx, predicate)
            })
            .collect();

        let records: Vec<&Record> = dataset
            .records
            .iter()
            .filter(|record| {
                resolved
                    .iter()
                    .all(|(idx, predicate)| predicate.matches(record.value(*idx)))
            })
            .collect();

        Ok(FilteredView { dataset, records })
    }
}

// ── FilteredView ──────────────────────────────────────────────────────────────

/// The subset of a dataset satisfying a [`FilterSpec`].
///
/// Derived data: recomputed from scratch whenever the spec changes, never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    /// The view containing every record (what an empty spec produces).
    pub fn full(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            records: dataset.records.iter().collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
