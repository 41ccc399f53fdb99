//! Summary metrics over filtered views.
//!
//! Everything here is a pure fold over a [`FilteredView`]: counts, amount
//! totals, distinct values, boolean rates, grouped sums and the top-N
//! prospect ranking. Empty views produce zero-valued aggregates, never
//! errors.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use funding_core::error::{DashboardError, Result};
use funding_core::formatting::percentage;
use funding_core::models::{Dataset, Record};

use crate::filter::FilteredView;

// ── ViewSummary ───────────────────────────────────────────────────────────────

/// Headline metrics for one filtered view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSummary {
    pub record_count: usize,
    /// Sum over the schema's amount field; `0.0` when the sheet has none.
    pub total_amount: f64,
    /// Mean over records with a non-null amount; `0.0` when there are none.
    pub mean_amount: f64,
    /// Distinct non-null values in the schema's state field.
    pub states_covered: usize,
}

// ── ViewAggregator ────────────────────────────────────────────────────────────

/// Stateless helper computing aggregates over a [`FilteredView`].
pub struct ViewAggregator;

impl ViewAggregator {
    /// Headline metrics for `view`. Zero-valued for an empty view.
    pub fn summarize(view: &FilteredView) -> ViewSummary {
        let dataset = view.dataset();
        let amount_idx = dataset
            .schema
            .amount_field
            .and_then(|f| dataset.field_index(f));
        let state_idx = dataset
            .schema
            .state_field
            .and_then(|f| dataset.field_index(f));

        let mut total = 0.0;
        let mut amount_count = 0usize;
        let mut states: BTreeSet<&str> = BTreeSet::new();

        for record in view.records() {
            if let Some(idx) = amount_idx {
                if let Some(amount) = record.value(idx).as_number() {
                    total += amount;
                    amount_count += 1;
                }
            }
            if let Some(idx) = state_idx {
                if let Some(state) = record.value(idx).as_text() {
                    states.insert(state);
                }
            }
        }

        ViewSummary {
            record_count: view.len(),
            total_amount: total,
            mean_amount: if amount_count > 0 {
                total / amount_count as f64
            } else {
                0.0
            },
            states_covered: states.len(),
        }
    }

    /// Count of distinct non-null values in `field`.
    pub fn distinct_count(view: &FilteredView, field: &str) -> Result<usize> {
        let idx = resolve_field(view.dataset(), field)?;
        let distinct: BTreeSet<String> = view
            .records()
            .iter()
            .map(|r| r.value(idx))
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .collect();
        Ok(distinct.len())
    }

    /// `(true_count, percent_of_records)` for a boolean `field`.
    ///
    /// Non-boolean and null cells count as false.
    pub fn bool_rate(view: &FilteredView, field: &str) -> Result<(usize, f64)> {
        let idx = resolve_field(view.dataset(), field)?;
        let true_count = view
            .records()
            .iter()
            .filter(|r| r.value(idx).as_bool() == Some(true))
            .count();
        let rate = percentage(true_count as f64, view.len() as f64, 1);
        Ok((true_count, rate))
    }

    /// Sum of the amount field grouped by the values of `field`, sorted by
    /// group key. Records with a null group value are skipped; records with
    /// a null amount contribute zero.
    pub fn sum_by(view: &FilteredView, field: &str) -> Result<Vec<(String, f64)>> {
        let dataset = view.dataset();
        let group_idx = resolve_field(dataset, field)?;
        let amount_idx = dataset
            .schema
            .amount_field
            .and_then(|f| dataset.field_index(f));

        let mut groups: BTreeMap<String, f64> = BTreeMap::new();
        for record in view.records() {
            let key = record.value(group_idx);
            if key.is_null() {
                continue;
            }
            let amount = amount_idx
                .and_then(|idx| record.value(idx).as_number())
                .unwrap_or(0.0);
            *groups.entry(key.to_string()).or_insert(0.0) += amount;
        }

        Ok(groups.into_iter().collect())
    }

    /// The top `n` records by amount, descending.
    ///
    /// Stable: records with equal amounts keep their original order. Records
    /// with a null amount are excluded from the ranking entirely.
    pub fn top_by_amount<'a>(view: &FilteredView<'a>, n: usize) -> Vec<&'a Record> {
        let dataset = view.dataset();
        let Some(amount_idx) = dataset
            .schema
            .amount_field
            .and_then(|f| dataset.field_index(f))
        else {
            return Vec::new();
        };

        let mut ranked: Vec<(&'a Record, f64)> = view
            .records()
            .iter()
            .filter_map(|r| r.value(amount_idx).as_number().map(|a| (*r, a)))
            .collect();

        // Stable sort: ties keep original record order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(n);
        ranked.into_iter().map(|(r, _)| r).collect()
    }
}

// ── Portfolio totals ──────────────────────────────────────────────────────────

/// Cross-dataset totals for the overview page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioTotals {
    /// Combined funding across every dataset with an amount field.
    pub total_funding: f64,
    /// Number of loaded datasets.
    pub dataset_count: usize,
    /// Combined record count.
    pub record_count: usize,
    /// Distinct states across every dataset with a state field.
    pub states_covered: usize,
}

/// Combined totals across every loaded dataset.
pub fn portfolio_totals<'a>(datasets: impl IntoIterator<Item = &'a Dataset>) -> PortfolioTotals {
    let mut totals = PortfolioTotals::default();
    let mut states: BTreeSet<String> = BTreeSet::new();

    for dataset in datasets {
        totals.dataset_count += 1;
        totals.record_count += dataset.len();

        let summary = ViewAggregator::summarize(&FilteredView::full(dataset));
        totals.total_funding += summary.total_amount;

        if let Some(idx) = dataset
            .schema
            .state_field
            .and_then(|f| dataset.field_index(f))
        {
            for record in &dataset.records {
                if let Some(state) = record.value(idx).as_text() {
                    states.insert(state.to_string());
                }
            }
        }
    }

    totals.states_covered = states.len();
    totals
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn resolve_field(dataset: &Dataset, field: &str) -> Result<usize> {
    dataset
        .field_index(field)
        .ok_or_else(|| DashboardError::UnknownField {
            dataset: dataset.kind().sheet_name().to_string(),
            field: field.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterSpec, Predicate};
    use funding_core::models::{FieldValue, ProgramKind, Record};
    use funding_core::schema::schema_for;

    /// Public housing dataset: name, state, amount, connected, wifi, date.
    fn housing_dataset(rows: &[(&str, &str, Option<f64>, Option<bool>)]) -> Dataset {
        let schema = schema_for(ProgramKind::PublicHousing);
        let records = rows
            .iter()
            .map(|(name, state, amount, connected)| {
                Record::new(vec![
                    FieldValue::Text(name.to_string()),
                    FieldValue::Text(state.to_string()),
                    amount.map(FieldValue::Number).unwrap_or(FieldValue::Null),
                    connected.map(FieldValue::Bool).unwrap_or(FieldValue::Null),
                    FieldValue::Null,
                    FieldValue::Null,
                ])
            })
            .collect();
        Dataset::new(schema, records)
    }

    fn sample_dataset() -> Dataset {
        housing_dataset(&[
            ("Alder Court", "WA", Some(100.0), Some(true)),
            ("Birch Row", "OR", Some(500.0), Some(false)),
            ("Cedar Flats", "WA", Some(1000.0), Some(true)),
        ])
    }

    // ── summarize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_counts_and_sums() {
        let dataset = sample_dataset();
        let summary = ViewAggregator::summarize(&FilteredView::full(&dataset));

        assert_eq!(summary.record_count, 3);
        assert!((summary.total_amount - 1600.0).abs() < 1e-9);
        assert!((summary.mean_amount - 1600.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.states_covered, 2);
    }

    #[test]
    fn test_summarize_count_matches_view_len() {
        let dataset = sample_dataset();
        let spec = FilterSpec::new().with(
            "funding_amount",
            Predicate::AmountRange {
                min: Some(500.0),
                max: None,
            },
        );
        let view = spec.apply(&dataset).unwrap();
        let summary = ViewAggregator::summarize(&view);

        assert_eq!(summary.record_count, view.len());
        assert_eq!(summary.record_count, 2);
        // Spec scenario: amount >= 500 over {100, 500, 1000} sums to 1500.
        assert!((summary.total_amount - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty_view_is_zero_valued() {
        let dataset = housing_dataset(&[]);
        let summary = ViewAggregator::summarize(&FilteredView::full(&dataset));
        assert_eq!(summary, ViewSummary::default());
    }

    #[test]
    fn test_summarize_null_amounts_do_not_poison_mean() {
        let dataset = housing_dataset(&[
            ("A", "WA", Some(300.0), None),
            ("B", "WA", None, None),
        ]);
        let summary = ViewAggregator::summarize(&FilteredView::full(&dataset));

        assert_eq!(summary.record_count, 2);
        assert!((summary.total_amount - 300.0).abs() < 1e-9);
        // Mean over the single non-null amount, not over all records.
        assert!((summary.mean_amount - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_dataset_without_amount_field() {
        let schema = schema_for(ProgramKind::IndustryNews);
        let dataset = Dataset::new(
            schema,
            vec![Record::new(vec![
                FieldValue::Text("FCC expands E-Rate".into()),
                FieldValue::Text("Telecom Daily".into()),
                FieldValue::Null,
                FieldValue::Null,
            ])],
        );
        let summary = ViewAggregator::summarize(&FilteredView::full(&dataset));

        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.total_amount, 0.0);
        assert_eq!(summary.states_covered, 0);
    }

    // ── distinct_count / bool_rate ────────────────────────────────────────────

    #[test]
    fn test_distinct_count() {
        let dataset = sample_dataset();
        let view = FilteredView::full(&dataset);
        assert_eq!(ViewAggregator::distinct_count(&view, "state").unwrap(), 2);
        assert_eq!(
            ViewAggregator::distinct_count(&view, "development_name").unwrap(),
            3
        );
    }

    #[test]
    fn test_distinct_count_unknown_field() {
        let dataset = sample_dataset();
        let view = FilteredView::full(&dataset);
        assert!(ViewAggregator::distinct_count(&view, "nope").is_err());
    }

    #[test]
    fn test_bool_rate() {
        let dataset = sample_dataset();
        let view = FilteredView::full(&dataset);
        let (count, rate) = ViewAggregator::bool_rate(&view, "connected").unwrap();

        assert_eq!(count, 2);
        assert!((rate - 66.7).abs() < 1e-9, "rate = {rate}");
    }

    #[test]
    fn test_bool_rate_empty_view() {
        let dataset = housing_dataset(&[]);
        let view = FilteredView::full(&dataset);
        let (count, rate) = ViewAggregator::bool_rate(&view, "connected").unwrap();
        assert_eq!(count, 0);
        assert_eq!(rate, 0.0);
    }

    // ── sum_by ────────────────────────────────────────────────────────────────

    #[test]
    fn test_sum_by_groups_and_sorts() {
        let dataset = sample_dataset();
        let view = FilteredView::full(&dataset);
        let groups = ViewAggregator::sum_by(&view, "state").unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "OR");
        assert!((groups[0].1 - 500.0).abs() < 1e-9);
        assert_eq!(groups[1].0, "WA");
        assert!((groups[1].1 - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_by_skips_null_group_values() {
        let dataset = housing_dataset(&[
            ("A", "WA", Some(100.0), None),
            ("B", "", Some(900.0), None),
        ]);
        // Empty state strings normalize to Null at ingestion; simulate that
        // by blanking the state cell directly.
        let mut records = dataset.records.clone();
        records[1].values[1] = FieldValue::Null;
        let dataset = Dataset::new(dataset.schema, records);

        let groups =
            ViewAggregator::sum_by(&FilteredView::full(&dataset), "state").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "WA");
    }

    // ── top_by_amount ─────────────────────────────────────────────────────────

    #[test]
    fn test_top_by_amount_orders_descending() {
        let dataset = sample_dataset();
        let top = ViewAggregator::top_by_amount(&FilteredView::full(&dataset), 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].value(0).as_text(), Some("Cedar Flats"));
        assert_eq!(top[1].value(0).as_text(), Some("Birch Row"));
    }

    #[test]
    fn test_top_by_amount_ties_keep_original_order() {
        let dataset = housing_dataset(&[
            ("First", "WA", Some(500.0), None),
            ("Second", "WA", Some(500.0), None),
            ("Third", "WA", Some(500.0), None),
        ]);
        let top = ViewAggregator::top_by_amount(&FilteredView::full(&dataset), 3);

        let names: Vec<_> = top.iter().map(|r| r.value(0).as_text().unwrap()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_top_by_amount_excludes_null_amounts() {
        let dataset = housing_dataset(&[
            ("Has amount", "WA", Some(10.0), None),
            ("No amount", "WA", None, None),
        ]);
        let top = ViewAggregator::top_by_amount(&FilteredView::full(&dataset), 5);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].value(0).as_text(), Some("Has amount"));
    }

    #[test]
    fn test_top_by_amount_n_larger_than_view() {
        let dataset = sample_dataset();
        let top = ViewAggregator::top_by_amount(&FilteredView::full(&dataset), 50);
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_top_by_amount_no_amount_field() {
        let schema = schema_for(ProgramKind::IndustryNews);
        let dataset = Dataset::new(
            schema,
            vec![Record::new(vec![
                FieldValue::Text("Headline".into()),
                FieldValue::Null,
                FieldValue::Null,
                FieldValue::Null,
            ])],
        );
        let top = ViewAggregator::top_by_amount(&FilteredView::full(&dataset), 5);
        assert!(top.is_empty());
    }

    // ── portfolio_totals ──────────────────────────────────────────────────────

    #[test]
    fn test_portfolio_totals_across_datasets() {
        let housing = sample_dataset();
        let lifeline_schema = schema_for(ProgramKind::Lifeline);
        let lifeline = Dataset::new(
            lifeline_schema,
            vec![Record::new(vec![
                FieldValue::Text("Acme Telecom".into()),
                FieldValue::Text("ID".into()),
                FieldValue::Number(400.0),
                FieldValue::Null,
            ])],
        );

        let totals = portfolio_totals([&housing, &lifeline]);

        assert_eq!(totals.dataset_count, 2);
        assert_eq!(totals.record_count, 4);
        assert!((totals.total_funding - 2000.0).abs() < 1e-9);
        // WA, OR from housing plus ID from lifeline.
        assert_eq!(totals.states_covered, 3);
    }

    #[test]
    fn test_portfolio_totals_empty() {
        let totals = portfolio_totals([]);
        assert_eq!(totals, PortfolioTotals::default());
    }
}
