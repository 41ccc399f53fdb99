mod bootstrap;
mod report;

use anyhow::Result;
use funding_core::models::{Dataset, FieldValue, ProgramKind};
use funding_core::settings::Settings;
use funding_core::states::normalize_state;
use funding_data::analysis::load_session;
use funding_data::export;
use funding_data::filter::{FilterSpec, Predicate};
use tracing::warn;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Funding dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(workbook_path) = bootstrap::discover_workbook(settings.file.as_deref()) else {
        eprintln!("Could not find a workbook automatically.");
        eprintln!();
        eprintln!("To load your funding data:");
        eprintln!("  1. Pass the file explicitly:  funding-dashboard --file <path>.xlsx");
        eprintln!("  2. Or place 'Data.xlsx' in the working directory");
        eprintln!("  3. Or put a .xlsx/.xls file under ./data/");
        std::process::exit(2);
    };

    let session = load_session(&workbook_path)?;
    tracing::info!(
        "Loaded {} datasets ({} records) from {}",
        session.len(),
        session.metadata.records_loaded,
        workbook_path.display()
    );

    match settings.view.as_str() {
        "overview" => print!("{}", report::render_overview(&session)),

        "inspect" => print!("{}", report::render_inspect(&session)),

        "dataset" => {
            let Some(slug) = settings.dataset.as_deref() else {
                eprintln!("The dataset view needs --dataset <slug>. Available datasets:");
                eprintln!("{}", report::dataset_slug_help());
                std::process::exit(2);
            };
            let Some(kind) = ProgramKind::from_slug(slug) else {
                eprintln!("Unknown dataset '{}'. Available datasets:", slug);
                eprintln!("{}", report::dataset_slug_help());
                std::process::exit(2);
            };
            let Some(dataset) = session.dataset(kind) else {
                eprintln!(
                    "Dataset '{}' was not loaded (sheet missing from the workbook).",
                    kind.sheet_name()
                );
                std::process::exit(1);
            };

            let spec = build_filter_spec(&settings, dataset);
            let view = spec.apply(dataset)?;
            print!("{}", report::render_dataset(&view, settings.top));

            if let Some(export_path) = &settings.export {
                export::export_csv_file(&view, export_path)?;
                println!(
                    "Exported {} records to {}",
                    view.len(),
                    export_path.display()
                );
            }
        }

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Translate the CLI filter flags into a [`FilterSpec`] for `dataset`.
///
/// Flags that need a schema role the dataset does not have are ignored with
/// a warning rather than failing the run.
fn build_filter_spec(settings: &Settings, dataset: &Dataset) -> FilterSpec {
    let schema = dataset.schema;
    let mut spec = FilterSpec::new();

    if !settings.states.is_empty() {
        match schema.state_field {
            Some(field) => {
                let codes = settings
                    .states
                    .iter()
                    .map(|s| FieldValue::Text(normalize_state(s)))
                    .collect();
                spec.set(field, Predicate::OneOf(codes));
            }
            None => warn!(
                "--state ignored: '{}' has no state field",
                dataset.kind().sheet_name()
            ),
        }
    }

    if settings.min_amount.is_some() || settings.max_amount.is_some() {
        match schema.amount_field {
            Some(field) => {
                spec.set(
                    field,
                    Predicate::AmountRange {
                        min: settings.min_amount,
                        max: settings.max_amount,
                    },
                );
            }
            None => warn!(
                "--min-amount/--max-amount ignored: '{}' has no amount field",
                dataset.kind().sheet_name()
            ),
        }
    }

    if let Some(category) = &settings.category {
        match schema.category_field {
            Some(field) => {
                spec.set(field, Predicate::Equals(FieldValue::Text(category.clone())));
            }
            None => warn!(
                "--category ignored: '{}' has no category field",
                dataset.kind().sheet_name()
            ),
        }
    }

    if settings.from_date.is_some() || settings.to_date.is_some() {
        match schema.date_field {
            Some(field) => {
                spec.set(
                    field,
                    Predicate::DateRange {
                        from: settings.from_date,
                        to: settings.to_date,
                    },
                );
            }
            None => warn!(
                "--from-date/--to-date ignored: '{}' has no date field",
                dataset.kind().sheet_name()
            ),
        }
    }

    spec
}

// ── Tests ──────────────────────────────────────────────────────────────────────
