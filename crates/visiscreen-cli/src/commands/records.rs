//! The `visiscreen records` command family.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use visiscreen_core::parser;
use visiscreen_core::record::ScreeningRecord;
use visiscreen_core::traits::{RecordQuery, StoredRecord, DEFAULT_LIST_LIMIT};
use visiscreen_report::text::generate_text;
use visiscreen_store::{create_store, load_config_from, VisiscreenConfig};

#[derive(Subcommand)]
pub enum RecordsAction {
    /// Evaluate an intake (or load an exported record) and store it
    Save {
        /// Intake TOML file to evaluate and store
        #[arg(long, conflicts_with = "record")]
        intake: Option<PathBuf>,

        /// Exported record JSON to store
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// List stored records, newest first
    List {
        /// Match against name or HN (case-insensitive)
        #[arg(long)]
        keyword: Option<String>,

        /// Only records examined on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Maximum number of records to show
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Show one stored record
    Show {
        id: String,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Replace a stored record and re-run its evaluation
    Update {
        id: String,

        /// Edited intake TOML file
        #[arg(long, conflicts_with = "record")]
        intake: Option<PathBuf>,

        /// Edited record JSON
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Delete a stored record
    Delete { id: String },
}

pub async fn execute(action: RecordsAction, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_store(&config)?;
    tracing::debug!(store = store.name(), "opened record store");

    match action {
        RecordsAction::Save { intake, record } => {
            let record = load_record(&config, intake.as_deref(), record.as_deref())?;
            let id = store.save(&record).await?;
            println!("Saved record {id}");
        }
        RecordsAction::List {
            keyword,
            date,
            limit,
        } => {
            anyhow::ensure!(limit >= 1, "limit must be at least 1");
            let query = RecordQuery {
                keyword,
                exam_date: date,
                limit,
            };
            let records = store.list(&query).await?;
            if records.is_empty() {
                println!("No records found.");
            } else {
                print_list(&records);
            }
        }
        RecordsAction::Show { id, format } => {
            let stored = store.get(&id).await?;
            match format.as_str() {
                "text" => print!("{}", generate_text(&stored.record)),
                "json" => println!("{}", serde_json::to_string_pretty(&stored)?),
                other => anyhow::bail!("unknown format: '{other}' (expected text or json)"),
            }
        }
        RecordsAction::Update { id, intake, record } => {
            let mut edited = load_record(&config, intake.as_deref(), record.as_deref())?;
            // keep the stored identity; only the readings and review change
            let existing = store.get(&id).await?;
            edited.id = existing.record.id;
            edited.created_at = existing.record.created_at;
            store.update(&id, &edited).await?;
            println!("Updated record {id}");
        }
        RecordsAction::Delete { id } => {
            store.delete(&id).await?;
            println!("Deleted record {id}");
        }
    }

    Ok(())
}

/// Build a record from an intake, or load an exported record and re-evaluate it.
fn load_record(
    config: &VisiscreenConfig,
    intake: Option<&Path>,
    record: Option<&Path>,
) -> Result<ScreeningRecord> {
    let registry = config.registry();
    match (intake, record) {
        (Some(path), _) => {
            let mut intake = parser::parse_intake(path)?;
            if intake.device.is_none() {
                intake.device = Some(config.device.clone());
            }
            ScreeningRecord::build(intake, &registry, config.visual_field_policy())
                .with_context(|| format!("failed to evaluate {}", path.display()))
        }
        (None, Some(path)) => {
            let mut record = ScreeningRecord::load_json(path)?;
            record
                .reevaluate(&registry)
                .with_context(|| format!("failed to evaluate {}", path.display()))?;
            Ok(record)
        }
        (None, None) => anyhow::bail!("either --intake or --record is required"),
    }
}

fn print_list(records: &[StoredRecord]) {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Record", "Job group", "Overall"]);

    for stored in records {
        let interp = &stored.record.interpretation;
        table.add_row(vec![
            Cell::new(&stored.id),
            Cell::new(stored.label()),
            Cell::new(&stored.record.meta.job_group_key),
            Cell::new(if interp.overall_ok { "MEETS" } else { "BELOW" }),
        ]);
    }

    println!("{table}");
    println!("{} record(s)", records.len());
}
