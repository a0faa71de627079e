//! The `visiscreen evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use visiscreen_core::engine::VisualFieldPolicy;
use visiscreen_core::record::ScreeningRecord;
use visiscreen_report::text::generate_text;
use visiscreen_report::{export_all, ExportFormat};
use visiscreen_store::load_config_from;

pub fn execute(
    intake_path: PathBuf,
    export: bool,
    output: Option<PathBuf>,
    format: String,
    fold_visual_field: bool,
    fail_on_below_reference: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let registry = config.registry();
    let policy = if fold_visual_field {
        VisualFieldPolicy::FoldIntoFailures
    } else {
        config.visual_field_policy()
    };

    let formats = ExportFormat::parse_list(&format)?;

    let intakes = super::load_intakes(&intake_path)?;
    anyhow::ensure!(
        !intakes.is_empty(),
        "no intake files found in {}",
        intake_path.display()
    );

    let mut records = Vec::with_capacity(intakes.len());
    for (path, mut intake) in intakes {
        if intake.device.is_none() {
            intake.device = Some(config.device.clone());
        }
        let record = ScreeningRecord::build(intake, &registry, policy)
            .with_context(|| format!("failed to evaluate {}", path.display()))?;
        records.push((path, record));
    }

    if let [(_, record)] = records.as_slice() {
        print!("{}", generate_text(record));
    } else {
        print_summary(&records);
    }

    let output = output.or_else(|| export.then(|| config.output_dir.clone()));
    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        for (_, record) in &records {
            for (format, path) in export_all(record, &dir, &formats)? {
                let label = match format {
                    ExportFormat::Text => "Summary saved to",
                    ExportFormat::Json => "Record saved to",
                    ExportFormat::Html => "Printable form",
                };
                eprintln!("{label}: {}", path.display());
            }
        }
    }

    let below = records
        .iter()
        .filter(|(_, r)| !r.interpretation.overall_ok)
        .count();
    if fail_on_below_reference && below > 0 {
        anyhow::bail!("{below} screening(s) below reference");
    }

    Ok(())
}

fn print_summary(records: &[(PathBuf, ScreeningRecord)]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["File", "Name", "HN", "Job group", "Overall", "Below reference"]);

    for (path, record) in records {
        let interp = &record.interpretation;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(file),
            Cell::new(&record.person.name),
            Cell::new(&record.person.hn),
            Cell::new(&record.meta.job_group_key),
            Cell::new(if interp.overall_ok { "MEETS" } else { "BELOW" }),
            Cell::new(if interp.failures.is_empty() {
                "-".to_string()
            } else {
                interp.failures.join(", ")
            }),
        ]);
    }

    println!("{table}");

    let below = records
        .iter()
        .filter(|(_, r)| !r.interpretation.overall_ok)
        .count();
    println!(
        "\n{} screening(s): {} meet reference, {below} below reference",
        records.len(),
        records.len() - below
    );
}
