//! The `visiscreen standards` command.

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use visiscreen_core::engine::{evaluate, EvaluationOptions};
use visiscreen_core::model::{InputRecord, Standard};
use visiscreen_core::registry::{JobGroup, Registry};
use visiscreen_store::load_config_from;

pub fn execute(group: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let registry = config.registry();

    match group {
        Some(key) => print_group(&registry, &key),
        None => {
            print_overview(&registry);
            Ok(())
        }
    }
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into())
}

fn triple<T: Display>(be: Option<T>, re: Option<T>, le: Option<T>) -> String {
    if be.is_none() && re.is_none() && le.is_none() {
        return "N/A".into();
    }
    format!("{}/{}/{}", or_na(be), or_na(re), or_na(le))
}

fn overview_row(key: &str, standard: &Standard) -> Vec<Cell> {
    let s = standard;
    vec![
        Cell::new(key),
        Cell::new(triple(s.far_va_be_min, s.far_va_re_min, s.far_va_le_min)),
        Cell::new(or_na(s.far_stereo_min)),
        Cell::new(or_na(s.far_color_min_correct.map(|c| format!("{c}/8")))),
        Cell::new(format!(
            "{} / {}",
            or_na(s.far_vphoria_range),
            or_na(s.far_lphoria_range)
        )),
        Cell::new(triple(s.near_va_be_min, s.near_va_re_min, s.near_va_le_min)),
        Cell::new(format!(
            "{} / {}",
            or_na(s.near_vphoria_range),
            or_na(s.near_lphoria_range)
        )),
        Cell::new(triple(s.inter_va_be_min, s.inter_va_re_min, s.inter_va_le_min)),
    ]
}

fn print_overview(registry: &Registry) {
    let mut table = Table::new();
    table.set_header(vec![
        "Group",
        "Far VA BE/RE/LE",
        "Stereo",
        "Color",
        "Far phoria V / L",
        "Near VA BE/RE/LE",
        "Near phoria V / L",
        "Inter VA BE/RE/LE",
    ]);

    for entry in registry.iter() {
        table.add_row(overview_row(entry.group.key(), &entry.standard));
    }

    println!("{table}");
    println!();
    for entry in registry.iter() {
        println!("  {:<14} {}", entry.group.key(), entry.group.label());
    }
}

fn print_group(registry: &Registry, input: &str) -> Result<()> {
    // Command-line spelling is forgiving; registry lookups take the canonical key.
    let key = input.parse::<JobGroup>()?.key();
    let group = registry.group(key)?;
    let standard = registry.get_standard(key)?;

    // Evaluating an empty record lists every item with its reference string.
    let options = EvaluationOptions {
        include_intermediate: true,
        ..Default::default()
    };
    let result = evaluate(&InputRecord::default(), standard, &options);

    println!("{}", group.label());
    let mut table = Table::new();
    table.set_header(vec!["Item", "Reference"]);
    for item in &result.items {
        table.add_row(vec![Cell::new(item.item.name()), Cell::new(&item.reference)]);
    }
    println!("{table}");
    Ok(())
}
