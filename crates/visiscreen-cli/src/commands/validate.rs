//! The `visiscreen validate` command.

use std::path::PathBuf;

use anyhow::Result;

use visiscreen_core::parser::validate_intake;
use visiscreen_store::load_config_from;

pub fn execute(intake_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let registry = config.registry();
    let policy = config.visual_field_policy();

    let intakes = super::load_intakes(&intake_path)?;

    let mut total_warnings = 0;

    for (path, intake) in &intakes {
        let who = if intake.person.name.trim().is_empty() {
            "-"
        } else {
            intake.person.name.as_str()
        };
        println!("Intake: {} ({who}, {})", path.display(), intake.job_group);

        let warnings = validate_intake(intake, &registry, policy);
        for w in &warnings {
            let prefix = w
                .field
                .as_ref()
                .map(|f| format!("  [{f}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All intakes valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
