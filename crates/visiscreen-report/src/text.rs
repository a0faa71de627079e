//! Line-oriented plain-text summary.

use std::path::Path;

use anyhow::{Context, Result};
use visiscreen_core::engine::Item;
use visiscreen_core::record::ScreeningRecord;

/// Render the summary, one fact per line.
pub fn generate_text(record: &ScreeningRecord) -> String {
    let meta = &record.meta;
    let person = &record.person;
    let interp = &record.interpretation;
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("VISION SCREENING SUMMARY ({})", meta.device));
    lines.push(format!("Date: {}", meta.exam_date.format("%Y-%m-%d")));
    lines.push(format!(
        "Name: {} | HN: {} | Age: {} | Gender: {}",
        person.name,
        person.hn,
        person.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
        person.gender.as_deref().unwrap_or("-"),
    ));
    lines.push(format!("Job group: {}", meta.job_group_label));
    lines.push(format!(
        "Correction: Far={}, Near={}",
        record.correction.far, record.correction.near
    ));
    lines.push(format!(
        "Overall: {}",
        if interp.overall_ok {
            "PASS (meets reference)"
        } else {
            "BELOW REFERENCE in some items"
        }
    ));

    if !interp.failures.is_empty() {
        lines.push("Items below reference:".into());
        lines.extend(interp.failures.iter().map(|f| format!("- {f}")));
    }

    lines.push(String::new());
    lines.push("Details:".into());
    for item in &interp.items {
        let verdict = if item.passed { "PASS" } else { "FAIL" };
        lines.push(format!("- {verdict}: {}", item.message));
    }

    if let Some(vf) = &record.inputs.visual_field {
        if !folded(record) {
            lines.push(format!(
                "- REFERENCE: Visual field ({}): {}",
                if vf.is_abnormal() { "abnormal" } else { "normal" },
                vf.summary()
            ));
        }
    }

    lines.push(String::new());
    lines.push("Recommendations (advisory only):".into());
    lines.extend(interp.recommendations.iter().map(|r| format!("- {r}")));

    let note = record.review.physician_note.trim();
    if !note.is_empty() {
        lines.push(String::new());
        lines.push("Physician review note:".into());
        lines.push(note.to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Whether the visual field already appears as an evaluated item.
fn folded(record: &ScreeningRecord) -> bool {
    record
        .interpretation
        .items
        .iter()
        .any(|i| i.item == Item::VisualField)
}

/// Write the text summary to a file.
pub fn write_text_summary(record: &ScreeningRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_text(record))
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    Ok(())
}
