//! Printable HTML screening form.
//!
//! Produces a self-contained A4-landscape page with all CSS inlined: person
//! and correction header, measured-vs-reference table, recommendations,
//! physician note and a signature line.

use anyhow::{Context, Result};
use std::path::Path;

use visiscreen_core::engine::{Eye, Item, ItemResult};
use visiscreen_core::model::{Correction, Distance};
use visiscreen_core::record::ScreeningRecord;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn checkbox(checked: bool, label: &str) -> String {
    format!(
        "<label class=\"checkbox\"><input type=\"checkbox\" disabled{}> {}</label>",
        if checked { " checked" } else { "" },
        label
    )
}

fn correction_row(title: &str, worn: Correction) -> String {
    let boxes: Vec<String> = [
        Correction::Uncorrected,
        Correction::Glasses,
        Correction::ContactLenses,
    ]
    .into_iter()
    .map(|c| checkbox(c == worn, &c.to_string()))
    .collect();
    format!("{title}: {}", boxes.join(" "))
}

/// Row label on the form, e.g. `"Far: VA Both eyes"`.
fn row_label(item: &Item) -> String {
    let prefix = |d: &Distance| format!("{}: ", d.label());
    match item {
        Item::Binocular { distance } => format!("{}Binocular (3 cubes)", prefix(distance)),
        Item::Acuity { distance, eye } => {
            let eye = match eye {
                Eye::Both => "Both eyes",
                Eye::Right => "Right",
                Eye::Left => "Left",
            };
            format!("{}VA {eye}", prefix(distance))
        }
        Item::Stereo { distance } => format!("{}Stereo depth", prefix(distance)),
        Item::Color { distance } => format!("{}Color discrimination", prefix(distance)),
        Item::VerticalPhoria { distance } => format!("{}Vertical phoria", prefix(distance)),
        Item::LateralPhoria { distance } => format!("{}Lateral phoria", prefix(distance)),
        Item::IntermediateBlock => "Inter: VA".to_string(),
        Item::VisualField => "Visual field".to_string(),
    }
}

fn result_row(result: &ItemResult) -> String {
    let class = if result.passed { "pass" } else { "fail" };
    format!(
        "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        html_escape(&row_label(&result.item)),
        html_escape(&result.measured),
        html_escape(&result.reference),
    )
}

/// Generate the printable form for a screening record.
pub fn generate_html(record: &ScreeningRecord) -> String {
    let meta = &record.meta;
    let person = &record.person;
    let interp = &record.interpretation;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Vision Screening Form - {}</title>\n",
        html_escape(&person.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n<div class=\"page\">\n");

    // Header
    html.push_str("<div class=\"box\">\n");
    html.push_str("<div class=\"title\">Vision Screening Record</div>\n");
    html.push_str(
        "<div class=\"subtitle\">(Record Form of Vision Screening Test in Occupational Health Setting)</div>\n",
    );
    html.push_str("<div class=\"grid\">\n<div>\n");
    html.push_str(&correction_row("Far", record.correction.far));
    html.push_str("<br>\n");
    html.push_str(&correction_row("Near", record.correction.near));
    html.push_str("\n</div>\n<div>\n");
    html.push_str(&format!(
        "Name <span class=\"line\">{}</span> HN <span class=\"line\">{}</span><br>\n",
        html_escape(&person.name),
        html_escape(&person.hn)
    ));
    html.push_str(&format!(
        "Age <span class=\"line\">{}</span> Gender <span class=\"line\">{}</span><br>\n",
        person.age.map(|a| a.to_string()).unwrap_or_default(),
        html_escape(person.gender.as_deref().unwrap_or(""))
    ));
    html.push_str(&format!(
        "Date of examination <span class=\"line\">{}</span>\n",
        meta.exam_date.format("%Y-%m-%d")
    ));
    html.push_str("</div>\n</div>\n</div>\n");

    html.push_str("<div class=\"grid\">\n");

    // Left column: job group, device, advice, sign-off
    html.push_str("<div class=\"box\">\n");
    html.push_str("<div class=\"section-title\">Job group</div>\n");
    html.push_str(&format!(
        "<div class=\"small\">{}</div>\n",
        html_escape(&meta.job_group_label)
    ));
    html.push_str("<div class=\"section-title\">Device</div>\n");
    html.push_str(&format!(
        "<div class=\"small\">{}</div>\n",
        html_escape(&meta.device)
    ));
    html.push_str("<div class=\"section-title\">Overall</div>\n");
    html.push_str(&format!(
        "<div class=\"small {}\">{}</div>\n",
        if interp.overall_ok { "pass" } else { "fail" },
        if interp.overall_ok {
            "Meets reference"
        } else {
            "Below reference in some items"
        }
    ));
    html.push_str("<div class=\"section-title\">Recommendation</div>\n");
    let recs: Vec<String> = interp.recommendations.iter().map(|r| html_escape(r)).collect();
    html.push_str(&format!(
        "<div class=\"small\">{}</div>\n",
        if recs.is_empty() {
            "-".to_string()
        } else {
            recs.join("<br>")
        }
    ));
    html.push_str("<div class=\"section-title\">Physician note</div>\n");
    let note = record.review.physician_note.trim();
    html.push_str(&format!(
        "<div class=\"small\">{}</div>\n",
        if note.is_empty() {
            "&nbsp;".to_string()
        } else {
            html_escape(note).replace('\n', "<br>")
        }
    ));
    html.push_str(
        "<div class=\"signature\">Physician signature <span class=\"line wide\">&nbsp;</span></div>\n",
    );
    if let Some(physician) = &record.review.physician {
        html.push_str(&format!(
            "<div class=\"small right\">({})</div>\n",
            html_escape(physician)
        ));
    }
    html.push_str("</div>\n");

    // Right column: measured vs reference
    html.push_str("<div class=\"box\">\n");
    html.push_str("<div class=\"section-title\">Results (measured + reference)</div>\n");
    html.push_str("<table>\n");
    html.push_str(concat!(
        "<thead><tr><th style=\"width:38%\">Item</th>",
        "<th style=\"width:32%\">Measured</th>",
        "<th style=\"width:30%\">Reference (by job group)</th></tr></thead>\n",
    ));
    html.push_str("<tbody>\n");
    for result in &interp.items {
        html.push_str(&result_row(result));
    }
    let folded = interp.items.iter().any(|r| r.item == Item::VisualField);
    if !folded {
        let measured = record
            .inputs
            .visual_field
            .as_ref()
            .map(|vf| vf.summary())
            .unwrap_or_else(|| "-".to_string());
        html.push_str(&format!(
            "<tr><td>Visual field</td><td>{}</td><td>Screening / clinician judgment</td></tr>\n",
            html_escape(&measured)
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</div>\n");

    html.push_str("</div>\n</div>\n</body>\n</html>");
    html
}

/// Write the printable form to a file.
pub fn write_html_form(record: &ScreeningRecord, path: &Path) -> Result<()> {
    let html = generate_html(record);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write form to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
@page { size: A4 landscape; margin: 8mm; }
body { font-family: "Sarabun", "Tahoma", sans-serif; font-size: 12.5pt; }
.page { width: 270mm; margin: 0 auto; }
.box { border: 1px solid #333; padding: 6px; }
.grid { display: grid; grid-template-columns: 1.1fr 0.9fr; gap: 6px; }
.title { text-align: center; font-weight: 700; font-size: 16pt; }
.subtitle { text-align: center; font-size: 12pt; margin-top: 2px; }
.section-title { font-weight: 700; margin-top: 6px; }
.small { font-size: 11pt; }
.checkbox { display: inline-flex; align-items: center; gap: 4px; margin-right: 8px; }
.line { border-bottom: 1px dotted #333; min-width: 80px; display: inline-block; }
.line.wide { min-width: 220px; }
.signature { margin-top: 1.2em; text-align: right; }
.right { text-align: right; }
.fail td, div.fail { font-weight: 700; }
table { width: 100%; border-collapse: collapse; }
td, th { border: 1px solid #333; padding: 4px; vertical-align: top; }
th { background: #f5f5f5; }
"#;
