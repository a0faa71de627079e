//! visiscreen-report: renderings of a screening record.
//!
//! Every renderer works from the record's interpretation (item messages,
//! measured/reference strings, failure tags, recommendations) and never
//! re-derives pass/fail logic.

pub mod html;
pub mod text;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use visiscreen_core::record::ScreeningRecord;

/// An on-disk export of a screening record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Plain-text summary.
    Text,
    /// Full record as JSON.
    Json,
    /// Printable HTML form.
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Text, ExportFormat::Json, ExportFormat::Html];

    /// Parse `all` or a comma-separated list such as `json,html`.
    pub fn parse_list(list: &str) -> Result<Vec<ExportFormat>> {
        if list.trim() == "all" {
            return Ok(Self::ALL.to_vec());
        }
        let mut formats = Vec::new();
        for part in list.split(',') {
            let format: ExportFormat = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }

    /// Where this export of `record` lands inside `dir`.
    pub fn path_for(self, record: &ScreeningRecord, dir: &Path) -> PathBuf {
        match self {
            ExportFormat::Text => dir.join(format!("{}.txt", record.export_stem())),
            ExportFormat::Json => dir.join(format!("{}.json", record.export_stem())),
            ExportFormat::Html => dir.join(format!("{}.html", record.form_stem())),
        }
    }

    fn write(self, record: &ScreeningRecord, path: &Path) -> Result<()> {
        match self {
            ExportFormat::Text => text::write_text_summary(record, path),
            ExportFormat::Json => record.save_json(path),
            ExportFormat::Html => html::write_html_form(record, path),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => anyhow::bail!("unknown format: '{other}' (expected text, json, html or all)"),
        }
    }
}

/// Write the requested exports of `record` into `dir`, in the order given.
///
/// Returns each format with the path it was written to.
pub fn export_all(
    record: &ScreeningRecord,
    dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<(ExportFormat, PathBuf)>> {
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = format.path_for(record, dir);
        format.write(record, &path)?;
        written.push((format, path));
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use visiscreen_core::engine::VisualFieldPolicy;
    use visiscreen_core::parser::parse_intake_str;
    use visiscreen_core::record::ScreeningRecord;
    use visiscreen_core::registry::Registry;

    pub const OFFICE_TOML: &str = r#"
[meta]
job_group = "office"
exam_date = 2025-01-15

[person]
name = "Somchai <Jaidee>"
hn = "12345"
age = 42
gender = "M"

[correction]
far = "glasses"

[far]
binocular_ok = true
va_be = 6
va_re = 7
va_le = 7
color_correct = 5
vphoria = 4
lphoria = 8

[near]
binocular_ok = true
va_be = 9
va_re = 8
va_le = 8
vphoria = 4
lphoria = 8

[visual_field]
status = "normal"
right_temporal = 85
left_temporal = 70

[review]
physician_note = "Refer for refraction."
"#;

    pub fn record(toml: &str) -> ScreeningRecord {
        let intake = parse_intake_str(toml, Path::new("fixture.toml")).unwrap();
        ScreeningRecord::build(intake, &Registry::builtin(), VisualFieldPolicy::default()).unwrap()
    }

    pub fn office_record() -> ScreeningRecord {
        record(OFFICE_TOML)
    }
}
