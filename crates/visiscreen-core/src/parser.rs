//! TOML intake parser.
//!
//! Loads screening intakes from TOML files and directories, and validates them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::{evaluate, EvaluationOptions, Outcome, VisualFieldPolicy};
use crate::model::{
    Correction, FarInput, InputRecord, IntermediateInput, NearInput, Symptoms, VisualField,
};
use crate::record::{CorrectionModes, Intake, Person, Review};
use crate::registry::Registry;

/// Intermediate TOML structure for parsing intake files.
#[derive(Debug, Deserialize)]
struct TomlIntakeFile {
    meta: TomlMeta,
    #[serde(default)]
    person: Person,
    #[serde(default)]
    correction: TomlCorrection,
    #[serde(default)]
    far: FarInput,
    #[serde(default)]
    near: NearInput,
    #[serde(default)]
    intermediate: Option<IntermediateInput>,
    #[serde(default)]
    visual_field: Option<VisualField>,
    #[serde(default)]
    symptoms: Symptoms,
    #[serde(default)]
    review: Review,
}

#[derive(Debug, Deserialize)]
struct TomlMeta {
    job_group: String,
    /// Either a TOML date (`2025-01-15`) or a quoted string.
    #[serde(default)]
    exam_date: Option<toml::Value>,
    #[serde(default)]
    device: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlCorrection {
    #[serde(default)]
    far: Option<String>,
    #[serde(default)]
    near: Option<String>,
}

fn parse_correction(value: Option<String>) -> Result<Correction> {
    match value {
        Some(s) => s.parse().map_err(|e: String| anyhow::anyhow!("{}", e)),
        None => Ok(Correction::default()),
    }
}

fn parse_exam_date(value: Option<toml::Value>) -> Result<NaiveDate> {
    let text = match value {
        None => return Ok(chrono::Local::now().date_naive()),
        Some(toml::Value::String(s)) => s,
        Some(toml::Value::Datetime(d)) => d.to_string(),
        Some(other) => anyhow::bail!("exam_date must be a date, got {}", other.type_str()),
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid exam_date: {text}"))
}

/// Parse a single TOML file into an [`Intake`].
pub fn parse_intake(path: &Path) -> Result<Intake> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read intake file: {}", path.display()))?;

    parse_intake_str(&content, path)
}

/// Parse a TOML string into an [`Intake`] (useful for testing).
pub fn parse_intake_str(content: &str, source_path: &Path) -> Result<Intake> {
    let parsed: TomlIntakeFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let exam_date = parse_exam_date(parsed.meta.exam_date)?;
    let correction = CorrectionModes {
        far: parse_correction(parsed.correction.far)?,
        near: parse_correction(parsed.correction.near)?,
    };

    Ok(Intake {
        device: parsed.meta.device,
        job_group: parsed.meta.job_group,
        exam_date,
        person: parsed.person,
        correction,
        inputs: InputRecord {
            far: parsed.far,
            near: parsed.near,
            intermediate: parsed.intermediate,
            visual_field: parsed.visual_field,
            symptoms: parsed.symptoms,
        },
        review: parsed.review,
    })
}

/// Recursively load all `.toml` intake files from a directory, sorted by path.
pub fn load_intake_directory(dir: &Path) -> Result<Vec<(PathBuf, Intake)>> {
    let mut intakes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            intakes.extend(load_intake_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_intake(&path) {
                Ok(intake) => intakes.push((path, intake)),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    intakes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(intakes)
}

/// A warning from intake validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The field or item concerned (if applicable).
    pub field: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(field: Option<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate an intake for common data-entry issues.
///
/// Warnings never block evaluation; they flag readings a technician most
/// likely forgot or mistyped.
pub fn validate_intake(
    intake: &Intake,
    registry: &Registry,
    policy: VisualFieldPolicy,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if intake.person.name.trim().is_empty() && intake.person.hn.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            Some("person".into()),
            "neither name nor HN recorded",
        ));
    }

    if let Some(age) = intake.person.age {
        if !(15..=90).contains(&age) {
            warnings.push(ValidationWarning::new(
                Some("person.age".into()),
                format!("implausible age for an occupational screening: {age}"),
            ));
        }
    }

    let standard = match registry.get_standard(&intake.job_group) {
        Ok(standard) => standard,
        Err(e) => {
            warnings.push(ValidationWarning::new(Some("meta.job_group".into()), e.to_string()));
            return warnings;
        }
    };

    // Missing readings the job group requires.
    let options = EvaluationOptions::for_input(&intake.inputs, policy);
    let result = evaluate(&intake.inputs, standard, &options);
    for item in result
        .items
        .iter()
        .filter(|r| r.outcome == Outcome::NotRecorded)
    {
        warnings.push(ValidationWarning::new(
            Some(item.item.failure_tag()),
            format!(
                "{} is required for {} but not recorded",
                item.item.name(),
                intake.job_group
            ),
        ));
    }

    if intake.inputs.intermediate.is_some() && !standard.has_intermediate() {
        warnings.push(ValidationWarning::new(
            Some("intermediate".into()),
            format!(
                "intermediate readings recorded but {} has no intermediate standard",
                intake.job_group
            ),
        ));
    }

    if let Some(vf) = &intake.inputs.visual_field {
        if vf.is_abnormal() && policy == VisualFieldPolicy::ReferenceOnly {
            warnings.push(ValidationWarning::new(
                Some("visual_field".into()),
                "visual field is abnormal but recorded for reference only; \
                 it does not affect the overall result",
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TemporalReach, VaCode};

    const OFFICE_TOML: &str = r#"
[meta]
job_group = "office"
exam_date = 2025-01-15

[person]
name = "Somchai Jaidee"
hn = "12345"
age = 42
gender = "M"

[correction]
far = "glasses"
near = "none"

[far]
binocular_ok = true
va_be = 8
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

[review]
physician_note = "Fit for office work."
"#;

    fn path() -> PathBuf {
        PathBuf::from("test.toml")
    }

    #[test]
    fn parse_valid_toml() {
        let intake = parse_intake_str(OFFICE_TOML, &path()).unwrap();
        assert_eq!(intake.job_group, "office");
        assert_eq!(intake.exam_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(intake.person.hn, "12345");
        assert_eq!(intake.correction.far, Correction::Glasses);
        assert_eq!(intake.correction.near, Correction::Uncorrected);
        assert_eq!(intake.inputs.far.va_be, Some(VaCode::fixed(8)));
        assert!(intake.inputs.far.stereo.is_none());
        assert!(intake.inputs.intermediate.is_none());
        assert_eq!(intake.review.physician_note, "Fit for office work.");
    }

    #[test]
    fn parse_quoted_date_and_visual_field() {
        let toml = r#"
[meta]
job_group = "labor"
exam_date = "2024-11-02"
device = "Optec 5000"

[visual_field]
status = "abnormal"
right_temporal = 55
left_temporal = "no_light"
left_nasal_seen = false
"#;
        let intake = parse_intake_str(toml, &path()).unwrap();
        assert_eq!(intake.device.as_deref(), Some("Optec 5000"));
        let vf = intake.inputs.visual_field.unwrap();
        assert_eq!(vf.right_temporal, TemporalReach::Deg55);
        assert!(!vf.left_nasal_seen);
        assert!(!intake.inputs.far.binocular_ok);
    }

    #[test]
    fn parse_rejects_out_of_scale_reading() {
        let toml = r#"
[meta]
job_group = "office"
exam_date = 2025-01-15

[far]
va_be = 15
"#;
        let err = parse_intake_str(toml, &path()).unwrap_err();
        assert!(format!("{err:#}").contains("outside the scale"));
    }

    #[test]
    fn parse_rejects_bad_date_and_correction() {
        let bad_date = "[meta]\njob_group = \"office\"\nexam_date = \"15/01/2025\"\n";
        assert!(parse_intake_str(bad_date, &path()).is_err());

        let bad_correction =
            "[meta]\njob_group = \"office\"\nexam_date = 2025-01-15\n[correction]\nfar = \"monocle\"\n";
        assert!(parse_intake_str(bad_correction, &path()).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        assert!(parse_intake_str("this is not valid toml {{{}}", &path()).is_err());
        // meta.job_group is required
        assert!(parse_intake_str("[person]\nname = \"x\"\n", &path()).is_err());
    }

    #[test]
    fn validate_clean_intake() {
        let intake = parse_intake_str(OFFICE_TOML, &path()).unwrap();
        let warnings = validate_intake(&intake, &Registry::builtin(), VisualFieldPolicy::default());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn validate_flags_missing_readings() {
        let mut intake = parse_intake_str(OFFICE_TOML, &path()).unwrap();
        intake.inputs.far.color_correct = None;
        intake.inputs.near.lphoria = None;
        let warnings = validate_intake(&intake, &Registry::builtin(), VisualFieldPolicy::default());
        let fields: Vec<_> = warnings.iter().filter_map(|w| w.field.as_deref()).collect();
        assert_eq!(fields, vec!["Color (Far)", "Lateral Phoria (Near)"]);
    }

    #[test]
    fn validate_unknown_group_and_age() {
        let mut intake = parse_intake_str(OFFICE_TOML, &path()).unwrap();
        intake.job_group = "astronaut".into();
        intake.person.age = Some(7);
        let warnings = validate_intake(&intake, &Registry::builtin(), VisualFieldPolicy::default());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("implausible age"));
        assert_eq!(warnings[1].message, "unknown job group: astronaut");
    }

    #[test]
    fn validate_intermediate_without_standard() {
        let toml = r#"
[meta]
job_group = "labor"
exam_date = 2025-01-15

[person]
hn = "1"

[far]
binocular_ok = true
va_be = 8
va_re = 7
va_le = 7
color_correct = 6
vphoria = 4

[near]
binocular_ok = true
va_be = 7
va_re = 6
va_le = 6

[intermediate]
va_be = 8
"#;
        let intake = parse_intake_str(toml, &path()).unwrap();
        let warnings = validate_intake(&intake, &Registry::builtin(), VisualFieldPolicy::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field.as_deref(), Some("intermediate"));
    }

    #[test]
    fn validate_reference_only_visual_field() {
        let mut intake = parse_intake_str(OFFICE_TOML, &path()).unwrap();
        intake.inputs.visual_field = Some(VisualField {
            status: crate::model::VisualFieldStatus::Abnormal,
            ..Default::default()
        });
        let registry = Registry::builtin();
        let warnings = validate_intake(&intake, &registry, VisualFieldPolicy::ReferenceOnly);
        assert_eq!(warnings.len(), 1);
        let folded = validate_intake(&intake, &registry, VisualFieldPolicy::FoldIntoFailures);
        assert!(folded.is_empty());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), OFFICE_TOML).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("a.toml"), OFFICE_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml {{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let intakes = load_intake_directory(dir.path()).unwrap();
        assert_eq!(intakes.len(), 2);
        assert!(intakes[0].0.ends_with("b.toml"));
        assert!(intakes[1].0.ends_with("nested/a.toml"));
    }

    #[test]
    fn load_directory_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_intake_directory(file.path()).is_err());
    }
}
