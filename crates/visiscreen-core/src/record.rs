//! Screening record: the structured export document with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{EvaluationOptions, EvaluationResult, ItemResult, VisualFieldPolicy};
use crate::error::ScreeningError;
use crate::model::{Correction, InputRecord};
use crate::recommend::derive_recommendations;
use crate::registry::Registry;

/// Device name recorded when none is given.
pub const DEFAULT_DEVICE: &str = "Titmus V2a";

/// Exam metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMeta {
    pub device: String,
    pub job_group_key: String,
    pub job_group_label: String,
    pub exam_date: NaiveDate,
}

/// Identity of the person screened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: String,
    /// Hospital number.
    #[serde(default)]
    pub hn: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// Correction worn for each battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionModes {
    #[serde(default)]
    pub far: Correction,
    #[serde(default)]
    pub near: Correction,
}

/// Sign-off and free-text review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub physician: Option<String>,
    #[serde(default)]
    pub physician_note: String,
}

/// Evaluation output plus the advice derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub overall_ok: bool,
    pub failures: Vec<String>,
    pub items: Vec<ItemResult>,
    pub recommendations: Vec<String>,
}

impl Interpretation {
    pub fn new(result: EvaluationResult, input: &InputRecord) -> Self {
        let recommendations = derive_recommendations(&result.failures, &input.symptoms);
        Self {
            overall_ok: result.overall_ok,
            failures: result.failures,
            items: result.items,
            recommendations,
        }
    }
}

/// Everything captured at intake, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intake {
    pub device: Option<String>,
    pub job_group: String,
    pub exam_date: NaiveDate,
    pub person: Person,
    pub correction: CorrectionModes,
    pub inputs: InputRecord,
    pub review: Review,
}

/// A complete screening record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    pub meta: ExamMeta,
    pub person: Person,
    pub correction: CorrectionModes,
    pub inputs: InputRecord,
    pub options: EvaluationOptions,
    pub interpretation: Interpretation,
    #[serde(default)]
    pub review: Review,
}

impl ScreeningRecord {
    /// Evaluate an intake against the registry and assemble the record.
    pub fn build(
        intake: Intake,
        registry: &Registry,
        policy: VisualFieldPolicy,
    ) -> Result<Self, ScreeningError> {
        let group = registry.group(&intake.job_group)?;
        let options = EvaluationOptions::for_input(&intake.inputs, policy);
        let result = registry.evaluate(group.key(), &intake.inputs, &options)?;
        let interpretation = Interpretation::new(result, &intake.inputs);

        tracing::debug!(
            job_group = group.key(),
            overall_ok = interpretation.overall_ok,
            "built screening record"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            meta: ExamMeta {
                device: intake.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                job_group_key: group.key().to_string(),
                job_group_label: group.label().to_string(),
                exam_date: intake.exam_date,
            },
            person: intake.person,
            correction: intake.correction,
            inputs: intake.inputs,
            options,
            interpretation,
            review: intake.review,
        })
    }

    /// Recompute the interpretation from the stored inputs.
    ///
    /// Used when a stored record is reopened; the job-group label is refreshed
    /// too so it always matches the registry in use. Block inclusion follows
    /// the current inputs while the visual-field policy is kept.
    pub fn reevaluate(&mut self, registry: &Registry) -> Result<(), ScreeningError> {
        let group = registry.group(&self.meta.job_group_key)?;
        self.options = EvaluationOptions::for_input(&self.inputs, self.options.visual_field_policy);
        let result = registry.evaluate(group.key(), &self.inputs, &self.options)?;
        self.meta.job_group_label = group.label().to_string();
        self.interpretation = Interpretation::new(result, &self.inputs);
        Ok(())
    }

    /// File stem for text and JSON exports, e.g. `vision_screening_12345_2025-01-15`.
    pub fn export_stem(&self) -> String {
        format!("vision_screening_{}", self.stem_suffix())
    }

    /// File stem for the printable form, e.g. `vision_form_12345_2025-01-15`.
    pub fn form_stem(&self) -> String {
        format!("vision_form_{}", self.stem_suffix())
    }

    fn stem_suffix(&self) -> String {
        let hn = self.person.hn.trim();
        let hn = if hn.is_empty() {
            "no_hn".to_string()
        } else {
            hn.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect()
        };
        format!("{hn}_{}", self.meta.exam_date.format("%Y-%m-%d"))
    }

    /// Save the record as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize record")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write record to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record from {}", path.display()))?;
        let record: ScreeningRecord =
            serde_json::from_str(&content).context("failed to parse record JSON")?;
        Ok(record)
    }
}
