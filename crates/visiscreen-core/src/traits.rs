//! Core trait definitions for screening record stores.
//!
//! The trait is implemented by the backends in the `visiscreen-store` crate.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::record::ScreeningRecord;

/// Default number of records returned by a listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Trait for document stores that persist screening records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable backend name (e.g. "file").
    fn name(&self) -> &str;

    /// Insert a new record and return its store id.
    async fn save(&self, record: &ScreeningRecord) -> anyhow::Result<String>;

    /// Replace the record stored under `id`.
    async fn update(&self, id: &str, record: &ScreeningRecord) -> anyhow::Result<()>;

    /// Fetch one record by id.
    async fn get(&self, id: &str) -> anyhow::Result<StoredRecord>;

    /// List records matching the query, newest first.
    async fn list(&self, query: &RecordQuery) -> anyhow::Result<Vec<StoredRecord>>;

    /// Remove the record stored under `id`.
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// A record together with its store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub record: ScreeningRecord,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, record: ScreeningRecord) -> Self {
        Self {
            id: id.into(),
            created_at: record.created_at,
            record,
        }
    }

    /// One-line listing label: `name | HN:hn | exam_date | created`.
    pub fn label(&self) -> String {
        let person = &self.record.person;
        let name = if person.name.trim().is_empty() {
            "-"
        } else {
            person.name.as_str()
        };
        let hn = if person.hn.trim().is_empty() {
            "-"
        } else {
            person.hn.as_str()
        };
        format!(
            "{name} | HN:{hn} | {} | {}",
            self.record.meta.exam_date.format("%Y-%m-%d"),
            self.created_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Filter for listing stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Case-insensitive substring of the name or HN.
    #[serde(default)]
    pub keyword: Option<String>,
    /// Exact exam date.
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            exam_date: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl RecordQuery {
    pub fn matches(&self, record: &ScreeningRecord) -> bool {
        if let Some(date) = self.exam_date {
            if record.meta.exam_date != date {
                return false;
            }
        }
        match self.keyword.as_deref().map(str::trim) {
            Some(kw) if !kw.is_empty() => {
                let kw = kw.to_lowercase();
                record.person.name.to_lowercase().contains(&kw)
                    || record.person.hn.to_lowercase().contains(&kw)
            }
            _ => true,
        }
    }

    /// Filter, sort newest first, and truncate to the limit.
    pub fn apply(&self, records: impl IntoIterator<Item = StoredRecord>) -> Vec<StoredRecord> {
        let mut out: Vec<StoredRecord> = records
            .into_iter()
            .filter(|r| self.matches(&r.record))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        out.truncate(self.limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::VisualFieldPolicy;
    use crate::record::tests::sample_intake;
    use crate::registry::Registry;
    use chrono::Duration;

    fn record(name: &str, hn: &str, minutes_ago: i64) -> StoredRecord {
        let mut intake = sample_intake();
        intake.person.name = name.into();
        intake.person.hn = hn.into();
        let mut record =
            ScreeningRecord::build(intake, &Registry::builtin(), VisualFieldPolicy::default())
                .unwrap();
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        StoredRecord::new(format!("{hn}-id"), record)
    }

    #[test]
    fn keyword_is_case_insensitive_on_name_and_hn() {
        let r = record("Malee Sukjai", "HN-778", 0).record;
        let by_name = RecordQuery {
            keyword: Some("malee".into()),
            ..Default::default()
        };
        assert!(by_name.matches(&r));
        let by_hn = RecordQuery {
            keyword: Some("hn-77".into()),
            ..Default::default()
        };
        assert!(by_hn.matches(&r));
        let miss = RecordQuery {
            keyword: Some("somchai".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&r));
        let blank = RecordQuery {
            keyword: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.matches(&r));
    }

    #[test]
    fn exam_date_is_exact() {
        let r = record("A", "1", 0).record;
        let hit = RecordQuery {
            exam_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            ..Default::default()
        };
        assert!(hit.matches(&r));
        let miss = RecordQuery {
            exam_date: NaiveDate::from_ymd_opt(2025, 1, 16),
            ..Default::default()
        };
        assert!(!miss.matches(&r));
    }

    #[test]
    fn apply_sorts_newest_first_and_limits() {
        let records = vec![record("Old", "1", 30), record("New", "2", 1), record("Mid", "3", 10)];
        let query = RecordQuery {
            limit: 2,
            ..Default::default()
        };
        let listed = query.apply(records);
        let names: Vec<_> = listed.iter().map(|r| r.record.person.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Mid"]);
        assert_eq!(RecordQuery::default().limit, 50);
    }

    #[test]
    fn label_format() {
        let r = record("Malee", "778", 0);
        let label = r.label();
        assert!(label.starts_with("Malee | HN:778 | 2025-01-15 | "), "got {label}");
        let anonymous = record("", "", 0);
        assert!(anonymous.label().starts_with("- | HN:- | "));
    }
}
