//! Job-group reference standards.
//!
//! Thresholds follow the V2a / Optec 5000 occupational job standards table:
//! acuity and stereo limits are the minimum picture number that must be
//! read, phoria limits are inclusive ranges, color is a minimum count of
//! plates read correctly out of 8.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{evaluate, EvaluationOptions, EvaluationResult};
use crate::error::ScreeningError;
use crate::model::{ColorCount, InputRecord, Range, Standard, StereoCode, VaCode};

/// Occupational group whose visual demands select a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobGroup {
    Unspecified,
    Office,
    Inspector,
    DriverMobile,
    Operator,
    Tradesman,
    Labor,
}

impl JobGroup {
    pub const ALL: [JobGroup; 7] = [
        JobGroup::Unspecified,
        JobGroup::Office,
        JobGroup::Inspector,
        JobGroup::DriverMobile,
        JobGroup::Operator,
        JobGroup::Tradesman,
        JobGroup::Labor,
    ];

    pub fn key(self) -> &'static str {
        match self {
            JobGroup::Unspecified => "unspecified",
            JobGroup::Office => "office",
            JobGroup::Inspector => "inspector",
            JobGroup::DriverMobile => "driver_mobile",
            JobGroup::Operator => "operator",
            JobGroup::Tradesman => "tradesman",
            JobGroup::Labor => "labor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobGroup::Unspecified => "0) Unspecified / unknown job group",
            JobGroup::Office => "1) Office - Clerical & Administrative",
            JobGroup::Inspector => "2) Inspector - Inspection & Close Machine Work",
            JobGroup::DriverMobile => "3) Driver/Crane - Operator of Mobile Equipment",
            JobGroup::Operator => "4) Operator - Machine Operators",
            JobGroup::Tradesman => "5) Tradesman - Mechanics & Skilled Tradesmen",
            JobGroup::Labor => "6) Labor - Unskilled Laborers",
        }
    }
}

impl fmt::Display for JobGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for JobGroup {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "unspecified" => Ok(JobGroup::Unspecified),
            "office" => Ok(JobGroup::Office),
            "inspector" => Ok(JobGroup::Inspector),
            "driver_mobile" | "driver" => Ok(JobGroup::DriverMobile),
            "operator" => Ok(JobGroup::Operator),
            "tradesman" => Ok(JobGroup::Tradesman),
            "labor" | "labour" => Ok(JobGroup::Labor),
            _ => Err(ScreeningError::UnknownJobGroup(s.to_string())),
        }
    }
}

const fn va(n: u8) -> Option<VaCode> {
    Some(VaCode::fixed(n))
}

const VPHORIA: Option<Range> = Some(Range::fixed(3, 5));
const LPHORIA: Option<Range> = Some(Range::fixed(4, 13));
const COLOR_MIN: Option<ColorCount> = Some(ColorCount::fixed(5));

/// Reference standard for a job group, exactly as tabulated.
pub fn standard_for(group: JobGroup) -> Standard {
    match group {
        JobGroup::Unspecified => Standard::not_assessed(),
        JobGroup::Office => Standard {
            far_va_be_min: va(8),
            far_va_re_min: va(7),
            far_va_le_min: va(7),
            far_stereo_min: None,
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: VPHORIA,
            far_lphoria_range: LPHORIA,
            near_va_be_min: va(9),
            near_va_re_min: va(8),
            near_va_le_min: va(8),
            near_vphoria_range: VPHORIA,
            near_lphoria_range: LPHORIA,
            inter_va_be_min: va(9),
            inter_va_re_min: va(8),
            inter_va_le_min: va(8),
            ..Standard::default()
        },
        JobGroup::Inspector => Standard {
            far_va_be_min: va(7),
            far_va_re_min: va(6),
            far_va_le_min: va(6),
            far_stereo_min: Some(StereoCode::fixed(5)),
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: VPHORIA,
            far_lphoria_range: LPHORIA,
            near_va_be_min: va(9),
            near_va_re_min: va(8),
            near_va_le_min: va(8),
            near_vphoria_range: VPHORIA,
            near_lphoria_range: LPHORIA,
            inter_va_be_min: va(9),
            inter_va_re_min: va(8),
            inter_va_le_min: va(8),
            ..Standard::default()
        },
        JobGroup::DriverMobile => Standard {
            far_va_be_min: va(9),
            far_va_re_min: va(8),
            far_va_le_min: va(8),
            far_stereo_min: Some(StereoCode::fixed(6)),
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: VPHORIA,
            far_lphoria_range: LPHORIA,
            near_va_be_min: va(7),
            near_va_re_min: va(6),
            near_va_le_min: va(6),
            near_vphoria_range: VPHORIA,
            near_lphoria_range: LPHORIA,
            inter_va_be_min: va(7),
            inter_va_re_min: va(6),
            inter_va_le_min: va(6),
            ..Standard::default()
        },
        JobGroup::Operator => Standard {
            far_va_be_min: va(8),
            far_va_re_min: va(7),
            far_va_le_min: va(7),
            far_stereo_min: Some(StereoCode::fixed(5)),
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: VPHORIA,
            far_lphoria_range: LPHORIA,
            near_va_be_min: va(8),
            near_va_re_min: va(7),
            near_va_le_min: va(7),
            near_vphoria_range: VPHORIA,
            near_lphoria_range: LPHORIA,
            inter_va_be_min: va(8),
            inter_va_re_min: va(7),
            inter_va_le_min: va(7),
            ..Standard::default()
        },
        JobGroup::Tradesman => Standard {
            far_va_be_min: va(8),
            far_va_re_min: va(7),
            far_va_le_min: va(7),
            far_stereo_min: Some(StereoCode::fixed(5)),
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: VPHORIA,
            far_lphoria_range: LPHORIA,
            near_va_be_min: va(9),
            near_va_re_min: va(8),
            near_va_le_min: va(8),
            near_vphoria_range: VPHORIA,
            near_lphoria_range: LPHORIA,
            inter_va_be_min: va(9),
            inter_va_re_min: va(8),
            inter_va_le_min: va(8),
            ..Standard::default()
        },
        JobGroup::Labor => Standard {
            far_va_be_min: va(8),
            far_va_re_min: va(7),
            far_va_le_min: va(7),
            far_stereo_min: None,
            far_color_min_correct: COLOR_MIN,
            far_vphoria_range: Some(Range::fixed(2, 6)),
            far_lphoria_range: None,
            near_va_be_min: va(7),
            near_va_re_min: va(6),
            near_va_le_min: va(6),
            near_vphoria_range: None,
            near_lphoria_range: None,
            ..Standard::default()
        },
    }
}

/// A registered job group and its standard.
#[derive(Debug, Clone)]
pub struct Entry {
    pub group: JobGroup,
    pub standard: Standard,
}

/// Read-only catalogue of job groups, looked up by key.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// All groups, including the all-N/A `unspecified` catch-all.
    pub fn builtin() -> Self {
        Self::from_groups(&JobGroup::ALL)
    }

    /// The concrete groups only, without the catch-all.
    pub fn without_catch_all() -> Self {
        let groups: Vec<JobGroup> = JobGroup::ALL
            .into_iter()
            .filter(|g| *g != JobGroup::Unspecified)
            .collect();
        Self::from_groups(&groups)
    }

    /// Pick the variant by whether the catch-all group should be offered.
    pub fn with_catch_all(include: bool) -> Self {
        if include {
            Self::builtin()
        } else {
            Self::without_catch_all()
        }
    }

    fn from_groups(groups: &[JobGroup]) -> Self {
        Self {
            entries: groups
                .iter()
                .map(|&group| Entry {
                    group,
                    standard: standard_for(group),
                })
                .collect(),
        }
    }

    fn entry(&self, key: &str) -> Result<&Entry, ScreeningError> {
        self.entries
            .iter()
            .find(|e| e.group.key() == key)
            .ok_or_else(|| ScreeningError::UnknownJobGroup(key.to_string()))
    }

    /// Look up the standard for a job-group key.
    pub fn get_standard(&self, key: &str) -> Result<&Standard, ScreeningError> {
        self.entry(key).map(|e| &e.standard)
    }

    /// Human-readable label for a job-group key.
    pub fn label(&self, key: &str) -> Result<&'static str, ScreeningError> {
        self.entry(key).map(|e| e.group.label())
    }

    /// Resolve a key to its group, failing if it is not registered.
    pub fn group(&self, key: &str) -> Result<JobGroup, ScreeningError> {
        self.entry(key).map(|e| e.group)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_ok()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.group.key()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluate an input record against the standard registered under `key`.
    pub fn evaluate(
        &self,
        key: &str,
        input: &InputRecord,
        options: &EvaluationOptions,
    ) -> Result<EvaluationResult, ScreeningError> {
        let standard = self.get_standard(key)?;
        Ok(evaluate(input, standard, options))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_seven_groups() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 7);
        assert_eq!(
            registry.keys(),
            vec![
                "unspecified",
                "office",
                "inspector",
                "driver_mobile",
                "operator",
                "tradesman",
                "labor"
            ]
        );
    }

    #[test]
    fn catch_all_variant() {
        let registry = Registry::without_catch_all();
        assert_eq!(registry.len(), 6);
        assert!(!registry.contains("unspecified"));
        assert_eq!(
            registry.get_standard("unspecified").unwrap_err(),
            ScreeningError::UnknownJobGroup("unspecified".into())
        );
        assert!(Registry::with_catch_all(true).contains("unspecified"));
    }

    #[test]
    fn unknown_key_rejected() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.get_standard("astronaut").unwrap_err(),
            ScreeningError::UnknownJobGroup("astronaut".into())
        );
    }

    #[test]
    fn lookup_requires_exact_key() {
        let registry = Registry::builtin();
        for key in ["driver", "OFFICE", "Office ", "Driver-Mobile", "labour"] {
            assert_eq!(
                registry.get_standard(key).unwrap_err(),
                ScreeningError::UnknownJobGroup(key.into())
            );
            assert!(registry.group(key).is_err());
        }
        assert!(registry.get_standard("driver_mobile").is_ok());
    }

    #[test]
    fn office_thresholds() {
        let registry = Registry::builtin();
        let std = registry.get_standard("office").unwrap();
        assert_eq!(std.far_va_be_min, Some(VaCode::fixed(8)));
        assert_eq!(std.far_va_re_min, Some(VaCode::fixed(7)));
        assert_eq!(std.far_stereo_min, None);
        assert_eq!(std.far_color_min_correct, Some(ColorCount::fixed(5)));
        assert_eq!(std.far_vphoria_range, Some(Range::fixed(3, 5)));
        assert_eq!(std.near_va_be_min, Some(VaCode::fixed(9)));
        assert!(std.far_binocular_required && std.near_binocular_required);
    }

    #[test]
    fn labor_has_gaps() {
        let std = standard_for(JobGroup::Labor);
        assert_eq!(std.far_vphoria_range, Some(Range::fixed(2, 6)));
        assert!(std.far_lphoria_range.is_none());
        assert!(std.near_vphoria_range.is_none());
        assert!(!std.has_intermediate());
    }

    #[test]
    fn driver_needs_stereo_six() {
        let std = standard_for(JobGroup::DriverMobile);
        assert_eq!(std.far_stereo_min, Some(StereoCode::fixed(6)));
        assert_eq!(std.far_va_be_min, Some(VaCode::fixed(9)));
        assert_eq!(std.near_va_be_min, Some(VaCode::fixed(7)));
    }

    #[test]
    fn unspecified_assesses_nothing() {
        assert_eq!(standard_for(JobGroup::Unspecified), Standard::not_assessed());
    }

    #[test]
    fn key_parsing_and_labels() {
        assert_eq!("Driver-Mobile".parse::<JobGroup>().unwrap(), JobGroup::DriverMobile);
        assert_eq!("labour".parse::<JobGroup>().unwrap(), JobGroup::Labor);
        assert!("pilot".parse::<JobGroup>().is_err());
        let registry = Registry::builtin();
        assert_eq!(
            registry.label("office").unwrap(),
            "1) Office - Clerical & Administrative"
        );
        assert_eq!(JobGroup::Tradesman.to_string(), "tradesman");
    }
}
