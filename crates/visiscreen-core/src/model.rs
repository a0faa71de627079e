//! Core data model types for visiscreen.
//!
//! Measured scales are validated newtypes, so a value outside its chart
//! (e.g. visual acuity 15) can never reach the evaluator. `Option` carries
//! the two distinct "missing" cases: on a [`Standard`] it means the item is
//! not assessed for the job group, on an [`InputRecord`] it means the value
//! was not recorded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScreeningError;

macro_rules! bounded_code {
    ($(#[$doc:meta])* $name:ident, $scale:literal, $min:literal, $max:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            /// Lowest value on the scale.
            pub const MIN: u8 = $min;
            /// Highest value on the scale.
            pub const MAX: u8 = $max;

            /// Validate a raw reading.
            pub fn new(value: u8) -> Result<Self, ScreeningError> {
                if (Self::MIN..=Self::MAX).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err(ScreeningError::OutOfRange {
                        scale: $scale,
                        value,
                        min: Self::MIN,
                        max: Self::MAX,
                    })
                }
            }

            /// Build a code for reference data; rejected at compile time in const context.
            pub const fn fixed(value: u8) -> Self {
                assert!(value >= Self::MIN && value <= Self::MAX);
                Self(value)
            }

            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ScreeningError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for u8 {
            fn from(code: $name) -> u8 {
                code.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bounded_code!(
    /// Visual acuity picture number (1-14); higher is sharper vision.
    VaCode,
    "visual acuity",
    1,
    14
);
bounded_code!(
    /// Stereo depth picture number (1-9); higher is finer depth discrimination.
    StereoCode,
    "stereo depth",
    1,
    9
);
bounded_code!(
    /// Number of color plates read correctly, out of 8.
    ColorCount,
    "color plates",
    0,
    8
);
bounded_code!(
    /// Vertical phoria reading (1-7).
    VerticalPhoria,
    "vertical phoria",
    1,
    7
);
bounded_code!(
    /// Lateral phoria reading (1-15).
    LateralPhoria,
    "lateral phoria",
    1,
    15
);

const SNELLEN: [&str; 14] = [
    "20/200", "20/100", "20/70", "20/50", "20/40", "20/35", "20/30", "20/25", "20/22", "20/20",
    "20/18", "20/17", "20/15", "20/13",
];

const ARC_SECONDS: [&str; 9] = [
    "400\"", "200\"", "100\"", "70\"", "50\"", "40\"", "30\"", "25\"", "20\"",
];

impl VaCode {
    /// Snellen fraction for this picture number.
    pub fn snellen(self) -> &'static str {
        SNELLEN[usize::from(self.0 - 1)]
    }
}

impl StereoCode {
    /// Disparity in seconds of arc for this picture number.
    pub fn arc_seconds(self) -> &'static str {
        ARC_SECONDS[usize::from(self.0 - 1)]
    }
}

/// Render an acuity code as `"8 (20/25)"`, or `"N/A"` when absent.
pub fn format_va(code: Option<VaCode>) -> String {
    match code {
        Some(c) => format!("{} ({})", c, c.snellen()),
        None => "N/A".to_string(),
    }
}

/// Render a stereo code as `"5 (50\")"`, or `"N/A"` when absent.
pub fn format_stereo(code: Option<StereoCode>) -> String {
    match code {
        Some(c) => format!("{} ({})", c, c.arc_seconds()),
        None => "N/A".to_string(),
    }
}

/// Inclusive integer interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    lo: u8,
    hi: u8,
}

#[derive(Deserialize)]
struct RawRange {
    lo: u8,
    hi: u8,
}

impl TryFrom<RawRange> for Range {
    type Error = ScreeningError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Range::new(raw.lo, raw.hi)
    }
}

impl Range {
    pub fn new(lo: u8, hi: u8) -> Result<Self, ScreeningError> {
        if lo > hi {
            return Err(ScreeningError::InvalidRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Build a range for reference data; rejected at compile time in const context.
    pub const fn fixed(lo: u8, hi: u8) -> Self {
        assert!(lo <= hi);
        Self { lo, hi }
    }

    pub fn lo(&self) -> u8 {
        self.lo
    }

    pub fn hi(&self) -> u8 {
        self.hi
    }

    pub fn contains(&self, value: u8) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

/// Reference standard for one job group.
///
/// `None` on any limit means the item is not assessed for this group and
/// always passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standard {
    pub far_binocular_required: bool,
    pub far_va_be_min: Option<VaCode>,
    pub far_va_re_min: Option<VaCode>,
    pub far_va_le_min: Option<VaCode>,
    pub far_stereo_min: Option<StereoCode>,
    pub far_color_min_correct: Option<ColorCount>,
    pub far_vphoria_range: Option<Range>,
    pub far_lphoria_range: Option<Range>,

    pub near_binocular_required: bool,
    pub near_va_be_min: Option<VaCode>,
    pub near_va_re_min: Option<VaCode>,
    pub near_va_le_min: Option<VaCode>,
    pub near_vphoria_range: Option<Range>,
    pub near_lphoria_range: Option<Range>,

    pub inter_va_be_min: Option<VaCode>,
    pub inter_va_re_min: Option<VaCode>,
    pub inter_va_le_min: Option<VaCode>,
}

impl Default for Standard {
    fn default() -> Self {
        Self {
            far_binocular_required: true,
            far_va_be_min: None,
            far_va_re_min: None,
            far_va_le_min: None,
            far_stereo_min: None,
            far_color_min_correct: None,
            far_vphoria_range: None,
            far_lphoria_range: None,
            near_binocular_required: true,
            near_va_be_min: None,
            near_va_re_min: None,
            near_va_le_min: None,
            near_vphoria_range: None,
            near_lphoria_range: None,
            inter_va_be_min: None,
            inter_va_re_min: None,
            inter_va_le_min: None,
        }
    }
}

impl Standard {
    /// A standard that assesses nothing: every item resolves to N/A.
    pub fn not_assessed() -> Self {
        Self {
            far_binocular_required: false,
            near_binocular_required: false,
            ..Self::default()
        }
    }

    /// Whether any intermediate acuity threshold is defined.
    pub fn has_intermediate(&self) -> bool {
        self.inter_va_be_min.is_some()
            || self.inter_va_re_min.is_some()
            || self.inter_va_le_min.is_some()
    }
}

/// Viewing distance of a test battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Far,
    Near,
    Intermediate,
}

impl Distance {
    /// Short label used inside item names and failure tags.
    pub fn label(self) -> &'static str {
        match self {
            Distance::Far => "Far",
            Distance::Near => "Near",
            Distance::Intermediate => "Inter",
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Far => write!(f, "far"),
            Distance::Near => write!(f, "near"),
            Distance::Intermediate => write!(f, "intermediate"),
        }
    }
}

/// Far battery readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarInput {
    /// Binocular fusion (3 cubes) seen; an absent flag counts as not passed.
    #[serde(default)]
    pub binocular_ok: bool,
    #[serde(default)]
    pub va_be: Option<VaCode>,
    #[serde(default)]
    pub va_re: Option<VaCode>,
    #[serde(default)]
    pub va_le: Option<VaCode>,
    #[serde(default)]
    pub stereo: Option<StereoCode>,
    #[serde(default)]
    pub color_correct: Option<ColorCount>,
    #[serde(default)]
    pub vphoria: Option<VerticalPhoria>,
    #[serde(default)]
    pub lphoria: Option<LateralPhoria>,
}

/// Near battery readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearInput {
    #[serde(default)]
    pub binocular_ok: bool,
    #[serde(default)]
    pub va_be: Option<VaCode>,
    #[serde(default)]
    pub va_re: Option<VaCode>,
    #[serde(default)]
    pub va_le: Option<VaCode>,
    #[serde(default)]
    pub vphoria: Option<VerticalPhoria>,
    #[serde(default)]
    pub lphoria: Option<LateralPhoria>,
}

/// Intermediate-distance acuity readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateInput {
    #[serde(default)]
    pub va_be: Option<VaCode>,
    #[serde(default)]
    pub va_re: Option<VaCode>,
    #[serde(default)]
    pub va_le: Option<VaCode>,
}

/// Overall visual-field screen status as judged by the technician.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualFieldStatus {
    #[default]
    Normal,
    Abnormal,
}

/// Furthest temporal position at which the light was seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemporalValue", into = "TemporalValue")]
pub enum TemporalReach {
    #[default]
    Deg85,
    Deg70,
    Deg55,
    NoLight,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TemporalValue {
    Degrees(u16),
    Text(String),
}

impl TryFrom<TemporalValue> for TemporalReach {
    type Error = String;

    fn try_from(value: TemporalValue) -> Result<Self, Self::Error> {
        match value {
            TemporalValue::Degrees(85) => Ok(TemporalReach::Deg85),
            TemporalValue::Degrees(70) => Ok(TemporalReach::Deg70),
            TemporalValue::Degrees(55) => Ok(TemporalReach::Deg55),
            TemporalValue::Degrees(other) => Err(format!(
                "temporal reach must be 85, 70, 55 or \"no_light\", got {other}"
            )),
            TemporalValue::Text(s) => s.parse(),
        }
    }
}

impl From<TemporalReach> for TemporalValue {
    fn from(reach: TemporalReach) -> Self {
        match reach {
            TemporalReach::Deg85 => TemporalValue::Degrees(85),
            TemporalReach::Deg70 => TemporalValue::Degrees(70),
            TemporalReach::Deg55 => TemporalValue::Degrees(55),
            TemporalReach::NoLight => TemporalValue::Text("no_light".into()),
        }
    }
}

impl FromStr for TemporalReach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_end_matches('°') {
            "85" => Ok(TemporalReach::Deg85),
            "70" => Ok(TemporalReach::Deg70),
            "55" => Ok(TemporalReach::Deg55),
            "no_light" | "none" | "not seen" => Ok(TemporalReach::NoLight),
            other => Err(format!("unknown temporal reach: {other}")),
        }
    }
}

impl fmt::Display for TemporalReach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalReach::Deg85 => write!(f, "85°"),
            TemporalReach::Deg70 => write!(f, "70°"),
            TemporalReach::Deg55 => write!(f, "55°"),
            TemporalReach::NoLight => write!(f, "no light seen"),
        }
    }
}

/// Visual-field screen (perimeter score). Recorded for reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualField {
    #[serde(default)]
    pub status: VisualFieldStatus,
    #[serde(default)]
    pub right_temporal: TemporalReach,
    #[serde(default = "default_true")]
    pub right_nasal_seen: bool,
    #[serde(default)]
    pub left_temporal: TemporalReach,
    #[serde(default = "default_true")]
    pub left_nasal_seen: bool,
}

impl VisualField {
    pub fn is_abnormal(&self) -> bool {
        self.status == VisualFieldStatus::Abnormal
    }

    /// One-line summary, e.g. `"R Temporal:85° | L Temporal:70°"`.
    pub fn summary(&self) -> String {
        format!(
            "R Temporal:{} | L Temporal:{}",
            self.right_temporal, self.left_temporal
        )
    }
}

fn default_true() -> bool {
    true
}

/// Symptoms reported alongside the screening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptoms {
    #[serde(default)]
    pub eye_strain: bool,
    #[serde(default)]
    pub headache: bool,
    #[serde(default)]
    pub double_vision: bool,
}

impl Symptoms {
    pub fn any(&self) -> bool {
        self.eye_strain || self.headache || self.double_vision
    }
}

/// Everything measured in one screening session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(default)]
    pub far: FarInput,
    #[serde(default)]
    pub near: NearInput,
    #[serde(default)]
    pub intermediate: Option<IntermediateInput>,
    #[serde(default)]
    pub visual_field: Option<VisualField>,
    #[serde(default)]
    pub symptoms: Symptoms,
}

/// Optical correction worn during a battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    #[default]
    Uncorrected,
    Glasses,
    ContactLenses,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correction::Uncorrected => write!(f, "no correction"),
            Correction::Glasses => write!(f, "glasses"),
            Correction::ContactLenses => write!(f, "contact lenses"),
        }
    }
}

impl FromStr for Correction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "uncorrected" | "none" | "no_correction" => Ok(Correction::Uncorrected),
            "glasses" | "spectacles" => Ok(Correction::Glasses),
            "contact_lenses" | "contacts" | "contact_lens" => Ok(Correction::ContactLenses),
            other => Err(format!("unknown correction: {other}")),
        }
    }
}
