//! Advisory recommendations derived from failed items.

use crate::model::Symptoms;

pub const NO_FURTHER_TESTING: &str = "No indication for further testing from this screening \
     (physician to consider symptoms/history).";

pub const VA_RETEST: &str = "Retest visual acuity: confirm test distance, lighting and occlusion, \
     with the worker wearing their usual correction.";
pub const VA_REFRACTION: &str =
    "If still below reference: further refraction assessment by an optometrist or ophthalmologist.";

pub const STEREO_RETEST: &str =
    "Retest stereo depth: confirm correction is worn, posture is correct \
     and instructions were understood.";
pub const STEREO_REFERRAL: &str =
    "If still abnormal: consult an ophthalmologist for a binocular vision assessment.";

pub const COLOR_CONFIRM: &str = "Retest color vision and confirm with an additional standard \
     plate test (e.g. PIP/Ishihara).";

pub const PHORIA_RETEST: &str =
    "Retest phoria: check instructions, cooperation and fatigue at the time of testing.";
pub const PHORIA_SYMPTOMS: &str =
    "If eye strain, headache or double vision is present: refer to an \
     ophthalmologist for a binocular vision assessment.";

pub const BINOCULAR_RETEST: &str =
    "Retest binocular fusion and assess for diplopia or suppression.";

pub const VISUAL_FIELD_REFERRAL: &str =
    "Refer for formal perimetry to confirm the visual-field finding.";

/// Failure categories, in the order their advice is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Acuity,
    Stereo,
    Color,
    Phoria,
    Binocular,
    VisualField,
}

impl Category {
    const ORDER: [Category; 6] = [
        Category::Acuity,
        Category::Stereo,
        Category::Color,
        Category::Phoria,
        Category::Binocular,
        Category::VisualField,
    ];

    fn matches(self, tag: &str) -> bool {
        match self {
            Category::Acuity => tag.contains("VA"),
            Category::Stereo => tag.contains("Stereo"),
            Category::Color => tag.contains("Color"),
            Category::Phoria => tag.contains("Phoria"),
            Category::Binocular => tag.contains("Binocular"),
            Category::VisualField => tag.contains("Visual field"),
        }
    }

    fn advice(self, symptoms: &Symptoms) -> Vec<&'static str> {
        match self {
            Category::Acuity => vec![VA_RETEST, VA_REFRACTION],
            Category::Stereo => vec![STEREO_RETEST, STEREO_REFERRAL],
            Category::Color => vec![COLOR_CONFIRM],
            Category::Phoria if symptoms.any() => vec![PHORIA_RETEST, PHORIA_SYMPTOMS],
            Category::Phoria => vec![PHORIA_RETEST],
            Category::Binocular => vec![BINOCULAR_RETEST],
            Category::VisualField => vec![VISUAL_FIELD_REFERRAL],
        }
    }
}

/// Map failure tags to advisory sentences.
///
/// Categories are emitted in a fixed order regardless of tag order, each at
/// most once, and duplicate sentences are dropped keeping the first. An empty
/// tag list yields exactly [`NO_FURTHER_TESTING`]; tags outside every category
/// contribute nothing.
pub fn derive_recommendations<S: AsRef<str>>(failures: &[S], symptoms: &Symptoms) -> Vec<String> {
    if failures.is_empty() {
        return vec![NO_FURTHER_TESTING.to_string()];
    }

    let mut out: Vec<String> = Vec::new();
    for category in Category::ORDER {
        if !failures.iter().any(|tag| category.matches(tag.as_ref())) {
            continue;
        }
        for sentence in category.advice(symptoms) {
            if !out.iter().any(|s| s == sentence) {
                out.push(sentence.to_string());
            }
        }
    }
    out
}
