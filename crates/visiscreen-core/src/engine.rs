//! Standards evaluation engine.
//!
//! Compares one [`InputRecord`] against one [`Standard`] item by item in a
//! fixed order. Every item is always evaluated and always produces a message;
//! nothing short-circuits, and evaluation never fails.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{
    format_stereo, format_va, ColorCount, Distance, InputRecord, IntermediateInput, Range,
    Standard, StereoCode, VaCode,
};

/// How a recorded visual-field screen affects the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualFieldPolicy {
    /// Recorded for reference only; never an evaluated item.
    #[default]
    ReferenceOnly,
    /// An abnormal status becomes a failed item tagged `Visual field`.
    FoldIntoFailures,
}

/// Options controlling which optional blocks are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    /// Evaluate the intermediate acuity block.
    #[serde(default)]
    pub include_intermediate: bool,
    /// The visual-field block is part of this screening.
    #[serde(default)]
    pub include_visual_field: bool,
    #[serde(default)]
    pub visual_field_policy: VisualFieldPolicy,
}

impl EvaluationOptions {
    /// Options implied by which optional blocks the input actually carries.
    pub fn for_input(input: &InputRecord, visual_field_policy: VisualFieldPolicy) -> Self {
        Self {
            include_intermediate: input.intermediate.is_some(),
            include_visual_field: input.visual_field.is_some(),
            visual_field_policy,
        }
    }
}

/// Which eye(s) an acuity reading was taken with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eye {
    Both,
    Right,
    Left,
}

impl Eye {
    fn long_name(self) -> &'static str {
        match self {
            Eye::Both => "Both eyes",
            Eye::Right => "Right eye",
            Eye::Left => "Left eye",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Eye::Both => "BE",
            Eye::Right => "RE",
            Eye::Left => "LE",
        }
    }
}

/// One evaluated screening item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Binocular { distance: Distance },
    Acuity { distance: Distance, eye: Eye },
    Stereo { distance: Distance },
    Color { distance: Distance },
    VerticalPhoria { distance: Distance },
    LateralPhoria { distance: Distance },
    /// The whole intermediate block when its standard is entirely absent.
    IntermediateBlock,
    VisualField,
}

impl Item {
    /// Display name used in messages, e.g. `"VA (Far) Both eyes"`.
    pub fn name(&self) -> String {
        match self {
            Item::Binocular { distance } => format!("Binocular vision ({})", distance.label()),
            Item::Acuity { distance, eye } => {
                format!("VA ({}) {}", distance.label(), eye.long_name())
            }
            Item::Stereo { distance } => format!("Stereo depth ({})", distance.label()),
            Item::Color { distance } => format!("Color ({})", distance.label()),
            Item::VerticalPhoria { distance } => {
                format!("Vertical Phoria ({})", distance.label())
            }
            Item::LateralPhoria { distance } => format!("Lateral Phoria ({})", distance.label()),
            Item::IntermediateBlock => "Intermediate".to_string(),
            Item::VisualField => "Visual field".to_string(),
        }
    }

    /// Short category label recorded when the item fails, e.g. `"VA (Far) BE"`.
    pub fn failure_tag(&self) -> String {
        match self {
            Item::Binocular { distance } => format!("Binocular ({})", distance.label()),
            Item::Acuity { distance, eye } => format!("VA ({}) {}", distance.label(), eye.tag()),
            Item::Stereo { distance } => format!("Stereo ({})", distance.label()),
            Item::Color { distance } => format!("Color ({})", distance.label()),
            Item::VerticalPhoria { distance } => {
                format!("Vertical Phoria ({})", distance.label())
            }
            Item::LateralPhoria { distance } => format!("Lateral Phoria ({})", distance.label()),
            Item::IntermediateBlock => "Intermediate".to_string(),
            Item::VisualField => "Visual field".to_string(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Why an item passed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The standard sets no limit for this item.
    NotApplicable,
    /// A limit exists but no value was recorded.
    NotRecorded,
    /// The recorded value meets the limit.
    Met,
    /// The recorded value misses the limit.
    NotMet,
}

impl Outcome {
    pub fn passed(self) -> bool {
        matches!(self, Outcome::NotApplicable | Outcome::Met)
    }
}

/// Result of a single item check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub item: Item,
    pub passed: bool,
    pub outcome: Outcome,
    /// Full sentence, e.g. `"VA (Far) Both eyes: 8 (20/25) (required ≥ 8 (20/25))"`.
    pub message: String,
    /// Measured value as displayed on the printable form.
    pub measured: String,
    /// Reference for the job group as displayed on the printable form.
    pub reference: String,
}

/// Output of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Per-item results in canonical order.
    pub items: Vec<ItemResult>,
    /// Failure tags in item order.
    pub failures: Vec<String>,
    /// `true` iff `failures` is empty.
    pub overall_ok: bool,
}

impl EvaluationResult {
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|r| !r.passed)
    }

    pub fn find(&self, item: Item) -> Option<&ItemResult> {
        self.items.iter().find(|r| r.item == item)
    }
}

const NOT_RECORDED: &str = "not recorded";
const DASH: &str = "-";

fn not_applicable(item: Item, measured: String) -> ItemResult {
    ItemResult {
        item,
        passed: true,
        outcome: Outcome::NotApplicable,
        message: format!("{}: N/A", item.name()),
        measured,
        reference: "N/A".to_string(),
    }
}

fn not_recorded(item: Item, reference: String) -> ItemResult {
    ItemResult {
        item,
        passed: false,
        outcome: Outcome::NotRecorded,
        message: format!("{}: {NOT_RECORDED}", item.name()),
        measured: DASH.to_string(),
        reference,
    }
}

fn compared(
    item: Item,
    ok: bool,
    detail: String,
    measured: String,
    reference: String,
) -> ItemResult {
    ItemResult {
        item,
        passed: ok,
        outcome: if ok { Outcome::Met } else { Outcome::NotMet },
        message: format!("{}: {detail}", item.name()),
        measured,
        reference,
    }
}

/// Binocular fusion check. Passes unconditionally when not required.
pub fn check_binocular(distance: Distance, required: bool, binocular_ok: bool) -> ItemResult {
    let item = Item::Binocular { distance };
    let measured = if binocular_ok { "PASS" } else { "FAIL" }.to_string();
    if !required {
        return not_applicable(item, measured);
    }
    let verdict = if binocular_ok { "pass" } else { "fail" };
    compared(
        item,
        binocular_ok,
        format!("{verdict} (required: 3 cubes)"),
        measured,
        "Must pass 3 cubes".to_string(),
    )
}

/// Minimum acuity check: `value >= min`, inclusive.
pub fn check_min_va(item: Item, value: Option<VaCode>, min: Option<VaCode>) -> ItemResult {
    let Some(min) = min else {
        let measured = value
            .map(|v| format_va(Some(v)))
            .unwrap_or_else(|| DASH.into());
        return not_applicable(item, measured);
    };
    let reference = format!(">= {}", format_va(Some(min)));
    let Some(value) = value else {
        return not_recorded(item, reference);
    };
    compared(
        item,
        value >= min,
        format!(
            "{} (required ≥ {})",
            format_va(Some(value)),
            format_va(Some(min))
        ),
        format_va(Some(value)),
        reference,
    )
}

/// Minimum stereo depth check: `value >= min`, inclusive.
pub fn check_min_stereo(
    distance: Distance,
    value: Option<StereoCode>,
    min: Option<StereoCode>,
) -> ItemResult {
    let item = Item::Stereo { distance };
    let Some(min) = min else {
        return not_applicable(
            item,
            value.map(|v| format_stereo(Some(v))).unwrap_or_else(|| DASH.into()),
        );
    };
    let reference = format!(">= {}", format_stereo(Some(min)));
    let Some(value) = value else {
        return not_recorded(item, reference);
    };
    compared(
        item,
        value >= min,
        format!(
            "{} (required ≥ {})",
            format_stereo(Some(value)),
            format_stereo(Some(min))
        ),
        format_stereo(Some(value)),
        reference,
    )
}

/// Color plate check: correct count out of 8 against a minimum.
pub fn check_color(
    distance: Distance,
    correct: Option<ColorCount>,
    min: Option<ColorCount>,
) -> ItemResult {
    let item = Item::Color { distance };
    let Some(min) = min else {
        return not_applicable(
            item,
            correct.map(|c| format!("{c}/8")).unwrap_or_else(|| DASH.into()),
        );
    };
    let reference = format!(">= {min}/8");
    let Some(correct) = correct else {
        return not_recorded(item, reference);
    };
    compared(
        item,
        correct >= min,
        format!("{correct}/8 correct (required ≥ {min}/8)"),
        format!("{correct}/8"),
        reference,
    )
}

/// Inclusive range check. An absent range passes as N/A.
pub fn check_range(item: Item, value: Option<u8>, range: Option<Range>) -> ItemResult {
    let Some(range) = range else {
        return not_applicable(
            item,
            value.map(|v| v.to_string()).unwrap_or_else(|| DASH.into()),
        );
    };
    let Some(value) = value else {
        return not_recorded(item, range.to_string());
    };
    compared(
        item,
        range.contains(value),
        format!("{value} (required {range})"),
        value.to_string(),
        range.to_string(),
    )
}

fn intermediate_items(
    input: Option<&IntermediateInput>,
    standard: &Standard,
    out: &mut Vec<ItemResult>,
) {
    if !standard.has_intermediate() {
        out.push(ItemResult {
            item: Item::IntermediateBlock,
            passed: true,
            outcome: Outcome::NotApplicable,
            message: "Intermediate: N/A (not assessed for this job group)".to_string(),
            measured: DASH.to_string(),
            reference: "N/A".to_string(),
        });
        return;
    }

    let blank = IntermediateInput::default();
    let inter = input.unwrap_or(&blank);
    let d = Distance::Intermediate;
    out.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Both },
        inter.va_be,
        standard.inter_va_be_min,
    ));
    out.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Right },
        inter.va_re,
        standard.inter_va_re_min,
    ));
    out.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Left },
        inter.va_le,
        standard.inter_va_le_min,
    ));
}

/// Evaluate one input record against one standard.
///
/// Pure and total: the same pair always yields the same result.
pub fn evaluate(
    input: &InputRecord,
    standard: &Standard,
    options: &EvaluationOptions,
) -> EvaluationResult {
    let far = &input.far;
    let near = &input.near;
    let mut items = Vec::with_capacity(20);

    let d = Distance::Far;
    items.push(check_binocular(d, standard.far_binocular_required, far.binocular_ok));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Both },
        far.va_be,
        standard.far_va_be_min,
    ));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Right },
        far.va_re,
        standard.far_va_re_min,
    ));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Left },
        far.va_le,
        standard.far_va_le_min,
    ));
    items.push(check_min_stereo(d, far.stereo, standard.far_stereo_min));
    items.push(check_color(d, far.color_correct, standard.far_color_min_correct));
    items.push(check_range(
        Item::VerticalPhoria { distance: d },
        far.vphoria.map(u8::from),
        standard.far_vphoria_range,
    ));
    items.push(check_range(
        Item::LateralPhoria { distance: d },
        far.lphoria.map(u8::from),
        standard.far_lphoria_range,
    ));

    let d = Distance::Near;
    items.push(check_binocular(d, standard.near_binocular_required, near.binocular_ok));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Both },
        near.va_be,
        standard.near_va_be_min,
    ));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Right },
        near.va_re,
        standard.near_va_re_min,
    ));
    items.push(check_min_va(
        Item::Acuity { distance: d, eye: Eye::Left },
        near.va_le,
        standard.near_va_le_min,
    ));
    items.push(check_range(
        Item::VerticalPhoria { distance: d },
        near.vphoria.map(u8::from),
        standard.near_vphoria_range,
    ));
    items.push(check_range(
        Item::LateralPhoria { distance: d },
        near.lphoria.map(u8::from),
        standard.near_lphoria_range,
    ));

    if options.include_intermediate {
        intermediate_items(input.intermediate.as_ref(), standard, &mut items);
    }

    if options.include_visual_field
        && options.visual_field_policy == VisualFieldPolicy::FoldIntoFailures
    {
        if let Some(vf) = &input.visual_field {
            let ok = !vf.is_abnormal();
            let status = if ok { "normal" } else { "abnormal" };
            items.push(compared(
                Item::VisualField,
                ok,
                format!("{status} ({})", vf.summary()),
                vf.summary(),
                "Screening / clinician judgment".to_string(),
            ));
        }
    }

    let failures: Vec<String> = items
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.item.failure_tag())
        .collect();

    tracing::debug!(
        items = items.len(),
        failures = failures.len(),
        "evaluated screening record"
    );

    EvaluationResult {
        overall_ok: failures.is_empty(),
        items,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FarInput, LateralPhoria, NearInput, VerticalPhoria, VisualField, VisualFieldStatus,
    };
    use crate::registry::{standard_for, JobGroup};

    fn va(n: u8) -> Option<VaCode> {
        Some(VaCode::fixed(n))
    }

    const VA_BE_FAR: Item = Item::Acuity {
        distance: Distance::Far,
        eye: Eye::Both,
    };

    #[test]
    fn min_threshold_absent_always_passes() {
        for value in [None, va(1), va(14)] {
            let r = check_min_va(VA_BE_FAR, value, None);
            assert!(r.passed);
            assert_eq!(r.outcome, Outcome::NotApplicable);
            assert_eq!(r.message, "VA (Far) Both eyes: N/A");
        }
    }

    #[test]
    fn min_threshold_boundary_inclusive() {
        for t in 2..=14u8 {
            let at = check_min_va(VA_BE_FAR, va(t), va(t));
            assert!(at.passed, "value == threshold {t} should pass");
            let below = check_min_va(VA_BE_FAR, va(t - 1), va(t));
            assert!(!below.passed, "value {} below threshold {t} should fail", t - 1);
            assert_eq!(below.outcome, Outcome::NotMet);
        }
    }

    #[test]
    fn min_threshold_message_shows_labels() {
        let r = check_min_va(VA_BE_FAR, va(8), va(8));
        assert_eq!(
            r.message,
            "VA (Far) Both eyes: 8 (20/25) (required ≥ 8 (20/25))"
        );
        assert_eq!(r.measured, "8 (20/25)");
        assert_eq!(r.reference, ">= 8 (20/25)");
    }

    #[test]
    fn missing_value_with_threshold_fails() {
        let r = check_min_va(VA_BE_FAR, None, va(8));
        assert!(!r.passed);
        assert_eq!(r.outcome, Outcome::NotRecorded);
        assert_eq!(r.message, "VA (Far) Both eyes: not recorded");

        let s = check_min_stereo(Distance::Far, None, Some(StereoCode::fixed(5)));
        assert_eq!(s.outcome, Outcome::NotRecorded);

        let c = check_color(Distance::Far, None, Some(ColorCount::fixed(5)));
        assert!(!c.passed);

        let p = check_range(
            Item::VerticalPhoria {
                distance: Distance::Far,
            },
            None,
            Some(Range::fixed(3, 5)),
        );
        assert_eq!(p.outcome, Outcome::NotRecorded);
    }

    #[test]
    fn stereo_and_color_messages() {
        let s = check_min_stereo(
            Distance::Far,
            Some(StereoCode::fixed(4)),
            Some(StereoCode::fixed(5)),
        );
        assert!(!s.passed);
        assert_eq!(
            s.message,
            "Stereo depth (Far): 4 (70\") (required ≥ 5 (50\"))"
        );

        let c = check_color(
            Distance::Far,
            Some(ColorCount::fixed(5)),
            Some(ColorCount::fixed(5)),
        );
        assert!(c.passed);
        assert_eq!(c.message, "Color (Far): 5/8 correct (required ≥ 5/8)");
        assert_eq!(c.measured, "5/8");
    }

    #[test]
    fn range_boundaries() {
        let item = Item::LateralPhoria {
            distance: Distance::Near,
        };
        let range = Some(Range::fixed(4, 13));
        assert!(check_range(item, Some(4), range).passed);
        assert!(check_range(item, Some(13), range).passed);
        assert!(!check_range(item, Some(3), range).passed);
        assert!(!check_range(item, Some(14), range).passed);
        let none = check_range(item, None, None);
        assert!(none.passed);
        assert_eq!(none.outcome, Outcome::NotApplicable);
        assert_eq!(
            check_range(item, Some(8), range).message,
            "Lateral Phoria (Near): 8 (required 4-13)"
        );
    }

    #[test]
    fn binocular_rules() {
        let not_required = check_binocular(Distance::Far, false, false);
        assert!(not_required.passed);
        assert_eq!(not_required.outcome, Outcome::NotApplicable);
        assert!(check_binocular(Distance::Far, true, true).passed);
        let fail = check_binocular(Distance::Near, true, false);
        assert!(!fail.passed);
        assert_eq!(fail.item.failure_tag(), "Binocular (Near)");
    }

    fn office_pass() -> InputRecord {
        InputRecord {
            far: FarInput {
                binocular_ok: true,
                va_be: va(8),
                va_re: va(7),
                va_le: va(7),
                stereo: None,
                color_correct: Some(ColorCount::fixed(5)),
                vphoria: Some(VerticalPhoria::fixed(4)),
                lphoria: Some(LateralPhoria::fixed(8)),
            },
            near: NearInput {
                binocular_ok: true,
                va_be: va(9),
                va_re: va(8),
                va_le: va(8),
                vphoria: Some(VerticalPhoria::fixed(4)),
                lphoria: Some(LateralPhoria::fixed(8)),
            },
            ..Default::default()
        }
    }

    #[test]
    fn canonical_item_order() {
        let std = standard_for(JobGroup::Office);
        let options = EvaluationOptions {
            include_intermediate: true,
            ..Default::default()
        };
        let result = evaluate(&office_pass(), &std, &options);
        let tags: Vec<String> = result.items.iter().map(|r| r.item.failure_tag()).collect();
        assert_eq!(
            tags,
            vec![
                "Binocular (Far)",
                "VA (Far) BE",
                "VA (Far) RE",
                "VA (Far) LE",
                "Stereo (Far)",
                "Color (Far)",
                "Vertical Phoria (Far)",
                "Lateral Phoria (Far)",
                "Binocular (Near)",
                "VA (Near) BE",
                "VA (Near) RE",
                "VA (Near) LE",
                "Vertical Phoria (Near)",
                "Lateral Phoria (Near)",
                "VA (Inter) BE",
                "VA (Inter) RE",
                "VA (Inter) LE",
            ]
        );
        // intermediate block included but not recorded
        assert_eq!(
            result.failures,
            vec!["VA (Inter) BE", "VA (Inter) RE", "VA (Inter) LE"]
        );
        assert!(!result.overall_ok);
    }

    #[test]
    fn intermediate_block_na_for_group_without_standard() {
        let std = standard_for(JobGroup::Labor);
        let options = EvaluationOptions {
            include_intermediate: true,
            ..Default::default()
        };
        let result = evaluate(&InputRecord::default(), &std, &options);
        let block = result.find(Item::IntermediateBlock).unwrap();
        assert!(block.passed);
        assert_eq!(
            block.message,
            "Intermediate: N/A (not assessed for this job group)"
        );
        assert!(!result.failures.iter().any(|f| f.contains("Inter")));
    }

    #[test]
    fn intermediate_excluded_by_default() {
        let std = standard_for(JobGroup::Office);
        let result = evaluate(&office_pass(), &std, &EvaluationOptions::default());
        assert_eq!(result.items.len(), 14);
        assert!(result.overall_ok);
    }

    #[test]
    fn visual_field_policy_toggle() {
        let std = standard_for(JobGroup::Office);
        let mut input = office_pass();
        input.visual_field = Some(VisualField {
            status: VisualFieldStatus::Abnormal,
            ..Default::default()
        });

        let reference_only = EvaluationOptions::for_input(&input, VisualFieldPolicy::ReferenceOnly);
        let result = evaluate(&input, &std, &reference_only);
        assert!(result.overall_ok);
        assert!(result.find(Item::VisualField).is_none());

        let folded = EvaluationOptions::for_input(&input, VisualFieldPolicy::FoldIntoFailures);
        let result = evaluate(&input, &std, &folded);
        assert!(!result.overall_ok);
        assert_eq!(result.failures, vec!["Visual field"]);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let std = standard_for(JobGroup::Inspector);
        let input = office_pass();
        let options = EvaluationOptions::default();
        let a = evaluate(&input, &std, &options);
        let b = evaluate(&input, &std, &options);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn overall_matches_failures() {
        let std = standard_for(JobGroup::DriverMobile);
        let result = evaluate(&office_pass(), &std, &EvaluationOptions::default());
        assert_eq!(result.overall_ok, result.failures.is_empty());
        assert_eq!(result.failed_items().count(), result.failures.len());
        // driver needs far VA BE 9 and stereo 6
        assert!(result.failures.contains(&"VA (Far) BE".to_string()));
        assert!(result.failures.contains(&"Stereo (Far)".to_string()));
    }
}
