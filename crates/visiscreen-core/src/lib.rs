//! visiscreen-core: job-group vision standards and the evaluation engine.
//!
//! This crate defines the screening data model, the reference standards
//! registry, per-item evaluation, recommendation derivation, and the
//! screening record that the rest of visiscreen renders and stores.

pub mod engine;
pub mod error;
pub mod exam;
pub mod model;
pub mod parser;
pub mod recommend;
pub mod record;
pub mod registry;
pub mod traits;

pub use engine::{evaluate, EvaluationOptions, EvaluationResult, VisualFieldPolicy};
pub use error::ScreeningError;
pub use record::ScreeningRecord;
pub use registry::Registry;

#[cfg(test)]
mod scenarios {
    //! End-to-end screening scenarios through the registry and deriver.

    use super::*;
    use crate::engine::{Item, Outcome};
    use crate::model::*;
    use crate::recommend::{
        derive_recommendations, NO_FURTHER_TESTING, PHORIA_RETEST, VA_REFRACTION, VA_RETEST,
    };

    fn office_input() -> InputRecord {
        InputRecord {
            far: FarInput {
                binocular_ok: true,
                va_be: Some(VaCode::fixed(8)),
                va_re: Some(VaCode::fixed(7)),
                va_le: Some(VaCode::fixed(7)),
                stereo: None,
                color_correct: Some(ColorCount::fixed(5)),
                vphoria: Some(VerticalPhoria::fixed(4)),
                lphoria: Some(LateralPhoria::fixed(8)),
            },
            near: NearInput {
                binocular_ok: true,
                va_be: Some(VaCode::fixed(9)),
                va_re: Some(VaCode::fixed(8)),
                va_le: Some(VaCode::fixed(8)),
                vphoria: Some(VerticalPhoria::fixed(4)),
                lphoria: Some(LateralPhoria::fixed(8)),
            },
            ..Default::default()
        }
    }

    fn labor_input() -> InputRecord {
        InputRecord {
            far: FarInput {
                binocular_ok: true,
                va_be: Some(VaCode::fixed(8)),
                va_re: Some(VaCode::fixed(7)),
                va_le: Some(VaCode::fixed(7)),
                color_correct: Some(ColorCount::fixed(6)),
                vphoria: Some(VerticalPhoria::fixed(4)),
                lphoria: None,
                ..Default::default()
            },
            near: NearInput {
                binocular_ok: true,
                va_be: Some(VaCode::fixed(7)),
                va_re: Some(VaCode::fixed(6)),
                va_le: Some(VaCode::fixed(6)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn run(key: &str, input: &InputRecord) -> (EvaluationResult, Vec<String>) {
        let result = Registry::builtin()
            .evaluate(key, input, &EvaluationOptions::default())
            .unwrap();
        let recs = derive_recommendations(&result.failures, &input.symptoms);
        (result, recs)
    }

    #[test]
    fn office_all_within_reference_passes() {
        let (result, recs) = run("office", &office_input());
        assert!(result.overall_ok);
        assert!(result.failures.is_empty());
        assert_eq!(recs, vec![NO_FURTHER_TESTING]);
        let stereo = result.find(Item::Stereo { distance: Distance::Far }).unwrap();
        assert_eq!(stereo.outcome, Outcome::NotApplicable);
    }

    #[test]
    fn office_far_acuity_below_minimum_fails() {
        let mut input = office_input();
        input.far.va_be = Some(VaCode::fixed(6));
        let (result, recs) = run("office", &input);
        assert!(!result.overall_ok);
        assert!(result.failures.contains(&"VA (Far) BE".to_string()));
        assert!(recs.contains(&VA_RETEST.to_string()));
        assert!(recs.contains(&VA_REFRACTION.to_string()));
    }

    #[test]
    fn labor_lateral_phoria_not_assessed() {
        let (result, _) = run("labor", &labor_input());
        let item = result
            .find(Item::LateralPhoria { distance: Distance::Far })
            .unwrap();
        assert!(item.passed);
        assert_eq!(item.message, "Lateral Phoria (Far): N/A");
        assert!(!result.failures.iter().any(|f| f == "Lateral Phoria (Far)"));
        assert!(result.overall_ok);
    }

    #[test]
    fn labor_vertical_phoria_out_of_range() {
        let mut input = labor_input();
        input.far.vphoria = Some(VerticalPhoria::fixed(7));
        let (result, recs) = run("labor", &input);
        assert!(!result.overall_ok);
        assert_eq!(result.failures, vec!["Vertical Phoria (Far)"]);
        assert_eq!(recs, vec![PHORIA_RETEST]);

        // a second phoria failure still yields the advice once
        let mut office = office_input();
        office.far.vphoria = Some(VerticalPhoria::fixed(7));
        office.far.lphoria = Some(LateralPhoria::fixed(15));
        let (result, recs) = run("office", &office);
        assert_eq!(result.failures.len(), 2);
        assert_eq!(recs.iter().filter(|r| *r == PHORIA_RETEST).count(), 1);
    }

    #[test]
    fn unspecified_group_always_passes() {
        let inputs = [
            InputRecord::default(),
            office_input(),
            InputRecord {
                far: FarInput {
                    va_be: Some(VaCode::fixed(1)),
                    vphoria: Some(VerticalPhoria::fixed(7)),
                    ..Default::default()
                },
                intermediate: Some(IntermediateInput::default()),
                ..Default::default()
            },
        ];
        let registry = Registry::builtin();
        let options = EvaluationOptions {
            include_intermediate: true,
            ..Default::default()
        };
        for input in &inputs {
            let result = registry.evaluate("unspecified", input, &options).unwrap();
            assert!(result.overall_ok);
            assert!(result
                .items
                .iter()
                .all(|r| r.outcome == Outcome::NotApplicable));
        }
    }
}
