// Font size checks (FONT_SIZE)
use shared_types::{ComparisonOperator, Highlight, HighlightStatus, RuleCondition, TextFragment};

use super::{non_negative, RuleContext};
use crate::error::RuleFault;
use crate::measure::convert_mm;
use crate::outcome::RuleOutcome;

pub fn check_font_size(
    rule_id_ref: &str,
    condition: &RuleCondition,
    ctx: &RuleContext<'_>,
) -> Result<RuleOutcome, RuleFault> {
    let target = condition
        .target_element_description
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RuleFault::MissingField {
            field: "target_element_description",
        })?;

    let Some(fragment) = ctx.pool.find_target(target) else {
        return Ok(RuleOutcome::fault(
            rule_id_ref.to_string(),
            format!("Font size target not found: '{}'", target),
            None,
        ));
    };

    let measured_mm = ctx
        .font_measure
        .and_then(|measure| measure.measure_mm(fragment, ctx.dpi));
    let Some(measured_mm) = measured_mm else {
        return Ok(RuleOutcome::informational(Highlight {
            rule_id_ref: rule_id_ref.to_string(),
            bounding_box: fragment.bounding_box(),
            status: HighlightStatus::Info,
            message: format!("Found '{}'; font size check not resolved", target),
            found_value: Some(fragment.text.clone()),
            expected_value: condition.font_size_value.map(|_| expected_size(condition)),
            confidence: Some(fragment.confidence),
        }));
    };

    let lower = condition.font_size_value.ok_or(RuleFault::MissingField {
        field: "font_size_value",
    })?;
    let lower = non_negative("font_size_value", lower)?;
    let unit = condition.font_size_unit;
    let measured = convert_mm(measured_mm, unit, ctx.dpi);

    let satisfied = match condition.font_size_operator {
        ComparisonOperator::Exactly => (measured - lower).abs() <= ctx.config.font_size_tolerance,
        ComparisonOperator::Min => measured >= lower,
        ComparisonOperator::Max => measured <= lower,
        ComparisonOperator::Between => {
            let upper = condition.font_size_value_upper.ok_or(RuleFault::MissingField {
                field: "font_size_value_upper",
            })?;
            (lower..=upper).contains(&measured)
        }
    };

    let highlight = size_highlight(rule_id_ref, target, fragment, condition, measured, satisfied);
    Ok(if satisfied {
        RuleOutcome::matched(highlight)
    } else {
        RuleOutcome::mismatched(highlight)
    })
}

fn size_highlight(
    rule_id_ref: &str,
    target: &str,
    fragment: &TextFragment,
    condition: &RuleCondition,
    measured: f64,
    satisfied: bool,
) -> Highlight {
    let unit = condition.font_size_unit.as_str();
    let expected = expected_size(condition);
    let (status, verdict) = if satisfied {
        (HighlightStatus::Correct, "meets")
    } else {
        (HighlightStatus::Wrong, "does not meet")
    };

    Highlight {
        rule_id_ref: rule_id_ref.to_string(),
        bounding_box: fragment.bounding_box(),
        status,
        message: format!(
            "Font size of '{}' is {:.2} {}, {} requirement: {}",
            target, measured, unit, verdict, expected
        ),
        found_value: Some(format!("{:.2} {}", measured, unit)),
        expected_value: Some(expected),
        confidence: Some(fragment.confidence),
    }
}

/// Human-readable requirement, e.g. "between 1.20 and 3.00 mm"
fn expected_size(condition: &RuleCondition) -> String {
    let unit = condition.font_size_unit.as_str();
    let value = condition.font_size_value.unwrap_or_default();
    match (condition.font_size_operator, condition.font_size_value_upper) {
        (ComparisonOperator::Between, Some(upper)) => {
            format!("between {:.2} and {:.2} {}", value, upper, unit)
        }
        (ComparisonOperator::Min, _) => format!("at least {:.2} {}", value, unit),
        (ComparisonOperator::Max, _) => format!("at most {:.2} {}", value, unit),
        (operator, _) => format!("{} {:.2} {}", operator.as_str(), value, unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::measure::{BoxHeightFontMeasure, FontMeasure};
    use crate::outcome::Tally;
    use crate::reconstruct::CandidatePool;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, FontSizeUnit, RuleSet};

    // 30 px at 300 dpi = 2.54 mm = 7.2 pt
    fn fragments() -> Vec<TextFragment> {
        vec![
            TextFragment::new("Ingredients", BoundingBox::new(20, 100, 180, 30), 0.93),
            TextFragment::new("wheat flour, water", BoundingBox::new(20, 160, 300, 20), 0.88),
        ]
    }

    fn run(condition: RuleCondition, measured: bool) -> RuleOutcome {
        let rule_set = RuleSet {
            id: uuid::Uuid::nil(),
            name: "fonts".into(),
            description: None,
            conditions: vec![condition],
        };
        let pool = CandidatePool::build(&fragments());
        let config = EngineConfig::default();
        let measure: &dyn FontMeasure = &BoxHeightFontMeasure;
        let ctx = RuleContext {
            rule_set: &rule_set,
            pool: &pool,
            barcodes: &[],
            config: &config,
            sensitivity: 50,
            dpi: 300.0,
            font_measure: measured.then_some(measure),
        };
        check_font_size("rule_1_font_size", &rule_set.conditions[0], &ctx)
            .unwrap_or_else(|fault| panic!("unexpected fault: {}", fault))
    }

    fn rule(value: f64, unit: FontSizeUnit, operator: ComparisonOperator) -> RuleCondition {
        RuleCondition::font_size("Ingredients", value, unit, operator)
    }

    #[test]
    fn test_exactly_within_tolerance() {
        let outcome = run(rule(2.5, FontSizeUnit::Mm, ComparisonOperator::Exactly), true);
        assert_eq!(outcome.tally, Tally::Match);
        let h = outcome.highlight.unwrap();
        assert_eq!(h.status, HighlightStatus::Correct);
        assert_eq!(h.bounding_box, BoundingBox::new(20, 100, 180, 30));
        assert_eq!(h.found_value.as_deref(), Some("2.54 mm"));
        assert_eq!(h.expected_value.as_deref(), Some("exactly 2.50 mm"));
    }

    #[test]
    fn test_exactly_outside_tolerance() {
        let outcome = run(rule(3.0, FontSizeUnit::Mm, ComparisonOperator::Exactly), true);
        assert_eq!(outcome.tally, Tally::Mismatch);
        assert_eq!(outcome.highlight.unwrap().status, HighlightStatus::Wrong);
        assert!(outcome.fault.is_none());
    }

    #[test]
    fn test_min_and_max() {
        assert_eq!(
            run(rule(3.0, FontSizeUnit::Mm, ComparisonOperator::Min), true).tally,
            Tally::Mismatch
        );
        assert_eq!(
            run(rule(2.0, FontSizeUnit::Mm, ComparisonOperator::Min), true).tally,
            Tally::Match
        );
        assert_eq!(
            run(rule(3.0, FontSizeUnit::Mm, ComparisonOperator::Max), true).tally,
            Tally::Match
        );
        assert_eq!(
            run(rule(2.0, FontSizeUnit::Mm, ComparisonOperator::Max), true).tally,
            Tally::Mismatch
        );
    }

    #[test]
    fn test_between_is_inclusive() {
        let inside = rule(2.0, FontSizeUnit::Mm, ComparisonOperator::Between).with_upper_bound(3.0);
        assert_eq!(run(inside, true).tally, Tally::Match);

        let below = rule(2.6, FontSizeUnit::Mm, ComparisonOperator::Between).with_upper_bound(3.0);
        let outcome = run(below, true);
        assert_eq!(outcome.tally, Tally::Mismatch);
        assert_eq!(
            outcome.highlight.unwrap().expected_value.as_deref(),
            Some("between 2.60 and 3.00 mm")
        );
    }

    #[test]
    fn test_points_conversion() {
        let outcome = run(rule(6.0, FontSizeUnit::Pt, ComparisonOperator::Min), true);
        assert_eq!(outcome.tally, Tally::Match);
        assert_eq!(outcome.highlight.unwrap().found_value.as_deref(), Some("7.20 pt"));
    }

    #[test]
    fn test_unmeasured_is_informational() {
        let outcome = run(rule(2.5, FontSizeUnit::Mm, ComparisonOperator::Exactly), false);
        assert_eq!(outcome.tally, Tally::Neutral);
        assert!(outcome.fault.is_none());
        let h = outcome.highlight.unwrap();
        assert_eq!(h.status, HighlightStatus::Info);
        assert_eq!(h.bounding_box, BoundingBox::new(20, 100, 180, 30));
        assert!(h.message.contains("not resolved"));
    }

    #[test]
    fn test_target_found_by_containment() {
        let condition =
            RuleCondition::font_size("wheat flour", 1.0, FontSizeUnit::Mm, ComparisonOperator::Min);
        let outcome = run(condition, true);
        assert_eq!(outcome.tally, Tally::Match);
        assert_eq!(
            outcome.highlight.unwrap().bounding_box,
            BoundingBox::new(20, 160, 300, 20)
        );
    }

    #[test]
    fn test_missing_target_is_fault_without_highlight() {
        let condition =
            RuleCondition::font_size("Allergens", 2.0, FontSizeUnit::Mm, ComparisonOperator::Min);
        let outcome = run(condition, true);
        assert_eq!(outcome.tally, Tally::Mismatch);
        assert!(outcome.highlight.is_none());
        assert_eq!(
            outcome.fault.as_deref(),
            Some("Font size target not found: 'Allergens'")
        );
    }

    #[test]
    fn test_missing_fields_are_rule_faults() {
        let rule_set = RuleSet::new("fonts", vec![]).unwrap();
        let pool = CandidatePool::build(&fragments());
        let config = EngineConfig::default();
        let measure: &dyn FontMeasure = &BoxHeightFontMeasure;
        let ctx = RuleContext {
            rule_set: &rule_set,
            pool: &pool,
            barcodes: &[],
            config: &config,
            sensitivity: 50,
            dpi: 300.0,
            font_measure: Some(measure),
        };

        let no_target = RuleCondition::new(shared_types::RuleType::FontSize);
        assert_eq!(
            check_font_size("r", &no_target, &ctx),
            Err(RuleFault::MissingField {
                field: "target_element_description"
            })
        );

        let mut no_value = rule(2.0, FontSizeUnit::Mm, ComparisonOperator::Min);
        no_value.font_size_value = None;
        assert_eq!(
            check_font_size("r", &no_value, &ctx),
            Err(RuleFault::MissingField {
                field: "font_size_value"
            })
        );

        // Bypasses RuleSet validation on purpose
        let no_upper = rule(2.0, FontSizeUnit::Mm, ComparisonOperator::Between);
        assert_eq!(
            check_font_size("r", &no_upper, &ctx),
            Err(RuleFault::MissingField {
                field: "font_size_value_upper"
            })
        );
    }
}
