//! Barcode dimension checks (BARCODE_DIMENSIONS)
//!
//! The payload to look for comes from an EXACT_TEXT_MATCH rule in the same
//! set: the one named by `payload_rule`, or else the first other text rule
//! sharing this rule's `target_element_description`.

use shared_types::{BarcodeDetection, Highlight, HighlightStatus, RuleCondition, RuleSet, RuleType};

use super::{non_negative, RuleContext};
use crate::error::RuleFault;
use crate::outcome::RuleOutcome;

/// Absorbs float noise so a difference of exactly `tolerance_mm` passes
const TOLERANCE_EPSILON: f64 = 1e-9;

pub fn check_barcode_dimensions(
    rule_id_ref: &str,
    index: usize,
    condition: &RuleCondition,
    ctx: &RuleContext<'_>,
) -> Result<RuleOutcome, RuleFault> {
    non_negative("tolerance_mm", condition.tolerance_mm)?;
    if let Some(width) = condition.expected_width_mm {
        non_negative("expected_width_mm", width)?;
    }
    if let Some(height) = condition.expected_height_mm {
        non_negative("expected_height_mm", height)?;
    }

    if ctx.barcodes.is_empty() {
        let message = "No barcodes detected on the label".to_string();
        let highlight = ctx.sentinel_highlight(rule_id_ref, message.clone(), None);
        return Ok(RuleOutcome::fault(
            rule_id_ref.to_string(),
            message,
            Some(highlight),
        ));
    }

    let payload = resolve_payload(ctx.rule_set, index, condition)?;

    let Some(barcode) = ctx.barcodes.iter().find(|b| b.data.trim() == payload) else {
        return Ok(RuleOutcome::fault(
            rule_id_ref.to_string(),
            format!("No detected barcode carries payload '{}'", payload),
            None,
        ));
    };

    let highlight = measure_against(rule_id_ref, barcode, condition);
    Ok(match highlight.status {
        HighlightStatus::Correct => RuleOutcome::matched(highlight),
        _ => RuleOutcome::mismatched(highlight),
    })
}

/// Expected payload for the barcode rule at `index`
pub fn resolve_payload<'a>(
    rule_set: &'a RuleSet,
    index: usize,
    condition: &RuleCondition,
) -> Result<&'a str, RuleFault> {
    let companion = match condition.payload_rule {
        Some(position) => position
            .checked_sub(1)
            .filter(|&i| i != index)
            .and_then(|i| rule_set.conditions.get(i))
            .filter(|c| c.rule_type == RuleType::ExactTextMatch)
            .ok_or_else(|| RuleFault::MissingCompanion {
                reason: format!("payload_rule {} is not a usable text rule", position),
            })?,
        None => {
            let target = condition
                .target_element_description
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| RuleFault::MissingCompanion {
                    reason: "no payload_rule and no target_element_description".to_string(),
                })?;
            rule_set
                .conditions
                .iter()
                .enumerate()
                .find(|(i, c)| {
                    *i != index
                        && c.rule_type == RuleType::ExactTextMatch
                        && c.target_element_description.as_deref().map(str::trim) == Some(target)
                })
                .map(|(_, c)| c)
                .ok_or_else(|| RuleFault::MissingCompanion {
                    reason: format!("no exact_text_match rule targets '{}'", target),
                })?
        }
    };

    companion
        .expected_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RuleFault::MissingCompanion {
            reason: "payload text rule has no expected_text".to_string(),
        })
}

/// `measured` is within `tolerance` of `expected`; an absent expectation always passes
pub fn within_tolerance(measured: f64, expected: Option<f64>, tolerance: f64) -> bool {
    expected.map_or(true, |e| (measured - e).abs() <= tolerance + TOLERANCE_EPSILON)
}

/// Compare a detected barcode's size with the rule. Always anchored at the
/// barcode's own bounding box.
pub fn measure_against(
    rule_id_ref: &str,
    barcode: &BarcodeDetection,
    condition: &RuleCondition,
) -> Highlight {
    let tolerance = condition.tolerance_mm;
    let width_ok =
        within_tolerance(barcode.measured_width_mm, condition.expected_width_mm, tolerance);
    let height_ok =
        within_tolerance(barcode.measured_height_mm, condition.expected_height_mm, tolerance);

    let found = format!(
        "{:.2} x {:.2} mm",
        barcode.measured_width_mm, barcode.measured_height_mm
    );
    let expected = format!(
        "{} x {} mm (+/- {:.2})",
        dimension(condition.expected_width_mm),
        dimension(condition.expected_height_mm),
        tolerance
    );

    let (status, message) = if width_ok && height_ok {
        (
            HighlightStatus::Correct,
            format!(
                "Barcode '{}' measures {}, within expected {}",
                barcode.data, found, expected
            ),
        )
    } else {
        (
            HighlightStatus::Wrong,
            format!(
                "Barcode '{}' measures {}, expected {}",
                barcode.data, found, expected
            ),
        )
    };

    Highlight {
        rule_id_ref: rule_id_ref.to_string(),
        bounding_box: barcode.bounding_box,
        status,
        message,
        found_value: Some(found),
        expected_value: Some(expected),
        confidence: None,
    }
}

fn dimension(value: Option<f64>) -> String {
    value.map_or_else(|| "any".to_string(), |v| format!("{:.2}", v))
}
