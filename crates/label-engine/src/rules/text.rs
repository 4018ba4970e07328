// Exact text presence checks (EXACT_TEXT_MATCH)
use shared_types::{Highlight, HighlightStatus, RuleCondition};

use super::RuleContext;
use crate::error::RuleFault;
use crate::outcome::RuleOutcome;
use crate::reconstruct::ScoredCandidate;
use crate::similarity::case_preserved;
use crate::thresholds::MatchTier;

/// Fault-log entry for required text that was not found anywhere
pub fn missing_text_message(expected: &str) -> String {
    format!("Missing required text: '{}'", expected)
}

/// Four-tier decision over the best-scoring candidate:
/// perfect -> correct, near -> wrong, below minimum -> missing (sentinel), else low similarity
pub fn check_exact_text(
    rule_id_ref: &str,
    condition: &RuleCondition,
    ctx: &RuleContext<'_>,
) -> Result<RuleOutcome, RuleFault> {
    let expected = match condition.expected_text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(RuleOutcome::skipped(rule_id_ref.to_string())),
    };

    let thresholds = ctx.thresholds_for(condition);
    let best = match ctx.pool.best_match(expected) {
        Some(best) if thresholds.tier(best.score) != MatchTier::Missing => best,
        _ => {
            let message = missing_text_message(expected);
            let highlight =
                ctx.sentinel_highlight(rule_id_ref, message.clone(), Some(expected.to_string()));
            return Ok(RuleOutcome::fault(rule_id_ref.to_string(), message, Some(highlight)));
        }
    };
    let percent = best.score * 100.0;
    let found = &best.candidate.text;

    let outcome = match thresholds.tier(best.score) {
        MatchTier::Perfect if condition.case_sensitive && !case_preserved(expected, found) => {
            RuleOutcome::mismatched(evidence(
                rule_id_ref,
                expected,
                &best,
                HighlightStatus::Wrong,
                format!(
                    "Found '{}' but letter case differs from expected '{}' ({:.1}% similar)",
                    found, expected, percent
                ),
            ))
        }
        MatchTier::Perfect => RuleOutcome::matched(evidence(
            rule_id_ref,
            expected,
            &best,
            HighlightStatus::Correct,
            format!("Found expected text: '{}'", expected),
        )),
        MatchTier::Near => RuleOutcome::mismatched(evidence(
            rule_id_ref,
            expected,
            &best,
            HighlightStatus::Wrong,
            format!(
                "Text differs from expected: found '{}' ({:.1}% similar)",
                found, percent
            ),
        )),
        MatchTier::Low | MatchTier::Missing => RuleOutcome::mismatched(evidence(
            rule_id_ref,
            expected,
            &best,
            HighlightStatus::Wrong,
            format!(
                "Low similarity to expected text: best candidate '{}' ({:.1}% similar)",
                found, percent
            ),
        )),
    };

    Ok(outcome)
}

fn evidence(
    rule_id_ref: &str,
    expected: &str,
    best: &ScoredCandidate<'_>,
    status: HighlightStatus,
    message: String,
) -> Highlight {
    Highlight {
        rule_id_ref: rule_id_ref.to_string(),
        bounding_box: best.candidate.bounding_box(),
        status,
        message,
        found_value: Some(best.candidate.text.clone()),
        expected_value: Some(expected.to_string()),
        confidence: Some(best.score),
    }
}
