//! Rule evaluators, one module per rule family
//!
//! [`evaluate_condition`] always returns exactly one outcome for a
//! condition. A [`RuleFault`] raised while checking one condition becomes a
//! mismatch with a fault-log entry; it never reaches the other conditions.

pub mod barcode;
pub mod font;
pub mod text;

use shared_types::{BarcodeDetection, Highlight, HighlightStatus, RuleCondition, RuleSet, RuleType};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::RuleFault;
use crate::measure::FontMeasure;
use crate::outcome::RuleOutcome;
use crate::reconstruct::CandidatePool;
use crate::thresholds::MatchThresholds;

/// Read-only inputs shared by every condition of one analysis
pub struct RuleContext<'a> {
    pub rule_set: &'a RuleSet,
    pub pool: &'a CandidatePool,
    pub barcodes: &'a [BarcodeDetection],
    pub config: &'a EngineConfig,
    pub sensitivity: u8,
    pub dpi: f64,
    pub font_measure: Option<&'a dyn FontMeasure>,
}

impl RuleContext<'_> {
    pub fn thresholds_for(&self, condition: &RuleCondition) -> MatchThresholds {
        self.config
            .threshold_policy
            .resolve(self.sensitivity, condition.sensitivity_override)
    }

    /// Highlight at the sentinel location, for faults with no real position
    pub fn sentinel_highlight(
        &self,
        rule_id_ref: &str,
        message: String,
        expected_value: Option<String>,
    ) -> Highlight {
        Highlight {
            rule_id_ref: rule_id_ref.to_string(),
            bounding_box: self.config.sentinel_box,
            status: HighlightStatus::Wrong,
            message,
            found_value: None,
            expected_value,
            confidence: None,
        }
    }
}

/// Evaluate the condition at `index` (0-based) of the rule set
pub fn evaluate_condition(
    index: usize,
    condition: &RuleCondition,
    ctx: &RuleContext<'_>,
) -> RuleOutcome {
    let rule_id_ref = condition.rule_id_ref(index);

    let result = match condition.rule_type {
        RuleType::ExactTextMatch => text::check_exact_text(&rule_id_ref, condition, ctx),
        RuleType::FontSize => font::check_font_size(&rule_id_ref, condition, ctx),
        RuleType::BarcodeDimensions => {
            barcode::check_barcode_dimensions(&rule_id_ref, index, condition, ctx)
        }
        other @ (RuleType::Spacing | RuleType::ElementPresence | RuleType::TranslationMatch) => {
            Err(RuleFault::Unsupported(other.as_str()))
        }
    };

    match result {
        Ok(outcome) => {
            debug!(
                rule = %outcome.rule_id_ref,
                tally = ?outcome.tally,
                "Condition evaluated"
            );
            outcome
        }
        Err(fault) => {
            warn!(rule = %rule_id_ref, error = %fault, "Condition could not be evaluated");
            let message = format!("Rule '{}' could not be evaluated: {}", rule_id_ref, fault);
            RuleOutcome::fault(rule_id_ref, message, None)
        }
    }
}

/// Reject NaN, infinite and negative values for `field`
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, RuleFault> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RuleFault::InvalidValue {
            field,
            reason: format!("expected a non-negative number, got {}", value),
        })
    }
}
