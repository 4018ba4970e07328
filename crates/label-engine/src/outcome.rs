//! Per-condition evaluation outcomes

use shared_types::Highlight;

/// How an outcome counts toward the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Match,
    Mismatch,
    /// Counted in neither column (skipped or unresolved checks)
    Neutral,
}

/// Result of evaluating one condition. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule_id_ref: String,
    pub tally: Tally,
    pub highlight: Option<Highlight>,
    /// Entry for the summary's fault log
    pub fault: Option<String>,
}

impl RuleOutcome {
    pub fn matched(highlight: Highlight) -> Self {
        Self {
            rule_id_ref: highlight.rule_id_ref.clone(),
            tally: Tally::Match,
            highlight: Some(highlight),
            fault: None,
        }
    }

    pub fn mismatched(highlight: Highlight) -> Self {
        Self {
            rule_id_ref: highlight.rule_id_ref.clone(),
            tally: Tally::Mismatch,
            highlight: Some(highlight),
            fault: None,
        }
    }

    pub fn informational(highlight: Highlight) -> Self {
        Self {
            rule_id_ref: highlight.rule_id_ref.clone(),
            tally: Tally::Neutral,
            highlight: Some(highlight),
            fault: None,
        }
    }

    /// Condition produced no verdict at all
    pub fn skipped(rule_id_ref: String) -> Self {
        Self {
            rule_id_ref,
            tally: Tally::Neutral,
            highlight: None,
            fault: None,
        }
    }

    /// Mismatch with a fault-log entry; `highlight` is only set for sentinel evidence
    pub fn fault(rule_id_ref: String, message: String, highlight: Option<Highlight>) -> Self {
        Self {
            rule_id_ref,
            tally: Tally::Mismatch,
            highlight,
            fault: Some(message),
        }
    }
}
