//! Result aggregation
//!
//! Folds per-condition outcomes, in rule order, into the summary counters,
//! the highlight list and the fault log.

use shared_types::{AnalysisResult, AnalysisSummary, Highlight, OverallStatus};

use crate::context::EvaluationContext;
use crate::outcome::{RuleOutcome, Tally};

/// Counters, fault log and highlights for a finished list of outcomes
pub fn aggregate(
    total_rules_defined: usize,
    outcomes: impl IntoIterator<Item = RuleOutcome>,
) -> (AnalysisSummary, Vec<Highlight>) {
    let initial = (
        AnalysisSummary {
            total_rules_defined,
            ..AnalysisSummary::default()
        },
        Vec::new(),
    );

    outcomes
        .into_iter()
        .fold(initial, |(mut summary, mut highlights), outcome| {
            match outcome.tally {
                Tally::Match => summary.matches += 1,
                Tally::Mismatch => summary.mismatches_or_errors += 1,
                Tally::Neutral => {}
            }
            summary.faults_without_location.extend(outcome.fault);
            highlights.extend(outcome.highlight);
            (summary, highlights)
        })
}

/// `pass` iff nothing mismatched. Critical and processing-error tiers are
/// never assigned here.
pub fn overall_status(summary: &AnalysisSummary) -> OverallStatus {
    if summary.mismatches_or_errors == 0 {
        OverallStatus::Pass
    } else {
        OverallStatus::FailMinor
    }
}

pub fn build_result(
    context: &EvaluationContext,
    total_rules_defined: usize,
    outcomes: impl IntoIterator<Item = RuleOutcome>,
) -> AnalysisResult {
    let (summary, highlights) = aggregate(total_rules_defined, outcomes);
    AnalysisResult {
        analysis_id: context.analysis_id,
        original_filename: context.original_filename.clone(),
        overall_status: overall_status(&summary),
        summary,
        highlights,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}
