//! Compliance rule evaluation for product-label images
//!
//! [`LabelEngine`] takes OCR text fragments and barcode detections for one
//! label, checks them against an ordered [`RuleSet`] and returns an
//! [`AnalysisResult`] in which every verdict carries its evidence.
//!
//! The engine does no OCR or barcode decoding itself. With the `runtime`
//! feature, [`pipeline::LabelAnalyzer`] drives those collaborators and the
//! engine end to end.

pub mod aggregate;
pub mod config;
pub mod context;
pub mod error;
pub mod measure;
pub mod outcome;
#[cfg(feature = "runtime")]
pub mod pipeline;
pub mod reconstruct;
pub mod rules;
pub mod similarity;
pub mod thresholds;

pub use config::EngineConfig;
pub use context::EvaluationContext;
pub use error::{LabelCheckError, RuleFault};
pub use measure::{BoxHeightFontMeasure, FontMeasure};
pub use thresholds::{MatchThresholds, ThresholdPolicy};

use shared_types::{AnalysisResult, BarcodeDetection, RuleSet, TextFragment};
use tracing::info;

use crate::reconstruct::CandidatePool;
use crate::rules::RuleContext;

/// LabelEngine entry point
#[derive(Default)]
pub struct LabelEngine {
    config: EngineConfig,
    font_measure: Option<Box<dyn FontMeasure>>,
}

impl LabelEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            font_measure: None,
        }
    }

    /// Enable real FONT_SIZE comparisons
    pub fn with_font_measure(mut self, measure: impl FontMeasure + 'static) -> Self {
        self.font_measure = Some(Box::new(measure));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate every condition of `rule_set`, in order, against the
    /// detected text and barcodes.
    ///
    /// Always returns a complete result: a condition that cannot be
    /// evaluated is recorded as a mismatch with a fault-log entry.
    pub fn evaluate(
        &self,
        rule_set: &RuleSet,
        fragments: &[TextFragment],
        barcodes: &[BarcodeDetection],
        context: &EvaluationContext,
    ) -> AnalysisResult {
        let pool = CandidatePool::build(fragments);
        let dpi = self.config.effective_dpi(context.dpi);

        info!(
            analysis_id = %context.analysis_id,
            file = %context.original_filename,
            rules = rule_set.conditions.len(),
            fragments = fragments.len(),
            lines = pool.line_count(),
            barcodes = barcodes.len(),
            sensitivity = context.sensitivity,
            "Evaluating label"
        );

        let ctx = RuleContext {
            rule_set,
            pool: &pool,
            barcodes,
            config: &self.config,
            sensitivity: context.sensitivity,
            dpi,
            font_measure: self.font_measure.as_deref(),
        };

        let outcomes = rule_set
            .conditions
            .iter()
            .enumerate()
            .map(|(index, condition)| rules::evaluate_condition(index, condition, &ctx));
        let result = aggregate::build_result(context, rule_set.conditions.len(), outcomes);

        info!(
            analysis_id = %result.analysis_id,
            status = result.overall_status.as_str(),
            matches = result.summary.matches,
            mismatches = result.summary.mismatches_or_errors,
            "Label evaluated"
        );
        result
    }
}
