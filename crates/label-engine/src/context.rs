//! Per-analysis inputs that are not part of the rule set

use uuid::Uuid;

use crate::thresholds::DEFAULT_SENSITIVITY;

/// Identity and tuning for one evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    pub analysis_id: Uuid,
    pub original_filename: String,
    /// 0 (lenient) to 100 (strict)
    pub sensitivity: u8,
    /// Image resolution; `None` falls back to the configured default
    pub dpi: Option<f64>,
}

impl EvaluationContext {
    pub fn new(original_filename: impl Into<String>) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            original_filename: original_filename.into(),
            sensitivity: DEFAULT_SENSITIVITY,
            dpi: None,
        }
    }

    pub fn with_analysis_id(mut self, analysis_id: Uuid) -> Self {
        self.analysis_id = analysis_id;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: u8) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = Some(dpi);
        self
    }
}
