//! Error types for label analysis

use shared_types::RuleSetError;
use thiserror::Error;

/// Errors that abort a whole analysis
#[derive(Error, Debug)]
pub enum LabelCheckError {
    /// A required capability is missing, e.g. no OCR backend
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// OCR or visual analysis failed on this image
    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(#[from] RuleSetError),

    #[error("Result sink error: {0}")]
    Sink(String),
}

/// A single condition could not be evaluated. Never aborts the analysis;
/// the engine records it as a mismatch with a fault-log entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleFault {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Another rule this one depends on is absent or unusable
    #[error("companion rule unavailable: {reason}")]
    MissingCompanion { reason: String },

    #[error("rule type '{0}' is not supported")]
    Unsupported(&'static str),
}
