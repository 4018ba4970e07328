pub mod audit;
pub mod rules;
pub mod types;

pub use audit::{AnalysisLedger, LedgerEntry, LedgerError};
pub use rules::{ComparisonOperator, FontSizeUnit, RuleCondition, RuleSet, RuleSetError, RuleType};
pub use types::{
    AnalysisResult, AnalysisSummary, BarcodeDetection, BoundingBox, Highlight, HighlightStatus,
    OverallStatus, TextFragment, MM_PER_INCH,
};
