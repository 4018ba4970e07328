//! Async analysis pipeline
//!
//! Runs the OCR and barcode collaborators on blocking worker threads,
//! waits for both, evaluates the rule set and hands the result to a sink.
//! Rule evaluation never starts on partial collaborator output.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shared_types::{AnalysisLedger, AnalysisResult, BarcodeDetection, RuleSet, TextFragment};
use tracing::{error, info};

use crate::context::EvaluationContext;
use crate::error::LabelCheckError;
use crate::thresholds::DEFAULT_SENSITIVITY;
use crate::LabelEngine;

/// OCR backend. Zero fragments is a valid answer, not an error.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &Path) -> Result<Vec<TextFragment>, LabelCheckError>;
}

/// Barcode decoder. Nothing found is an empty list, not an error.
pub trait BarcodeDetector: Send + Sync {
    fn detect_barcodes(
        &self,
        image: &Path,
        dpi: f64,
    ) -> Result<Vec<BarcodeDetection>, LabelCheckError>;
}

/// Write-once destination for finished analyses
pub trait ResultSink: Send + Sync {
    fn store(&self, result: &AnalysisResult, rule_set: &RuleSet) -> Result<(), LabelCheckError>;
}

/// Sink that appends every result to an in-memory [`AnalysisLedger`]
#[derive(Debug, Default)]
pub struct LedgerSink {
    ledger: Mutex<AnalysisLedger>,
}

impl LedgerSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the ledger as it stands
    pub fn snapshot(&self) -> Result<AnalysisLedger, LabelCheckError> {
        self.ledger
            .lock()
            .map(|ledger| ledger.clone())
            .map_err(|_| LabelCheckError::Sink("ledger lock poisoned".to_string()))
    }
}

impl ResultSink for LedgerSink {
    fn store(&self, result: &AnalysisResult, rule_set: &RuleSet) -> Result<(), LabelCheckError> {
        let mut ledger = self
            .ledger
            .lock()
            .map_err(|_| LabelCheckError::Sink("ledger lock poisoned".to_string()))?;
        let entry = ledger
            .append(result, rule_set)
            .map_err(|e| LabelCheckError::Sink(e.to_string()))?;
        info!(
            analysis_id = %entry.analysis_id,
            hash = %entry.compute_hash(),
            "Analysis recorded"
        );
        Ok(())
    }
}

/// One label to analyze
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: PathBuf,
    pub original_filename: String,
    pub rule_set: RuleSet,
    pub sensitivity: u8,
    pub dpi: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(image: impl Into<PathBuf>, rule_set: RuleSet) -> Self {
        let image = image.into();
        let original_filename = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            image,
            original_filename,
            rule_set,
            sensitivity: DEFAULT_SENSITIVITY,
            dpi: None,
        }
    }

    pub fn with_original_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = name.into();
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

/// Drives collaborators and the engine for one request at a time.
/// Holds no per-analysis state, so one analyzer can serve concurrent requests.
pub struct LabelAnalyzer {
    engine: LabelEngine,
    extractor: Arc<dyn TextExtractor>,
    detector: Arc<dyn BarcodeDetector>,
    sink: Arc<dyn ResultSink>,
}

impl LabelAnalyzer {
    pub fn new(
        engine: LabelEngine,
        extractor: Arc<dyn TextExtractor>,
        detector: Arc<dyn BarcodeDetector>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            engine,
            extractor,
            detector,
            sink,
        }
    }

    pub fn engine(&self) -> &LabelEngine {
        &self.engine
    }

    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, LabelCheckError> {
        request.rule_set.validate()?;
        if request.sensitivity > 100 {
            return Err(LabelCheckError::Configuration(format!(
                "sensitivity must be between 0 and 100, got {}",
                request.sensitivity
            )));
        }

        let dpi = self.engine.config().effective_dpi(request.dpi);
        let image = Arc::new(request.image.clone());

        let extractor = Arc::clone(&self.extractor);
        let ocr_image = Arc::clone(&image);
        let ocr = tokio::task::spawn_blocking(move || extractor.extract_text(&ocr_image));

        let detector = Arc::clone(&self.detector);
        let barcode_image = Arc::clone(&image);
        let barcodes =
            tokio::task::spawn_blocking(move || detector.detect_barcodes(&barcode_image, dpi));

        let (ocr, barcodes) = tokio::join!(ocr, barcodes);
        let fragments = joined(ocr, "OCR")?;
        let barcodes = joined(barcodes, "Barcode detection")?;

        let context = EvaluationContext::new(request.original_filename.clone())
            .with_sensitivity(request.sensitivity)
            .with_dpi(dpi);
        let result = self
            .engine
            .evaluate(&request.rule_set, &fragments, &barcodes, &context);

        self.sink.store(&result, &request.rule_set)?;
        Ok(result)
    }
}

// Flatten a blocking task's join result, logging upstream failures
fn joined<T>(
    result: Result<Result<T, LabelCheckError>, tokio::task::JoinError>,
    stage: &str,
) -> Result<T, LabelCheckError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(stage, error = %e, "Collaborator failed");
            Err(e)
        }
        Err(join_error) => {
            error!(stage, error = %join_error, "Collaborator task panicked");
            Err(LabelCheckError::Processing(format!(
                "{} task panicked: {}",
                stage, join_error
            )))
        }
    }
}
