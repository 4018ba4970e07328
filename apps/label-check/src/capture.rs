//! Recorded collaborator output
//!
//! A capture file holds what the OCR engine and barcode decoder produced
//! for one image. [`ReplayCapture`] feeds it back through the collaborator
//! traits so the analysis pipeline runs unchanged.

use std::path::Path;

use label_engine::pipeline::{BarcodeDetector, TextExtractor};
use label_engine::LabelCheckError;
use serde::{Deserialize, Serialize};
use shared_types::{BarcodeDetection, BoundingBox, TextFragment};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub fragments: Vec<TextFragment>,
    #[serde(default)]
    pub barcodes: Vec<CapturedBarcode>,
}

/// Barcode as the decoder reported it. Sizes missing from the capture are
/// derived from the pixel box at analysis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedBarcode {
    pub data: String,
    #[serde(rename = "type", default)]
    pub symbology: String,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_width_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_height_mm: Option<f64>,
}

impl CapturedBarcode {
    pub fn to_detection(&self, dpi: f64) -> BarcodeDetection {
        let mut detection = BarcodeDetection::from_pixels(
            self.data.clone(),
            self.symbology.clone(),
            self.bounding_box,
            dpi,
        );
        if let Some(width) = self.measured_width_mm {
            detection.measured_width_mm = width;
        }
        if let Some(height) = self.measured_height_mm {
            detection.measured_height_mm = height;
        }
        detection
    }
}

impl Capture {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Serves a [`Capture`] as both OCR and barcode backend
#[derive(Debug, Clone)]
pub struct ReplayCapture {
    capture: Capture,
}

impl ReplayCapture {
    pub fn new(capture: Capture) -> Self {
        Self { capture }
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.capture.original_filename.as_deref()
    }
}

impl TextExtractor for ReplayCapture {
    fn extract_text(&self, _image: &Path) -> Result<Vec<TextFragment>, LabelCheckError> {
        Ok(self.capture.fragments.clone())
    }
}

impl BarcodeDetector for ReplayCapture {
    fn detect_barcodes(
        &self,
        _image: &Path,
        dpi: f64,
    ) -> Result<Vec<BarcodeDetection>, LabelCheckError> {
        Ok(self
            .capture
            .barcodes
            .iter()
            .map(|barcode| barcode.to_detection(dpi))
            .collect())
    }
}
