use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Millimetres per inch, used for every pixel/DPI conversion
pub const MM_PER_INCH: f64 = 25.4;

/// Axis-aligned box in image pixel coordinates (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Vertical midpoint, in pixels
    pub fn vertical_mid(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }

    /// Smallest box enclosing both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// One span of OCR text with its pixel box and recognition confidence.
///
/// Line blocks produced by the reconstructor share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            left: bbox.x,
            top: bbox.y,
            width: bbox.width,
            height: bbox.height,
            confidence,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.left, self.top, self.width, self.height)
    }
}

/// A decoded barcode with its physical size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeDetection {
    pub data: String,
    #[serde(rename = "type")]
    pub symbology: String,
    pub bounding_box: BoundingBox,
    pub measured_width_mm: f64,
    pub measured_height_mm: f64,
}

impl BarcodeDetection {
    /// Build a detection from a pixel box, converting its size with the image DPI.
    ///
    /// A non-positive DPI yields zero-sized measurements.
    pub fn from_pixels(
        data: impl Into<String>,
        symbology: impl Into<String>,
        bounding_box: BoundingBox,
        dpi: f64,
    ) -> Self {
        let to_mm = |px: i32| {
            if dpi <= 0.0 {
                0.0
            } else {
                f64::from(px) / dpi * MM_PER_INCH
            }
        };
        Self {
            data: data.into(),
            symbology: symbology.into(),
            bounding_box,
            measured_width_mm: to_mm(bounding_box.width),
            measured_height_mm: to_mm(bounding_box.height),
        }
    }
}

/// Verdict carried by a highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightStatus {
    Correct,
    Wrong,
    Info,
}

impl HighlightStatus {
    /// Box colour used by the annotation renderer
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            HighlightStatus::Correct => [0, 200, 0],
            HighlightStatus::Wrong => [220, 0, 0],
            HighlightStatus::Info => [0, 90, 220],
        }
    }
}

/// Evidence for one evaluated condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub rule_id_ref: String,
    pub bounding_box: BoundingBox,
    pub status: HighlightStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pass,
    FailCritical,
    FailMinor,
    ProcessingError,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Pass => "pass",
            OverallStatus::FailCritical => "fail_critical",
            OverallStatus::FailMinor => "fail_minor",
            OverallStatus::ProcessingError => "processing_error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_rules_defined: usize,
    pub matches: usize,
    pub mismatches_or_errors: usize,
    /// Faults that have no location on the image, in evaluation order
    pub faults_without_location: Vec<String>,
}

/// Final verdict of one label analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub original_filename: String,
    pub overall_status: OverallStatus,
    pub summary: AnalysisSummary,
    pub highlights: Vec<Highlight>,
    pub timestamp: String, // RFC 3339, UTC
}
