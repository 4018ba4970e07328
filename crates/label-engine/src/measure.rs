//! Physical unit conversion and font-size measurement
//!
//! All conversions go through millimetres: `mm = px / dpi * 25.4`.

use shared_types::{FontSizeUnit, TextFragment, MM_PER_INCH};

const PT_PER_INCH: f64 = 72.0;

/// Pixels to millimetres at `dpi`; 0.0 when the DPI is not positive
pub fn pixels_to_mm(pixels: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    pixels / dpi * MM_PER_INCH
}

pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / MM_PER_INCH * dpi
}

pub fn mm_to_pt(mm: f64) -> f64 {
    mm / MM_PER_INCH * PT_PER_INCH
}

/// Express a millimetre value in `unit`
pub fn convert_mm(mm: f64, unit: FontSizeUnit, dpi: f64) -> f64 {
    match unit {
        FontSizeUnit::Mm => mm,
        FontSizeUnit::Pt => mm_to_pt(mm),
        FontSizeUnit::Px => mm_to_px(mm, dpi),
    }
}

/// Measures the printed size of a located text element.
///
/// Returns the size in millimetres, or `None` when the element cannot be
/// measured (the engine then reports the check as unresolved).
pub trait FontMeasure: Send + Sync {
    fn measure_mm(&self, target: &TextFragment, dpi: f64) -> Option<f64>;
}

/// Uses the height of the OCR box as the font height
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxHeightFontMeasure;

impl FontMeasure for BoxHeightFontMeasure {
    fn measure_mm(&self, target: &TextFragment, dpi: f64) -> Option<f64> {
        if target.height <= 0 || dpi <= 0.0 {
            return None;
        }
        Some(pixels_to_mm(f64::from(target.height), dpi))
    }
}
