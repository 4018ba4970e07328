//! Engine configuration

use serde::{Deserialize, Serialize};
use shared_types::BoundingBox;

use crate::thresholds::ThresholdPolicy;

/// Placeholder location for faults that have no position on the image
pub const SENTINEL_BOX: BoundingBox = BoundingBox {
    x: 0,
    y: 0,
    width: 10,
    height: 10,
};

pub const DEFAULT_DPI: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub threshold_policy: ThresholdPolicy,
    /// Used whenever the image DPI is unknown
    pub default_dpi: f64,
    /// Allowed deviation for `exactly` font-size checks, in the rule's unit
    pub font_size_tolerance: f64,
    pub sentinel_box: BoundingBox,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold_policy: ThresholdPolicy::default(),
            default_dpi: DEFAULT_DPI,
            font_size_tolerance: 0.25,
            sentinel_box: SENTINEL_BOX,
        }
    }
}

impl EngineConfig {
    /// `dpi` if it is usable, else the configured default
    pub fn effective_dpi(&self, dpi: Option<f64>) -> f64 {
        dpi.filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(self.default_dpi)
    }
}
