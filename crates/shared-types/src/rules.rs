//! Declarative rule sets checked against a label
//!
//! A [`RuleSet`] is an ordered list of [`RuleCondition`]s. Structural
//! problems (missing `between` bound, dangling payload references) are
//! rejected when the set is built, so evaluation never has to re-check them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kind of check a condition performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    ExactTextMatch,
    FontSize,
    Spacing,
    BarcodeDimensions,
    ElementPresence,
    TranslationMatch,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::ExactTextMatch => "exact_text_match",
            RuleType::FontSize => "font_size",
            RuleType::Spacing => "spacing",
            RuleType::BarcodeDimensions => "barcode_dimensions",
            RuleType::ElementPresence => "element_presence",
            RuleType::TranslationMatch => "translation_match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    #[default]
    Exactly,
    Min,
    Max,
    Between,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Exactly => "exactly",
            ComparisonOperator::Min => "min",
            ComparisonOperator::Max => "max",
            ComparisonOperator::Between => "between",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSizeUnit {
    #[default]
    Mm,
    Pt,
    Px,
}

impl FontSizeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSizeUnit::Mm => "mm",
            FontSizeUnit::Pt => "pt",
            FontSizeUnit::Px => "px",
        }
    }
}

fn default_case_sensitive() -> bool {
    true
}

fn default_tolerance_mm() -> f64 {
    0.5
}

/// One declarative check inside a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_element_description: Option<String>,

    // Text checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    // Font size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_value: Option<f64>,
    #[serde(default)]
    pub font_size_unit: FontSizeUnit,
    #[serde(default)]
    pub font_size_operator: ComparisonOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_value_upper: Option<f64>,

    // Element presence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_present: Option<bool>,

    // Barcode dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_width_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_height_mm: Option<f64>,
    #[serde(default = "default_tolerance_mm")]
    pub tolerance_mm: f64,
    /// 1-based position of the text rule holding the barcode payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_rule: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_override: Option<u8>,
}

impl RuleCondition {
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            description: None,
            target_element_description: None,
            expected_text: None,
            language: None,
            case_sensitive: default_case_sensitive(),
            font_size_value: None,
            font_size_unit: FontSizeUnit::default(),
            font_size_operator: ComparisonOperator::default(),
            font_size_value_upper: None,
            is_present: None,
            expected_width_mm: None,
            expected_height_mm: None,
            tolerance_mm: default_tolerance_mm(),
            payload_rule: None,
            sensitivity_override: None,
        }
    }

    /// EXACT_TEXT_MATCH condition for `expected`
    pub fn exact_text(expected: impl Into<String>) -> Self {
        Self {
            expected_text: Some(expected.into()),
            ..Self::new(RuleType::ExactTextMatch)
        }
    }

    /// BARCODE_DIMENSIONS condition; `None` leaves that dimension unchecked
    pub fn barcode_dimensions(width_mm: Option<f64>, height_mm: Option<f64>) -> Self {
        Self {
            expected_width_mm: width_mm,
            expected_height_mm: height_mm,
            ..Self::new(RuleType::BarcodeDimensions)
        }
    }

    /// FONT_SIZE condition for the element described by `target`
    pub fn font_size(
        target: impl Into<String>,
        value: f64,
        unit: FontSizeUnit,
        operator: ComparisonOperator,
    ) -> Self {
        Self {
            target_element_description: Some(target.into()),
            font_size_value: Some(value),
            font_size_unit: unit,
            font_size_operator: operator,
            ..Self::new(RuleType::FontSize)
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_element_description = Some(target.into());
        self
    }

    pub fn with_tolerance_mm(mut self, tolerance_mm: f64) -> Self {
        self.tolerance_mm = tolerance_mm;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_upper_bound(mut self, upper: f64) -> Self {
        self.font_size_value_upper = Some(upper);
        self
    }

    pub fn with_payload_rule(mut self, position: usize) -> Self {
        self.payload_rule = Some(position);
        self
    }

    pub fn with_sensitivity_override(mut self, sensitivity: u8) -> Self {
        self.sensitivity_override = Some(sensitivity);
        self
    }

    /// Stable reference used in highlights: `rule_<position>_<type>`
    pub fn rule_id_ref(&self, index: usize) -> String {
        format!("rule_{}_{}", index + 1, self.rule_type.as_str())
    }
}

/// Why a rule set was rejected. `rule` is the 1-based position in the list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleSetError {
    #[error("rule {rule}: font_size_value_upper is required when operator is 'between'")]
    MissingUpperBound { rule: usize },

    #[error("rule {rule}: upper font size bound {upper} is below lower bound {lower}")]
    InvertedBounds { rule: usize, lower: f64, upper: f64 },

    #[error("rule {rule}: sensitivity_override {value} is outside 0-100")]
    SensitivityOutOfRange { rule: usize, value: u8 },

    #[error("rule {rule}: tolerance_mm must be a finite, non-negative number (got {value})")]
    InvalidTolerance { rule: usize, value: f64 },

    #[error("rule {rule}: payload_rule {reference} {reason}")]
    InvalidPayloadRule {
        rule: usize,
        reference: usize,
        reason: &'static str,
    },
}

/// Ordered collection of conditions applied to one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub conditions: Vec<RuleCondition>,
}

impl RuleSet {
    /// Build and validate a rule set
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<RuleCondition>,
    ) -> Result<Self, RuleSetError> {
        let rule_set = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            conditions,
        };
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Check structural invariants. Sets deserialized from JSON must pass
    /// through here before evaluation.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        for (index, condition) in self.conditions.iter().enumerate() {
            let rule = index + 1;

            if condition.font_size_operator == ComparisonOperator::Between {
                let upper = condition
                    .font_size_value_upper
                    .ok_or(RuleSetError::MissingUpperBound { rule })?;
                if let Some(lower) = condition.font_size_value {
                    if upper < lower {
                        return Err(RuleSetError::InvertedBounds { rule, lower, upper });
                    }
                }
            }

            if let Some(value) = condition.sensitivity_override {
                if value > 100 {
                    return Err(RuleSetError::SensitivityOutOfRange { rule, value });
                }
            }

            if !condition.tolerance_mm.is_finite() || condition.tolerance_mm < 0.0 {
                return Err(RuleSetError::InvalidTolerance {
                    rule,
                    value: condition.tolerance_mm,
                });
            }

            if let Some(reference) = condition.payload_rule {
                let invalid = |reason| RuleSetError::InvalidPayloadRule {
                    rule,
                    reference,
                    reason,
                };
                if reference == 0 || reference > self.conditions.len() {
                    return Err(invalid("is out of range"));
                }
                if reference == rule {
                    return Err(invalid("refers to itself"));
                }
                if self.conditions[reference - 1].rule_type != RuleType::ExactTextMatch {
                    return Err(invalid("is not an exact_text_match rule"));
                }
            }
        }
        Ok(())
    }
}
