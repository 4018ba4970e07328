//! Similarity thresholds and the sensitivity knob
//!
//! Sensitivity 0-100 maps monotonically onto the three thresholds used by
//! text matching: 0 is lenient, 50 reproduces the defaults, 100 is strict.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// At or above: the text is present as expected
    pub perfect: f64,
    /// At or above (below `perfect`): present but differs slightly
    pub near: f64,
    /// Below: treated as absent
    pub minimum: f64,
}

const LENIENT: MatchThresholds = MatchThresholds::new(0.95, 0.75, 0.45);
const DEFAULT: MatchThresholds = MatchThresholds::new(0.98, 0.85, 0.60);
const STRICT: MatchThresholds = MatchThresholds::new(1.0, 0.93, 0.75);

pub const DEFAULT_SENSITIVITY: u8 = 50;

/// Where a similarity score falls among the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Perfect,
    Near,
    Low,
    Missing,
}

impl MatchThresholds {
    pub const fn new(perfect: f64, near: f64, minimum: f64) -> Self {
        Self {
            perfect,
            near,
            minimum,
        }
    }

    /// Thresholds for a sensitivity in 0-100 (larger values are clamped)
    pub fn for_sensitivity(sensitivity: u8) -> Self {
        let s = f64::from(sensitivity.min(100));
        if s <= 50.0 {
            lerp(&LENIENT, &DEFAULT, s / 50.0)
        } else {
            lerp(&DEFAULT, &STRICT, (s - 50.0) / 50.0)
        }
    }

    pub fn tier(&self, score: f64) -> MatchTier {
        if score >= self.perfect {
            MatchTier::Perfect
        } else if score >= self.near {
            MatchTier::Near
        } else if score < self.minimum {
            MatchTier::Missing
        } else {
            MatchTier::Low
        }
    }
}

impl Default for MatchThresholds {
    fn default() -> Self {
        DEFAULT
    }
}

// a*(1-t) + b*t hits both endpoints exactly
fn lerp(a: &MatchThresholds, b: &MatchThresholds, t: f64) -> MatchThresholds {
    let mix = |x: f64, y: f64| x * (1.0 - t) + y * t;
    MatchThresholds {
        perfect: mix(a.perfect, b.perfect),
        near: mix(a.near, b.near),
        minimum: mix(a.minimum, b.minimum),
    }
}

/// How the engine picks thresholds for a condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Same thresholds for every condition, sensitivity ignored
    Fixed(MatchThresholds),
    /// Derive from the condition's override, else the analysis sensitivity
    #[default]
    Sensitivity,
}

impl ThresholdPolicy {
    pub fn resolve(&self, sensitivity: u8, sensitivity_override: Option<u8>) -> MatchThresholds {
        match self {
            ThresholdPolicy::Fixed(thresholds) => *thresholds,
            ThresholdPolicy::Sensitivity => {
                MatchThresholds::for_sensitivity(sensitivity_override.unwrap_or(sensitivity))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_sensitivity_gives_default_thresholds() {
        assert_eq!(
            MatchThresholds::for_sensitivity(DEFAULT_SENSITIVITY),
            MatchThresholds::default()
        );
        assert_eq!(MatchThresholds::default(), MatchThresholds::new(0.98, 0.85, 0.60));
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(MatchThresholds::for_sensitivity(0), LENIENT);
        assert_eq!(MatchThresholds::for_sensitivity(100), STRICT);
        assert_eq!(MatchThresholds::for_sensitivity(255), STRICT);
    }

    #[test]
    fn test_tiers() {
        let t = MatchThresholds::default();
        assert_eq!(t.tier(1.0), MatchTier::Perfect);
        assert_eq!(t.tier(0.98), MatchTier::Perfect);
        assert_eq!(t.tier(0.90), MatchTier::Near);
        assert_eq!(t.tier(0.85), MatchTier::Near);
        assert_eq!(t.tier(0.70), MatchTier::Low);
        assert_eq!(t.tier(0.60), MatchTier::Low);
        assert_eq!(t.tier(0.59), MatchTier::Missing);
        assert_eq!(t.tier(0.0), MatchTier::Missing);
    }

    #[test]
    fn test_override_wins_over_global() {
        let policy = ThresholdPolicy::Sensitivity;
        assert_eq!(policy.resolve(50, Some(100)), STRICT);
        assert_eq!(policy.resolve(0, None), LENIENT);
    }

    #[test]
    fn test_fixed_policy_ignores_sensitivity() {
        let fixed = MatchThresholds::new(0.9, 0.8, 0.5);
        let policy = ThresholdPolicy::Fixed(fixed);
        assert_eq!(policy.resolve(0, Some(100)), fixed);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Raising sensitivity never loosens any threshold
        #[test]
        fn thresholds_monotonic(a in 0u8..=100, b in 0u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = MatchThresholds::for_sensitivity(lo);
            let high = MatchThresholds::for_sensitivity(hi);
            prop_assert!(low.perfect <= high.perfect + 1e-12);
            prop_assert!(low.near <= high.near + 1e-12);
            prop_assert!(low.minimum <= high.minimum + 1e-12);
        }

        /// Property: Tiers stay ordered at every sensitivity
        #[test]
        fn thresholds_ordered(s in 0u8..=100) {
            let t = MatchThresholds::for_sensitivity(s);
            prop_assert!(t.minimum < t.near);
            prop_assert!(t.near < t.perfect);
            prop_assert!(t.perfect <= 1.0);
        }
    }
}
