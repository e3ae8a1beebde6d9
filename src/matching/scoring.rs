use serde::{Deserialize, Serialize};

use crate::core::types::Tier;

/// Score boundaries that route a classified chain into a tier.
///
/// The fuzzy boundaries decide the confident tiers directly; a score at or
/// below `good` is inconclusive and is escalated to structural alignment,
/// where `poor_alignment` and `poor_score` separate `possible` from `poor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Lowest score (inclusive) for `excellent`
    pub excellent: f64,
    /// Scores strictly above this are `good`; at or below escalate
    pub good: f64,
    /// Alignment coverage below this counts against the chain
    pub poor_alignment: f64,
    /// Similarity below this counts against the chain
    pub poor_score: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.9,
            good: 0.5,
            poor_alignment: 0.5,
            poor_score: 0.4,
        }
    }
}

/// Tier decision from similarity alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyDecision {
    Tier(Tier),
    /// Similarity is inconclusive; structural alignment decides
    Escalate,
}

impl TierThresholds {
    /// Check every threshold is in [0, 1] and `good <= excellent`
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid threshold.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("excellent", self.excellent),
            ("good", self.good),
            ("poor_alignment", self.poor_alignment),
            ("poor_score", self.poor_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("threshold '{name}' must be in [0, 1], got {value}"));
            }
        }
        if self.good > self.excellent {
            return Err(format!(
                "threshold 'good' ({}) must not exceed 'excellent' ({})",
                self.good, self.excellent
            ));
        }
        Ok(())
    }

    /// Decide a tier from the best similarity score, or escalate
    #[must_use]
    pub fn fuzzy_decision(&self, score: f64) -> FuzzyDecision {
        if score >= 1.0 {
            FuzzyDecision::Tier(Tier::Exact)
        } else if score >= self.excellent {
            FuzzyDecision::Tier(Tier::Excellent)
        } else if score > self.good {
            FuzzyDecision::Tier(Tier::Good)
        } else {
            FuzzyDecision::Escalate
        }
    }

    /// Decide between `possible` and `poor` once structural alignment has run.
    ///
    /// A chain is `poor` only when both its alignment coverage and its
    /// similarity are low.
    #[must_use]
    pub fn fallback_tier(&self, score: f64, alignment_ratio: f64) -> Tier {
        if alignment_ratio < self.poor_alignment && score < self.poor_score {
            Tier::Poor
        } else {
            Tier::Possible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(t.fuzzy_decision(1.0), FuzzyDecision::Tier(Tier::Exact));
        assert_eq!(t.fuzzy_decision(0.9999), FuzzyDecision::Tier(Tier::Excellent));
        assert_eq!(t.fuzzy_decision(0.9), FuzzyDecision::Tier(Tier::Excellent));
        assert_eq!(t.fuzzy_decision(0.8999), FuzzyDecision::Tier(Tier::Good));
        assert_eq!(t.fuzzy_decision(0.5001), FuzzyDecision::Tier(Tier::Good));
        assert_eq!(t.fuzzy_decision(0.5), FuzzyDecision::Escalate);
        assert_eq!(t.fuzzy_decision(0.0), FuzzyDecision::Escalate);
    }

    #[test]
    fn test_fallback_requires_both_low() {
        let t = TierThresholds::default();
        assert_eq!(t.fallback_tier(0.3, 0.2), Tier::Poor);
        assert_eq!(t.fallback_tier(0.3, 0.5), Tier::Possible);
        assert_eq!(t.fallback_tier(0.4, 0.0), Tier::Possible);
        assert_eq!(t.fallback_tier(0.45, 0.9), Tier::Possible);
    }

    #[test]
    fn test_validate() {
        assert!(TierThresholds::default().validate().is_ok());

        let inverted = TierThresholds {
            excellent: 0.5,
            good: 0.9,
            ..TierThresholds::default()
        };
        assert!(inverted.validate().is_err());

        let out_of_range = TierThresholds {
            poor_score: 1.5,
            ..TierThresholds::default()
        };
        assert!(out_of_range.validate().unwrap_err().contains("poor_score"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let t: TierThresholds = serde_json::from_str(r#"{"excellent": 0.95}"#).unwrap();
        assert!((t.excellent - 0.95).abs() < f64::EPSILON);
        assert!((t.good - 0.5).abs() < f64::EPSILON);
    }
}
