//! Engine configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one cart-analysis run.
///
/// All fields have the documented defaults; `validate` catches structurally
/// invalid values, which are a caller error rather than a runtime case the
/// engine recovers from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How far back to look in the order history, in days
    pub history_days_back: i64,
    /// Floor a prune decision must clear in conservative mode
    pub min_prune_confidence: f64,
    /// Blend learned cadences and the conservative gate into decisions
    pub use_learned_cadences: bool,
    /// Downgrade low-confidence prunes to keep
    pub conservative_mode: bool,
    /// Flag low-confidence keeps for downstream re-review
    pub include_uncertain_items: bool,
    /// Urgency ratio below which an item is a prune candidate
    pub prune_threshold: f64,
    /// Urgency ratio above which a keep is near-certain
    pub uncertain_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_days_back: 90,
            min_prune_confidence: 0.7,
            use_learned_cadences: true,
            conservative_mode: true,
            include_uncertain_items: true,
            prune_threshold: 0.7,
            uncertain_threshold: 0.9,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("history_days_back must be positive, got {0}")]
    NonPositiveWindow(i64),
    #[error("prune_threshold ({prune}) must not exceed uncertain_threshold ({uncertain})")]
    ThresholdOrder { prune: f64, uncertain: f64 },
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("min_prune_confidence", self.min_prune_confidence),
            ("prune_threshold", self.prune_threshold),
            ("uncertain_threshold", self.uncertain_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.history_days_back <= 0 {
            return Err(ConfigError::NonPositiveWindow(self.history_days_back));
        }
        if self.prune_threshold > self.uncertain_threshold {
            return Err(ConfigError::ThresholdOrder {
                prune: self.prune_threshold,
                uncertain: self.uncertain_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_days_back, 90);
        assert_eq!(config.min_prune_confidence, 0.7);
        assert_eq!(config.prune_threshold, 0.7);
        assert_eq!(config.uncertain_threshold, 0.9);
        assert!(config.conservative_mode);
        assert!(config.use_learned_cadences);
        assert!(config.include_uncertain_items);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"conservative_mode":false}"#).unwrap();
        assert!(!config.conservative_mode);
        assert_eq!(config.prune_threshold, 0.7);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = EngineConfig {
            prune_threshold: 1.3,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "prune_threshold", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let config = EngineConfig {
            prune_threshold: 0.95,
            uncertain_threshold: 0.9,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }
}
