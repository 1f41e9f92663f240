//! Learning state: the sole persisted root of the adaptive layer
//!
//! All updates are functional (old state in, new state out); nothing here
//! performs I/O. The caller owns serialization and must serialize
//! concurrent writers per household itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cadence prediction, appended when a cart is analyzed and resolved
/// later once the true cadence is observable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadencePrediction {
    pub predicted_days: u32,
    #[serde(default)]
    pub actual_days: Option<u32>,
    /// Set on resolution with the ±2-day tolerance
    #[serde(default)]
    pub was_correct: Option<bool>,
    pub recorded_at: DateTime<Utc>,
    pub session_id: String,
}

impl CadencePrediction {
    pub fn is_resolved(&self) -> bool {
        self.actual_days.is_some()
    }

    /// Signed prediction error in days, once resolved
    pub fn error_days(&self) -> Option<i64> {
        self.actual_days
            .map(|actual| self.predicted_days as i64 - actual as i64)
    }
}

/// Per-product prediction log and learned cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceAccuracy {
    #[serde(default)]
    pub predictions: Vec<CadencePrediction>,
    #[serde(default)]
    pub learned_cadence_days: Option<u32>,
    pub default_cadence_days: u32,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

impl CadenceAccuracy {
    pub fn new(default_cadence_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            predictions: Vec::new(),
            learned_cadence_days: None,
            default_cadence_days,
            confidence: 0.3,
            updated_at: now,
        }
    }

    pub fn total_predictions(&self) -> usize {
        self.predictions.len()
    }

    pub fn resolved_predictions(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_resolved()).count()
    }

    pub fn correct_predictions(&self) -> usize {
        self.predictions
            .iter()
            .filter(|p| p.was_correct == Some(true))
            .count()
    }

    /// Fraction of resolved predictions that were correct
    pub fn accuracy_rate(&self) -> Option<f64> {
        let resolved = self.resolved_predictions();
        if resolved == 0 {
            return None;
        }
        Some(self.correct_predictions() as f64 / resolved as f64)
    }

    /// Mean signed error over resolved predictions, in days
    pub fn average_error_days(&self) -> Option<f64> {
        let errors: Vec<i64> = self.predictions.iter().filter_map(|p| p.error_days()).collect();
        if errors.is_empty() {
            return None;
        }
        Some(errors.iter().sum::<i64>() as f64 / errors.len() as f64)
    }

    /// Most recent resolution timestamp, for staleness checks
    pub fn last_resolved_at(&self) -> Option<DateTime<Utc>> {
        self.predictions
            .iter()
            .filter(|p| p.is_resolved())
            .map(|p| p.recorded_at)
            .max()
    }
}

/// The cart decision a feedback record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartDecision {
    Removed,
    Kept,
}

/// Whether a decision turned out right, relative to what the household did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneOutcome {
    Correct,
    WrongRemoval,
    WrongKeep,
    Unknown,
}

/// Append-only record of one observed feedback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruningFeedback {
    pub product_key: String,
    pub category: larder_core::Category,
    pub decision: CartDecision,
    pub outcome: PruneOutcome,
    /// Confidence the decision carried when it was made
    pub decision_confidence: f64,
    /// Product confidence after this event was folded in
    pub adjusted_confidence: f64,
    pub recorded_at: DateTime<Utc>,
    pub session_id: String,
}

/// Short date range with a consumption multiplier (guests, holidays)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub factor: f64,
}

/// Household consumption profile, updated incrementally from feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionProfile {
    /// Per-category consumption-rate multipliers (1.0 = category default)
    #[serde(default)]
    pub category_rates: HashMap<String, f64>,
    /// Per-category monthly factors overriding the built-in seasonal table
    #[serde(default)]
    pub seasonal_overrides: HashMap<String, Vec<f64>>,
    #[serde(default)]
    pub special_events: Vec<SpecialEvent>,
    pub overall_multiplier: f64,
    pub confidence: f64,
    pub data_points: usize,
}

impl Default for ConsumptionProfile {
    fn default() -> Self {
        Self {
            category_rates: HashMap::new(),
            seasonal_overrides: HashMap::new(),
            special_events: Vec::new(),
            overall_multiplier: 1.0,
            confidence: 0.3,
            data_points: 0,
        }
    }
}

impl ConsumptionProfile {
    pub fn category_rate(&self, category: larder_core::Category) -> f64 {
        self.category_rates
            .get(category.as_str())
            .copied()
            .unwrap_or(1.0)
    }
}

/// Counters updated once per cart-analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: usize,
    pub total_items: usize,
    pub total_pruned: usize,
    #[serde(default)]
    pub last_session_id: Option<String>,
}

/// Sole persisted root of the learning layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningState {
    #[serde(default)]
    pub cadence_accuracy: HashMap<String, CadenceAccuracy>,
    #[serde(default)]
    pub pruning_feedback: Vec<PruningFeedback>,
    #[serde(default)]
    pub consumption_profile: ConsumptionProfile,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub run_stats: RunStats,
}

impl LearningState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            cadence_accuracy: HashMap::new(),
            pruning_feedback: Vec::new(),
            consumption_profile: ConsumptionProfile::default(),
            last_updated: now,
            run_stats: RunStats::default(),
        }
    }

    pub fn accuracy_for(&self, product_key: &str) -> Option<&CadenceAccuracy> {
        self.cadence_accuracy.get(product_key)
    }

    /// Feedback records for one product, oldest first
    pub fn feedback_for(&self, product_key: &str) -> Vec<&PruningFeedback> {
        self.pruning_feedback
            .iter()
            .filter(|f| f.product_key == product_key)
            .collect()
    }
}

impl Default for LearningState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
