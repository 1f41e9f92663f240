//! Cadence tracker: pure update functions over the learning state

use crate::state::{CadenceAccuracy, CadencePrediction, LearningState};
use chrono::{DateTime, Duration, Utc};
use larder_core::{CadenceEstimate, CadenceSource};

/// A resolved prediction within this many days of the actual cadence counts
/// as correct. Widening this silently reinterprets stored predictions, so
/// it is a constant of the data format rather than configuration.
pub const CORRECTNESS_TOLERANCE_DAYS: i64 = 2;

/// Decay constant for recency weighting, in days
const RECENCY_DECAY_DAYS: f64 = 90.0;

/// Tunables for learned-cadence derivation
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Resolved predictions required before the learned cadence is trusted
    pub min_resolved: usize,
    /// Predictions older than this are ignored
    pub max_age_days: i64,
    /// Blend weight of the learned average vs the category default
    pub learned_weight: f64,
    /// Learned cadence may deviate at most this fraction from the default
    pub max_deviation: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_resolved: 3,
            max_age_days: 180,
            learned_weight: 0.7,
            max_deviation: 0.2,
        }
    }
}

/// Append an unresolved prediction for a product. First sighting of a
/// product starts its accuracy record at confidence 0.3.
pub fn record_prediction(
    state: &LearningState,
    product_key: &str,
    predicted_days: u32,
    default_cadence_days: u32,
    session_id: &str,
    now: DateTime<Utc>,
) -> LearningState {
    let mut next = state.clone();
    let acc = next
        .cadence_accuracy
        .entry(product_key.to_string())
        .or_insert_with(|| CadenceAccuracy::new(default_cadence_days, now));

    acc.predictions.push(CadencePrediction {
        predicted_days,
        actual_days: None,
        was_correct: None,
        recorded_at: now,
        session_id: session_id.to_string(),
    });
    acc.updated_at = now;
    next.last_updated = now;
    next
}

/// Resolve the most recent unresolved prediction for a product once the
/// true cadence is known, then recompute the learned cadence.
pub fn record_prediction_outcome(
    state: &LearningState,
    product_key: &str,
    actual_days: u32,
    config: &TrackerConfig,
    now: DateTime<Utc>,
) -> LearningState {
    resolve_pending(state, product_key, None, actual_days, config, now)
}

/// Resolve the pending prediction recorded under a specific session,
/// leaving newer pending predictions untouched.
pub fn record_session_outcome(
    state: &LearningState,
    product_key: &str,
    session_id: &str,
    actual_days: u32,
    config: &TrackerConfig,
    now: DateTime<Utc>,
) -> LearningState {
    resolve_pending(state, product_key, Some(session_id), actual_days, config, now)
}

fn resolve_pending(
    state: &LearningState,
    product_key: &str,
    session_id: Option<&str>,
    actual_days: u32,
    config: &TrackerConfig,
    now: DateTime<Utc>,
) -> LearningState {
    let mut next = state.clone();
    let Some(acc) = next.cadence_accuracy.get_mut(product_key) else {
        return next;
    };

    let Some(pending) = acc
        .predictions
        .iter_mut()
        .rev()
        .find(|p| !p.is_resolved() && session_id.map_or(true, |s| p.session_id == s))
    else {
        return next;
    };

    let error = (pending.predicted_days as i64 - actual_days as i64).abs();
    pending.actual_days = Some(actual_days);
    pending.was_correct = Some(error <= CORRECTNESS_TOLERANCE_DAYS);

    let learned = learned_cadence(acc, config, now);
    if learned.source == CadenceSource::Learned {
        acc.learned_cadence_days = Some(learned.days);
    }
    acc.confidence = learned.confidence;
    acc.updated_at = now;
    next.last_updated = now;
    next
}

/// Derive the learned cadence for a product from its resolved predictions.
///
/// Requires `min_resolved` resolutions within `max_age_days`; otherwise the
/// category default is returned at low confidence. The learned figure is a
/// recency-weighted average of actual cadences, blended with the default
/// and clamped to `max_deviation` around it.
pub fn learned_cadence(
    accuracy: &CadenceAccuracy,
    config: &TrackerConfig,
    now: DateTime<Utc>,
) -> CadenceEstimate {
    let cutoff = now - Duration::days(config.max_age_days);
    let recent: Vec<&CadencePrediction> = accuracy
        .predictions
        .iter()
        .filter(|p| p.is_resolved() && p.recorded_at >= cutoff)
        .collect();

    let default_days = accuracy.default_cadence_days;
    if recent.len() < config.min_resolved {
        return CadenceEstimate {
            days: default_days,
            source: CadenceSource::CategoryDefault,
            confidence: 0.3,
            data_points: recent.len(),
            reason: format!(
                "{} resolved prediction(s), need {}; using default of {} days",
                recent.len(),
                config.min_resolved,
                default_days
            ),
        };
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for p in &recent {
        let age_days = (now - p.recorded_at).num_days().max(0) as f64;
        let weight = (-age_days / RECENCY_DECAY_DAYS).exp();
        weighted_sum += p.actual_days.unwrap_or(default_days) as f64 * weight;
        weight_total += weight;
    }
    let recency_avg = weighted_sum / weight_total.max(f64::EPSILON);

    let blended =
        config.learned_weight * recency_avg + (1.0 - config.learned_weight) * default_days as f64;
    let lo = default_days as f64 * (1.0 - config.max_deviation);
    let hi = default_days as f64 * (1.0 + config.max_deviation);
    let days = blended
        .clamp(lo, hi)
        .round()
        .clamp(larder_core::MIN_CADENCE_DAYS as f64, larder_core::MAX_CADENCE_DAYS as f64)
        as u32;

    let correct = recent.iter().filter(|p| p.was_correct == Some(true)).count();
    let accuracy_rate = correct as f64 / recent.len() as f64;
    let volume_bonus = (0.02 * recent.len() as f64).min(0.15);
    let confidence = (0.35 + 0.45 * accuracy_rate + volume_bonus).min(0.95);

    CadenceEstimate {
        days,
        source: CadenceSource::Learned,
        confidence,
        data_points: recent.len(),
        reason: format!(
            "learned from {} resolved predictions ({}% accurate)",
            recent.len(),
            (accuracy_rate * 100.0).round() as u32
        ),
    }
}
