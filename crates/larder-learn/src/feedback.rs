//! Feedback processor: behavioral and explicit signals folded into the
//! learning state

use crate::state::{CartDecision, LearningState, PruneOutcome, PruningFeedback};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use larder_core::{product_key, CartItem, Category, PruneDecision, PurchaseRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Purchases this close to a regular order date are attributed to that
/// order rather than treated as an emergency top-up.
const EMERGENCY_BOUNDARY_MARGIN_DAYS: i64 = 2;

/// Feedback newer than this counts as "recent" for gating purposes
pub(crate) const RECENT_FEEDBACK_DAYS: i64 = 60;

const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// The seven observable signal kinds, ordered by importance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSignalType {
    ExplicitCorrection,
    RanOutEarly,
    EmergencyPurchase,
    ImplicitReAdd,
    StillHaveStock,
    QuantityAdjusted,
    AcceptedSuggestion,
}

impl FeedbackSignalType {
    /// Fixed importance weight
    pub fn weight(&self) -> f64 {
        match self {
            FeedbackSignalType::ExplicitCorrection => 1.0,
            FeedbackSignalType::RanOutEarly => 0.9,
            FeedbackSignalType::EmergencyPurchase => 0.8,
            FeedbackSignalType::ImplicitReAdd => 0.7,
            FeedbackSignalType::StillHaveStock => 0.6,
            FeedbackSignalType::QuantityAdjusted => 0.4,
            FeedbackSignalType::AcceptedSuggestion => 0.3,
        }
    }

    /// Outcome the signal implies, relative to the original decision
    pub fn outcome(&self, decision: CartDecision) -> PruneOutcome {
        match self {
            FeedbackSignalType::ExplicitCorrection => match decision {
                CartDecision::Removed => PruneOutcome::WrongRemoval,
                CartDecision::Kept => PruneOutcome::WrongKeep,
            },
            FeedbackSignalType::RanOutEarly | FeedbackSignalType::EmergencyPurchase => {
                match decision {
                    CartDecision::Removed => PruneOutcome::WrongRemoval,
                    CartDecision::Kept => PruneOutcome::Correct,
                }
            }
            FeedbackSignalType::ImplicitReAdd => match decision {
                CartDecision::Removed => PruneOutcome::WrongRemoval,
                CartDecision::Kept => PruneOutcome::Unknown,
            },
            FeedbackSignalType::StillHaveStock => match decision {
                CartDecision::Kept => PruneOutcome::WrongKeep,
                CartDecision::Removed => PruneOutcome::Correct,
            },
            FeedbackSignalType::QuantityAdjusted => PruneOutcome::Unknown,
            FeedbackSignalType::AcceptedSuggestion => PruneOutcome::Correct,
        }
    }
}

/// One observed signal about one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSignal {
    pub signal: FeedbackSignalType,
    pub product_key: String,
    pub category: Category,
    /// The decision the signal refers to
    pub decision: CartDecision,
    /// Confidence the decision carried when it was made
    pub decision_confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// Fold one signal into the state: append a feedback record, adjust the
/// product's confidence, and nudge the consumption profile.
pub fn process_feedback_signal(state: &LearningState, signal: &FeedbackSignal) -> LearningState {
    let mut next = state.clone();
    let outcome = signal.signal.outcome(signal.decision);
    let weight = signal.signal.weight();

    let delta = match outcome {
        PruneOutcome::Correct => 0.05 * weight,
        PruneOutcome::WrongRemoval => -0.25 * weight,
        PruneOutcome::WrongKeep => -0.15 * weight,
        PruneOutcome::Unknown => -0.02 * weight,
    };

    let adjusted = {
        let acc = next
            .cadence_accuracy
            .entry(signal.product_key.clone())
            .or_insert_with(|| {
                crate::state::CadenceAccuracy::new(
                    signal.category.default_cadence_days(),
                    signal.timestamp,
                )
            });
        acc.confidence = (acc.confidence + delta).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        acc.updated_at = signal.timestamp;
        acc.confidence
    };

    next.pruning_feedback.push(PruningFeedback {
        product_key: signal.product_key.clone(),
        category: signal.category,
        decision: signal.decision,
        outcome,
        decision_confidence: signal.decision_confidence,
        adjusted_confidence: adjusted,
        recorded_at: signal.timestamp,
        session_id: signal.session_id.clone(),
    });

    // Directional consumption evidence feeds the household profile
    let profile = &mut next.consumption_profile;
    match signal.signal {
        FeedbackSignalType::RanOutEarly | FeedbackSignalType::EmergencyPurchase => {
            let rate = profile.category_rate(signal.category);
            profile
                .category_rates
                .insert(signal.category.as_str().to_string(), (rate * 1.05).clamp(0.5, 2.0));
        }
        FeedbackSignalType::StillHaveStock => {
            let rate = profile.category_rate(signal.category);
            profile
                .category_rates
                .insert(signal.category.as_str().to_string(), (rate * 0.95).clamp(0.5, 2.0));
        }
        _ => {}
    }
    profile.data_points += 1;
    profile.confidence = (0.3 + 0.02 * profile.data_points as f64).min(0.9);

    next.last_updated = signal.timestamp;
    debug!(
        product = %signal.product_key,
        signal = ?signal.signal,
        outcome = ?outcome,
        confidence = adjusted,
        "feedback processed"
    );
    next
}

/// What the accumulated feedback says about trusting decisions for a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackRecommendation {
    TrustMore,
    TrustLess,
    NeedsReview,
    InsufficientData,
}

/// Aggregated feedback view for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeedbackAnalysis {
    pub recommendation: FeedbackRecommendation,
    pub wrong_removals: usize,
    pub wrong_keeps: usize,
    pub correct: usize,
    pub total: usize,
}

/// Aggregate a product's feedback history into a trust recommendation.
pub fn analyze_product_feedback(
    state: &LearningState,
    product_key: &str,
) -> ProductFeedbackAnalysis {
    let records = state.feedback_for(product_key);
    let wrong_removals = records
        .iter()
        .filter(|f| f.outcome == PruneOutcome::WrongRemoval)
        .count();
    let wrong_keeps = records
        .iter()
        .filter(|f| f.outcome == PruneOutcome::WrongKeep)
        .count();
    let correct = records
        .iter()
        .filter(|f| f.outcome == PruneOutcome::Correct)
        .count();
    let resolved = wrong_removals + wrong_keeps + correct;
    let errors = wrong_removals + wrong_keeps;

    let recommendation = if resolved < 2 {
        FeedbackRecommendation::InsufficientData
    } else if wrong_removals >= 2 {
        FeedbackRecommendation::TrustLess
    } else if errors as f64 / resolved as f64 > 0.5 {
        FeedbackRecommendation::NeedsReview
    } else if correct > 2 * errors {
        FeedbackRecommendation::TrustMore
    } else {
        FeedbackRecommendation::NeedsReview
    };

    ProductFeedbackAnalysis {
        recommendation,
        wrong_removals,
        wrong_keeps,
        correct,
        total: records.len(),
    }
}

/// Recent wrong-removal count for a product, used by the conservative gate
pub(crate) fn recent_wrong_removals(
    state: &LearningState,
    product_key: &str,
    now: DateTime<Utc>,
) -> usize {
    let cutoff = now - Duration::days(RECENT_FEEDBACK_DAYS);
    state
        .feedback_for(product_key)
        .iter()
        .filter(|f| f.outcome == PruneOutcome::WrongRemoval && f.recorded_at >= cutoff)
        .count()
}

/// Diff the proposed (post-prune) cart against the cart the user actually
/// checked out with, synthesizing signals without explicit input.
pub fn detect_implicit_feedback(
    proposed: &[CartItem],
    final_cart: &[CartItem],
    decisions: &[PruneDecision],
    session_id: &str,
    now: DateTime<Utc>,
) -> Vec<FeedbackSignal> {
    let proposed_qty: HashMap<String, u32> = proposed
        .iter()
        .map(|i| (product_key(i.product_id.as_deref(), &i.name), i.quantity))
        .collect();
    let final_qty: HashMap<String, u32> = final_cart
        .iter()
        .map(|i| (product_key(i.product_id.as_deref(), &i.name), i.quantity))
        .collect();

    let mut signals = Vec::new();
    for d in decisions {
        let key = product_key(d.product_id.as_deref(), &d.name);
        let category = d.context.category;
        let mk = |signal, decision| FeedbackSignal {
            signal,
            product_key: key.clone(),
            category,
            decision,
            decision_confidence: d.confidence,
            timestamp: now,
            session_id: session_id.to_string(),
        };

        if d.prune {
            // We removed it and the user put it back
            if final_qty.contains_key(&key) {
                signals.push(mk(FeedbackSignalType::ImplicitReAdd, CartDecision::Removed));
            }
        } else {
            match (proposed_qty.get(&key), final_qty.get(&key)) {
                // We kept it and the user took it out
                (Some(_), None) => {
                    signals.push(mk(FeedbackSignalType::StillHaveStock, CartDecision::Kept))
                }
                (Some(&before), Some(&after)) if before != after => {
                    signals.push(mk(FeedbackSignalType::QuantityAdjusted, CartDecision::Kept))
                }
                _ => {}
            }
        }
    }
    signals
}

/// Flag purchases falling strictly inside the interior of a gap between two
/// consecutive regular order dates as emergency top-ups, evidence that a
/// prior prune was wrong.
pub fn detect_emergency_purchases(
    purchases: &[PurchaseRecord],
    regular_order_dates: &[NaiveDate],
    session_id: &str,
    now: DateTime<Utc>,
) -> Vec<FeedbackSignal> {
    let mut order_dates: Vec<NaiveDate> = regular_order_dates.to_vec();
    order_dates.sort_unstable();
    order_dates.dedup();

    let mut signals = Vec::new();
    for window in order_dates.windows(2) {
        let (start, end) = (window[0], window[1]);
        let lo = start + Duration::days(EMERGENCY_BOUNDARY_MARGIN_DAYS);
        let hi = end - Duration::days(EMERGENCY_BOUNDARY_MARGIN_DAYS);
        if lo >= hi {
            continue;
        }
        for p in purchases {
            if p.date > lo && p.date < hi {
                let category = p
                    .category
                    .unwrap_or_else(|| larder_core::detect_category(&p.name).category);
                signals.push(FeedbackSignal {
                    signal: FeedbackSignalType::EmergencyPurchase,
                    product_key: product_key(p.product_id.as_deref(), &p.name),
                    category,
                    decision: CartDecision::Removed,
                    decision_confidence: 0.0,
                    timestamp: now,
                    session_id: session_id.to_string(),
                });
            }
        }
    }
    signals
}
