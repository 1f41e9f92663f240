//! Adaptive cadence calculator: blends learned cadence, household and
//! seasonal factors, and feedback-derived confidence, with a conservative
//! prune gate on top

use crate::feedback::{analyze_product_feedback, recent_wrong_removals, FeedbackRecommendation};
use crate::state::{ConsumptionProfile, LearningState};
use crate::tracker::{learned_cadence, record_prediction, TrackerConfig};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use larder_core::{
    analyze_cart, product_key, CadenceSource, CartAnalysis, CartItem, Category, EngineConfig,
    PruneDecision, PruneReason, PurchaseRecord, UserOverride, MAX_CADENCE_DAYS, MIN_CADENCE_DAYS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Tunables for the adaptive layer
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    pub tracker: TrackerConfig,
    /// Floor an adaptive confidence must clear for a prune to stand
    pub min_learned_confidence: f64,
    /// Resolved predictions required before a prune is allowed through
    pub required_consistent_signals: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            min_learned_confidence: 0.6,
            required_consistent_signals: 3,
        }
    }
}

/// Final cadence and confidence for one product in one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveCadence {
    pub cadence_days: u32,
    pub confidence: f64,
    pub source: CadenceSource,
    pub consumption_factor: f64,
    pub seasonal_factor: f64,
    pub reason: String,
}

// Monthly consumption factors for categories with a real seasonal swing;
// everything else sits at 1.0 year-round.
const SEASONAL_BEVERAGES: [f64; 12] = [0.9, 0.9, 1.0, 1.0, 1.1, 1.2, 1.3, 1.3, 1.1, 1.0, 0.9, 0.9];
const SEASONAL_FROZEN: [f64; 12] = [0.9, 0.9, 1.0, 1.05, 1.1, 1.2, 1.3, 1.3, 1.1, 1.0, 0.9, 0.95];
const SEASONAL_PANTRY: [f64; 12] = [1.15, 1.1, 1.05, 1.0, 0.95, 0.9, 0.85, 0.85, 0.95, 1.05, 1.1, 1.15];

fn builtin_seasonal_factor(category: Category, month0: usize) -> f64 {
    match category {
        Category::Beverages => SEASONAL_BEVERAGES[month0],
        Category::Frozen => SEASONAL_FROZEN[month0],
        Category::Pantry => SEASONAL_PANTRY[month0],
        _ => 1.0,
    }
}

/// Seasonal factor for a category at a reference date: household override
/// first, else the built-in table, else 1.0; active special events multiply
/// on top.
fn seasonal_factor(profile: &ConsumptionProfile, category: Category, reference: NaiveDate) -> f64 {
    let month0 = reference.month0() as usize;
    let mut factor = profile
        .seasonal_overrides
        .get(category.as_str())
        .and_then(|months| months.get(month0).copied())
        .unwrap_or_else(|| builtin_seasonal_factor(category, month0));

    for event in &profile.special_events {
        if reference >= event.start && reference <= event.end {
            factor *= event.factor;
        }
    }
    factor
}

/// Compute the adaptive cadence and calibrated confidence for one product.
pub fn calculate_adaptive_cadence(
    state: &LearningState,
    key: &str,
    category: Category,
    reference: NaiveDate,
    config: &AdaptiveConfig,
    now: DateTime<Utc>,
) -> AdaptiveCadence {
    let default_days = category.default_cadence_days();
    let (base_days, mut confidence, base_reason) = match state.accuracy_for(key) {
        Some(acc) => {
            let learned = learned_cadence(acc, &config.tracker, now);
            (learned.days, learned.confidence, learned.reason)
        }
        None => (
            default_days,
            0.3,
            format!("no learning data; {} default of {} days", category.as_str(), default_days),
        ),
    };

    let profile = &state.consumption_profile;
    let consumption = (profile.category_rate(category) * profile.overall_multiplier).max(0.1);
    let seasonal = seasonal_factor(profile, category, reference).max(0.1);

    let cadence_days = ((base_days as f64 / (consumption * seasonal)).round() as i64)
        .clamp(MIN_CADENCE_DAYS as i64, MAX_CADENCE_DAYS as i64) as u32;

    // Bounded confidence adjustments, each independent of the others
    if let Some(acc) = state.accuracy_for(key) {
        if acc.resolved_predictions() >= config.tracker.min_resolved {
            if let Some(rate) = acc.accuracy_rate() {
                if rate >= 0.75 {
                    confidence += 0.15;
                } else if rate < 0.45 {
                    confidence -= 0.2;
                }
            }
            // Systematic bias: consistently long or short by more than 3 days
            if acc.average_error_days().is_some_and(|e| e.abs() > 3.0) {
                confidence -= 0.1;
            }
        }

        confidence += match acc.last_resolved_at() {
            Some(at) => {
                let age = (now - at).num_days();
                if age <= 30 {
                    0.0
                } else if age <= 90 {
                    -0.05
                } else if age <= 180 {
                    -0.1
                } else {
                    -0.15
                }
            }
            None => 0.0,
        };
    }

    confidence += match analyze_product_feedback(state, key).recommendation {
        FeedbackRecommendation::TrustMore => 0.1,
        FeedbackRecommendation::TrustLess => -0.25,
        FeedbackRecommendation::NeedsReview => -0.15,
        FeedbackRecommendation::InsufficientData => 0.0,
    };

    if (seasonal - 1.0).abs() > 0.2 {
        confidence -= 0.1;
    }

    let confidence = confidence.clamp(0.1, 0.95);

    AdaptiveCadence {
        cadence_days,
        confidence,
        source: CadenceSource::Adaptive,
        consumption_factor: consumption,
        seasonal_factor: seasonal,
        reason: format!(
            "{base_reason}; household factor {consumption:.2}, seasonal factor {seasonal:.2}"
        ),
    }
}

/// Safety gate: downgrade a heuristic prune to keep-and-flag when the
/// learning data does not support it.
pub fn make_conservative_prune_decision(
    decision: &PruneDecision,
    adaptive: &AdaptiveCadence,
    state: &LearningState,
    key: &str,
    config: &AdaptiveConfig,
    now: DateTime<Utc>,
) -> PruneDecision {
    if !decision.prune {
        return decision.clone();
    }

    let resolved = state
        .accuracy_for(key)
        .map(|a| a.resolved_predictions())
        .unwrap_or(0);
    let wrong_removals = recent_wrong_removals(state, key, now);

    let downgrade_reason = if adaptive.confidence < config.min_learned_confidence {
        Some(format!(
            "learned confidence {:.2} below floor {:.2}",
            adaptive.confidence, config.min_learned_confidence
        ))
    } else if resolved < config.required_consistent_signals {
        Some(format!(
            "only {} resolved prediction(s), need {}",
            resolved, config.required_consistent_signals
        ))
    } else if wrong_removals > 0 {
        let required = 0.7 + 0.1 * wrong_removals as f64;
        if adaptive.confidence < required {
            Some(format!(
                "{} recent wrong removal(s) require confidence {:.2}, have {:.2}",
                wrong_removals, required, adaptive.confidence
            ))
        } else {
            None
        }
    } else {
        None
    };

    match downgrade_reason {
        Some(why) => {
            debug!(product = %key, %why, "prune downgraded to keep");
            PruneDecision {
                prune: false,
                confidence: adaptive.confidence.min(0.6),
                reason: PruneReason::AdequateStock,
                detail: format!("{}; kept for review: {}", decision.detail, why),
                needs_review: true,
                ..decision.clone()
            }
        }
        None => PruneDecision {
            confidence: adaptive.confidence,
            ..decision.clone()
        },
    }
}

/// Full adaptive analysis: heuristic pass, learned-cadence overlay and
/// conservative gating per item, and one recorded cadence prediction per
/// analyzed product. Returns the decisions and the next learning state.
#[allow(clippy::too_many_arguments)]
pub fn analyze_cart_adaptive(
    cart: &[CartItem],
    purchases: &[PurchaseRecord],
    overrides: &HashMap<String, UserOverride>,
    state: &LearningState,
    engine_config: &EngineConfig,
    adaptive_config: &AdaptiveConfig,
    reference: NaiveDate,
    session_id: &str,
    now: DateTime<Utc>,
) -> (CartAnalysis, LearningState) {
    let mut analysis = analyze_cart(cart, purchases, overrides, engine_config, reference);
    let mut next = state.clone();

    let mut seen: HashSet<String> = HashSet::new();
    for decision in &mut analysis.decisions {
        let key = product_key(decision.product_id.as_deref(), &decision.name);

        // Overrides and duplicates are not learning targets
        let fixed = matches!(
            decision.reason,
            PruneReason::DuplicateInCart | PruneReason::UserAlwaysPrune | PruneReason::UserNeverPrune
        );
        if fixed {
            continue;
        }

        if engine_config.use_learned_cadences && next.accuracy_for(&key).is_some() {
            let adaptive = calculate_adaptive_cadence(
                &next,
                &key,
                decision.context.category,
                reference,
                adaptive_config,
                now,
            );
            let mut gated = make_conservative_prune_decision(
                decision,
                &adaptive,
                &next,
                &key,
                adaptive_config,
                now,
            );
            gated.context.cadence_days = adaptive.cadence_days;
            gated.context.cadence_source = adaptive.source;
            *decision = gated;
        }

        // One prediction per product per run
        if seen.insert(key.clone()) {
            next = record_prediction(
                &next,
                &key,
                decision.context.cadence_days,
                decision.context.category.default_cadence_days(),
                session_id,
                now,
            );
        }
    }

    analysis.summary = resummarize(&analysis);
    next.run_stats.total_runs += 1;
    next.run_stats.total_items += analysis.summary.items;
    next.run_stats.total_pruned += analysis.summary.pruned;
    next.run_stats.last_session_id = Some(session_id.to_string());
    next.last_updated = now;

    (analysis, next)
}

// The overlay can change prune flags and confidences; rebuild the summary
// from the final decisions.
fn resummarize(analysis: &CartAnalysis) -> larder_core::AnalysisSummary {
    let decisions = &analysis.decisions;
    let items = decisions.len();
    let pruned = decisions.iter().filter(|d| d.prune).count();

    let mut by_reason = BTreeMap::new();
    let mut by_category = BTreeMap::new();
    for d in decisions {
        *by_reason.entry(d.reason.as_str().to_string()).or_insert(0) += 1;
        *by_category
            .entry(d.context.category.as_str().to_string())
            .or_insert(0) += 1;
    }

    larder_core::AnalysisSummary {
        items,
        pruned,
        kept: items - pruned,
        average_confidence: if items == 0 {
            0.0
        } else {
            decisions.iter().map(|d| d.confidence).sum::<f64>() / items as f64
        },
        high_confidence: decisions.iter().filter(|d| d.confidence >= 0.8).count(),
        low_confidence: decisions.iter().filter(|d| d.confidence < 0.5).count(),
        by_reason,
        by_category,
    }
}
