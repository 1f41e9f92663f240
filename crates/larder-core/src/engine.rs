//! Heuristic prune/keep decision engine
//!
//! Runs a duplicate-detection pre-pass over the whole cart, then a
//! first-match-wins ladder per item: user overrides, missing history,
//! urgency-ratio bands, and a conservative-mode confidence floor.

use crate::cadence::{estimate_cadence, CadenceEstimate, CadenceSource};
use crate::category::detect_category;
use crate::config::EngineConfig;
use crate::history::{build_histories, product_key};
use crate::timing::estimate_timing;
use crate::types::{
    CartItem, DecisionContext, ItemPurchaseHistory, PruneDecision, PruneReason, PurchaseRecord,
    UserOverride,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const DUPLICATE_CONFIDENCE: f64 = 0.95;
const MAX_PRUNE_CONFIDENCE: f64 = 0.95;
const HIGH_CONFIDENCE: f64 = 0.8;
const LOW_CONFIDENCE: f64 = 0.5;

/// Aggregate statistics over one run's decisions
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisSummary {
    pub items: usize,
    pub pruned: usize,
    pub kept: usize,
    pub average_confidence: f64,
    pub high_confidence: usize,
    pub low_confidence: usize,
    pub by_reason: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// Output of one cart-analysis run: one decision per input item, in input
/// order, plus summary statistics
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CartAnalysis {
    pub decisions: Vec<PruneDecision>,
    pub summary: AnalysisSummary,
}

/// Analyze a full cart against the purchase history.
///
/// Pure and synchronous: identical inputs (including the reference date)
/// produce identical decisions.
pub fn analyze_cart(
    cart: &[CartItem],
    purchases: &[PurchaseRecord],
    overrides: &HashMap<String, UserOverride>,
    config: &EngineConfig,
    reference: NaiveDate,
) -> CartAnalysis {
    let histories = build_histories(purchases, config, reference);

    // Duplicate pre-pass: first occurrence of each product key is the
    // original, every later occurrence is flagged.
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    for (idx, item) in cart.iter().enumerate() {
        first_seen
            .entry(product_key(item.product_id.as_deref(), &item.name))
            .or_insert(idx);
    }

    let decisions: Vec<PruneDecision> = cart
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let key = product_key(item.product_id.as_deref(), &item.name);
            if first_seen.get(&key) != Some(&idx) {
                duplicate_decision(item, first_seen[&key])
            } else {
                decide_item(item, histories.get(&key), overrides.get(&key), config, reference)
            }
        })
        .collect();

    let summary = summarize(&decisions);
    debug!(
        items = summary.items,
        pruned = summary.pruned,
        avg_confidence = summary.average_confidence,
        "cart analyzed"
    );

    CartAnalysis { decisions, summary }
}

/// Decide one item through the heuristic ladder.
pub fn decide_item(
    item: &CartItem,
    history: Option<&ItemPurchaseHistory>,
    user_override: Option<&UserOverride>,
    config: &EngineConfig,
    reference: NaiveDate,
) -> PruneDecision {
    let category = detect_category(&item.name);
    let mut cadence = estimate_cadence(history, category.category);

    if let Some(days) = user_override.and_then(|o| o.custom_cadence_days) {
        cadence = CadenceEstimate {
            days: days.max(1),
            source: CadenceSource::UserOverride,
            confidence: 0.9,
            data_points: cadence.data_points,
            reason: format!("user-set cadence of {} days", days),
        };
    }

    let timing = estimate_timing(
        history.and_then(|h| h.last_purchase),
        cadence.days,
        reference,
    );

    let context = DecisionContext {
        days_since_purchase: timing.days_since_purchase,
        cadence_days: cadence.days,
        urgency_ratio: timing.urgency_ratio,
        category: category.category,
        cadence_source: cadence.source,
    };

    let decision = |prune: bool, confidence: f64, reason: PruneReason, detail: String| {
        let needs_review = config.include_uncertain_items
            && !prune
            && confidence < config.min_prune_confidence;
        PruneDecision {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            prune,
            confidence,
            reason,
            detail,
            context: context.clone(),
            needs_review,
        }
    };

    // (a)/(b) user overrides short-circuit everything else
    if let Some(ovr) = user_override {
        if ovr.always_prune {
            return decision(true, 1.0, PruneReason::UserAlwaysPrune, "user marked as always prune".to_string());
        }
        if ovr.never_prune {
            return decision(false, 1.0, PruneReason::UserNeverPrune, "user marked as never prune".to_string());
        }
    }

    // (c) nothing to reason from
    let Some(ratio) = timing.urgency_ratio else {
        return decision(
            false,
            0.4,
            PruneReason::NoPurchaseHistory,
            "no purchase on record; keeping to be safe".to_string(),
        );
    };
    let days_since = timing.days_since_purchase.unwrap_or(0);

    // (d) at or past the expected cadence
    if ratio >= 1.0 {
        return decision(
            false,
            0.9,
            PruneReason::OverdueRestock,
            format!(
                "purchased {} days ago, past the expected {} days",
                days_since, cadence.days
            ),
        );
    }

    // (e) close enough to the cadence that restock is probably wanted
    if ratio >= config.uncertain_threshold {
        let span = (1.0 - config.uncertain_threshold).max(f64::EPSILON);
        let confidence = (0.6 + 0.3 * (ratio - config.uncertain_threshold) / span).min(0.9);
        return decision(
            false,
            confidence,
            PruneReason::DueSoon,
            format!(
                "purchased {} days ago, approaching the expected {} days",
                days_since, cadence.days
            ),
        );
    }

    // (f) well inside the cadence: prune candidate
    if ratio < config.prune_threshold {
        let margin = (config.prune_threshold - ratio) / config.prune_threshold;
        let confidence = ((0.62 + 0.33 * margin) * (0.85 + 0.15 * cadence.confidence))
            .min(MAX_PRUNE_CONFIDENCE);
        let detail = format!(
            "purchased {} days ago, expected every {} days (urgency {:.2})",
            days_since, cadence.days, ratio
        );

        if config.conservative_mode && confidence < config.min_prune_confidence {
            // Downgraded prune keeps the same reason as the fallback keep
            // branch: both are "keep, low confidence".
            return decision(
                false,
                0.6,
                PruneReason::AdequateStock,
                format!("{detail}; confidence too low to prune"),
            );
        }
        return decision(true, confidence, PruneReason::RecentlyPurchased, detail);
    }

    // (g) between the thresholds: keep, moderate confidence
    decision(
        false,
        0.6,
        PruneReason::AdequateStock,
        format!(
            "purchased {} days ago, within the expected {} days",
            days_since, cadence.days
        ),
    )
}

fn duplicate_decision(item: &CartItem, original_index: usize) -> PruneDecision {
    let category = detect_category(&item.name);
    PruneDecision {
        product_id: item.product_id.clone(),
        name: item.name.clone(),
        prune: true,
        confidence: DUPLICATE_CONFIDENCE,
        reason: PruneReason::DuplicateInCart,
        detail: format!("duplicate of cart item #{}", original_index + 1),
        context: DecisionContext {
            days_since_purchase: None,
            cadence_days: category.category.default_cadence_days(),
            urgency_ratio: None,
            category: category.category,
            cadence_source: CadenceSource::NoHistory,
        },
        needs_review: false,
    }
}

fn summarize(decisions: &[PruneDecision]) -> AnalysisSummary {
    let items = decisions.len();
    let pruned = decisions.iter().filter(|d| d.prune).count();
    let average_confidence = if items == 0 {
        0.0
    } else {
        decisions.iter().map(|d| d.confidence).sum::<f64>() / items as f64
    };

    let mut by_reason = BTreeMap::new();
    let mut by_category = BTreeMap::new();
    for d in decisions {
        *by_reason.entry(d.reason.as_str().to_string()).or_insert(0) += 1;
        *by_category
            .entry(d.context.category.as_str().to_string())
            .or_insert(0) += 1;
    }

    AnalysisSummary {
        items,
        pruned,
        kept: items - pruned,
        average_confidence,
        high_confidence: decisions.iter().filter(|d| d.confidence >= HIGH_CONFIDENCE).count(),
        low_confidence: decisions.iter().filter(|d| d.confidence < LOW_CONFIDENCE).count(),
        by_reason,
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn item(name: &str) -> CartItem {
        CartItem {
            product_id: None,
            name: name.to_string(),
            quantity: 1,
            unit_price: None,
        }
    }

    fn purchase(name: &str, d: &str) -> PurchaseRecord {
        PurchaseRecord {
            product_id: None,
            name: name.to_string(),
            date: date(d),
            quantity: 1,
            order_id: format!("o-{d}"),
            unit_price: None,
            category: None,
        }
    }

    #[test]
    fn test_detergent_scenario_prunes() {
        // Laundry default cadence 45d, purchased 15 days ago: ratio ~0.33
        let cart = vec![item("Detergente Skip 30 Doses")];
        let purchases = vec![purchase("Detergente Skip 30 Doses", "2026-08-05")];
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &HashMap::new(),
            &EngineConfig::default(),
            date("2026-08-20"),
        );

        let d = &analysis.decisions[0];
        assert!(d.prune, "expected prune: {:?}", d);
        assert_eq!(d.reason, PruneReason::RecentlyPurchased);
        assert!(d.detail.contains("15 days"), "detail: {}", d.detail);
        assert!(d.detail.contains("45 days"), "detail: {}", d.detail);
        assert!(d.confidence >= 0.7);
    }

    #[test]
    fn test_never_prune_override_wins() {
        let cart = vec![item("Detergente Skip 30 Doses")];
        let purchases = vec![purchase("Detergente Skip 30 Doses", "2026-08-05")];
        let mut overrides = HashMap::new();
        overrides.insert(
            product_key(None, "Detergente Skip 30 Doses"),
            UserOverride {
                never_prune: true,
                ..UserOverride::default()
            },
        );
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &overrides,
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        let d = &analysis.decisions[0];
        assert!(!d.prune);
        assert_eq!(d.confidence, 1.0);
        assert_eq!(d.reason, PruneReason::UserNeverPrune);
    }

    #[test]
    fn test_always_prune_override() {
        let d = decide_item(
            &item("Leite Mimosa UHT 1L"),
            None,
            Some(&UserOverride {
                always_prune: true,
                ..UserOverride::default()
            }),
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        assert!(d.prune);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_no_history_keeps() {
        let d = decide_item(
            &item("Leite Mimosa UHT 1L"),
            None,
            None,
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        assert!(!d.prune);
        assert_eq!(d.confidence, 0.4);
        assert_eq!(d.reason, PruneReason::NoPurchaseHistory);
        assert!(d.needs_review);
    }

    #[test]
    fn test_overdue_keeps_high_confidence() {
        let cart = vec![item("Leite Mimosa UHT 1L")];
        // Dairy default 7d, purchased 10 days ago: ratio ~1.43
        let purchases = vec![purchase("Leite Mimosa UHT 1L", "2026-08-10")];
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &HashMap::new(),
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        let d = &analysis.decisions[0];
        assert!(!d.prune);
        assert_eq!(d.confidence, 0.9);
        assert_eq!(d.reason, PruneReason::OverdueRestock);
    }

    #[test]
    fn test_duplicate_detection() {
        let cart = vec![
            item("Leite Mimosa UHT 1L"),
            item("Arroz Agulha"),
            item("leite  MIMOSA uht 1l"),
        ];
        let analysis = analyze_cart(
            &cart,
            &[],
            &HashMap::new(),
            &EngineConfig::default(),
            date("2026-08-20"),
        );

        assert_eq!(analysis.decisions[0].reason, PruneReason::NoPurchaseHistory);
        assert_eq!(analysis.decisions[2].reason, PruneReason::DuplicateInCart);
        assert!(analysis.decisions[2].prune);
        assert_eq!(analysis.decisions[2].confidence, 0.95);
        let dup_count = analysis
            .decisions
            .iter()
            .filter(|d| d.reason == PruneReason::DuplicateInCart)
            .count();
        assert_eq!(dup_count, 1);
    }

    #[test]
    fn test_conservative_monotonicity() {
        // Flipping conservative_mode on can only turn prunes into keeps
        let cart: Vec<CartItem> = vec![
            item("Detergente Skip 30 Doses"),
            item("Leite Mimosa UHT 1L"),
            item("Arroz Agulha 1kg"),
        ];
        let purchases = vec![
            purchase("Detergente Skip 30 Doses", "2026-08-05"),
            purchase("Leite Mimosa UHT 1L", "2026-08-18"),
            purchase("Arroz Agulha 1kg", "2026-08-01"),
        ];
        let relaxed = EngineConfig {
            conservative_mode: false,
            ..EngineConfig::default()
        };
        let strict = EngineConfig::default();
        let reference = date("2026-08-20");

        let loose = analyze_cart(&cart, &purchases, &HashMap::new(), &relaxed, reference);
        let tight = analyze_cart(&cart, &purchases, &HashMap::new(), &strict, reference);

        for (l, t) in loose.decisions.iter().zip(tight.decisions.iter()) {
            if !l.prune {
                assert!(!t.prune, "conservative mode flipped keep->prune for {}", l.name);
            }
        }
    }

    #[test]
    fn test_conservative_downgrade_uses_fallback_reason() {
        // Dairy, 2 purchases: category-default cadence at low confidence.
        // Ratio sits just inside the prune band so the computed confidence
        // misses the 0.7 floor and conservative mode downgrades to keep.
        let cart = vec![item("Leite Mimosa UHT 1L")];
        let purchases = vec![
            purchase("Leite Mimosa UHT 1L", "2026-08-10"),
            purchase("Leite Mimosa UHT 1L", "2026-08-16"),
        ];
        // 4 days since, cadence 7 => ratio ~0.57 < 0.7
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &HashMap::new(),
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        let d = &analysis.decisions[0];
        assert!(!d.prune);
        // Same reason as the fallback keep branch, not a special-cased one
        assert_eq!(d.reason, PruneReason::AdequateStock);
        assert!(d.needs_review);
    }

    #[test]
    fn test_idempotence() {
        let cart = vec![item("Detergente Skip 30 Doses"), item("Leite Mimosa UHT 1L")];
        let purchases = vec![
            purchase("Detergente Skip 30 Doses", "2026-08-05"),
            purchase("Leite Mimosa UHT 1L", "2026-08-12"),
        ];
        let config = EngineConfig::default();
        let reference = date("2026-08-20");

        let a = analyze_cart(&cart, &purchases, &HashMap::new(), &config, reference);
        let b = analyze_cart(&cart, &purchases, &HashMap::new(), &config, reference);

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_custom_cadence_override() {
        let cart = vec![item("Leite Mimosa UHT 1L")];
        let purchases = vec![purchase("Leite Mimosa UHT 1L", "2026-08-10")];
        let mut overrides = HashMap::new();
        overrides.insert(
            product_key(None, "Leite Mimosa UHT 1L"),
            UserOverride {
                custom_cadence_days: Some(60),
                ..UserOverride::default()
            },
        );
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &overrides,
            &EngineConfig::default(),
            date("2026-08-20"),
        );
        let d = &analysis.decisions[0];
        assert_eq!(d.context.cadence_days, 60);
        assert_eq!(d.context.cadence_source, CadenceSource::UserOverride);
        // 10 days into a 60-day cadence: prune candidate
        assert!(d.prune);
    }

    #[test]
    fn test_summary_counts() {
        let cart = vec![
            item("Detergente Skip 30 Doses"),
            item("Leite Mimosa UHT 1L"),
            item("Produto Misterioso"),
        ];
        let purchases = vec![
            purchase("Detergente Skip 30 Doses", "2026-08-05"),
            purchase("Leite Mimosa UHT 1L", "2026-08-10"),
        ];
        let analysis = analyze_cart(
            &cart,
            &purchases,
            &HashMap::new(),
            &EngineConfig::default(),
            date("2026-08-20"),
        );

        let s = &analysis.summary;
        assert_eq!(s.items, 3);
        assert_eq!(s.pruned + s.kept, 3);
        assert!(s.average_confidence > 0.0 && s.average_confidence <= 1.0);
        assert_eq!(s.by_reason.values().sum::<usize>(), 3);
        assert_eq!(s.by_category.values().sum::<usize>(), 3);
        assert_eq!(s.by_category.get("unknown"), Some(&1));
    }

    #[test]
    fn test_include_uncertain_items_off_suppresses_flags() {
        let config = EngineConfig {
            include_uncertain_items: false,
            ..EngineConfig::default()
        };
        let d = decide_item(&item("Produto Misterioso"), None, None, &config, date("2026-08-20"));
        assert!(!d.prune);
        assert!(!d.needs_review);
    }
}
