//! Value types for cart analysis

use crate::cadence::CadenceSource;
use crate::category::Category;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of order history, externally supplied and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub date: NaiveDate,
    pub quantity: u32,
    pub order_id: String,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
}

/// A product's purchase history, derived per run from the full order history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPurchaseHistory {
    pub purchases: Vec<PurchaseRecord>,
    pub total_quantity: u32,
    pub last_purchase: Option<NaiveDate>,
    pub average_quantity: f64,
}

impl ItemPurchaseHistory {
    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }

    /// Purchase dates in ascending order
    pub fn sorted_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.purchases.iter().map(|p| p.date).collect();
        dates.sort_unstable();
        dates
    }
}

/// One item of the auto-built cart under review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

/// Per-product user override, highest-priority input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserOverride {
    #[serde(default)]
    pub never_prune: bool,
    #[serde(default)]
    pub always_prune: bool,
    #[serde(default)]
    pub custom_cadence_days: Option<u32>,
}

/// Closed set of reasons a decision can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PruneReason {
    /// Later occurrence of a product key already in the cart
    DuplicateInCart,
    UserAlwaysPrune,
    UserNeverPrune,
    NoPurchaseHistory,
    /// Past the expected cadence, restock is due
    OverdueRestock,
    DueSoon,
    AdequateStock,
    /// Purchased recently enough that stock likely remains
    RecentlyPurchased,
}

impl PruneReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PruneReason::DuplicateInCart => "duplicate-in-cart",
            PruneReason::UserAlwaysPrune => "user-always-prune",
            PruneReason::UserNeverPrune => "user-never-prune",
            PruneReason::NoPurchaseHistory => "no-purchase-history",
            PruneReason::OverdueRestock => "overdue-restock",
            PruneReason::DueSoon => "due-soon",
            PruneReason::AdequateStock => "adequate-stock",
            PruneReason::RecentlyPurchased => "recently-purchased",
        }
    }
}

/// Inputs the decision was made from, attached for explainability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    pub days_since_purchase: Option<i64>,
    pub cadence_days: u32,
    pub urgency_ratio: Option<f64>,
    pub category: Category,
    pub cadence_source: CadenceSource,
}

/// One prune/keep call for one cart item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneDecision {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub prune: bool,
    pub confidence: f64,
    pub reason: PruneReason,
    /// Human-readable explanation derived from the context
    pub detail: String,
    pub context: DecisionContext,
    /// Flagged for downstream re-review (uncertain or gated decisions)
    #[serde(default)]
    pub needs_review: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serde_kebab() {
        let json = serde_json::to_string(&PruneReason::DuplicateInCart).unwrap();
        assert_eq!(json, "\"duplicate-in-cart\"");
        let parsed: PruneReason = serde_json::from_str("\"recently-purchased\"").unwrap();
        assert_eq!(parsed, PruneReason::RecentlyPurchased);
    }

    #[test]
    fn test_purchase_record_optional_fields() {
        let json = r#"{"name":"Leite Mimosa UHT 1L","date":"2026-08-01","quantity":2,"order_id":"o-1"}"#;
        let record: PurchaseRecord = serde_json::from_str(json).unwrap();
        assert!(record.product_id.is_none());
        assert!(record.unit_price.is_none());
        assert!(record.category.is_none());
        assert_eq!(record.quantity, 2);
    }

    #[test]
    fn test_sorted_dates() {
        let mk = |d: &str| PurchaseRecord {
            product_id: None,
            name: "x".to_string(),
            date: d.parse().unwrap(),
            quantity: 1,
            order_id: "o".to_string(),
            unit_price: None,
            category: None,
        };
        let hist = ItemPurchaseHistory {
            purchases: vec![mk("2026-03-10"), mk("2026-01-05"), mk("2026-02-01")],
            total_quantity: 3,
            last_purchase: Some("2026-03-10".parse().unwrap()),
            average_quantity: 1.0,
        };
        let dates = hist.sorted_dates();
        assert_eq!(dates[0], "2026-01-05".parse::<NaiveDate>().unwrap());
        assert_eq!(dates[2], "2026-03-10".parse::<NaiveDate>().unwrap());
    }
}
