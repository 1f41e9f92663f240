//! Purchase-interval cadence estimation

use crate::category::Category;
use crate::types::ItemPurchaseHistory;
use serde::{Deserialize, Serialize};

/// Where a cadence figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CadenceSource {
    /// No purchases on record; category default used
    NoHistory,
    /// Too few purchases; category default used
    CategoryDefault,
    /// Median of observed purchase gaps
    Learned,
    /// Learned cadence adjusted by household and seasonal factors
    Adaptive,
    /// Cadence fixed explicitly by the user
    UserOverride,
}

impl CadenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CadenceSource::NoHistory => "no-history",
            CadenceSource::CategoryDefault => "category-default",
            CadenceSource::Learned => "learned",
            CadenceSource::Adaptive => "adaptive",
            CadenceSource::UserOverride => "user-override",
        }
    }
}

/// Cadence estimate for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceEstimate {
    pub days: u32,
    pub source: CadenceSource,
    pub confidence: f64,
    pub data_points: usize,
    pub reason: String,
}

/// Minimum purchase count before gaps are trusted over the category default
const MIN_PURCHASES_FOR_ESTIMATE: usize = 3;
pub const MIN_CADENCE_DAYS: u32 = 1;
pub const MAX_CADENCE_DAYS: u32 = 180;

/// Estimate the expected restock interval from purchase history, falling
/// back to the category default when history is missing or too sparse.
pub fn estimate_cadence(history: Option<&ItemPurchaseHistory>, category: Category) -> CadenceEstimate {
    let default_days = category.default_cadence_days();

    let history = match history {
        Some(h) if h.purchase_count() > 0 => h,
        _ => {
            return CadenceEstimate {
                days: default_days,
                source: CadenceSource::NoHistory,
                confidence: 0.3,
                data_points: 0,
                reason: format!(
                    "no purchase history; using {} default of {} days",
                    category.as_str(),
                    default_days
                ),
            }
        }
    };

    let count = history.purchase_count();
    if count < MIN_PURCHASES_FOR_ESTIMATE {
        return CadenceEstimate {
            days: default_days,
            source: CadenceSource::CategoryDefault,
            confidence: (0.3 + 0.05 * count as f64).min(0.45),
            data_points: count,
            reason: format!(
                "only {} purchase(s); using {} default of {} days",
                count,
                category.as_str(),
                default_days
            ),
        };
    }

    let dates = history.sorted_dates();
    // Same-day reorders carry no interval information
    let gaps: Vec<f64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .filter(|&g| g > 0.0)
        .collect();

    if gaps.len() < MIN_PURCHASES_FOR_ESTIMATE - 1 {
        return CadenceEstimate {
            days: default_days,
            source: CadenceSource::CategoryDefault,
            confidence: 0.35,
            data_points: count,
            reason: format!(
                "purchases cluster on too few distinct days; using {} default of {} days",
                category.as_str(),
                default_days
            ),
        };
    }

    let days = median(&gaps)
        .round()
        .clamp(MIN_CADENCE_DAYS as f64, MAX_CADENCE_DAYS as f64) as u32;
    let confidence = gap_confidence(&gaps);

    CadenceEstimate {
        days,
        source: CadenceSource::Learned,
        confidence,
        data_points: count,
        reason: format!(
            "median of {} purchase gaps is {} days (confidence {:.2})",
            gaps.len(),
            days,
            confidence
        ),
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Map gap regularity (coefficient of variation) into ~[0.5, 0.95], with a
/// small bonus for data volume.
fn gap_confidence(gaps: &[f64]) -> f64 {
    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.5;
    }
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;

    let base = (0.95 - 0.45 * cv.min(1.0)).max(0.5);
    let volume_bonus = (0.01 * (n - 2.0)).clamp(0.0, 0.05);
    (base + volume_bonus).min(0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PurchaseRecord;

    fn history(dates: &[&str]) -> ItemPurchaseHistory {
        let purchases: Vec<PurchaseRecord> = dates
            .iter()
            .map(|d| PurchaseRecord {
                product_id: None,
                name: "item".to_string(),
                date: d.parse().unwrap(),
                quantity: 1,
                order_id: format!("o-{d}"),
                unit_price: None,
                category: None,
            })
            .collect();
        let last = purchases.iter().map(|p| p.date).max();
        ItemPurchaseHistory {
            total_quantity: purchases.len() as u32,
            average_quantity: 1.0,
            last_purchase: last,
            purchases,
        }
    }

    #[test]
    fn test_no_history_uses_category_default() {
        let est = estimate_cadence(None, Category::Laundry);
        assert_eq!(est.days, 45);
        assert_eq!(est.source, CadenceSource::NoHistory);
        assert_eq!(est.confidence, 0.3);
        assert_eq!(est.data_points, 0);
    }

    #[test]
    fn test_sparse_history_scales_confidence() {
        let est = estimate_cadence(Some(&history(&["2026-08-01", "2026-08-08"])), Category::Dairy);
        assert_eq!(est.source, CadenceSource::CategoryDefault);
        assert_eq!(est.days, 7);
        assert!(est.confidence > 0.3 && est.confidence < 0.5);
    }

    #[test]
    fn test_regular_weekly_cadence() {
        let est = estimate_cadence(
            Some(&history(&["2026-07-01", "2026-07-08", "2026-07-15", "2026-07-22"])),
            Category::Dairy,
        );
        assert_eq!(est.days, 7);
        assert_eq!(est.source, CadenceSource::Learned);
        // Perfectly regular gaps: confidence near the top of the band
        assert!(est.confidence > 0.9, "confidence: {}", est.confidence);
    }

    #[test]
    fn test_median_is_outlier_robust() {
        // Gaps: 7, 7, 7, 60; the vacation gap must not drag the estimate
        let est = estimate_cadence(
            Some(&history(&[
                "2026-05-01",
                "2026-05-08",
                "2026-05-15",
                "2026-05-22",
                "2026-07-21",
            ])),
            Category::Dairy,
        );
        assert_eq!(est.days, 7);
        // Irregular gaps lower confidence
        assert!(est.confidence < 0.9);
    }

    #[test]
    fn test_cadence_clamped_to_bounds() {
        let est = estimate_cadence(
            Some(&history(&["2024-01-01", "2024-12-01", "2025-11-01", "2026-08-01"])),
            Category::Pantry,
        );
        assert_eq!(est.days, MAX_CADENCE_DAYS);
        assert!(est.days >= MIN_CADENCE_DAYS && est.days <= MAX_CADENCE_DAYS);
    }

    #[test]
    fn test_same_day_orders_fall_back() {
        let est = estimate_cadence(
            Some(&history(&["2026-08-01", "2026-08-01", "2026-08-01"])),
            Category::Pantry,
        );
        assert_eq!(est.source, CadenceSource::CategoryDefault);
        assert_eq!(est.days, 30);
    }
}
