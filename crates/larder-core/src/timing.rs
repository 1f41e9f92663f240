//! Restock timing: urgency ratio and status
//!
//! The sole place the urgency ratio is computed; every downstream decision
//! keys off the ratio or status produced here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How urgently a product needs restocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestockStatus {
    /// No last-purchase date on record
    Unknown,
    /// ratio >= 1.2
    Overdue,
    /// ratio >= 0.9
    DueSoon,
    /// ratio >= 0.5
    Adequate,
    /// ratio < 0.5
    RecentlyPurchased,
}

impl RestockStatus {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 1.2 {
            RestockStatus::Overdue
        } else if ratio >= 0.9 {
            RestockStatus::DueSoon
        } else if ratio >= 0.5 {
            RestockStatus::Adequate
        } else {
            RestockStatus::RecentlyPurchased
        }
    }
}

/// Timing estimate for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockTiming {
    pub days_since_purchase: Option<i64>,
    pub days_until_restock: Option<i64>,
    pub urgency_ratio: Option<f64>,
    pub status: RestockStatus,
}

/// Compute timing from the last purchase date and expected cadence.
pub fn estimate_timing(
    last_purchase: Option<NaiveDate>,
    cadence_days: u32,
    reference: NaiveDate,
) -> RestockTiming {
    let Some(last) = last_purchase else {
        return RestockTiming {
            days_since_purchase: None,
            days_until_restock: None,
            urgency_ratio: None,
            status: RestockStatus::Unknown,
        };
    };

    let days_since = (reference - last).num_days().max(0);
    let cadence = cadence_days.max(1) as i64;
    let ratio = days_since as f64 / cadence as f64;

    RestockTiming {
        days_since_purchase: Some(days_since),
        days_until_restock: Some(cadence - days_since),
        urgency_ratio: Some(ratio),
        status: RestockStatus::from_ratio(ratio),
    }
}
