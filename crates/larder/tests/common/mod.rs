use chrono::{DateTime, NaiveDate, Utc};
use larder_core::{CartItem, PurchaseRecord};

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn now() -> DateTime<Utc> {
    "2026-08-20T12:00:00Z".parse().unwrap()
}

pub fn cart_item(name: &str) -> CartItem {
    CartItem {
        product_id: None,
        name: name.to_string(),
        quantity: 1,
        unit_price: None,
    }
}

pub fn purchase(name: &str, day: &str, order: &str) -> PurchaseRecord {
    PurchaseRecord {
        product_id: None,
        name: name.to_string(),
        date: date(day),
        quantity: 1,
        order_id: order.to_string(),
        unit_price: None,
        category: None,
    }
}

/// Purchases at a fixed interval ending `last` days before the reference date
pub fn weekly_purchases(name: &str, interval_days: i64, count: usize, last: &str) -> Vec<PurchaseRecord> {
    let end = date(last);
    (0..count)
        .map(|i| {
            let offset = interval_days * (count - 1 - i) as i64;
            PurchaseRecord {
                product_id: None,
                name: name.to_string(),
                date: end - chrono::Duration::days(offset),
                quantity: 1,
                order_id: format!("order-{i}"),
                unit_price: None,
                category: None,
            }
        })
        .collect()
}
