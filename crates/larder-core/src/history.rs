//! Product identity and purchase-history grouping

use crate::config::EngineConfig;
use crate::types::{ItemPurchaseHistory, PurchaseRecord};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Normalize a product name: lowercase, strip diacritics, collapse whitespace
pub fn normalize_name(name: &str) -> String {
    let lowered: String = name.to_lowercase().chars().map(fold_diacritic).collect();
    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(lowered.trim(), " ").to_string()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// Canonical product identity: id when present, else normalized name.
///
/// Every identity lookup (history matching, overrides, learning-state
/// indexing, duplicate detection) must go through this one function so a
/// product's records never fragment across keys.
pub fn product_key(product_id: Option<&str>, name: &str) -> String {
    match product_id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => normalize_name(name),
    }
}

/// Group the full purchase history by product key, keeping only purchases
/// within `history_days_back` of the reference date.
pub fn build_histories(
    purchases: &[PurchaseRecord],
    config: &EngineConfig,
    reference: NaiveDate,
) -> HashMap<String, ItemPurchaseHistory> {
    let cutoff = reference - Duration::days(config.history_days_back);
    let mut grouped: HashMap<String, Vec<PurchaseRecord>> = HashMap::new();

    for record in purchases {
        if record.date < cutoff || record.date > reference {
            continue;
        }
        let key = product_key(record.product_id.as_deref(), &record.name);
        grouped.entry(key).or_default().push(record.clone());
    }

    grouped
        .into_iter()
        .map(|(key, mut records)| {
            records.sort_by_key(|r| r.date);
            let total_quantity: u32 = records.iter().map(|r| r.quantity).sum();
            let last_purchase = records.last().map(|r| r.date);
            let average_quantity = if records.is_empty() {
                0.0
            } else {
                total_quantity as f64 / records.len() as f64
            };
            (
                key,
                ItemPurchaseHistory {
                    purchases: records,
                    total_quantity,
                    last_purchase,
                    average_quantity,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, date: &str, qty: u32) -> PurchaseRecord {
        PurchaseRecord {
            product_id: None,
            name: name.to_string(),
            date: date.parse().unwrap(),
            quantity: qty,
            order_id: format!("o-{date}"),
            unit_price: None,
            category: None,
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Leite   Mimosa  UHT "), "leite mimosa uht");
        assert_eq!(normalize_name("Ração Gato"), "racao gato");
        assert_eq!(normalize_name("Pão de Ló"), "pao de lo");
    }

    #[test]
    fn test_product_key_prefers_id() {
        assert_eq!(product_key(Some("p-42"), "Leite Mimosa"), "p-42");
        assert_eq!(product_key(Some("  "), "Leite Mimosa"), "leite mimosa");
        assert_eq!(product_key(None, "Leite Mimosa"), "leite mimosa");
    }

    #[test]
    fn test_key_unifies_case_and_accents() {
        // Same product spelled differently must land on one key
        assert_eq!(
            product_key(None, "AÇÚCAR Branco"),
            product_key(None, "acucar   branco")
        );
    }

    #[test]
    fn test_build_histories_groups_and_sorts() {
        let purchases = vec![
            record("Leite Mimosa", "2026-08-10", 2),
            record("leite  mimosa", "2026-07-01", 1),
            record("Arroz Agulha", "2026-08-01", 1),
        ];
        let config = EngineConfig::default();
        let histories = build_histories(&purchases, &config, "2026-08-20".parse().unwrap());

        let milk = histories.get("leite mimosa").unwrap();
        assert_eq!(milk.purchase_count(), 2);
        assert_eq!(milk.total_quantity, 3);
        assert_eq!(milk.last_purchase, Some("2026-08-10".parse().unwrap()));
        assert_eq!(milk.purchases[0].date, "2026-07-01".parse().unwrap());
        assert!(histories.contains_key("arroz agulha"));
    }

    #[test]
    fn test_build_histories_honors_window() {
        let purchases = vec![
            record("Leite Mimosa", "2026-01-01", 1),
            record("Leite Mimosa", "2026-08-10", 1),
            // Dated after the reference: ignored
            record("Leite Mimosa", "2026-09-01", 1),
        ];
        let config = EngineConfig::default(); // 90 days back
        let histories = build_histories(&purchases, &config, "2026-08-20".parse().unwrap());
        assert_eq!(histories.get("leite mimosa").unwrap().purchase_count(), 1);
    }
}
