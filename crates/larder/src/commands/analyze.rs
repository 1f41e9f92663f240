use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate, Utc};
use larder_core::{CartItem, EngineConfig, PurchaseRecord, UserOverride};
use larder_learn::{
    analyze_cart_adaptive, detect_emergency_purchases, process_feedback_signal, AdaptiveConfig,
};
use larder_store::{append_jsonl, load_state, save_state, Paths, RunRecord};
use tracing::info;

/// An order with at least this many line items counts as a regular shop;
/// purchases outside regular shops are candidate emergency top-ups.
const REGULAR_ORDER_MIN_ITEMS: usize = 3;

#[allow(clippy::too_many_arguments)]
pub fn run(
    cart_path: &str,
    history_path: &str,
    overrides_path: Option<&str>,
    date: Option<&str>,
    household: &str,
    session: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let cart: Vec<CartItem> = read_json(cart_path).context("reading cart")?;
    let purchases: Vec<PurchaseRecord> = read_json(history_path).context("reading history")?;
    let overrides: HashMap<String, UserOverride> = match overrides_path {
        Some(path) => read_json(path).context("reading overrides")?,
        None => HashMap::new(),
    };

    let reference = match date {
        Some(s) => s
            .parse::<NaiveDate>()
            .with_context(|| format!("invalid date: {s}"))?,
        None => Local::now().date_naive(),
    };

    let now = Utc::now();
    let session_id = session
        .map(str::to_string)
        .unwrap_or_else(|| format!("run-{}", now.format("%Y%m%d%H%M%S")));

    let paths = Paths::new()?;
    let state_path = paths.state_path(household);
    let mut state = load_state(&state_path)?;

    // Purchases between regular shops are emergency restocks; fold them in
    // before analyzing so they count against this run's decisions.
    for signal in detect_emergency_purchases(
        &emergency_candidates(&purchases),
        &regular_order_dates(&purchases),
        &session_id,
        now,
    ) {
        state = process_feedback_signal(&state, &signal);
    }

    let engine_config = EngineConfig::default();
    let adaptive_config = AdaptiveConfig::default();
    let (analysis, next_state) = analyze_cart_adaptive(
        &cart,
        &purchases,
        &overrides,
        &state,
        &engine_config,
        &adaptive_config,
        reference,
        &session_id,
        now,
    );

    save_state(&state_path, &next_state)?;
    append_jsonl(
        &paths.runs_path(),
        &RunRecord {
            session_id: session_id.clone(),
            timestamp: now,
            items: analysis.summary.items,
            pruned: analysis.summary.pruned,
            kept: analysis.summary.kept,
            average_confidence: analysis.summary.average_confidence,
        },
    )?;
    info!(
        session = %session_id,
        items = analysis.summary.items,
        pruned = analysis.summary.pruned,
        "cart analyzed"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    for d in &analysis.decisions {
        let mark = if d.prune { "✗ prune" } else { "✓ keep " };
        let review = if d.needs_review { "  [review]" } else { "" };
        println!(
            "{mark}  {:<40} {:.2}  {}{review}",
            d.name,
            d.confidence,
            d.reason.as_str()
        );
    }
    println!();
    println!(
        "{} items: {} pruned, {} kept (avg confidence {:.2})",
        analysis.summary.items,
        analysis.summary.pruned,
        analysis.summary.kept,
        analysis.summary.average_confidence
    );
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("cannot read {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("cannot parse {path}"))
}

fn regular_order_dates(purchases: &[PurchaseRecord]) -> Vec<NaiveDate> {
    let mut per_order: HashMap<&str, (NaiveDate, usize)> = HashMap::new();
    for p in purchases {
        let entry = per_order.entry(p.order_id.as_str()).or_insert((p.date, 0));
        entry.1 += 1;
    }
    per_order
        .values()
        .filter(|(_, count)| *count >= REGULAR_ORDER_MIN_ITEMS)
        .map(|(date, _)| *date)
        .collect()
}

fn emergency_candidates(purchases: &[PurchaseRecord]) -> Vec<PurchaseRecord> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for p in purchases {
        *counts.entry(p.order_id.as_str()).or_insert(0) += 1;
    }
    purchases
        .iter()
        .filter(|p| counts[p.order_id.as_str()] < REGULAR_ORDER_MIN_ITEMS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase(name: &str, date: &str, order: &str) -> PurchaseRecord {
        PurchaseRecord {
            product_id: None,
            name: name.to_string(),
            date: date.parse().unwrap(),
            quantity: 1,
            order_id: order.to_string(),
            unit_price: None,
            category: None,
        }
    }

    #[test]
    fn test_regular_orders_need_three_items() {
        let purchases = vec![
            purchase("Leite", "2026-08-01", "big-1"),
            purchase("Pão", "2026-08-01", "big-1"),
            purchase("Arroz", "2026-08-01", "big-1"),
            purchase("Leite", "2026-08-06", "small-1"),
        ];
        let dates = regular_order_dates(&purchases);
        assert_eq!(dates, vec!["2026-08-01".parse::<NaiveDate>().unwrap()]);

        let candidates = emergency_candidates(&purchases);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].order_id, "small-1");
    }
}
