use chrono::Utc;
use larder_core::product_key;
use larder_learn::{record_prediction_outcome, record_session_outcome, TrackerConfig};
use larder_store::{load_state, save_state, Paths};

pub fn run(
    product: &str,
    actual_days: u32,
    session: Option<&str>,
    household: &str,
) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let state_path = paths.state_path(household);
    let state = load_state(&state_path)?;

    let key = product_key(None, product);
    let Some(acc) = state.accuracy_for(&key) else {
        anyhow::bail!("no predictions recorded for {key}");
    };
    let unresolved = |p: &larder_learn::CadencePrediction| {
        !p.is_resolved() && session.map_or(true, |s| p.session_id == s)
    };
    if !acc.predictions.iter().any(unresolved) {
        anyhow::bail!("no unresolved prediction for {key}");
    }

    let config = TrackerConfig::default();
    let next = match session {
        Some(sid) => record_session_outcome(&state, &key, sid, actual_days, &config, Utc::now()),
        None => record_prediction_outcome(&state, &key, actual_days, &config, Utc::now()),
    };
    save_state(&state_path, &next)?;

    let acc = next
        .accuracy_for(&key)
        .ok_or_else(|| anyhow::anyhow!("state lost entry for {key}"))?;
    println!("✓ resolved prediction for {key} at {actual_days} days");
    println!(
        "  {} of {} predictions resolved, confidence {:.2}",
        acc.resolved_predictions(),
        acc.total_predictions(),
        acc.confidence
    );
    if let Some(days) = acc.learned_cadence_days {
        println!("  learned cadence: {days} days");
    }
    Ok(())
}
