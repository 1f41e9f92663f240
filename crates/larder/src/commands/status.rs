use larder_learn::LearningState;
use larder_store::{load_state, read_jsonl, Paths, RunRecord};

pub fn run(household: &str) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let state = load_state(&paths.state_path(household))?;
    let runs: Vec<RunRecord> = read_jsonl(&paths.runs_path())?;

    let (predictions, resolved, correct) = prediction_counts(&state);
    let learned = state
        .cadence_accuracy
        .values()
        .filter(|acc| acc.learned_cadence_days.is_some())
        .count();

    let mut output = serde_json::json!({
        "household": household,
        "products_tracked": state.cadence_accuracy.len(),
        "products_with_learned_cadence": learned,
        "predictions": predictions,
        "resolved": resolved,
        "correct": correct,
        "feedback_records": state.pruning_feedback.len(),
        "profile_data_points": state.consumption_profile.data_points,
        "runs": state.run_stats.total_runs,
        "items_seen": state.run_stats.total_items,
        "items_pruned": state.run_stats.total_pruned,
    });

    if let Some(last) = runs.last() {
        output["last_run"] = serde_json::json!({
            "session_id": last.session_id,
            "timestamp": last.timestamp.to_rfc3339(),
            "items": last.items,
            "pruned": last.pruned,
        });
    }

    println!("{output}");
    Ok(())
}

fn prediction_counts(state: &LearningState) -> (usize, usize, usize) {
    let mut predictions = 0;
    let mut resolved = 0;
    let mut correct = 0;
    for acc in state.cadence_accuracy.values() {
        predictions += acc.total_predictions();
        resolved += acc.resolved_predictions();
        correct += acc.correct_predictions();
    }
    (predictions, resolved, correct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use larder_learn::{record_prediction, record_prediction_outcome, TrackerConfig};

    #[test]
    fn test_prediction_counts_across_products() {
        let now = Utc::now();
        let config = TrackerConfig::default();
        let mut state = LearningState::new(now);
        state = record_prediction(&state, "leite", 7, 7, "s1", now);
        state = record_prediction_outcome(&state, "leite", 8, &config, now);
        state = record_prediction(&state, "leite", 7, 7, "s2", now);
        state = record_prediction(&state, "arroz", 30, 30, "s2", now);

        let (predictions, resolved, correct) = prediction_counts(&state);
        assert_eq!(predictions, 3);
        assert_eq!(resolved, 1);
        assert_eq!(correct, 1, "8 vs 7 is within tolerance");
    }
}
