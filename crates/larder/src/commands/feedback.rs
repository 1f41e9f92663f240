use chrono::Utc;
use larder_core::{detect_category, product_key};
use larder_learn::{
    analyze_product_feedback, process_feedback_signal, CartDecision, FeedbackSignal,
    FeedbackSignalType,
};
use larder_store::{load_state, save_state, Paths};

use crate::cli::SignalArg;

pub fn run(product: &str, signal: SignalArg, removed: bool, household: &str) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let state_path = paths.state_path(household);
    let state = load_state(&state_path)?;

    let key = product_key(None, product);
    let now = Utc::now();
    let decision_confidence = state
        .accuracy_for(&key)
        .map(|acc| acc.confidence)
        .unwrap_or(0.3);

    let signal = FeedbackSignal {
        signal: signal_type(signal),
        product_key: key.clone(),
        category: detect_category(product).category,
        decision: if removed {
            CartDecision::Removed
        } else {
            CartDecision::Kept
        },
        decision_confidence,
        timestamp: now,
        session_id: format!("feedback-{}", now.format("%Y%m%d%H%M%S")),
    };

    let next = process_feedback_signal(&state, &signal);
    save_state(&state_path, &next)?;

    let analysis = analyze_product_feedback(&next, &key);
    let confidence = next
        .accuracy_for(&key)
        .map(|acc| acc.confidence)
        .unwrap_or(0.3);
    println!("✓ feedback recorded for {key}");
    println!("  confidence now {confidence:.2}");
    println!(
        "  recommendation: {} ({} correct, {} wrong removals, {} wrong keeps)",
        recommendation_label(&analysis.recommendation),
        analysis.correct,
        analysis.wrong_removals,
        analysis.wrong_keeps
    );
    Ok(())
}

fn signal_type(arg: SignalArg) -> FeedbackSignalType {
    match arg {
        SignalArg::ExplicitCorrection => FeedbackSignalType::ExplicitCorrection,
        SignalArg::RanOutEarly => FeedbackSignalType::RanOutEarly,
        SignalArg::EmergencyPurchase => FeedbackSignalType::EmergencyPurchase,
        SignalArg::ReAdd => FeedbackSignalType::ImplicitReAdd,
        SignalArg::StillHaveStock => FeedbackSignalType::StillHaveStock,
        SignalArg::QuantityAdjusted => FeedbackSignalType::QuantityAdjusted,
        SignalArg::AcceptedSuggestion => FeedbackSignalType::AcceptedSuggestion,
    }
}

fn recommendation_label(rec: &larder_learn::FeedbackRecommendation) -> &'static str {
    match rec {
        larder_learn::FeedbackRecommendation::TrustMore => "trust more",
        larder_learn::FeedbackRecommendation::TrustLess => "trust less",
        larder_learn::FeedbackRecommendation::NeedsReview => "needs review",
        larder_learn::FeedbackRecommendation::InsufficientData => "insufficient data",
    }
}
