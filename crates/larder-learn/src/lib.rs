//! Adaptive learning layer: cadence tracking, behavioral feedback, and
//! confidence calibration over observed outcomes

mod adaptive;
mod feedback;
mod state;
mod tracker;

pub use adaptive::{
    analyze_cart_adaptive, calculate_adaptive_cadence, make_conservative_prune_decision,
    AdaptiveCadence, AdaptiveConfig,
};
pub use feedback::{
    analyze_product_feedback, detect_emergency_purchases, detect_implicit_feedback,
    process_feedback_signal, FeedbackRecommendation, FeedbackSignal, FeedbackSignalType,
    ProductFeedbackAnalysis,
};
pub use state::{
    CadenceAccuracy, CadencePrediction, CartDecision, ConsumptionProfile, LearningState,
    PruneOutcome, PruningFeedback, RunStats, SpecialEvent,
};
pub use tracker::{
    learned_cadence, record_prediction, record_prediction_outcome, record_session_outcome,
    TrackerConfig, CORRECTNESS_TOLERANCE_DAYS,
};
