//! Core restock decision engine: category inference, cadence estimation,
//! restock timing, and heuristic prune/keep decisioning

mod cadence;
mod category;
mod config;
mod engine;
mod history;
mod timing;
mod types;

pub use cadence::{
    estimate_cadence, CadenceEstimate, CadenceSource, MAX_CADENCE_DAYS, MIN_CADENCE_DAYS,
};
pub use category::{detect_category, Category, CategoryMatch};
pub use config::{ConfigError, EngineConfig};
pub use engine::{analyze_cart, decide_item, AnalysisSummary, CartAnalysis};
pub use history::{build_histories, normalize_name, product_key};
pub use timing::{estimate_timing, RestockStatus, RestockTiming};
pub use types::{
    CartItem, DecisionContext, ItemPurchaseHistory, PruneDecision, PruneReason, PurchaseRecord,
    UserOverride,
};
