use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "larder")]
#[command(version)]
#[command(about = "Restock-aware cart pruning for recurring grocery orders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the larder data directory
    Init,

    /// Analyze a proposed cart against purchase history
    Analyze {
        /// Path to cart JSON (array of cart items)
        #[arg(short, long)]
        cart: String,

        /// Path to purchase history JSON (array of purchase records)
        #[arg(long)]
        history: String,

        /// Path to per-product overrides JSON (optional)
        #[arg(long)]
        overrides: Option<String>,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Household profile to load and update
        #[arg(long, default_value = "default")]
        household: String,

        /// Session identifier recorded with predictions
        #[arg(long)]
        session: Option<String>,

        /// Emit decisions as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record an explicit feedback signal for a product
    Feedback {
        /// Product name (or canonical key)
        product: String,

        /// Signal type
        #[arg(long, value_enum)]
        signal: SignalArg,

        /// The product had been removed from the cart (default: kept)
        #[arg(long)]
        removed: bool,

        /// Household profile to update
        #[arg(long, default_value = "default")]
        household: String,
    },

    /// Resolve the most recent cadence prediction for a product
    Resolve {
        /// Product name (or canonical key)
        product: String,

        /// Observed days until the product was actually repurchased
        #[arg(long)]
        actual_days: u32,

        /// Resolve the prediction from this session instead of the latest
        #[arg(long)]
        session: Option<String>,

        /// Household profile to update
        #[arg(long, default_value = "default")]
        household: String,
    },

    /// Show learning state summary
    Status {
        /// Household profile to inspect
        #[arg(long, default_value = "default")]
        household: String,
    },

    /// Print version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SignalArg {
    /// User explicitly said the decision was wrong
    ExplicitCorrection,
    /// Product ran out before the predicted restock date
    RanOutEarly,
    /// Unplanned purchase between regular orders
    EmergencyPurchase,
    /// User put a pruned product straight back in the cart
    ReAdd,
    /// Product was still stocked when flagged as due
    StillHaveStock,
    /// User changed the quantity rather than the decision
    QuantityAdjusted,
    /// User accepted the suggestion as-is
    AcceptedSuggestion,
}
