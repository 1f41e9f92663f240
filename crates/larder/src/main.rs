mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Analyze {
            cart,
            history,
            overrides,
            date,
            household,
            session,
            json,
        } => commands::analyze::run(
            &cart,
            &history,
            overrides.as_deref(),
            date.as_deref(),
            &household,
            session.as_deref(),
            json,
        ),
        Commands::Feedback {
            product,
            signal,
            removed,
            household,
        } => commands::feedback::run(&product, signal, removed, &household),
        Commands::Resolve {
            product,
            actual_days,
            session,
            household,
        } => commands::resolve::run(&product, actual_days, session.as_deref(), &household),
        Commands::Status { household } => commands::status::run(&household),
        Commands::Version => commands::version::run(),
    }
}
