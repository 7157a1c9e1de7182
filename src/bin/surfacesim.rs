//! surfacesim CLI - surface similarity scoring for code pairs
//!
//! Scores single pairs or JSONL datasets and runs the region analyses over
//! scored data. Logs go to stderr so stdout stays machine-readable.

use clap::Parser;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score(args) => cli::score_command(args).await?,
        Commands::Batch(args) => cli::batch_command(args).await?,
        Commands::Thresholds(args) => cli::thresholds_command(args).await?,
        Commands::HitRate(args) => cli::hit_rate_command(args).await?,
        Commands::Mae(args) => cli::mae_command(args).await?,
        Commands::External(args) => cli::external_command(args).await?,
        Commands::ListLanguages => cli::list_languages().await?,
        Commands::PrintDefaultConfig => cli::print_default_config().await?,
        Commands::InitConfig(args) => cli::init_config(args).await?,
        Commands::ValidateConfig(args) => cli::validate_config(args).await?,
    }

    Ok(())
}
