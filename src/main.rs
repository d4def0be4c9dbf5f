//! Main entry point for the Lang Pipeline services

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lang_pipeline::cli::commands::{self, Commands};
use lang_pipeline::PipelineConfig;

/// Lang Pipeline - identify a sentence's language, then translate it
#[derive(Parser, Debug)]
#[command(name = "lang-pipeline", version, about, long_about = None)]
struct Args {
    /// Path to the INI configuration file
    #[arg(short, long, default_value = "app.ini")]
    config: PathBuf,

    /// Provider API key (overrides `api_key` from the configuration file)
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "lang_pipeline=debug,tower_http=debug"
    } else {
        "lang_pipeline=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(PipelineConfig::load(&args.config, args.api_key)?);
    info!(
        "Starting {} ({} v{})",
        args.command.service_name(&config),
        lang_pipeline::NAME,
        lang_pipeline::VERSION
    );

    match args.command {
        Commands::App => commands::handle_app(config).await?,
        Commands::Identify => commands::handle_identify(config).await?,
        Commands::Translate => commands::handle_translate(config).await?,
        Commands::Client { iterations } => commands::handle_client(config, iterations).await?,
    }

    Ok(())
}
