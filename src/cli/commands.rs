//! CLI command definitions and handlers

use clap::Subcommand;
use std::sync::Arc;
use tracing::info;

use crate::core::config::PipelineConfig;

/// Components that can be started from the command line
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the front-end service (HTML pages and /api/translate)
    App,

    /// Start the language identification service
    Identify,

    /// Start the translation service
    Translate,

    /// Start the load generator feeding encyclopedia sentences to the front-end
    Client {
        /// Stop after this many iterations instead of running until interrupted
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
    },
}

impl Commands {
    /// Service name to report for this component
    pub fn service_name<'a>(&self, config: &'a PipelineConfig) -> &'a str {
        match self {
            Commands::App => &config.app_service_name,
            Commands::Identify => &config.identify_service_name,
            Commands::Translate => &config.translate_service_name,
            Commands::Client { .. } => &config.client_service_name,
        }
    }
}

/// Handle the front-end command
pub async fn handle_app(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    info!("Default model: {}, target language: {}", config.model_id, config.target_language);
    info!("Identify service: {}", config.identify_service_url());
    info!("Translate service: {}", config.translate_service_url());
    println!("🚀 Front-end starting on http://{}:{}", config.host, config.app_service_port);

    crate::server::app::run_server(config).await
}

/// Handle the identify command
pub async fn handle_identify(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    info!("Provider: {} (version {})", config.api_url, config.api_version);
    println!("🔎 Identify service starting on http://{}:{}", config.host, config.identify_service_port);

    crate::server::identify::run_server(config).await
}

/// Handle the translate command
pub async fn handle_translate(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    info!("Provider: {} (version {})", config.api_url, config.api_version);
    info!("Default model: {}, segment policy: {}", config.model_id, config.segment_policy);
    println!("🌐 Translate service starting on http://{}:{}", config.host, config.translate_service_port);

    crate::server::translate::run_server(config).await
}

/// Handle the load generator command
pub async fn handle_client(config: Arc<PipelineConfig>, iterations: Option<u64>) -> anyhow::Result<()> {
    use crate::loadgen::LoadGenerator;

    let generator = LoadGenerator::new(&config)?;
    info!("Encyclopedia: {}", config.wiki_api_url);
    info!("Front-end: {}", config.app_service_url());

    match iterations {
        Some(count) => {
            let succeeded = generator.run_iterations(count).await;
            println!("✅ {}/{} iterations succeeded", succeeded, count);
        }
        None => {
            println!("🔁 Load generator running, press Ctrl+C to stop");
            generator.run_until(crate::server::shutdown_signal()).await;
        }
    }

    Ok(())
}
