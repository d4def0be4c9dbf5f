//! Identify service: proxy to the provider's language identification

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::client::LanguageProvider;
use crate::core::config::PipelineConfig;
use crate::core::errors::{Result, ServiceError};

/// Application state
#[derive(Clone)]
pub struct IdentifyState {
    config: Arc<PipelineConfig>,
    provider: LanguageProvider,
}

impl IdentifyState {
    pub fn new(config: Arc<PipelineConfig>) -> Result<Self> {
        let provider = LanguageProvider::new(&config)?;
        Ok(Self { config, provider })
    }
}

#[derive(Debug, Deserialize)]
pub struct IdentifyQuery {
    pub input_sentence: Option<String>,
}

async fn healthcheck(State(state): State<Arc<IdentifyState>>) -> String {
    state.config.identify_service_name.clone()
}

/// `POST /api/identify?input_sentence=S` answers with the winning language code
#[instrument(name = "POST /api/identify", skip_all)]
async fn identify(
    State(state): State<Arc<IdentifyState>>,
    Query(query): Query<IdentifyQuery>,
) -> Result<String> {
    let sentence = query
        .input_sentence
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServiceError::missing("input_sentence"))?;

    let result = state.provider.identify(&sentence).await?;
    let best = result.best()?;

    info!(
        language = %best.language,
        probability = best.confidence,
        "Identified language"
    );

    Ok(best.language.clone())
}

/// Build the identify router
pub fn router(state: IdentifyState) -> Router {
    let service_name = state.config.identify_service_name.clone();

    let router = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/api/identify", post(identify))
        .with_state(Arc::new(state));

    super::with_observability(router, &service_name)
}

/// Run the identify service
pub async fn run_server(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    let state = IdentifyState::new(config.clone())?;
    super::serve(router(state), &config.host, config.identify_service_port).await
}
