//! Translate service: proxy to the provider's translation

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::client::LanguageProvider;
use crate::core::config::PipelineConfig;
use crate::core::errors::{Result, ServiceError};
use crate::core::models::{ModelId, SegmentPolicy};

/// Application state
#[derive(Clone)]
pub struct TranslateState {
    config: Arc<PipelineConfig>,
    provider: LanguageProvider,
    default_model: ModelId,
    segment_policy: SegmentPolicy,
}

impl TranslateState {
    pub fn new(config: Arc<PipelineConfig>) -> Result<Self> {
        let provider = LanguageProvider::new(&config)?;
        let default_model = config.default_model()?;
        let segment_policy = config.segment_policy;

        Ok(Self {
            config,
            provider,
            default_model,
            segment_policy,
        })
    }

    /// Model named by the request, or the default when absent or empty
    fn resolve_model(&self, requested: Option<&str>) -> Result<ModelId> {
        match requested.filter(|m| !m.is_empty()) {
            Some(code) => ModelId::parse(code),
            None => Ok(self.default_model.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    pub input_sentence: Option<String>,
    pub language_model: Option<String>,
}

async fn healthcheck(State(state): State<Arc<TranslateState>>) -> String {
    state.config.translate_service_name.clone()
}

/// `POST /api/translate?input_sentence=S&language_model=M` answers with the translation
#[instrument(name = "POST /api/translate", skip_all)]
async fn translate(
    State(state): State<Arc<TranslateState>>,
    Query(query): Query<TranslateQuery>,
) -> Result<String> {
    let sentence = query
        .input_sentence
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServiceError::missing("input_sentence"))?;

    let model = state.resolve_model(query.language_model.as_deref())?;
    debug!(source = model.source(), target = model.target(), "Resolved model");

    let result = state.provider.translate(&sentence, &model).await?;
    let output = result.collapse(state.segment_policy)?;

    info!(model = %model, policy = %state.segment_policy, "Translated sentence");
    Ok(output)
}

/// Build the translate router
pub fn router(state: TranslateState) -> Router {
    let service_name = state.config.translate_service_name.clone();

    let router = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/api/translate", post(translate))
        .with_state(Arc::new(state));

    super::with_observability(router, &service_name)
}

/// Run the translate service
pub async fn run_server(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    let state = TranslateState::new(config.clone())?;
    super::serve(router(state), &config.host, config.translate_service_port).await
}
