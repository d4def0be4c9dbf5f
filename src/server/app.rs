//! Front-end service: HTML form and plain-text API over the pipeline

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::config::PipelineConfig;
use crate::core::models::ChatHistory;
use crate::core::pipeline::{Pipeline, PipelineError};

use super::{render, request_id};

/// Application state
#[derive(Clone)]
pub struct AppState {
    config: Arc<PipelineConfig>,
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Arc<PipelineConfig>) -> anyhow::Result<Self> {
        let pipeline = Pipeline::new(&config)?;
        Ok(Self { config, pipeline })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiTranslateQuery {
    pub input_sentence: Option<String>,
}

/// Form posted by the translate page
#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    pub input: Option<String>,
}

async fn healthcheck(State(state): State<Arc<AppState>>) -> String {
    state.config.app_service_name.clone()
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::index_page(&state.config.app_service_name))
}

/// `GET /translate`: empty form
async fn translate_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut history = ChatHistory::new();
    history.push(" ");
    Html(render::translate_page(&state.config.app_service_name, &history))
}

/// `POST /translate`: run the pipeline and show the sentence above its translation
#[instrument(name = "POST /translate", skip_all)]
async fn submit_translation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<TranslateForm>,
) -> (StatusCode, Html<String>) {
    let mut history = ChatHistory::new();

    let status = match form.input.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(sentence) => {
            match state
                .pipeline
                .identify_and_translate(sentence, request_id(&headers))
                .await
            {
                Ok(outcome) => {
                    history.push(outcome.output);
                    history.push(format!("# {}", sentence));
                    StatusCode::OK
                }
                Err(e) => {
                    warn!(error.kind = e.kind(), error.code = e.code(), "Translation failed: {}", e);
                    history.push(format!("Translation failed: {}", e));
                    history.push(format!("# {}", sentence));
                    e.status_code()
                }
            }
        }
        None => {
            history.push("Please type a sentence to translate.");
            StatusCode::BAD_REQUEST
        }
    };

    let page = render::translate_page(&state.config.app_service_name, &history);
    (status, Html(page))
}

/// `POST /api/translate?input_sentence=S`: plain-text translation
#[instrument(name = "POST /api/translate", skip_all)]
async fn api_translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ApiTranslateQuery>,
) -> Result<String, PipelineError> {
    let sentence = query
        .input_sentence
        .filter(|s| !s.trim().is_empty())
        .ok_or(PipelineError::MissingInput)?;

    let outcome = state
        .pipeline
        .identify_and_translate(&sentence, request_id(&headers))
        .await?;

    info!(model = %outcome.model, "Served API translation");
    Ok(outcome.output)
}

/// Build the front-end router
pub fn router(state: AppState) -> Router {
    let service_name = state.config.app_service_name.clone();

    let router = Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(healthcheck))
        .route("/translate", get(translate_page).post(submit_translation))
        .route("/api/translate", post(api_translate))
        .with_state(Arc::new(state));

    super::with_observability(router, &service_name)
}

/// Run the front-end service
pub async fn run_server(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    let state = AppState::new(config.clone())?;
    super::serve(router(state), &config.host, config.app_service_port).await
}
