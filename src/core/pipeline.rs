//! Front-end orchestration: identify the language, pick a model, translate
//!
//! The front-end never talks to the provider itself. It calls the identify
//! service, builds `<language>-<target>` from the answer (or falls back to the
//! configured default model) and hands the sentence to the translate service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, field, info, instrument, warn, Span};

use crate::core::config::PipelineConfig;
use crate::core::errors::{ErrorResponse, ServiceError};
use crate::core::models::ModelId;

/// Header carrying the request id across hops
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors raised while orchestrating downstream calls
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Caller did not supply a sentence
    #[error("No input sentence was provided")]
    MissingInput,

    /// The downstream service could not be reached or timed out
    #[error("The {service} service is unreachable: {message}")]
    Unreachable {
        service: &'static str,
        message: String,
    },

    /// The downstream service answered with an error status
    #[error("The {service} service failed ({status}): {message}")]
    Downstream {
        service: &'static str,
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl PipelineError {
    /// HTTP status the front-end answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput => StatusCode::BAD_REQUEST,
            Self::Unreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Downstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::Unreachable { .. } => "unreachable",
            Self::Downstream { .. } => "downstream",
        }
    }

    /// Error code reported by the downstream service, if it sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Downstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingInput => warn!(error.kind = self.kind(), "{}", self),
            _ => error!(error.kind = self.kind(), error.code = self.code(), "{}", self),
        }

        (self.status_code(), self.to_string()).into_response()
    }
}

/// What one pipeline run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Identified language, if any
    pub language: Option<String>,
    /// Model sent to the translate service
    pub model: String,
    /// Translated sentence
    pub output: String,
}

/// Pick the model for the translate call.
///
/// A non-empty detected language gives `<language>-<target>`; otherwise the
/// default model is used unchanged.
pub fn select_model(detected: Option<&str>, default_model: &str, target: &str) -> String {
    match detected.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => ModelId::compose(code, target),
        None => default_model.to_string(),
    }
}

/// POST to a sibling service with query parameters and return the body text
pub(crate) async fn post_downstream(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
    params: &[(&str, &str)],
    request_id: Option<&str>,
) -> Result<String, PipelineError> {
    let mut request = client.post(url).query(params);
    if let Some(id) = request_id {
        request = request.header(REQUEST_ID_HEADER, id);
    }

    let response = request.send().await.map_err(|e| PipelineError::Unreachable {
        service,
        message: e.to_string(),
    })?;

    let status = response.status();
    Span::current().record("http.status_code", status.as_u16());

    let body = response.text().await.map_err(|e| PipelineError::Unreachable {
        service,
        message: e.to_string(),
    })?;

    if status.is_success() {
        return Ok(body);
    }

    let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => (Some(parsed.error.code), parsed.error.message),
        Err(_) => (None, body),
    };

    Err(PipelineError::Downstream {
        service,
        status: status.as_u16(),
        code,
        message,
    })
}

/// Orchestrates the identify and translate services
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: reqwest::Client,
    identify_url: String,
    translate_url: String,
    default_model: String,
    target_language: String,
}

impl Pipeline {
    /// Create a pipeline wired to the services named in `config`
    pub fn new(config: &PipelineConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            identify_url: format!("{}/api/identify", config.identify_service_url()),
            translate_url: format!("{}/api/translate", config.translate_service_url()),
            default_model: config.model_id.clone(),
            target_language: config.target_language.clone(),
        })
    }

    /// Ask the identify service for the language of `sentence`.
    ///
    /// `Ok(None)` means no language could be determined.
    #[instrument(
        name = "pipeline.identify",
        skip_all,
        fields(http.method = "POST", http.url = %self.identify_url, http.status_code = field::Empty)
    )]
    pub async fn identify(
        &self,
        sentence: &str,
        request_id: Option<&str>,
    ) -> Result<Option<String>, PipelineError> {
        let result = post_downstream(
            &self.client,
            "identify",
            &self.identify_url,
            &[("input_sentence", sentence)],
            request_id,
        )
        .await;

        match result {
            Ok(body) => {
                let code = body.trim();
                Ok((!code.is_empty()).then(|| code.to_string()))
            }
            Err(PipelineError::Downstream { code: Some(code), .. })
                if code == ServiceError::EmptyIdentification.error_code() =>
            {
                warn!("No language identified, falling back to the default model");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Ask the translate service to translate `sentence` with `model`
    #[instrument(
        name = "pipeline.translate",
        skip(self, sentence, request_id),
        fields(http.method = "POST", http.url = %self.translate_url, http.status_code = field::Empty)
    )]
    pub async fn translate(
        &self,
        sentence: &str,
        model: &str,
        request_id: Option<&str>,
    ) -> Result<String, PipelineError> {
        post_downstream(
            &self.client,
            "translate",
            &self.translate_url,
            &[("input_sentence", sentence), ("language_model", model)],
            request_id,
        )
        .await
    }

    /// Identify, select the model, translate
    #[instrument(
        name = "identify_and_translate",
        skip_all,
        fields(language = field::Empty, model = field::Empty)
    )]
    pub async fn identify_and_translate(
        &self,
        sentence: &str,
        request_id: Option<&str>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let language = self.identify(sentence, request_id).await?;
        let model = select_model(language.as_deref(), &self.default_model, &self.target_language);

        let span = Span::current();
        span.record("language", language.as_deref().unwrap_or(""));
        span.record("model", model.as_str());

        let output = self.translate(sentence, &model, request_id).await?;
        info!("Translated with {}: {}", model, output);

        Ok(PipelineOutcome {
            language,
            model,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, Recorder};
    use axum::{extract::Query, http::HeaderMap, routing::post, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    type Params = Query<HashMap<String, String>>;

    /// Translate stub that records the model it receives and echoes it back
    async fn spawn_translate_stub(models: Recorder) -> SocketAddr {
        let router = Router::new().route(
            "/api/translate",
            post(move |Query(params): Params| {
                let models = models.clone();
                async move {
                    let model = params.get("language_model").cloned().unwrap_or_default();
                    models.push(model.clone());
                    format!("translated with {}", model)
                }
            }),
        );
        spawn_stub(router).await
    }

    /// Identify stub answering with a fixed body
    async fn spawn_identify_stub(answer: &'static str) -> SocketAddr {
        let router = Router::new().route("/api/identify", post(move || async move { answer }));
        spawn_stub(router).await
    }

    fn pipeline(identify: SocketAddr, translate: SocketAddr) -> Pipeline {
        let mut config = PipelineConfig::sample();
        config.identify_service_port = identify.port();
        config.translate_service_port = translate.port();
        Pipeline::new(&config).unwrap()
    }

    #[test]
    fn test_select_model() {
        assert_eq!(select_model(Some("fr"), "en-es", "en"), "fr-en");
        assert_eq!(select_model(Some("de"), "en-es", "fr"), "de-fr");
        assert_eq!(select_model(Some(""), "en-es", "en"), "en-es");
        assert_eq!(select_model(Some("  "), "en-es", "en"), "en-es");
        assert_eq!(select_model(None, "en-es", "en"), "en-es");
    }

    #[tokio::test]
    async fn test_detected_language_builds_model() {
        let models = Recorder::default();
        let identify = spawn_identify_stub("fr").await;
        let translate = spawn_translate_stub(models.clone()).await;

        let outcome = pipeline(identify, translate)
            .identify_and_translate("Bonjour le monde", None)
            .await
            .unwrap();

        assert_eq!(outcome.language.as_deref(), Some("fr"));
        assert_eq!(outcome.model, "fr-en");
        assert_eq!(outcome.output, "translated with fr-en");
        assert_eq!(models.values(), vec!["fr-en"]);
    }

    #[tokio::test]
    async fn test_empty_identification_uses_default_model() {
        let models = Recorder::default();
        let identify = spawn_identify_stub("").await;
        let translate = spawn_translate_stub(models.clone()).await;

        let outcome = pipeline(identify, translate)
            .identify_and_translate("???", None)
            .await
            .unwrap();

        assert_eq!(outcome.language, None);
        assert_eq!(models.values(), vec!["en-es"]);
    }

    #[tokio::test]
    async fn test_empty_identification_error_uses_default_model() {
        let models = Recorder::default();
        let router = Router::new().route(
            "/api/identify",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"error": {"code": "EMPTY_IDENTIFICATION", "message": "none"}})),
                )
            }),
        );
        let identify = spawn_stub(router).await;
        let translate = spawn_translate_stub(models.clone()).await;

        let outcome = pipeline(identify, translate)
            .identify_and_translate("...", None)
            .await
            .unwrap();

        assert_eq!(outcome.model, "en-es");
        assert_eq!(models.values(), vec!["en-es"]);
    }

    #[tokio::test]
    async fn test_identify_failure_is_reported() {
        let models = Recorder::default();
        let router = Router::new().route(
            "/api/identify",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": {"code": "PROVIDER_REJECTED", "message": "bad key"}})),
                )
            }),
        );
        let identify = spawn_stub(router).await;
        let translate = spawn_translate_stub(models.clone()).await;

        let err = pipeline(identify, translate)
            .identify_and_translate("hello", None)
            .await
            .unwrap_err();

        match &err {
            PipelineError::Downstream { service, status, code, message } => {
                assert_eq!(*service, "identify");
                assert_eq!(*status, 502);
                assert_eq!(code.as_deref(), Some("PROVIDER_REJECTED"));
                assert_eq!(message, "bad key");
            }
            other => panic!("expected Downstream, got {:?}", other),
        }
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind(), "downstream");
        assert_eq!(err.code(), Some("PROVIDER_REJECTED"));
        assert!(models.values().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_translate_service() {
        let identify = spawn_identify_stub("fr").await;
        let unused: SocketAddr = "127.0.0.1:9".parse().unwrap();

        let err = pipeline(identify, unused)
            .identify_and_translate("Bonjour", None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Unreachable { service: "translate", .. }));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.kind(), "unreachable");
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn test_request_id_is_forwarded() {
        let seen = Recorder::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/identify",
            post(move |headers: HeaderMap| {
                let recorder = recorder.clone();
                async move {
                    if let Some(id) = headers.get(REQUEST_ID_HEADER) {
                        recorder.push(id.to_str().unwrap());
                    }
                    "fr"
                }
            }),
        );
        let identify = spawn_stub(router).await;
        let translate = spawn_translate_stub(Recorder::default()).await;

        pipeline(identify, translate)
            .identify_and_translate("Bonjour", Some("req-42"))
            .await
            .unwrap();

        assert_eq!(seen.values(), vec!["req-42"]);
    }
}
