//! Client for the external language identification / translation provider

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, field, instrument, Span};

use crate::core::config::PipelineConfig;
use crate::core::errors::{Result, ServiceError};
use crate::core::models::{IdentificationResult, ModelId, TranslationResult};

/// Body of a translate call
#[derive(Serialize)]
struct TranslateBody<'a> {
    text: [&'a str; 1],
    source: &'a str,
    target: &'a str,
}

/// HTTP client for a Language Translator v3 style provider
#[derive(Debug, Clone)]
pub struct LanguageProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    api_version: String,
}

impl LanguageProvider {
    /// Create a provider client from the pipeline configuration
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Ask the provider which languages `text` may be written in
    #[instrument(
        name = "provider.identify",
        skip(self, text),
        fields(http.method = "POST", http.url = field::Empty, http.status_code = field::Empty)
    )]
    pub async fn identify(&self, text: &str) -> Result<IdentificationResult> {
        let url = format!("{}/v3/identify", self.api_url);
        Span::current().record("http.url", url.as_str());

        let request = self
            .client
            .post(&url)
            .query(&[("version", self.api_version.as_str())])
            .basic_auth("apikey", Some(&self.api_key))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(text.to_string());

        let result: IdentificationResult = self.send(request).await?;
        debug!("Provider proposed {} candidate languages", result.languages.len());
        Ok(result)
    }

    /// Translate `text` with the language pair in `model`
    #[instrument(
        name = "provider.translate",
        skip(self, text, model),
        fields(model = %model, http.method = "POST", http.url = field::Empty, http.status_code = field::Empty)
    )]
    pub async fn translate(&self, text: &str, model: &ModelId) -> Result<TranslationResult> {
        let url = format!("{}/v3/translate", self.api_url);
        Span::current().record("http.url", url.as_str());

        let body = TranslateBody {
            text: [text],
            source: model.source(),
            target: model.target(),
        };

        let request = self
            .client
            .post(&url)
            .query(&[("version", self.api_version.as_str())])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&body);

        let result: TranslationResult = self.send(request).await?;
        debug!("Provider returned {} translation segments", result.translations.len());
        Ok(result)
    }

    /// Send a request and decode a successful JSON answer
    async fn send<T: serde::de::DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let status_code = status.as_u16();
        let message = response.text().await.unwrap_or_default();

        match status_code {
            401 | 403 | 429 => Err(ServiceError::ProviderRejected {
                status: status_code,
                message,
            }),
            _ => Err(ServiceError::ProviderError {
                status: status_code,
                message,
            }),
        }
    }
}
