//! Configuration management

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::core::models::{is_language_code, ModelId, SegmentPolicy};

/// Configuration shared by every component of the pipeline.
///
/// Loaded once at startup from the `[DEFAULT]` section of an INI file and
/// handed to each handler by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bind address for the services
    pub host: String,
    pub app_service_port: u16,
    pub identify_service_port: u16,
    pub translate_service_port: u16,

    /// Identity names, returned by `/healthcheck` and attached to spans
    pub app_service_name: String,
    pub identify_service_name: String,
    pub translate_service_name: String,
    pub client_service_name: String,

    /// Fallback model when no language was identified, e.g. `en-es`
    pub model_id: String,
    /// Target language appended to the identified source language
    pub target_language: String,

    /// Provider credentials
    pub api_key: String,
    pub api_url: String,

    /// Hostnames the services use to reach each other
    #[serde(default = "default_app_service_host")]
    pub app_service_host: String,
    #[serde(default = "default_identify_service_host")]
    pub identify_service_host: String,
    #[serde(default = "default_translate_service_host")]
    pub translate_service_host: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub segment_policy: SegmentPolicy,

    /// MediaWiki API endpoint used by the load generator
    #[serde(default = "default_wiki_api_url")]
    pub wiki_api_url: String,
    /// Upper bound of the random pause between load-generator iterations
    #[serde(default = "default_max_sleep_secs")]
    pub max_sleep_secs: u64,
}

fn default_app_service_host() -> String {
    "app-service".to_string()
}

fn default_identify_service_host() -> String {
    "identify-service".to_string()
}

fn default_translate_service_host() -> String {
    "translate-service".to_string()
}

fn default_api_version() -> String {
    "2018-05-01".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_wiki_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_max_sleep_secs() -> u64 {
    10
}

/// Layout of the INI file: every key lives under `[DEFAULT]`
#[derive(Deserialize)]
struct IniDocument {
    #[serde(alias = "DEFAULT")]
    default: PipelineConfig,
}

impl PipelineConfig {
    /// Load from an INI file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .build()
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let document: IniDocument = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(document.default)
    }

    /// Load, apply an optional API key override and validate
    pub fn load<P: AsRef<Path>>(path: P, api_key: Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::from_file(path)?;

        if let Some(api_key) = api_key {
            config.api_key = api_key;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("host", &self.host),
            ("app_service_name", &self.app_service_name),
            ("identify_service_name", &self.identify_service_name),
            ("translate_service_name", &self.translate_service_name),
            ("client_service_name", &self.client_service_name),
            ("api_key", &self.api_key),
            ("api_url", &self.api_url),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} is required", key));
            }
        }

        ModelId::parse(&self.model_id)
            .map_err(|e| anyhow::anyhow!("model_id is invalid: {}", e))?;

        if !is_language_code(&self.target_language) {
            return Err(anyhow::anyhow!(
                "target_language must be a two-letter lowercase code, got {:?}",
                self.target_language
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(anyhow::anyhow!("request_timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// The default model, parsed
    pub fn default_model(&self) -> crate::core::errors::Result<ModelId> {
        ModelId::parse(&self.model_id)
    }

    pub fn app_service_url(&self) -> String {
        format!("http://{}:{}", self.app_service_host, self.app_service_port)
    }

    pub fn identify_service_url(&self) -> String {
        format!("http://{}:{}", self.identify_service_host, self.identify_service_port)
    }

    pub fn translate_service_url(&self) -> String {
        format!("http://{}:{}", self.translate_service_host, self.translate_service_port)
    }
}

#[cfg(test)]
impl PipelineConfig {
    /// A valid configuration pointing everything at localhost
    pub(crate) fn sample() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            app_service_port: 5000,
            identify_service_port: 5001,
            translate_service_port: 5002,
            app_service_name: "app-service".to_string(),
            identify_service_name: "identify-service".to_string(),
            translate_service_name: "translate-service".to_string(),
            client_service_name: "client-service".to_string(),
            model_id: "en-es".to_string(),
            target_language: "en".to_string(),
            api_key: "test-key".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            app_service_host: "127.0.0.1".to_string(),
            identify_service_host: "127.0.0.1".to_string(),
            translate_service_host: "127.0.0.1".to_string(),
            api_version: default_api_version(),
            request_timeout_ms: 2000,
            segment_policy: SegmentPolicy::Last,
            wiki_api_url: "http://127.0.0.1:9/w/api.php".to_string(),
            max_sleep_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_INI: &str = "[DEFAULT]
host = 0.0.0.0
app_service_port = 5000
identify_service_port = 5001
translate_service_port = 5002
app_service_name = app-service
identify_service_name = identify-service
translate_service_name = translate-service
client_service_name = client-service
model_id = en-es
target_language = en
api_key = secret
api_url = https://api.example.com/instances/abc
";

    fn write_ini(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_ini() {
        let file = write_ini(SAMPLE_INI);
        let config = PipelineConfig::from_file(file.path()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.identify_service_port, 5001);
        assert_eq!(config.model_id, "en-es");
        assert_eq!(config.api_url, "https://api.example.com/instances/abc");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_keys_default() {
        let file = write_ini(SAMPLE_INI);
        let config = PipelineConfig::from_file(file.path()).unwrap();

        assert_eq!(config.identify_service_url(), "http://identify-service:5001");
        assert_eq!(config.translate_service_url(), "http://translate-service:5002");
        assert_eq!(config.app_service_url(), "http://app-service:5000");
        assert_eq!(config.api_version, "2018-05-01");
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.segment_policy, SegmentPolicy::Last);
        assert_eq!(config.max_sleep_secs, 10);
    }

    #[test]
    fn test_optional_keys_override() {
        let content = format!("{}segment_policy = join\nmax_sleep_secs = 3\n", SAMPLE_INI);
        let file = write_ini(&content);
        let config = PipelineConfig::from_file(file.path()).unwrap();

        assert_eq!(config.segment_policy, SegmentPolicy::Join);
        assert_eq!(config.max_sleep_secs, 3);
    }

    #[test]
    fn test_missing_required_key_fails() {
        let content = SAMPLE_INI.replace("api_url = https://api.example.com/instances/abc\n", "");
        let file = write_ini(&content);
        assert!(PipelineConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_api_key_override() {
        let file = write_ini(SAMPLE_INI);
        let config = PipelineConfig::load(file.path(), Some("override".to_string())).unwrap();
        assert_eq!(config.api_key, "override");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PipelineConfig::sample();
        config.model_id = "english-spanish".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::sample();
        config.target_language = "eng".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::sample();
        config.api_key = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::sample();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        assert!(PipelineConfig::sample().validate().is_ok());
    }
}
