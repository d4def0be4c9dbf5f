//! Load generator: feeds random encyclopedia sentences through the front-end
//!
//! Every iteration fetches a random article summary, shortens it, submits it
//! to the front-end's `/api/translate` and pauses for a random number of
//! seconds. A failing step is logged with its kind and the loop carries on.

pub mod wiki;

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{field, info, instrument, warn, Span};
use uuid::Uuid;

use crate::core::config::PipelineConfig;
use crate::core::pipeline::{post_downstream, PipelineError};

pub use wiki::WikiClient;

/// Summaries longer than this are cut at their first period
pub const SUMMARY_LIMIT: usize = 100;

/// Failure of one load-generator step
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Encyclopedia request failed: {message}")]
    Encyclopedia {
        message: String,
    },

    #[error("No search results for {term:?}")]
    NoSearchResults {
        term: String,
    },

    #[error("Article {title:?} has no summary")]
    EmptySummary {
        title: String,
    },

    #[error("Front-end unreachable: {message}")]
    Submit {
        message: String,
    },

    #[error("Front-end rejected the sentence ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },
}

impl LoadError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encyclopedia { .. } => "encyclopedia",
            Self::NoSearchResults { .. } => "no_search_results",
            Self::EmptySummary { .. } => "empty_summary",
            Self::Submit { .. } => "submit",
            Self::Rejected { .. } => "rejected",
        }
    }
}

impl From<PipelineError> for LoadError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Downstream { status, message, .. } => LoadError::Rejected { status, message },
            other => LoadError::Submit {
                message: other.to_string(),
            },
        }
    }
}

/// Shorten a summary to its first sentence when it exceeds [`SUMMARY_LIMIT`].
///
/// The text before the first `.` is kept and a `.` appended; a long summary
/// without any period is kept whole with a `.` appended.
pub fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_LIMIT {
        return summary.to_string();
    }

    let head = summary.split('.').next().unwrap_or(summary);
    format!("{}.", head)
}

/// One successful round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub sentence: String,
    pub translation: String,
}

/// Drives the pipeline with encyclopedia sentences
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    wiki: WikiClient,
    client: reqwest::Client,
    app_url: String,
    max_sleep_secs: u64,
}

impl LoadGenerator {
    pub fn new(config: &PipelineConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms);

        Ok(Self {
            wiki: WikiClient::new(config.wiki_api_url.clone(), timeout)?,
            client: reqwest::Client::builder().timeout(timeout).build()?,
            app_url: format!("{}/api/translate", config.app_service_url()),
            max_sleep_secs: config.max_sleep_secs,
        })
    }

    /// Random title, first search hit, its summary, shortened
    #[instrument(name = "loadgen.fetch_sentence", skip(self))]
    pub async fn fetch_sentence(&self) -> Result<String, LoadError> {
        let title = self.wiki.random_title().await?;
        let hit = self.wiki.search(&title).await?;
        let summary = self.wiki.summary(&hit).await?;
        Ok(truncate_summary(&summary))
    }

    /// Submit a sentence to the front-end under a fresh request id
    #[instrument(
        name = "loadgen.submit",
        skip(self, sentence),
        fields(
            http.method = "POST",
            http.url = %self.app_url,
            http.status_code = field::Empty,
            request_id = field::Empty,
        )
    )]
    pub async fn submit(&self, sentence: &str) -> Result<String, LoadError> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let translation = post_downstream(
            &self.client,
            "app",
            &self.app_url,
            &[("input_sentence", sentence)],
            Some(&request_id),
        )
        .await?;

        Ok(translation)
    }

    /// Fetch and submit one sentence
    pub async fn run_once(&self) -> Result<Iteration, LoadError> {
        let sentence = self.fetch_sentence().await?;
        info!("Summary: {}", sentence);

        let translation = self.submit(&sentence).await?;
        info!("Translation: {}", translation);

        Ok(Iteration {
            sentence,
            translation,
        })
    }

    fn pause(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(0..=self.max_sleep_secs);
        Duration::from_secs(secs)
    }

    /// One iteration followed by the random pause; failures are logged
    async fn iteration(&self) -> bool {
        let succeeded = match self.run_once().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error.kind = e.kind(), "Iteration failed: {}", e);
                false
            }
        };

        tokio::time::sleep(self.pause()).await;
        succeeded
    }

    /// Run `count` iterations and return how many succeeded
    pub async fn run_iterations(&self, count: u64) -> u64 {
        let mut succeeded = 0;
        for _ in 0..count {
            if self.iteration().await {
                succeeded += 1;
            }
        }
        succeeded
    }

    /// Loop until `shutdown` resolves
    pub async fn run_until<F: Future<Output = ()>>(&self, shutdown: F) {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Load generator stopping");
                    return;
                }
                _ = self.iteration() => {}
            }
        }
    }
}
