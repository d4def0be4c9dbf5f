//! MediaWiki action API client: random title, search, summary

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, field, instrument, Span};

use super::LoadError;

#[derive(Deserialize)]
struct QueryResponse<T> {
    query: T,
}

#[derive(Deserialize)]
struct RandomQuery {
    random: Vec<PageRef>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<PageRef>,
}

#[derive(Deserialize)]
struct PageRef {
    title: String,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: Vec<ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

/// Encyclopedia client used by the load generator
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikiClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    async fn query<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, LoadError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| LoadError::Encyclopedia {
                message: e.to_string(),
            })?;

        Span::current().record("http.status_code", response.status().as_u16());

        let response = response.error_for_status().map_err(|e| LoadError::Encyclopedia {
            message: e.to_string(),
        })?;

        let body: QueryResponse<T> = response.json().await.map_err(|e| LoadError::Encyclopedia {
            message: format!("Undecodable answer: {}", e),
        })?;

        Ok(body.query)
    }

    /// Title of a random main-namespace article
    #[instrument(name = "wiki.random", skip(self), fields(http.method = "GET", http.status_code = field::Empty))]
    pub async fn random_title(&self) -> Result<String, LoadError> {
        let query: RandomQuery = self
            .query(&[("list", "random"), ("rnnamespace", "0"), ("rnlimit", "1")])
            .await?;

        query
            .random
            .into_iter()
            .next()
            .map(|page| page.title)
            .ok_or_else(|| LoadError::Encyclopedia {
                message: "No random page returned".to_string(),
            })
    }

    /// Title of the first search hit for `term`
    #[instrument(name = "wiki.search", skip(self), fields(http.method = "GET", http.status_code = field::Empty))]
    pub async fn search(&self, term: &str) -> Result<String, LoadError> {
        let query: SearchQuery = self
            .query(&[("list", "search"), ("srsearch", term), ("srlimit", "10"), ("srprop", "")])
            .await?;

        debug!("{} search hits", query.search.len());

        query
            .search
            .into_iter()
            .next()
            .map(|page| page.title)
            .ok_or_else(|| LoadError::NoSearchResults {
                term: term.to_string(),
            })
    }

    /// Plain-text introduction of the article titled `title`
    #[instrument(name = "wiki.summary", skip(self), fields(http.method = "GET", http.status_code = field::Empty))]
    pub async fn summary(&self, title: &str) -> Result<String, LoadError> {
        let query: ExtractQuery = self
            .query(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        query
            .pages
            .into_iter()
            .next()
            .and_then(|page| page.extract)
            .map(|extract| extract.trim().to_string())
            .filter(|extract| !extract.is_empty())
            .ok_or_else(|| LoadError::EmptySummary {
                title: title.to_string(),
            })
    }
}
