use crate::config::Config;
use crate::error::{AssessError, Result};
use crate::rerank::{RerankDocument, RerankService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request structure for the reranking filter API
#[derive(Serialize)]
struct FilterRequest<'a> {
    query: &'a str,
    docs: &'a [RerankDocument],
    num_results: usize,
}

/// Providers disagree on the envelope; all of these are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum FilterResponse {
    List(Vec<FilteredDoc>),
    Results { results: Vec<FilteredDoc> },
    Data { data: Vec<FilteredDoc> },
}

#[derive(Deserialize)]
struct FilteredDoc {
    id: DocId,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocId {
    Int(u64),
    Text(String),
}

impl DocId {
    fn to_index(&self) -> Option<usize> {
        match self {
            DocId::Int(n) => usize::try_from(*n).ok(),
            DocId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// HTTP client for a Pongo-style `/filter` reranking endpoint
pub struct HttpReranker {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl HttpReranker {
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(api_key: String, base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            endpoint: format!("{}/filter", base_url.trim_end_matches('/')),
        }
    }

    /// Build from config; `None` when no reranker key is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.reranker_api_key().map(|key| {
            Self::new(key, &config.reranker.base_url, config.reranker_timeout())
        })
    }

    /// Replace the underlying HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RerankService for HttpReranker {
    async fn rerank(
        &self,
        query: &str,
        docs: &[RerankDocument],
        num_results: usize,
    ) -> Result<Vec<RerankDocument>> {
        let request = FilterRequest {
            query,
            docs,
            num_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AssessError::RerankerUnavailable(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(AssessError::RerankerUnavailable(format!(
                "Reranker API error {}: {}",
                status, body
            )));
        }

        let parsed: FilterResponse = response.json().await.map_err(|e| {
            AssessError::RerankerUnavailable(format!("Failed to parse response: {}", e))
        })?;

        let docs = match parsed {
            FilterResponse::List(docs) => docs,
            FilterResponse::Results { results } => results,
            FilterResponse::Data { data } => data,
        };

        docs.into_iter()
            .map(|doc| {
                let id = doc.id.to_index().ok_or_else(|| {
                    AssessError::RerankerUnavailable("non-numeric document id in response".to_string())
                })?;
                Ok(RerankDocument { id, text: doc.text })
            })
            .collect()
    }
}
