//! Optional reranking step: reorder a candidate list through an external service.

pub mod http;

pub use http::HttpReranker;

use crate::error::{AssessError, Result};
use crate::eval::Cutoff;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A document as exchanged with the reranking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankDocument {
    /// 0-based position in the submitted list.
    pub id: usize,
    pub text: String,
}

/// An external reranking service.
///
/// Implementations return the documents they keep, most relevant first. Only `id` is trusted
/// by callers; text is mapped back from the submitted list.
#[async_trait]
pub trait RerankService: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        docs: &[RerankDocument],
        num_results: usize,
    ) -> Result<Vec<RerankDocument>>;
}

/// Adapter around an optional [`RerankService`] handle.
#[derive(Clone, Default)]
pub struct Reranker {
    service: Option<Arc<dyn RerankService>>,
}

impl Reranker {
    pub fn new(service: Arc<dyn RerankService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Adapter with no service; every call fails with `RerankerUnavailable`.
    pub fn disabled() -> Self {
        Self { service: None }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Reorder `documents` for `query`, preserving the service's order.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        cutoff: Cutoff,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let service = self.service.as_ref().ok_or_else(|| {
            AssessError::RerankerUnavailable("no reranking service configured".to_string())
        })?;

        let docs: Vec<RerankDocument> = documents
            .iter()
            .enumerate()
            .map(|(id, text)| RerankDocument {
                id,
                text: text.clone(),
            })
            .collect();

        let num_results = match cutoff {
            Cutoff::All => docs.len(),
            Cutoff::Top(k) => k.max(docs.len()),
        };

        let start = std::time::Instant::now();
        let reordered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AssessError::Cancelled),
            reordered = service.rerank(query, &docs, num_results) => reordered?,
        };
        log::debug!(
            "Reranker returned {} of {} documents in {:?}",
            reordered.len(),
            docs.len(),
            start.elapsed()
        );

        reordered
            .into_iter()
            .map(|doc| {
                documents.get(doc.id).cloned().ok_or_else(|| {
                    AssessError::RerankerUnavailable(format!(
                        "service returned unknown document id {}",
                        doc.id
                    ))
                })
            })
            .collect()
    }
}
