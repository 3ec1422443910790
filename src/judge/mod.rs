//! LLM relevance judge: chunked prompting, strict verdict parsing, ordered merge.

pub mod openai;
pub mod prompt;
pub mod verdict;

pub use openai::OpenAiJudgeClient;

use crate::error::{AssessError, Result};
use crate::eval::Cutoff;
use crate::model::JudgedSource;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Maximum number of documents sent to the judge in one request.
pub const JUDGE_BATCH_SIZE: usize = 5;

/// A chat-completion backend that turns a prompt into the model's reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Whether credentials are present for this backend.
    fn has_credentials(&self) -> bool {
        true
    }
}

/// Relevance judge over a [`CompletionClient`].
#[derive(Clone)]
pub struct RelevanceJudge {
    client: Arc<dyn CompletionClient>,
}

impl RelevanceJudge {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn has_credentials(&self) -> bool {
        self.client.has_credentials()
    }

    /// Judge the top `cutoff` documents for `query`.
    ///
    /// Documents are sent in chunks of [`JUDGE_BATCH_SIZE`], one request at a time, each
    /// tagged with its global 1-based rank. A malformed reply for any chunk fails the whole
    /// call. The returned labels are sorted by `source_num`.
    pub async fn judge(
        &self,
        query: &str,
        documents: &[String],
        cutoff: Cutoff,
        cancel: &CancellationToken,
    ) -> Result<Vec<JudgedSource>> {
        let n = cutoff.limit(documents.len());
        let mut judged = Vec::with_capacity(n);

        for (chunk_index, chunk) in documents[..n].chunks(JUDGE_BATCH_SIZE).enumerate() {
            let first_source_num = chunk_index * JUDGE_BATCH_SIZE + 1;
            let prompt = prompt::build_prompt(query, first_source_num, chunk);

            log::debug!(
                "Judging sources {}..={} for query: {}",
                first_source_num,
                first_source_num + chunk.len() - 1,
                query
            );

            let start = std::time::Instant::now();
            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AssessError::Cancelled),
                reply = self.client.complete(&prompt) => reply?,
            };
            log::debug!("Judge call took {:?}", start.elapsed());

            judged.extend(verdict::parse_verdicts(&reply, first_source_num, chunk.len())?);
        }

        judged.sort_by_key(|j| j.source_num);
        Ok(judged)
    }
}
