//! Top-level assessment run: judge the base ranking, optionally rerank and judge again,
//! score both sides and append the record to the store.

use crate::config::Config;
use crate::error::{AssessError, Result};
use crate::eval::{score, Cutoff, MetricsResult};
use crate::judge::{OpenAiJudgeClient, RelevanceJudge};
use crate::model::{labels_of, AssessmentRecord, AssessmentSide, RecordStatus};
use crate::rerank::{HttpReranker, Reranker};
use crate::store::AssessmentStore;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Scores computed for one run at its collection cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    pub base: MetricsResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reranked: Option<MetricsResult>,
}

/// Result of [`Assessor::run_assessment`]; the record has already been appended.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentOutcome {
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
    pub record: AssessmentRecord,
}

/// Runs assessments against one store with an injected judge and reranker.
pub struct Assessor {
    judge: RelevanceJudge,
    reranker: Reranker,
    store: AssessmentStore,
}

impl Assessor {
    pub fn new(judge: RelevanceJudge, reranker: Reranker, store: AssessmentStore) -> Self {
        Self {
            judge,
            reranker,
            store,
        }
    }

    /// Wire up the HTTP judge and (when a key is set) the HTTP reranker from config.
    ///
    /// Fails with `Configuration` when the judge API key is missing.
    pub fn from_config(config: &Config, store: AssessmentStore) -> Result<Self> {
        let judge = RelevanceJudge::new(Arc::new(OpenAiJudgeClient::from_config(config)?));
        let reranker = match HttpReranker::from_config(config) {
            Some(service) => Reranker::new(Arc::new(service)),
            None => Reranker::disabled(),
        };
        Ok(Self::new(judge, reranker, store))
    }

    pub fn store(&self) -> &AssessmentStore {
        &self.store
    }

    /// Assess one query's ranked `documents` and append the outcome to the store.
    ///
    /// Configuration problems are returned before any network call. A judge failure on either
    /// side is recorded as an `error` record and reported through the outcome, not as `Err`.
    /// A reranker failure only drops the reranked side.
    pub async fn run_assessment(
        &self,
        query: &str,
        documents: &[String],
        use_reranker: bool,
        cutoff: Cutoff,
        include_docs: bool,
        cancel: &CancellationToken,
    ) -> Result<AssessmentOutcome> {
        if use_reranker && !self.reranker.is_configured() {
            return Err(AssessError::Configuration(
                "reranking requested but no reranker is configured (is PONGO_API_KEY set?)"
                    .to_string(),
            ));
        }
        if !self.judge.has_credentials() {
            return Err(AssessError::Configuration(
                "judge API credentials are not provided".to_string(),
            ));
        }

        self.store.with_store(|s| s.prepare()).await?;

        let base = match self.assess_side(query, documents, cutoff, include_docs, cancel).await {
            Ok(side) => side,
            Err(e) if e.is_query_scoped() => return self.record_failure(query, cutoff, e).await,
            Err(e) => return Err(e),
        };

        let mut reranked = None;
        let mut reranker_error = None;
        if use_reranker {
            match self.reranker.rerank(query, documents, cutoff, cancel).await {
                Ok(reordered) => {
                    match self.assess_side(query, &reordered, cutoff, include_docs, cancel).await {
                        Ok(side) => reranked = Some(side),
                        Err(e) if e.is_query_scoped() => {
                            return self.record_failure(query, cutoff, e).await
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(AssessError::RerankerUnavailable(message)) => {
                    log::warn!("Reranker unavailable for query {:?}: {}", query, message);
                    reranker_error = Some(message);
                }
                Err(e) => return Err(e),
            }
        }

        let metrics = RunMetrics {
            base: base.calculated_scores,
            reranked: reranked.as_ref().map(|side| side.calculated_scores),
        };
        let record = AssessmentRecord::success(query, cutoff, base, reranked, reranker_error);
        self.append(record.clone()).await?;

        log::info!(
            "Assessed {:?}: nDCG@{} {:.3}, hit index {}",
            query,
            cutoff,
            metrics.base.ndcg,
            metrics.base.hit_index
        );

        Ok(AssessmentOutcome {
            status: RecordStatus::Success,
            metrics: Some(metrics),
            record,
        })
    }

    async fn assess_side(
        &self,
        query: &str,
        documents: &[String],
        cutoff: Cutoff,
        include_docs: bool,
        cancel: &CancellationToken,
    ) -> Result<AssessmentSide> {
        let judged = self.judge.judge(query, documents, cutoff, cancel).await?;
        let calculated_scores = score(&labels_of(&judged), cutoff);
        let docs = include_docs.then(|| documents[..judged.len()].to_vec());

        Ok(AssessmentSide {
            relevance_ratings: judged,
            calculated_scores,
            docs,
        })
    }

    async fn record_failure(
        &self,
        query: &str,
        cutoff: Cutoff,
        error: AssessError,
    ) -> Result<AssessmentOutcome> {
        log::warn!("Judge failed, skipping this question: {:?} ({})", query, error);

        let record = AssessmentRecord::failed(query, cutoff, error.to_string());
        self.append(record.clone()).await?;

        Ok(AssessmentOutcome {
            status: RecordStatus::Error,
            metrics: None,
            record,
        })
    }

    async fn append(&self, record: AssessmentRecord) -> Result<()> {
        self.store.with_store(move |s| s.append(&record)).await
    }
}
