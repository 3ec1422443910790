//! Labels and persisted assessment records.

use crate::eval::{Cutoff, MetricsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Three-way relevance verdict, stored as "HR" / "SR" / "NR".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelevanceLabel {
    HighlyRelevant,
    SomewhatRelevant,
    NotRelevant,
}

impl RelevanceLabel {
    pub fn tag(self) -> &'static str {
        match self {
            RelevanceLabel::HighlyRelevant => "HR",
            RelevanceLabel::SomewhatRelevant => "SR",
            RelevanceLabel::NotRelevant => "NR",
        }
    }
}

impl FromStr for RelevanceLabel {
    type Err = String;

    /// Accepts the short tags and the spelled-out names in any case,
    /// with spaces, underscores or hyphens ("hr", "Highly Relevant", "NOT_RELEVANT").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "HR" | "HIGHLYRELEVANT" => Ok(RelevanceLabel::HighlyRelevant),
            "SR" | "SOMEWHATRELEVANT" => Ok(RelevanceLabel::SomewhatRelevant),
            "NR" | "NOTRELEVANT" => Ok(RelevanceLabel::NotRelevant),
            _ => Err(format!("unknown relevance score: {:?}", s)),
        }
    }
}

impl TryFrom<String> for RelevanceLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelevanceLabel> for String {
    fn from(label: RelevanceLabel) -> Self {
        label.tag().to_string()
    }
}

impl fmt::Display for RelevanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A label attached to the document at 1-based rank `source_num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgedSource {
    pub source_num: usize,
    pub score: RelevanceLabel,
}

/// Labels of a judged list, in rank order.
pub fn labels_of(judged: &[JudgedSource]) -> Vec<RelevanceLabel> {
    judged.iter().map(|j| j.score).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error,
}

/// One judged ranking (base or reranked) inside a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSide {
    pub relevance_ratings: Vec<JudgedSource>,
    /// Scores at the cutoff used when the labels were collected.
    pub calculated_scores: MetricsResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<String>>,
}

impl AssessmentSide {
    pub fn labels(&self) -> Vec<RelevanceLabel> {
        labels_of(&self.relevance_ratings)
    }
}

/// One persisted assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<Cutoff>,
    pub status: RecordStatus,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<AssessmentSide>,
    #[serde(default, alias = "pongo", skip_serializing_if = "Option::is_none")]
    pub reranked: Option<AssessmentSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssessmentRecord {
    pub fn success(
        query: &str,
        cutoff: Cutoff,
        base: AssessmentSide,
        reranked: Option<AssessmentSide>,
        reranker_error: Option<String>,
    ) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            created_at: Some(Utc::now()),
            cutoff: Some(cutoff),
            status: RecordStatus::Success,
            query: query.to_string(),
            base: Some(base),
            reranked,
            reranker_error,
            error: None,
        }
    }

    pub fn failed(query: &str, cutoff: Cutoff, error: String) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            created_at: Some(Utc::now()),
            cutoff: Some(cutoff),
            status: RecordStatus::Error,
            query: query.to_string(),
            base: None,
            reranked: None,
            reranker_error: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == RecordStatus::Error
    }
}
