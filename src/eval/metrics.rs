//! Rank-quality metrics: DCG, iDCG, nDCG and first-hit rank over judged labels.

use crate::model::RelevanceLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many top-ranked documents are considered when judging and scoring.
///
/// On the wire and in config a cutoff is an integer; any negative value means [`Cutoff::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Cutoff {
    All,
    Top(usize),
}

impl Cutoff {
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Cutoff::All
        } else {
            Cutoff::Top(raw as usize)
        }
    }

    /// Number of items kept out of `len`.
    pub fn limit(self, len: usize) -> usize {
        match self {
            Cutoff::All => len,
            Cutoff::Top(k) => k.min(len),
        }
    }

    /// True when this cutoff asks for more than `available` items.
    pub fn exceeds(self, available: usize) -> bool {
        matches!(self, Cutoff::Top(k) if k > available)
    }
}

impl From<i64> for Cutoff {
    fn from(raw: i64) -> Self {
        Cutoff::from_raw(raw)
    }
}

impl From<Cutoff> for i64 {
    fn from(cutoff: Cutoff) -> Self {
        match cutoff {
            Cutoff::All => -1,
            Cutoff::Top(k) => k as i64,
        }
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cutoff::All => write!(f, "all"),
            Cutoff::Top(k) => write!(f, "{}", k),
        }
    }
}

/// Scores derived from one label sequence at one cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    #[serde(rename = "DCG")]
    pub dcg: f64,
    #[serde(rename = "iDCG")]
    pub idcg: f64,
    #[serde(rename = "nDCG")]
    pub ndcg: f64,
    /// 1-based rank of the first highly relevant document, -1 if none.
    pub hit_index: i64,
    pub did_hit: bool,
}

impl MetricsResult {
    /// Reciprocal rank of the first hit; 0.0 when nothing was hit.
    pub fn reciprocal_rank(&self) -> f64 {
        if self.did_hit && self.hit_index > 0 {
            1.0 / self.hit_index as f64
        } else {
            0.0
        }
    }
}

fn discount(rank: usize) -> f64 {
    1.0 / ((rank + 1) as f64).log2()
}

/// Score a ranked label sequence.
///
/// Only the first `cutoff.limit(labels.len())` labels are considered. Binary gain:
/// a highly relevant label earns the full positional discount, anything else earns nothing,
/// while the ideal ordering earns the discount at every position.
pub fn score(labels: &[RelevanceLabel], cutoff: Cutoff) -> MetricsResult {
    let n = cutoff.limit(labels.len());

    let mut dcg = 0.0;
    let mut idcg = 0.0;
    let mut hit_index: i64 = -1;

    for (i, label) in labels.iter().take(n).enumerate() {
        let rank = i + 1;
        let gain = discount(rank);
        idcg += gain;
        if *label == RelevanceLabel::HighlyRelevant {
            dcg += gain;
            if hit_index == -1 {
                hit_index = rank as i64;
            }
        }
    }

    // n == 0 leaves idcg at zero
    let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };

    MetricsResult {
        dcg,
        idcg,
        ndcg,
        hit_index,
        did_hit: hit_index != -1,
    }
}
