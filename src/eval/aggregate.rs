//! Aggregate stored assessments into MRR / hit rate / average nDCG, recomputed at a given cutoff.

use crate::error::Result;
use crate::eval::metrics::{score, Cutoff, MetricsResult};
use crate::model::{AssessmentRecord, AssessmentSide};
use crate::store::AssessmentStore;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Running sums for one side (base or reranked).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SideAccumulator {
    /// Sum of 1/hit_index; records without a hit add 0.
    pub reciprocal_rank_sum: f64,
    pub ndcg_sum: f64,
    pub hits: usize,
    pub evaluated: usize,
}

impl SideAccumulator {
    pub fn add(&mut self, metrics: &MetricsResult) {
        self.reciprocal_rank_sum += metrics.reciprocal_rank();
        self.ndcg_sum += metrics.ndcg;
        if metrics.did_hit {
            self.hits += 1;
        }
        self.evaluated += 1;
    }

    pub fn merge(&mut self, other: &SideAccumulator) {
        self.reciprocal_rank_sum += other.reciprocal_rank_sum;
        self.ndcg_sum += other.ndcg_sum;
        self.hits += other.hits;
        self.evaluated += other.evaluated;
    }

    /// Averages over `num_elements`, which includes skipped records.
    pub fn summarize(&self, num_elements: usize) -> SideSummary {
        if num_elements == 0 {
            return SideSummary {
                evaluated: self.evaluated,
                ..SideSummary::default()
            };
        }
        let denom = num_elements as f64;
        SideSummary {
            mrr: self.reciprocal_rank_sum / denom,
            hit_rate: self.hits as f64 / denom,
            average_ndcg: self.ndcg_sum / denom,
            evaluated: self.evaluated,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SideSummary {
    pub mrr: f64,
    pub hit_rate: f64,
    pub average_ndcg: f64,
    pub evaluated: usize,
}

/// Accumulated state over a set of records at one cutoff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub num_elements: usize,
    pub skipped: usize,
    pub degraded_records: usize,
    /// Fewest labels seen in a degraded record.
    pub min_available: Option<usize>,
    pub base: SideAccumulator,
    pub reranked: Option<SideAccumulator>,
}

impl Aggregation {
    pub fn from_records(records: &[AssessmentRecord], cutoff: Cutoff) -> Self {
        let mut agg = Aggregation {
            num_elements: records.len(),
            ..Aggregation::default()
        };

        for record in records {
            let base = match (&record.base, record.is_error()) {
                (Some(base), false) => base,
                _ => {
                    log::info!("Skipping error'ed record: {:?}", record.query);
                    agg.skipped += 1;
                    continue;
                }
            };

            let mut degraded = agg.note_available(base, cutoff);
            let metrics = score(&base.labels(), cutoff);
            agg.base.add(&metrics);

            if let Some(reranked) = &record.reranked {
                degraded |= agg.note_available(reranked, cutoff);
                let metrics = score(&reranked.labels(), cutoff);
                agg.reranked.get_or_insert_with(SideAccumulator::default).add(&metrics);
            }

            if degraded {
                agg.degraded_records += 1;
            }
        }

        agg
    }

    /// Track the label count of a side judged on fewer documents than `cutoff`.
    /// Returns whether the side falls short.
    fn note_available(&mut self, side: &AssessmentSide, cutoff: Cutoff) -> bool {
        let available = side.relevance_ratings.len();
        if !cutoff.exceeds(available) {
            return false;
        }
        self.min_available = Some(self.min_available.map_or(available, |m| m.min(available)));
        true
    }

    /// Combine with an aggregation over a disjoint set of records.
    pub fn merge(&mut self, other: &Aggregation) {
        self.num_elements += other.num_elements;
        self.skipped += other.skipped;
        self.degraded_records += other.degraded_records;
        self.min_available = match (self.min_available, other.min_available) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.base.merge(&other.base);
        if let Some(other_reranked) = &other.reranked {
            self.reranked
                .get_or_insert_with(SideAccumulator::default)
                .merge(other_reranked);
        }
    }

    pub fn report(&self, cutoff: Cutoff) -> EvaluationReport {
        EvaluationReport {
            cutoff,
            num_elements: self.num_elements,
            skipped: self.skipped,
            degraded_records: self.degraded_records,
            base: self.base.summarize(self.num_elements),
            reranked: self.reranked.map(|r| r.summarize(self.num_elements)),
        }
    }
}

/// Averaged metrics across every record in a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub cutoff: Cutoff,
    pub num_elements: usize,
    pub skipped: usize,
    pub degraded_records: usize,
    pub base: SideSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reranked: Option<SideSummary>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Records: {} ({} skipped, {} below cutoff)",
            self.num_elements, self.skipped, self.degraded_records
        )?;
        write_side(f, "Base", self.cutoff, &self.base)?;
        if let Some(reranked) = &self.reranked {
            writeln!(f)?;
            write_side(f, "Reranked", self.cutoff, reranked)?;
        }
        Ok(())
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, name: &str, cutoff: Cutoff, s: &SideSummary) -> fmt::Result {
    writeln!(f, "========== {} scores ==========", name)?;
    writeln!(f, "{} MRR @ {}: {:.4}", name, cutoff, s.mrr)?;
    writeln!(f, "{} hit rate @ {}: {:.4}", name, cutoff, s.hit_rate)?;
    writeln!(f, "{} NDCG @ {}: {:.4}", name, cutoff, s.average_ndcg)
}

/// Read every record in `store_path` and summarize it at `cutoff`.
///
/// Metrics are recomputed from the stored labels, never taken from the cached scores. When
/// `cutoff` asks for more documents than a record was judged on, the available count is used
/// and a single warning is logged.
pub fn aggregate(store_path: &Path, cutoff: Cutoff) -> Result<EvaluationReport> {
    let records = AssessmentStore::new(store_path).read_all()?;
    let agg = Aggregation::from_records(&records, cutoff);

    if let Some(available) = agg.min_available {
        log::warn!(
            "{} record(s) were judged on fewer documents (as few as {}) than the evaluation cutoff ({}); the lower value is used for those records",
            agg.degraded_records,
            available,
            cutoff
        );
    }

    Ok(agg.report(cutoff))
}
