//! Ranking metrics (DCG / nDCG / hit index) and store-wide aggregation (MRR, hit rate, nDCG).

pub mod aggregate;
pub mod metrics;

pub use aggregate::{aggregate, Aggregation, EvaluationReport, SideAccumulator, SideSummary};
pub use metrics::{score, Cutoff, MetricsResult};
