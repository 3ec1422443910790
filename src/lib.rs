pub mod assessment;
pub mod config;
pub mod error;
pub mod eval;
pub mod judge;
pub mod model;
pub mod rerank;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use assessment::{AssessmentOutcome, Assessor};
pub use config::Config;
pub use error::{AssessError, Result};
pub use eval::{aggregate, Cutoff, EvaluationReport, MetricsResult};
pub use store::AssessmentStore;
