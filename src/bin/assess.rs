//! Assessment CLI: judge each query's ranked documents and append results to the store.

use anyhow::Context;
use clap::Parser;
use rankassess::{model::RecordStatus, AssessmentStore, Assessor, Config, Cutoff};
use serde::Deserialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Run LLM-judged relevance assessments over a query set.
#[derive(Parser, Debug)]
#[command(name = "assess")]
struct Args {
    /// JSON file: [{"query": "...", "documents": ["most relevant first", ...]}, ...]
    #[arg(long)]
    queries: PathBuf,

    /// Also rerank each list and judge the reranked order (needs a reranker API key).
    #[arg(long)]
    rerank: bool,

    /// Documents scored per query; -1 scores all (default from config).
    #[arg(long, allow_hyphen_values = true)]
    cutoff: Option<i64>,

    /// Assessment store path (default from config).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Do not store raw document text in records.
    #[arg(long)]
    no_docs: bool,
}

#[derive(Debug, Deserialize)]
struct QueryCase {
    query: String,
    documents: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.assessment.log_level.as_str()),
    )
    .init();

    let cutoff = args.cutoff.map(Cutoff::from_raw).unwrap_or_else(|| config.cutoff());
    let store_path = args.store.unwrap_or_else(|| config.store_path().to_path_buf());
    let include_docs = config.assessment.include_docs && !args.no_docs;

    let cases_json = std::fs::read_to_string(&args.queries)
        .with_context(|| format!("Failed to read {}", args.queries.display()))?;
    let cases: Vec<QueryCase> =
        serde_json::from_str(&cases_json).context("Invalid queries JSON")?;

    if cases.is_empty() {
        anyhow::bail!("No queries in {}", args.queries.display());
    }

    let assessor = Assessor::from_config(&config, AssessmentStore::new(&store_path))?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    println!(
        "Assessing {} queries (cutoff {}, rerank: {}) into {}\n",
        cases.len(),
        cutoff,
        args.rerank,
        store_path.display()
    );

    let mut succeeded = 0;
    let mut failed = 0;

    for case in &cases {
        let outcome = assessor
            .run_assessment(
                &case.query,
                &case.documents,
                args.rerank,
                cutoff,
                include_docs,
                &cancel,
            )
            .await?;

        match (outcome.status, outcome.metrics) {
            (RecordStatus::Success, Some(metrics)) => {
                succeeded += 1;
                let reranked = metrics
                    .reranked
                    .map(|r| format!(", reranked nDCG {:.3}", r.ndcg))
                    .unwrap_or_default();
                println!(
                    "  {} (nDCG {:.3}, hit index {}{})",
                    case.query, metrics.base.ndcg, metrics.base.hit_index, reranked
                );
            }
            _ => {
                failed += 1;
                println!("  {} (skipped: judge failure)", case.query);
            }
        }
    }

    println!("\n{} assessed, {} skipped. Run `evaluate` for aggregate scores.", succeeded, failed);
    Ok(())
}
