//! Evaluation CLI: aggregate stored assessments into MRR, hit rate and nDCG.

use clap::Parser;
use rankassess::{aggregate, Config, Cutoff};
use std::path::PathBuf;

/// Report averaged ranking metrics over every assessment in a store.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
struct Args {
    /// Assessment store path (default from config).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Documents considered per record; -1 uses all judged labels (default from config).
    #[arg(long, allow_hyphen_values = true)]
    cutoff: Option<i64>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.assessment.log_level.as_str()),
    )
    .init();

    let cutoff = args.cutoff.map(Cutoff::from_raw).unwrap_or_else(|| config.cutoff());
    let store_path = args.store.unwrap_or_else(|| config.store_path().to_path_buf());

    let report = aggregate(&store_path, cutoff)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
