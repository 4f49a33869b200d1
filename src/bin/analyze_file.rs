//! Runs the comment pipeline over a local JSON or JSON-lines dump of
//! `{"text": ..., "author": ...}` records and prints the report.

use anyhow::Context;
use clap::Parser;
use comment_checker::{config::AppConfig, source::StaticCommentSource, LexiconScorer, Pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "analyze_file", about = "Analyze a comment dump without touching the network")]
struct Args {
    /// JSON array or JSON-lines file of comment records
    path: PathBuf,

    /// Maximum number of records to read (defaults to MAX_COMMENTS)
    #[arg(long)]
    cap: Option<usize>,

    /// Number of analyzed comments to keep in the sample (defaults to SAMPLE_LIMIT)
    #[arg(long)]
    sample_limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env();

    let source = StaticCommentSource::from_json_file(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    info!("📂 Loaded {} records from {}", source.len(), args.path.display());

    let pipeline = Pipeline::new(Arc::new(LexiconScorer::new()), config.sarcasm);
    let report = pipeline.analyze_comments(
        source.items(),
        args.cap.unwrap_or(config.max_comments),
        args.sample_limit.unwrap_or(config.sample_limit),
    )?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
