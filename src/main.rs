mod args;
mod audio;
mod background;
mod caption;
mod compose;
mod config;
mod error;
mod manifest;
mod pipeline;
mod scratch;
mod subtitle;
mod tips;
mod tts;
mod utils;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::config::Config;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Could not load .env: {}", e);
        }
    }
    let config = Config::from_args(args)?;

    info!("Starting tech tip video generation ({} tips)", config.tip_count);
    let out_dir = config.out_dir.clone();
    let pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run().await?;

    for failure in &report.failures {
        warn!(
            "Tip {} skipped ({}): {}",
            failure.index, failure.reason, failure.tip
        );
    }
    info!("Process complete.");
    println!(
        "Done. {} videos in {}/ ({} failed), log at {}",
        report.manifest.len(),
        out_dir.display(),
        report.failures.len(),
        report.manifest_path.display()
    );
    Ok(())
}
