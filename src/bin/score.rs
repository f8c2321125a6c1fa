use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use nft_snipe::config::{AppConfig, CONFIG_PATH};
use nft_snipe::engine::{self, ScoreOptions};
use nft_snipe::reporter::{self, BatchSummary};
use nft_snipe::types::Asset;

#[derive(Parser)]
#[command(name = "score", about = "NFT rarity / snipe scoring pipeline")]
struct Args {
    /// JSON file holding an array of scraped asset records
    #[arg(long)]
    input: PathBuf,

    /// Collection config file (TOML)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Flag snipe candidates (requires a [snipe] config section)
    #[arg(long)]
    snipe: bool,

    /// Print a batch summary after the scored records
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Config file is optional unless --snipe needs its ceilings
    let config = if args.config.exists() {
        AppConfig::load(&args.config)?
    } else {
        AppConfig::default()
    };

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let assets: Vec<Asset> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    info!("Loaded {} assets from {}", assets.len(), args.input.display());

    let snipe = if args.snipe {
        let snipe_config = config
            .snipe
            .context("--snipe requires a [snipe] section in the config")?;
        Some(snipe_config.into_criteria()?)
    } else {
        None
    };

    let opts = ScoreOptions {
        collection_size: config.collection.collection_size,
        snipe,
    };
    let scored = engine::process_batch(&assets, &opts)?;
    info!("Scored {} assets", scored.len());

    reporter::report_scored(&scored);
    if args.summary {
        reporter::report_summary(&BatchSummary::from_batch(&scored));
    }

    Ok(())
}
