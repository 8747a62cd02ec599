//! # newsgrab
//!
//! Harvests news records from a fixed set of Chinese news platforms,
//! normalizes them into one record shape, persists them idempotently, and
//! fans out webhook digests.
//!
//! ## Usage
//!
//! ```sh
//! newsgrab --source sina --news-type hot_news
//! newsgrab -s tencent -n hot_news --interval 30
//! ```
//!
//! ## Architecture
//!
//! One run walks the harvest pipeline:
//! 1. **List fetch**: the source's list endpoint via the shared HTTP client
//! 2. **List parse**: JSONP/JSON/HTML payload into stubs (title + url)
//! 3. **Detail enrichment**: bounded concurrent fetch+parse per stub;
//!    failed items drop out without aborting the batch
//! 4. **Fan-out**: file snapshot and/or SQLite upsert, plus Feishu/DingTalk
//!    digests — persistence and notification never block each other

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod article;
mod cli;
mod config;
mod extract;
mod fetch;
mod models;
mod notify;
mod pipeline;
mod sink;
mod sources;
mod utils;

use cli::Cli;
use config::Config;
use fetch::FetchClient;
use models::Source;
use notify::Notifier;
use pipeline::HarvestPipeline;
use sink::Sink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsgrab starting up");

    let args = Cli::parse();
    debug!(?args.source, ?args.news_type, ?args.interval, "Parsed CLI arguments");

    let config = Config::load_or_default(args.config.as_deref().map(Path::new))?;

    let Some(source) = Source::parse(&args.source) else {
        error!(source = %args.source, "unknown source");
        return Err(format!("unknown source: {}", args.source).into());
    };
    let Some(extractor) = sources::extractor_for(source) else {
        let implemented: Vec<&str> = sources::IMPLEMENTED.iter().map(Source::as_str).collect();
        error!(source = %source, ?implemented, "source has no extractor yet");
        return Err(format!(
            "source {source} has no extractor yet; implemented: {}",
            implemented.join(", ")
        )
        .into());
    };

    let fetcher = Arc::new(FetchClient::new(&config.http)?);
    let sink = Sink::from_config(&config).await?;
    let notifier = Notifier::from_config(&config);
    let pipeline = HarvestPipeline::new(
        fetcher,
        extractor,
        sink,
        notifier,
        config.harvest.concurrency,
    );

    let category = args.news_type.category();
    match args.interval {
        None => {
            let summary = pipeline.run(category).await;
            info!(
                indexed = summary.indexed,
                harvested = summary.harvested,
                failed = summary.failed,
                skipped = summary.skipped,
                elapsed = ?start_time.elapsed(),
                "completed with {} items",
                summary.harvested
            );
        }
        Some(minutes) => {
            info!(minutes, "interval mode; first run starts immediately");
            let mut ticker = tokio::time::interval(Duration::from_secs(minutes.max(1) * 60));
            loop {
                ticker.tick().await;
                let summary = pipeline.run(category).await;
                info!(
                    indexed = summary.indexed,
                    harvested = summary.harvested,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    "completed with {} items",
                    summary.harvested
                );
            }
        }
    }

    Ok(())
}
