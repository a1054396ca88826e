//! topcolors CLI: report the three most frequent colors of each image URL.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use topcolors::analysis::HttpFetcher;
use topcolors::cache::DedupCache;
use topcolors::config::Config;
use topcolors::engine::Pipeline;
use topcolors::io::{OutputFormat, ReportWriter, read_urls};
use topcolors::telemetry::{TelemetryConfig, init_telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "topcolors", about = "Top-3 colors for a list of image URLs")]
struct Cli {
    /// File with one image URL per line
    input: Option<PathBuf>,
    /// Where to write the results
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,
    /// Concurrent fetch/decode workers
    #[arg(short, long)]
    workers: Option<usize>,
    /// Capacity of the internal queues
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// Per-fetch timeout in seconds
    #[arg(long)]
    fetch_timeout: Option<u64>,
    /// Output format (csv or jsonl)
    #[arg(long)]
    format: Option<OutputFormat>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(n) = cli.workers {
        config.workers = n;
    }
    if let Some(n) = cli.queue_capacity {
        config.queue_capacity = Some(n);
    }
    if let Some(secs) = cli.fetch_timeout {
        config.fetch_timeout_secs = secs;
    }
    if let Some(format) = cli.format {
        config.output_format = format;
    }
    config.validate()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "topcolors".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let input = cli.input.unwrap_or_else(|| {
        info!("no input file given, using ./input.txt");
        PathBuf::from("input.txt")
    });

    let urls = read_urls(&input).await?;
    let mut writer = ReportWriter::create(&cli.output, config.output_format).await?;

    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let pipeline = Pipeline::new(fetcher, Arc::new(DedupCache::new()), config.pipeline());

    let mut run = pipeline.start(urls);
    while let Some(report) = run.next().await {
        writer.write(&report).await?;
    }
    let stats = run.finish().await?;
    let written = writer.finish().await?;

    println!(
        "{written} result(s) written to {} ({} analyzed, {} cache hit(s), {} coalesced, {} error(s), peak {} active)",
        cli.output.display(),
        stats.analyzed,
        stats.cache_hits,
        stats.coalesced,
        stats.errors,
        stats.peak_active,
    );
    Ok(())
}
