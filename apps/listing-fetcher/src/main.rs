//! Listing Fetcher Binary
//!
//! Harvests every listing matching the configured search, working around the
//! API's per-request record cap.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin listing-fetcher -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `LISTING_FETCHER_CONFIG`: Config file path when no argument is given
//!   (default: config.yaml; built-in defaults if that file is absent)
//! - `RUST_LOG`: Log filter (default: `listing_fetcher=info`)
//! - `LOG_FORMAT`: `json` for structured logs

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use listing_fetcher::application::use_cases::{HarvestReport, HarvestUseCase};
use listing_fetcher::config::{Config, DEFAULT_CONFIG_PATH, load_config};
use listing_fetcher::infrastructure::output::JsonFileWriter;
use listing_fetcher::infrastructure::search_api::SearchApiClient;
use listing_fetcher::observability::init_metrics;
use listing_fetcher::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    let config = resolve_config()?;
    log_config(&config);

    if let Some(metrics) = config.observability.metrics() {
        init_metrics(&metrics).context("failed to start metrics exporter")?;
    }

    let client = SearchApiClient::new(&config.search.to_api_config())
        .context("failed to build search client")?;
    let harvest = HarvestUseCase::new(
        Arc::new(client),
        config.partition.clone(),
        config.fetch.to_executor_config(),
    );

    let base_query = config.query.search_query();
    let bounds = config.query.bounds().context("invalid query bounds")?;

    let outcome = harvest.run(&base_query, &bounds).await?;
    log_report(&outcome.report);

    let writer = JsonFileWriter::new(&config.output.path);
    if let Err(e) = writer.write(&outcome.aggregate.records) {
        tracing::error!(error = %e, "Failed to write records");
    }
    if let Some(report_path) = &config.output.report_path
        && let Err(e) = JsonFileWriter::new(report_path).write(&outcome.report)
    {
        tracing::error!(error = %e, "Failed to write report");
    }

    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Config from the first argument, `LISTING_FETCHER_CONFIG`, or config.yaml.
///
/// Only the implicit default path may be missing; built-in defaults apply then.
fn resolve_config() -> anyhow::Result<Config> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LISTING_FETCHER_CONFIG").ok());

    match explicit {
        Some(path) => {
            load_config(Some(&path)).with_context(|| format!("failed to load config from {path}"))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(None).context("failed to load config.yaml")
        }
        None => {
            tracing::info!("No config file found, using built-in defaults");
            Ok(Config::default())
        }
    }
}

fn log_config(config: &Config) {
    tracing::info!(
        endpoint = %config.search.endpoint,
        low = config.query.low,
        high = config.query.high,
        threshold = config.query.threshold,
        concurrency = config.fetch.concurrency,
        max_retries = config.fetch.max_retries,
        output = %config.output.path,
        "Starting listing fetcher"
    );
}

fn log_report(report: &HarvestReport) {
    let elapsed = report.finished_at - report.started_at;
    tracing::info!(
        run_id = %report.run_id,
        initial_estimate = report.initial_estimate,
        records = report.records,
        ranges = report.ranges.len(),
        probes = report.probe_count,
        degraded = report.degraded_ranges.len(),
        completeness = report.completeness(),
        elapsed_ms = elapsed.num_milliseconds(),
        "Harvest complete"
    );
    for range in &report.degraded_ranges {
        tracing::warn!(%range, "Range degraded; its records may be missing");
    }
}
