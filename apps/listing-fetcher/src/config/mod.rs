//! Configuration module for the listing fetcher.
//!
//! Loads the YAML configuration, interpolates environment variables and
//! validates the result before anything touches the network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_fetcher::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("threshold: {}", config.query.threshold);
//! ```

mod fetch;
mod observability;
mod output;
mod query;
mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetch::FetchConfig;
pub use observability::ObservabilityConfig;
pub use output::OutputConfig;
pub use query::{ParamValue, QueryConfig};
pub use search::{SearchConfig, TransportRetrySettings};

use crate::domain::{NUM_RECORDS_PARAM, PartitionConfig};

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search API transport.
    #[serde(default)]
    pub search: SearchConfig,
    /// Base query and bounding range.
    #[serde(default)]
    pub query: QueryConfig,
    /// Forward search tunables.
    #[serde(default)]
    pub partition: PartitionConfig,
    /// Sub-range fetching.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Output files.
    #[serde(default)]
    pub output: OutputConfig,
    /// Metrics export.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    // Search transport
    let endpoint = &config.search.endpoint;
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "search.endpoint must be an http(s) URL, got '{endpoint}'"
        )));
    }
    if config.search.timeout_secs == 0 {
        return fail("search.timeout_secs must be positive");
    }
    let retry = &config.search.retry;
    if retry.max_attempts == 0 {
        return fail("search.retry.max_attempts must be at least 1");
    }
    if retry.multiplier < 1.0 {
        return fail("search.retry.multiplier must be at least 1.0");
    }
    if !(0.0..=1.0).contains(&retry.jitter_factor) {
        return fail("search.retry.jitter_factor must be between 0.0 and 1.0");
    }

    // Query and bounds
    let query = &config.query;
    if query.low_param.is_empty() || query.high_param.is_empty() {
        return fail("query.low_param and query.high_param must be set");
    }
    if query.low_param == query.high_param {
        return fail("query.low_param and query.high_param must be different");
    }
    for reserved in [query.low_param.as_str(), query.high_param.as_str(), NUM_RECORDS_PARAM] {
        if query.params.contains_key(reserved) {
            return Err(ConfigError::ValidationError(format!(
                "query.params must not set '{reserved}'; it is managed per request"
            )));
        }
    }
    query
        .bounds()
        .map_err(|e| ConfigError::ValidationError(format!("query bounds: {e}")))?;

    // Partition tunables
    let partition = &config.partition;
    if partition.min_step_delta <= 0 {
        return fail("partition.min_step_delta must be positive");
    }
    if partition.max_growth_factor < 1 {
        return fail("partition.max_growth_factor must be at least 1");
    }
    if partition.max_probes_per_range == 0 {
        return fail("partition.max_probes_per_range must be positive");
    }

    // Fetching
    if config.fetch.concurrency == 0 {
        return fail("fetch.concurrency must be at least 1");
    }
    if !config.fetch.retry_delay_secs.is_finite() || config.fetch.retry_delay_secs < 0.0 {
        return fail("fetch.retry_delay_secs must be a non-negative number");
    }

    // Output
    if config.output.path.is_empty() {
        return fail("output.path must be set");
    }

    Ok(())
}
