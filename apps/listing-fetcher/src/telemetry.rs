//! Tracing Setup
//!
//! Console logging through `tracing-subscriber`.
//!
//! # Configuration
//!
//! - `RUST_LOG`: extra filter directives (default: `listing_fetcher=info`)
//! - `LOG_FORMAT`: `json` for one JSON object per line, anything else for text

use tracing_subscriber::EnvFilter;

/// Default filter directive for this crate.
const DEFAULT_DIRECTIVE: &str = "listing_fetcher=info";

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant guaranteed
/// to parse.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
#[allow(clippy::expect_used)]
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(
        DEFAULT_DIRECTIVE
            .parse()
            .expect("static directive 'listing_fetcher=info' is valid"),
    );

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
