//! Exponential backoff with jitter for search API requests.
//!
//! | Retryable | Non-Retryable |
//! |-----------|---------------|
//! | HTTP 429 (Rate Limited) | HTTP 400 (Bad Request) |
//! | HTTP 408 (Request Timeout) | HTTP 401/403 (Auth Errors) |
//! | HTTP 5xx | HTTP 404 (Not Found) |
//! | Connection errors and timeouts | Undecodable bodies |

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::StatusCode;

use super::config::TransportRetryConfig;

/// Error category for determining retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - use Retry-After if available.
    RateLimited,
    /// Transient failure.
    Retryable,
    /// Permanent failure.
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
#[must_use]
pub const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500..=599 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Parse a `Retry-After` header value.
///
/// Supports both delta-seconds (e.g., "120") and HTTP-date formats. Dates in
/// the past yield a zero delay.
#[must_use]
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Exponential backoff calculator.
#[derive(Debug)]
pub struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    /// Create a calculator from a retry configuration.
    #[must_use]
    pub const fn new(config: &TransportRetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter_factor: config.jitter_factor,
        }
    }

    /// Attempts made so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failed attempt and get the delay before the next one.
    ///
    /// Returns `None` once the attempt budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(self.apply_jitter(backoff).min(self.max_backoff))
    }

    /// Random value in `[backoff * (1 - jitter), backoff * (1 + jitter)]`.
    fn apply_jitter(&self, backoff: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return backoff;
        }
        let secs = backoff.as_secs_f64();
        let spread = secs * self.jitter_factor;
        let min = (secs - spread).max(0.0);
        let max = secs + spread;
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }
}
