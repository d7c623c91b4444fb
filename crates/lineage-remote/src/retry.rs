//! Rate-limit-aware retry policy
//!
//! Only `429 Too Many Requests` is retried. When the server says how long to
//! wait (`Retry-After`, or an exhausted `X-RateLimit-Remaining` with
//! `X-RateLimit-Reset`), the request is always retried after that wait.
//! Without a hint the policy waits a fixed fallback interval and gives up
//! after `max_retries` retries.
//!
//! State lives in a [`RetryContext`], created once per logical fetch.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of retries without a server hint
const MAX_RETRIES: u32 = 3;

/// Wait between retries without a server hint
const RETRY_INTERVAL_NO_HINT_SECS: u64 = 30;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Reset values above this are epoch seconds rather than a delta
const EPOCH_THRESHOLD: i64 = 1_000_000_000;

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed when the server gives no hint
    pub max_retries: u32,
    /// Wait between retries when the server gives no hint (seconds)
    pub fallback_interval_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            fallback_interval_secs: RETRY_INTERVAL_NO_HINT_SECS,
        }
    }
}

impl RetryConfig {
    /// Set the number of retries without a hint
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fallback wait
    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval_secs = interval.as_secs();
        self
    }
}

/// Rate-limit signals carried by a response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitHints {
    /// Parsed `Retry-After`
    pub retry_after: Option<Duration>,
    /// Parsed `X-RateLimit-Remaining`
    pub remaining: Option<u64>,
    /// Parsed `X-RateLimit-Reset`, as a wait from now
    pub reset: Option<Duration>,
}

impl RateLimitHints {
    /// Parse hints relative to the current time
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_headers_at(headers, Utc::now())
    }

    /// Parse hints relative to `now`
    pub fn from_headers_at(headers: &HeaderMap, now: DateTime<Utc>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        };

        let retry_after = header(RETRY_AFTER.as_str()).and_then(|v| parse_retry_after(v, now));
        let remaining = header(RATE_LIMIT_REMAINING).and_then(|v| v.parse().ok());
        let reset = header(RATE_LIMIT_RESET).and_then(|v| parse_reset(v, now));

        Self {
            retry_after,
            remaining,
            reset,
        }
    }

    /// Wait the server asked for, if any
    pub fn wait_hint(&self) -> Option<Duration> {
        self.retry_after.or(match self.remaining {
            Some(0) => self.reset,
            _ => None,
        })
    }
}

impl fmt::Display for RateLimitHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(retry_after) = self.retry_after {
            parts.push(format!("retry-after={}s", retry_after.as_secs()));
        }
        if let Some(remaining) = self.remaining {
            parts.push(format!("remaining={}", remaining));
        }
        if let Some(reset) = self.reset {
            parts.push(format!("reset={}s", reset.as_secs()));
        }
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// `Retry-After` is either delta seconds or an HTTP-date
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some(until(at, now))
}

/// `X-RateLimit-Reset` is either delta seconds or epoch seconds
fn parse_reset(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let secs = value.parse::<i64>().ok()?;
    if secs > EPOCH_THRESHOLD {
        let at = DateTime::from_timestamp(secs, 0)?;
        Some(until(at, now))
    } else {
        Some(Duration::from_secs(secs.max(0) as u64))
    }
}

fn until(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Per-request retry state
#[derive(Debug, Clone)]
pub struct RetryContext {
    config: RetryConfig,
    /// Retries granted so far
    retries: u32,
    /// Wait before the next retry
    interval: Duration,
}

impl RetryContext {
    /// Fresh state for one logical fetch
    pub fn new(config: RetryConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.fallback_interval_secs),
            config,
            retries: 0,
        }
    }

    /// Decide whether to retry after a response
    ///
    /// Updates the wait returned by [`retry_interval`](Self::retry_interval).
    pub fn should_retry(&mut self, status: StatusCode, headers: &HeaderMap) -> bool {
        if status != StatusCode::TOO_MANY_REQUESTS {
            return false;
        }

        let hints = RateLimitHints::from_headers(headers);
        if let Some(hint) = hints.wait_hint() {
            self.interval = hint;
            self.retries += 1;
            warn!(
                wait_secs = self.interval.as_secs(),
                hints = %hints,
                "Server signalled 429, retrying after server-provided wait"
            );
            return true;
        }

        self.interval = Duration::from_secs(self.config.fallback_interval_secs);
        if self.retries < self.config.max_retries {
            self.retries += 1;
            warn!(
                attempt = self.retries,
                wait_secs = self.interval.as_secs(),
                "Server signalled 429 with no retry hint, retrying"
            );
            true
        } else {
            warn!(
                max_retries = self.config.max_retries,
                "Server signalled 429 with no retry hint and max retries reached, giving up"
            );
            false
        }
    }

    /// Wait before the next retry
    pub fn retry_interval(&self) -> Duration {
        self.interval
    }

    /// Wait before the next retry, in milliseconds
    pub fn retry_interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    /// Retries granted so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_hint_always_retries() {
        let mut ctx = RetryContext::new(RetryConfig::default());
        let hinted = headers(&[("retry-after", "5")]);

        for _ in 0..10 {
            assert!(ctx.should_retry(StatusCode::TOO_MANY_REQUESTS, &hinted));
            assert_eq!(ctx.retry_interval_ms(), 5000);
        }
    }

    #[test]
    fn test_no_hint_retries_three_times() {
        let mut ctx = RetryContext::new(RetryConfig::default());
        let none = HeaderMap::new();

        for _ in 0..3 {
            assert!(ctx.should_retry(StatusCode::TOO_MANY_REQUESTS, &none));
            assert_eq!(ctx.retry_interval_ms(), 30_000);
        }
        assert!(!ctx.should_retry(StatusCode::TOO_MANY_REQUESTS, &none));
        assert_eq!(ctx.retries(), 3);
    }

    #[test]
    fn test_other_statuses_never_retry() {
        let mut ctx = RetryContext::new(RetryConfig::default());
        let hinted = headers(&[("retry-after", "5")]);
        for status in [
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(!ctx.should_retry(status, &hinted));
        }
        assert_eq!(ctx.retries(), 0);
    }

    #[test]
    fn test_zero_hint_is_honored() {
        let mut ctx = RetryContext::new(RetryConfig::default());
        assert!(ctx.should_retry(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("retry-after", "0")])
        ));
        assert_eq!(ctx.retry_interval_ms(), 0);
    }

    #[test]
    fn test_http_date_retry_after() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:28:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        let hints = RateLimitHints::from_headers_at(
            &headers(&[("retry-after", "Wed, 21 Oct 2015 07:28:12 GMT")]),
            now,
        );
        assert_eq!(hints.retry_after, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_rate_limit_reset() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let delta = RateLimitHints::from_headers_at(
            &headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "7")]),
            now,
        );
        assert_eq!(delta.wait_hint(), Some(Duration::from_secs(7)));

        let epoch = RateLimitHints::from_headers_at(
            &headers(&[
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", "1700000020"),
            ]),
            now,
        );
        assert_eq!(epoch.wait_hint(), Some(Duration::from_secs(20)));

        let not_exhausted = RateLimitHints::from_headers_at(
            &headers(&[("x-ratelimit-remaining", "10"), ("x-ratelimit-reset", "7")]),
            now,
        );
        assert_eq!(not_exhausted.wait_hint(), None);
    }

    #[test]
    fn test_configured_fallback() {
        let config = RetryConfig::default()
            .with_max_retries(1)
            .with_fallback_interval(Duration::from_secs(2));
        let mut ctx = RetryContext::new(config);
        let none = HeaderMap::new();
        assert!(ctx.should_retry(StatusCode::TOO_MANY_REQUESTS, &none));
        assert_eq!(ctx.retry_interval_ms(), 2000);
        assert!(!ctx.should_retry(StatusCode::TOO_MANY_REQUESTS, &none));
    }
}
