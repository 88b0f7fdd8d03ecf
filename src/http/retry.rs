//! Retry policy for GitHub requests: transient failures get a bounded number
//! of attempts, primary rate-limit exhaustion gets an unbounded wait.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Maximum number of attempts for network errors and 5xx responses.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Extra seconds slept past `x-ratelimit-reset` so the window has really rolled over.
pub const RATE_LIMIT_PADDING_SECS: u64 = 1;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
const RETRY_AFTER: &str = "retry-after";

/// Returns how long to wait before re-sending, if the response says the
/// rate limit is exhausted.
///
/// GitHub signals this with 403 or 429 plus either `retry-after` (seconds)
/// or `x-ratelimit-remaining: 0` and `x-ratelimit-reset` (epoch seconds).
/// A 403 without those headers is a plain permission failure.
pub fn rate_limit_wait(status: StatusCode, headers: &HeaderMap, now_epoch: u64) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    if let Some(secs) = header_u64(headers, RETRY_AFTER) {
        return Some(Duration::from_secs(secs));
    }

    let remaining = headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    if remaining != Some("0") {
        return None;
    }

    let reset = header_u64(headers, RATE_LIMIT_RESET)?;
    Some(Duration::from_secs(
        reset.saturating_sub(now_epoch) + RATE_LIMIT_PADDING_SECS,
    ))
}

/// Whether a response status is worth another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
}

pub(crate) fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
