//! HTTP client module with retry logic, rate-limit waiting and error handling.

mod client;
mod retry;

pub use client::{HttpClient, StatusError};
pub use retry::{MAX_RETRIES, RATE_LIMIT_PADDING_SECS, RETRY_DELAY_MS, rate_limit_wait};
