//! HTTP client with built-in retry logic and rate-limit waiting.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use super::retry::{
    MAX_RETRIES, RETRY_DELAY_MS, is_retryable_status, now_epoch, rate_limit_wait,
};

/// A response that came back with an unsuccessful status.
///
/// Callers downcast to this to tell "not found" or "already exists" apart
/// from other failures.
#[derive(Debug)]
pub struct StatusError {
    pub status: StatusCode,
    pub message: String,
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for StatusError {}

impl StatusError {
    /// Drains the body of a failed response into an error.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self {
            status,
            message: error_message(&body),
        }
    }
}

/// Pulls `message` out of a GitHub error document, keeping the raw body
/// when it is something else.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if body.contains("already_exists") => {
            format!("{} (already_exists)", parsed.message)
        }
        Ok(parsed) => parsed.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Sends the request produced by `build` and returns the response,
    /// whatever its status.
    ///
    /// Rate-limited responses are waited out and re-sent without counting as
    /// an attempt. Network errors and 5xx responses are retried up to
    /// [`MAX_RETRIES`] attempts; the last 5xx response is returned as is.
    pub async fn send<F, Fut>(&self, operation_name: &str, build: F) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<RequestBuilder>>,
    {
        let mut attempt = 1;

        loop {
            let request = build().await?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if let Some(wait) = rate_limit_wait(status, response.headers(), now_epoch()) {
                        warn!(
                            "{}: rate limit exhausted, waiting {}s for it to reset...",
                            operation_name,
                            wait.as_secs()
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if is_retryable_status(status) && attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed (HTTP {}), retrying in {}ms...",
                            operation_name,
                            attempt,
                            MAX_RETRIES,
                            status.as_u16(),
                            RETRY_DELAY_MS
                        );
                        attempt += 1;
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                        );
                        attempt += 1;
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                        continue;
                    }

                    return Err(anyhow::Error::from(e)).with_context(|| {
                        format!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
                    });
                }
            }
        }
    }

    /// Like [`HttpClient::send`], but turns an unsuccessful status into a
    /// [`StatusError`].
    pub async fn send_ok<F, Fut>(&self, operation_name: &str, build: F) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<RequestBuilder>>,
    {
        let response = self.send(operation_name, build).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StatusError::from_response(response).await.into())
        }
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let client = &self.client;
        let response = self
            .send_ok("GET JSON", || async move { Ok(client.get(url).query(query)) })
            .await?;

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }

    /// Downloads a URL into the writer returned by `create_writer`.
    ///
    /// The writer is only created once the server has answered with a
    /// success status, so a failed request leaves nothing behind.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let client = &self.client;
        let mut response = self
            .send_ok("Download", || async move {
                Ok(client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/octet-stream"))
            })
            .await?;

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}
