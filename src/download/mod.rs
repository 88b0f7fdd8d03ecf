use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

/// Downloads a URL into `dest`, creating the file through the runtime.
///
/// Returns the number of bytes written.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime + ?Sized>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    debug!("Downloading {} to {:?}...", url, dest);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create file at {:?}", dest))
        })
        .await?;

    debug!("Download of {:?} complete ({} bytes).", dest, bytes);
    Ok(bytes)
}
