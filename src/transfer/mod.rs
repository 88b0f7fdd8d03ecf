//! Asset Transfer Pipeline: stage one asset in scratch storage, upload it to
//! the target release, then remove the staged copy.
//!
//! Transfers run one at a time. The scratch directory is shared by every
//! transfer of a process and files are named after the asset, so two
//! transfers must never overlap.

use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::download::download_file;
use crate::error::MigrateError;
use crate::github::{Release, ReleaseAsset, ReleaseDirectory};
use crate::http::HttpClient;
use crate::runtime::Runtime;

pub const DEFAULT_SCRATCH_DIR: &str = "tmp";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetTransfer: Send + Sync {
    /// Copies `asset` from its source download URL onto `target`.
    async fn transfer(&self, asset: &ReleaseAsset, target: &Release) -> Result<(), MigrateError>;
}

/// Transfers through a local scratch directory.
///
/// Downloads use the source host's client; uploads go through the target
/// release directory.
pub struct ScratchTransfer<R: Runtime, T: ReleaseDirectory> {
    runtime: R,
    source_http: HttpClient,
    target: Arc<T>,
    scratch_dir: PathBuf,
}

impl<R: Runtime, T: ReleaseDirectory> ScratchTransfer<R, T> {
    pub fn new(runtime: R, source_http: HttpClient, target: Arc<T>, scratch_dir: PathBuf) -> Self {
        Self {
            runtime,
            source_http,
            target,
            scratch_dir,
        }
    }

    /// Where `asset_name` is staged.
    pub fn scratch_path(&self, asset_name: &str) -> Result<PathBuf, MigrateError> {
        match Path::new(asset_name).file_name() {
            Some(file_name) if file_name == asset_name => Ok(self.scratch_dir.join(file_name)),
            _ => Err(MigrateError::Transfer(format!(
                "Asset name '{}' cannot be used as a file name",
                asset_name
            ))),
        }
    }
}

/// The declared content type, or one guessed from the file extension.
pub fn content_type_for(asset: &ReleaseAsset) -> String {
    if asset.content_type.is_empty() {
        mime_guess::from_path(&asset.name)
            .first_or_octet_stream()
            .to_string()
    } else {
        asset.content_type.clone()
    }
}

#[async_trait]
impl<R, T> AssetTransfer for ScratchTransfer<R, T>
where
    R: Runtime,
    T: ReleaseDirectory,
{
    #[tracing::instrument(skip(self, asset, target), fields(asset = %asset.name, release = %target.tag_name))]
    async fn transfer(&self, asset: &ReleaseAsset, target: &Release) -> Result<(), MigrateError> {
        self.runtime
            .create_dir_all(&self.scratch_dir)
            .map_err(|e| MigrateError::io(&self.scratch_dir, format!("{:#}", e)))?;

        let path = self.scratch_path(&asset.name)?;

        info!("Downloading asset {}...", asset.name);
        download_file(
            &self.runtime,
            &asset.browser_download_url,
            &path,
            &self.source_http,
        )
        .await
        .map_err(|e| {
            if e.downcast_ref::<std::io::Error>().is_some() {
                MigrateError::io(&path, format!("{:#}", e))
            } else {
                MigrateError::transfer(e.context(format!("Unable to download asset {}", asset.name)))
            }
        })?;

        info!("Uploading asset {}...", asset.name);
        // A failed upload keeps the staged file around for inspection.
        self.target
            .upload_asset(
                &target.upload_url,
                &path,
                &asset.name,
                asset.label.as_deref().unwrap_or_default(),
                &content_type_for(asset),
            )
            .await?;

        self.runtime
            .remove_file(&path)
            .map_err(|e| MigrateError::io(&path, format!("{:#}", e)))?;
        debug!("Removed scratch file {:?}", path);

        Ok(())
    }
}
