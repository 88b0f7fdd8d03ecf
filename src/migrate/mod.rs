//! Reconciliation Engine.
//!
//! Migrates every release of one source repository onto the repository of
//! the same name under the target owner. Each release is looked up on the
//! target before it is created and each asset before it is transferred, so
//! a run can be repeated against a partially migrated target.
//!
//! Failures stay local: a release that cannot be created is counted and
//! skipped, an asset that cannot be transferred is logged and skipped, and
//! a failed latest-flag edit is only a warning.

pub mod matching;

use log::{debug, info, warn};
use std::ops::AddAssign;
use std::sync::Arc;

use crate::error::MigrateError;
use crate::github::{Release, ReleaseDirectory, ReleasePatch, RepoRef};
use crate::notes::BodyTransform;
use crate::transfer::AssetTransfer;

/// Release counters for one repository or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Source releases seen.
    pub releases: usize,
    /// Releases that could not be created on the target.
    pub failed: usize,
}

impl Outcome {
    pub fn succeeded(&self) -> usize {
        self.releases.saturating_sub(self.failed)
    }
}

impl AddAssign for Outcome {
    fn add_assign(&mut self, other: Self) {
        self.releases += other.releases;
        self.failed += other.failed;
    }
}

pub struct Reconciler<S, T, X>
where
    S: ReleaseDirectory,
    T: ReleaseDirectory,
    X: AssetTransfer,
{
    source: S,
    target: Arc<T>,
    transfer: X,
    transforms: Vec<Box<dyn BodyTransform>>,
    default_owner: Option<String>,
    target_owner: String,
}

impl<S, T, X> Reconciler<S, T, X>
where
    S: ReleaseDirectory,
    T: ReleaseDirectory,
    X: AssetTransfer,
{
    pub fn new(source: S, target: Arc<T>, transfer: X, target_owner: impl Into<String>) -> Self {
        Self {
            source,
            target,
            transfer,
            transforms: Vec::new(),
            default_owner: None,
            target_owner: target_owner.into(),
        }
    }

    /// Owner used for repositories given without one.
    pub fn with_default_owner(mut self, owner: Option<String>) -> Self {
        self.default_owner = owner;
        self
    }

    /// Appends a release-notes rewrite stage.
    pub fn with_transform(mut self, transform: Box<dyn BodyTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Resolves `spec` (`name` or `owner/name`) and migrates it.
    pub async fn migrate(&self, spec: &str) -> Result<Outcome, MigrateError> {
        let repo = RepoRef::resolve(spec, self.default_owner.as_deref())?;
        Ok(self.migrate_repository(&repo).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn migrate_repository(&self, repo: &RepoRef) -> Outcome {
        let target_repo = repo.with_owner(&self.target_owner);

        info!("Fetching releases from repository {}...", repo);
        let releases = match self.source.list_releases(repo).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!("Could not list all releases of {}: {}", repo, e);
                e.fetched
            }
        };

        let latest_id = match self.source.get_latest_release(repo).await {
            Ok(latest) => Some(latest.id),
            Err(e) => {
                warn!("Could not fetch latest release of {}: {}", repo, e);
                None
            }
        };

        info!("{} releases fetched from {}", releases.len(), repo);

        let mut outcome = Outcome {
            releases: releases.len(),
            failed: 0,
        };
        let mut new_latest: Option<(u64, String)> = None;

        for source_release in &releases {
            let release = self.rewrite_body(repo, source_release);
            info!("Migrating release {} to {}...", release.display_name(), target_repo);

            let target_release = match self.place_release(&target_repo, &release).await {
                Placement::Ready(target_release) => target_release,
                Placement::Skipped => continue,
                Placement::Failed => {
                    outcome.failed += 1;
                    continue;
                }
            };

            if latest_id == Some(release.id) {
                new_latest = Some((target_release.id, release.display_name().to_string()));
            }

            self.transfer_assets(&release, &target_release).await;
        }

        match new_latest {
            Some((id, name)) => {
                info!("Marking release {} as latest in {}", name, target_repo);
                if let Err(e) = self
                    .target
                    .edit_release(&target_repo, id, &ReleasePatch::make_latest())
                    .await
                {
                    warn!("Error marking release {} as latest in {}: {}", name, target_repo, e);
                }
            }
            None if latest_id.is_some() => {
                warn!(
                    "Could not mark latest release in {}: its source release was not migrated",
                    target_repo
                );
            }
            None => debug!("{} has no latest release to carry over", repo),
        }

        if outcome.failed > 0 {
            warn!(
                "{} of {} releases failed to migrate from {}",
                outcome.failed, outcome.releases, repo
            );
        } else {
            info!("All {} releases of {} migrated", outcome.releases, repo);
        }

        outcome
    }

    /// Runs the body transforms in order. A failing stage keeps the body
    /// produced so far.
    fn rewrite_body(&self, repo: &RepoRef, release: &Release) -> Release {
        if self.transforms.is_empty() {
            return release.clone();
        }

        let mut body = release.body.clone().unwrap_or_default();
        for transform in &self.transforms {
            match transform.transform(repo, release, &body) {
                Ok(rewritten) => body = rewritten,
                Err(e) => warn!(
                    "Error applying {} to release {}: {:#}",
                    transform.name(),
                    release.display_name(),
                    e
                ),
            }
        }

        Release {
            body: Some(body),
            ..release.clone()
        }
    }

    /// Finds or creates the target counterpart of `release`.
    async fn place_release(&self, target_repo: &RepoRef, release: &Release) -> Placement {
        if let Some(existing) = self.find_equivalent(target_repo, release).await {
            info!(
                "Release {} already exists with matching tag, name and commitish, skipping creation",
                release.display_name()
            );
            return Placement::Ready(existing);
        }

        match self
            .target
            .create_release(target_repo, &release.to_new_release())
            .await
        {
            Ok(created) => {
                info!("Created release {} in {}", release.display_name(), target_repo);
                Placement::Ready(created)
            }
            Err(e) if e.is_conflict() => {
                info!(
                    "Release {} already exists in {}, fetching existing release",
                    release.display_name(),
                    target_repo
                );
                match self
                    .target
                    .get_release_by_tag(target_repo, &release.tag_name)
                    .await
                {
                    Ok(existing) => Placement::Ready(existing),
                    Err(e) => {
                        warn!(
                            "Could not retrieve existing release {}: {}",
                            release.display_name(),
                            e
                        );
                        Placement::Skipped
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Error creating release {} in {}: {}",
                    release.display_name(),
                    target_repo,
                    e
                );
                Placement::Failed
            }
        }
    }

    async fn find_equivalent(&self, target_repo: &RepoRef, release: &Release) -> Option<Release> {
        match self
            .target
            .get_release_by_tag(target_repo, &release.tag_name)
            .await
        {
            Ok(existing) if matching::is_equivalent(&existing, release) => Some(existing),
            Ok(_) => {
                debug!(
                    "Tag {} exists in {} with a different name or commitish",
                    release.tag_name, target_repo
                );
                None
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!(
                    "Could not look up tag {} in {}: {}",
                    release.tag_name, target_repo, e
                );
                None
            }
        }
    }

    async fn transfer_assets(&self, release: &Release, target_release: &Release) {
        for asset in &release.assets {
            if matching::asset_exists(target_release, asset) {
                info!(
                    "Asset {} already exists in release {}, skipping",
                    asset.name,
                    release.display_name()
                );
                continue;
            }

            if let Err(e) = self.transfer.transfer(asset, target_release).await {
                warn!(
                    "Error transferring asset {} of release {}: {}",
                    asset.name,
                    release.display_name(),
                    e
                );
            }
        }
    }
}

enum Placement {
    /// The target release to attach assets to.
    Ready(Release),
    /// Not counted as a failure; nothing more to do for this release.
    Skipped,
    Failed,
}
