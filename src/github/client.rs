use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;

use super::repo::RepoRef;
use super::types::{NewRelease, Release, ReleasePatch};
use crate::error::{ListError, MigrateError};
use crate::http::{HttpClient, StatusError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// Read/write access to the releases of repositories on one host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseDirectory: Send + Sync {
    /// Every release of `repo`, in the order the host lists them.
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>, ListError>;

    async fn get_latest_release(&self, repo: &RepoRef) -> Result<Release, MigrateError>;

    async fn get_release_by_tag(&self, repo: &RepoRef, tag: &str) -> Result<Release, MigrateError>;

    async fn create_release(
        &self,
        repo: &RepoRef,
        release: &NewRelease,
    ) -> Result<Release, MigrateError>;

    async fn edit_release(
        &self,
        repo: &RepoRef,
        id: u64,
        patch: &ReleasePatch,
    ) -> Result<(), MigrateError>;

    /// Streams `file` to a release upload URL template.
    async fn upload_asset(
        &self,
        upload_url: &str,
        file: &Path,
        name: &str,
        label: &str,
        content_type: &str,
    ) -> Result<(), MigrateError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueComments: Send + Sync {
    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<(), MigrateError>;
}

pub struct GitHub {
    http: HttpClient,
    api_url: String,
}

impl GitHub {
    pub fn new(http: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { http, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    fn releases_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.name)
    }
}

/// Maps a transport failure to the taxonomy, treating 404 as `NotFound`.
fn classify(err: anyhow::Error, missing: impl FnOnce() -> String) -> MigrateError {
    match err.downcast_ref::<StatusError>() {
        Some(status) if status.status == StatusCode::NOT_FOUND => MigrateError::NotFound(missing()),
        _ => MigrateError::transfer(err),
    }
}

/// Removes the `{?name,label}` hypermedia suffix and adds the query.
pub fn expand_upload_url(template: &str, name: &str, label: &str) -> Result<Url, MigrateError> {
    let base = match template.find('{') {
        Some(pos) => &template[..pos],
        None => template,
    };
    let mut url = Url::parse(base).map_err(|e| {
        MigrateError::Transfer(format!("Invalid upload URL '{}': {}", template, e))
    })?;
    url.query_pairs_mut()
        .append_pair("name", name)
        .append_pair("label", label);
    Ok(url)
}

#[async_trait]
impl ReleaseDirectory for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>, ListError> {
        let url = self.releases_url(repo);
        let mut releases = Vec::new();
        let mut page = 1;

        loop {
            debug!("Fetching releases page {} from {}...", page, url);

            let per_page = PER_PAGE.to_string();
            let page_number = page.to_string();
            let parsed: Vec<Release> = match self
                .http
                .get_json(
                    &url,
                    &[("per_page", per_page.as_str()), ("page", page_number.as_str())],
                )
                .await
                .with_context(|| format!("Unable to list releases of {}", repo))
            {
                Ok(parsed) => parsed,
                Err(e) => {
                    return Err(ListError {
                        fetched: releases,
                        error: MigrateError::transfer(e),
                    });
                }
            };

            let len = parsed.len();
            releases.extend(parsed);

            if len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(releases)
    }

    #[tracing::instrument(skip(self))]
    async fn get_latest_release(&self, repo: &RepoRef) -> Result<Release, MigrateError> {
        let url = format!("{}/latest", self.releases_url(repo));
        self.http
            .get_json(&url, &[])
            .await
            .context("Unable to get latest release")
            .map_err(|e| classify(e, || format!("no releases found for repository {}", repo)))
    }

    #[tracing::instrument(skip(self))]
    async fn get_release_by_tag(&self, repo: &RepoRef, tag: &str) -> Result<Release, MigrateError> {
        let mut url = Url::parse(&format!("{}/tags", self.releases_url(repo)))
            .map_err(|e| MigrateError::Transfer(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MigrateError::Transfer("Invalid API URL".to_string()))?
            .push(tag);

        self.http
            .get_json(url.as_str(), &[])
            .await
            .context("Unable to get release by tag")
            .map_err(|e| classify(e, || format!("release not found for tag {} in {}", tag, repo)))
    }

    #[tracing::instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn create_release(
        &self,
        repo: &RepoRef,
        release: &NewRelease,
    ) -> Result<Release, MigrateError> {
        let url = self.releases_url(repo);
        let client = self.http.inner();
        let url_ref = url.as_str();

        let result = self
            .http
            .send_ok("Create release", || async move {
                Ok(client.post(url_ref).json(release))
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if let Some(status) = e.downcast_ref::<StatusError>() {
                    if status.status == StatusCode::UNPROCESSABLE_ENTITY
                        && status.message.contains("already_exists")
                    {
                        return Err(MigrateError::Conflict(format!(
                            "release {} already exists in {}",
                            release.tag_name, repo
                        )));
                    }
                }
                return Err(MigrateError::transfer(
                    e.context(format!("Unable to create release {}", release.tag_name)),
                ));
            }
        };

        response
            .json::<Release>()
            .await
            .context("Failed to parse created release")
            .map_err(MigrateError::transfer)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn edit_release(
        &self,
        repo: &RepoRef,
        id: u64,
        patch: &ReleasePatch,
    ) -> Result<(), MigrateError> {
        let url = format!("{}/{}", self.releases_url(repo), id);
        let client = self.http.inner();
        let url_ref = url.as_str();

        self.http
            .send_ok("Edit release", || async move {
                Ok(client.patch(url_ref).json(patch))
            })
            .await
            .with_context(|| format!("Unable to edit release {}", id))
            .map_err(MigrateError::transfer)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, upload_url, label, content_type))]
    async fn upload_asset(
        &self,
        upload_url: &str,
        file: &Path,
        name: &str,
        label: &str,
        content_type: &str,
    ) -> Result<(), MigrateError> {
        let url = expand_upload_url(upload_url, name, label)?;
        let size = tokio::fs::metadata(file)
            .await
            .map_err(|e| MigrateError::io(file, e))?
            .len();

        debug!("Uploading {:?} ({} bytes) to {}...", file, size, url);

        let client = self.http.inner();
        let url_ref = url.as_str();

        let response = self
            .http
            .send("Upload asset", || async move {
                let body = tokio::fs::File::open(file)
                    .await
                    .context("Failed to open asset file")?;
                Ok(client
                    .post(url_ref)
                    .header(CONTENT_TYPE, content_type)
                    .header(CONTENT_LENGTH, size)
                    .body(reqwest::Body::from(body)))
            })
            .await
            .with_context(|| format!("Unable to upload asset {}", name))
            .map_err(MigrateError::transfer)?;

        if response.status() != StatusCode::CREATED {
            let status = StatusError::from_response(response).await;
            return Err(MigrateError::Transfer(format!(
                "Unable to upload asset {}: {}",
                name, status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl IssueComments for GitHub {
    #[tracing::instrument(skip(self, body))]
    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<(), MigrateError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, repo.owner, repo.name, number
        );
        let client = self.http.inner();
        let url_ref = url.as_str();
        let payload = serde_json::json!({ "body": body });
        let payload_ref = &payload;

        self.http
            .send_ok("Comment on issue", || async move {
                Ok(client.post(url_ref).json(payload_ref))
            })
            .await
            .with_context(|| format!("Unable to comment on {}#{}", repo, number))
            .map_err(MigrateError::transfer)?;
        Ok(())
    }
}
