use log::debug;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use std::path::PathBuf;

use crate::error::MigrateError;
use crate::github::{DEFAULT_API_URL, GitHub};
use crate::http::HttpClient;
use crate::transfer::DEFAULT_SCRATCH_DIR;

pub const USER_AGENT: &str = "ghrm";
pub const API_VERSION: &str = "2022-11-28";

/// Which repositories a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySelection {
    /// `name` or `owner/name`.
    Single(String),
    /// A file with one repository per line.
    List(PathBuf),
}

/// Unvalidated settings, as collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub source_token: Option<String>,
    pub target_token: Option<String>,
    pub source_organization: Option<String>,
    pub target_organization: Option<String>,
    pub source_hostname: Option<String>,
    pub source_api_url: Option<String>,
    pub target_api_url: Option<String>,
    pub repository: Option<String>,
    pub repository_list: Option<PathBuf>,
    pub mapping_file: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
}

/// Settings for one run. Built once by [`MigrationConfig::from_options`] and
/// never changed afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub source_token: String,
    pub target_token: String,
    pub source_organization: Option<String>,
    pub target_organization: String,
    pub source_api_url: String,
    pub target_api_url: String,
    pub repositories: RepositorySelection,
    pub mapping_file: Option<PathBuf>,
    pub scratch_dir: PathBuf,
}

impl std::fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("source_token", &mask_token(&self.source_token))
            .field("target_token", &mask_token(&self.target_token))
            .field("source_organization", &self.source_organization)
            .field("target_organization", &self.target_organization)
            .field("source_api_url", &self.source_api_url)
            .field("target_api_url", &self.target_api_url)
            .field("repositories", &self.repositories)
            .field("mapping_file", &self.mapping_file)
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

impl MigrationConfig {
    pub fn from_options(options: ConfigOptions) -> Result<Self, MigrateError> {
        let source_token = required(options.source_token, "source token")?;
        let target_token = required(options.target_token, "target token")?;
        let target_organization = required(options.target_organization, "target organization")?;
        let source_organization = options
            .source_organization
            .map(|org| org.trim().to_string())
            .filter(|org| !org.is_empty());

        let repositories = match (options.repository, options.repository_list) {
            (Some(_), Some(_)) => {
                return Err(MigrateError::Configuration(
                    "Specify either a repository or a repository list, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(MigrateError::Configuration(
                    "Either a repository or a repository list is required".to_string(),
                ));
            }
            (Some(repo), None) => {
                if source_organization.is_none() {
                    return Err(MigrateError::Configuration(
                        "A source organization is required when specifying a repository"
                            .to_string(),
                    ));
                }
                RepositorySelection::Single(repo.trim().to_string())
            }
            (None, Some(path)) => RepositorySelection::List(path),
        };

        let source_api_url = match (options.source_api_url, options.source_hostname) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(host)) if !host.trim().is_empty() => enterprise_api_url(&host),
            (None, _) => DEFAULT_API_URL.to_string(),
        };
        let target_api_url = options
            .target_api_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            source_token,
            target_token,
            source_organization,
            target_organization,
            source_api_url,
            target_api_url,
            repositories,
            mapping_file: options.mapping_file,
            scratch_dir: options
                .scratch_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
        })
    }

    pub fn source_http(&self) -> Result<HttpClient, MigrateError> {
        debug!("Source token: {}", mask_token(&self.source_token));
        build_http_client(&self.source_token)
    }

    pub fn target_http(&self) -> Result<HttpClient, MigrateError> {
        debug!("Target token: {}", mask_token(&self.target_token));
        build_http_client(&self.target_token)
    }

    pub fn source_github(&self) -> Result<GitHub, MigrateError> {
        Ok(GitHub::new(
            self.source_http()?,
            Some(self.source_api_url.clone()),
        ))
    }

    pub fn target_github(&self) -> Result<GitHub, MigrateError> {
        Ok(GitHub::new(
            self.target_http()?,
            Some(self.target_api_url.clone()),
        ))
    }
}

fn required(value: Option<String>, what: &str) -> Result<String, MigrateError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MigrateError::Configuration(format!("A {} is required", what))),
    }
}

/// API base of a GitHub Enterprise Server host.
pub fn enterprise_api_url(hostname: &str) -> String {
    let host = hostname
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}/api/v3", host)
}

/// Shows at most the first four and last four characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

/// Client with the headers every GitHub API call carries.
pub fn build_http_client(token: &str) -> Result<HttpClient, MigrateError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
        MigrateError::Configuration(format!("Token is not a valid header value: {}", e))
    })?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| MigrateError::Configuration(format!("Unable to build HTTP client: {}", e)))?;

    Ok(HttpClient::new(client))
}
