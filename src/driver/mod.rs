//! Migration Driver: turns a [`MigrationConfig`] into engine runs, one per
//! repository, and reports the summed totals.

mod summary;

use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::config::{MigrationConfig, RepositorySelection};
use crate::error::MigrateError;
use crate::github::ReleaseDirectory;
use crate::migrate::{Outcome, Reconciler};
use crate::notes::{HandleMapping, ProvenanceStamp};
use crate::runtime::Runtime;
use crate::transfer::{AssetTransfer, ScratchTransfer};

pub use summary::{IssueContext, in_github_actions, parse_issue_context, report, summary_table};

/// Repository entries of a list file: one per line, blank lines and `#`
/// comments ignored.
pub fn parse_repository_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_repository_list<R: Runtime + ?Sized>(
    runtime: &R,
    path: &Path,
) -> Result<Vec<String>, MigrateError> {
    let content = runtime
        .read_to_string(path)
        .map_err(|e| MigrateError::io(path, format!("{:#}", e)))?;
    Ok(parse_repository_list(&content))
}

/// Runs the engine over every entry and sums the outcomes. Entries that
/// cannot be resolved to an owner are skipped.
pub async fn migrate_all<S, T, X>(
    reconciler: &Reconciler<S, T, X>,
    repositories: &[String],
) -> Outcome
where
    S: ReleaseDirectory,
    T: ReleaseDirectory,
    X: AssetTransfer,
{
    let mut total = Outcome::default();
    for repository in repositories {
        match reconciler.migrate(repository).await {
            Ok(outcome) => total += outcome,
            Err(e) => warn!("Skipping repository '{}': {}", repository, e),
        }
    }
    total
}

/// Migrates everything `config` selects and reports the totals.
///
/// Only setup problems are returned as errors: an unreadable repository
/// list or a client that cannot be built. A mapping file that cannot be
/// loaded only disables the mapping stage.
#[tracing::instrument(skip_all)]
pub async fn run<R>(runtime: R, config: &MigrationConfig) -> Result<Outcome, MigrateError>
where
    R: Runtime + Clone + 'static,
{
    let repositories = match &config.repositories {
        RepositorySelection::Single(repo) => vec![repo.clone()],
        RepositorySelection::List(path) => {
            let repositories = read_repository_list(&runtime, path)?;
            info!("{} repositories listed in {:?}", repositories.len(), path);
            repositories
        }
    };

    let mapping = config
        .mapping_file
        .as_deref()
        .and_then(|path| match HandleMapping::load(&runtime, path) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                warn!("Release bodies will not be rewritten: {}", e);
                None
            }
        });

    let source = config.source_github()?;
    let target = Arc::new(config.target_github()?);
    let transfer = ScratchTransfer::new(
        runtime.clone(),
        config.source_http()?,
        target.clone(),
        config.scratch_dir.clone(),
    );

    let mut reconciler = Reconciler::new(
        source,
        target.clone(),
        transfer,
        config.target_organization.clone(),
    )
    .with_default_owner(config.source_organization.clone())
    .with_transform(Box::new(ProvenanceStamp::now()));
    if let Some(mapping) = mapping.filter(|m| !m.is_empty()) {
        reconciler = reconciler.with_transform(Box::new(mapping));
    }

    let outcome = migrate_all(&reconciler, &repositories).await;
    report(&runtime, target.as_ref(), &outcome).await;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;
    use crate::github::{MockReleaseDirectory, Release, RepoRef};
    use crate::runtime::MockRuntime;
    use crate::transfer::MockAssetTransfer;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_parse_repository_list() {
        let repos = parse_repository_list(
            "# migrate these\nold-org/tool\n\n  lib  \n# old-org/skipped\nother-org/app\n",
        );
        assert_eq!(repos, vec!["old-org/tool", "lib", "other-org/app"]);
    }

    #[test]
    fn test_read_repository_list_failure_is_io() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let err = read_repository_list(&runtime, Path::new("repos.txt")).unwrap_err();
        assert!(matches!(err, MigrateError::Io { .. }));
    }

    #[tokio::test]
    async fn test_migrate_all_sums_and_skips_unresolvable() {
        let mut source = MockReleaseDirectory::new();
        source
            .expect_list_releases()
            .with(eq(RepoRef::new("old-org", "tool")))
            .returning(|_| {
                Ok(vec![
                    Release {
                        id: 1,
                        tag_name: "v1".to_string(),
                        ..Default::default()
                    },
                    Release {
                        id: 2,
                        tag_name: "v2".to_string(),
                        ..Default::default()
                    },
                ])
            });
        source
            .expect_list_releases()
            .with(eq(RepoRef::new("other-org", "app")))
            .returning(|_| {
                Ok(vec![Release {
                    id: 3,
                    tag_name: "v3".to_string(),
                    ..Default::default()
                }])
            });
        source
            .expect_get_latest_release()
            .returning(|_| Err(MigrateError::NotFound("none".to_string())));

        let mut target = MockReleaseDirectory::new();
        target
            .expect_get_release_by_tag()
            .returning(|_, tag| Err(MigrateError::NotFound(tag.to_string())));
        target.expect_create_release().returning(|_, new| {
            if new.tag_name == "v2" {
                Err(MigrateError::Transfer("HTTP 500".to_string()))
            } else {
                Ok(Release {
                    id: 10,
                    tag_name: new.tag_name.clone(),
                    ..Default::default()
                })
            }
        });

        let reconciler = Reconciler::new(
            source,
            Arc::new(target),
            MockAssetTransfer::new(),
            "new-org",
        );
        let total = migrate_all(
            &reconciler,
            &[
                "old-org/tool".to_string(),
                "bare-name".to_string(),
                "other-org/app".to_string(),
            ],
        )
        .await;

        assert_eq!(
            total,
            Outcome {
                releases: 3,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_run_fails_on_unreadable_repository_list() {
        let config = MigrationConfig::from_options(ConfigOptions {
            source_token: Some("source-token".to_string()),
            target_token: Some("target-token".to_string()),
            target_organization: Some("new-org".to_string()),
            repository_list: Some(PathBuf::from("missing.txt")),
            ..Default::default()
        })
        .unwrap();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("missing.txt")))
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let err = run(Arc::new(runtime), &config).await.unwrap_err();
        assert!(matches!(err, MigrateError::Io { .. }));
    }

    fn run_config(server_url: &str, mapping_file: Option<&str>) -> MigrationConfig {
        MigrationConfig::from_options(ConfigOptions {
            source_token: Some("source-token".to_string()),
            target_token: Some("target-token".to_string()),
            source_organization: Some("old-org".to_string()),
            target_organization: Some("new-org".to_string()),
            source_api_url: Some(server_url.to_string()),
            target_api_url: Some(server_url.to_string()),
            repository: Some("tool".to_string()),
            mapping_file: mapping_file.map(PathBuf::from),
            ..Default::default()
        })
        .unwrap()
    }

    async fn empty_source(server: &mut mockito::ServerGuard) -> mockito::Mock {
        let _latest = server
            .mock("GET", "/repos/old-org/tool/releases/latest")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/old-org/tool/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await
    }

    fn runtime_outside_actions(mapping: Result<&'static str, &'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("mapping.csv")))
            .returning(move |_| mapping.map(str::to_string).map_err(|e| anyhow::anyhow!(e)));
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
    }

    #[tokio::test]
    async fn test_run_continues_without_unreadable_mapping_file() {
        let mut server = mockito::Server::new_async().await;
        let listing = empty_source(&mut server).await;

        let runtime = runtime_outside_actions(Err("No such file or directory"));
        let outcome = run(Arc::new(runtime), &run_config(&server.url(), Some("mapping.csv")))
            .await
            .unwrap();

        listing.assert_async().await;
        assert_eq!(outcome, Outcome::default());
    }

    #[tokio::test]
    async fn test_run_continues_without_malformed_mapping_file() {
        let mut server = mockito::Server::new_async().await;
        let listing = empty_source(&mut server).await;

        let runtime = runtime_outside_actions(Ok("only-one-column\n"));
        let outcome = run(Arc::new(runtime), &run_config(&server.url(), Some("mapping.csv")))
            .await
            .unwrap();

        listing.assert_async().await;
        assert_eq!(outcome, Outcome::default());
    }
}
