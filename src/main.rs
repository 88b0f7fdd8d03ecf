use anyhow::Result;
use clap::Parser;
use ghrm::config::{ConfigOptions, MigrationConfig};
use log::debug;
use std::path::PathBuf;

/// ghrm - GitHub Release Migrator
///
/// Copy releases and their assets from repositories on one GitHub host or
/// organization to repositories of the same name in a target organization.
///
/// Runs can be repeated: releases that already exist on the target with the
/// same tag, name and commitish are reused, and assets already present with
/// the same name and size are skipped.
///
/// Examples:
///   ghrm --source-organization old-org --target-organization new-org --repository tool
///   ghrm --target-organization new-org --repository-list repos.txt
#[derive(Parser, Debug)]
#[command(author, version = env!("GHRM_VERSION"), about)]
struct Cli {
    /// Token for the source host
    #[arg(long, env = "GHRM_SOURCE_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    source_token: Option<String>,

    /// Token for the target host
    #[arg(long, env = "GHRM_TARGET_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    target_token: Option<String>,

    /// Source organization; required with --repository, default owner for list entries
    #[arg(long, env = "GHRM_SOURCE_ORGANIZATION", value_name = "ORG")]
    source_organization: Option<String>,

    /// Organization receiving the releases
    #[arg(long, env = "GHRM_TARGET_ORGANIZATION", value_name = "ORG")]
    target_organization: Option<String>,

    /// GitHub Enterprise Server hostname of the source
    #[arg(long, env = "GHRM_SOURCE_HOSTNAME", value_name = "HOST")]
    source_hostname: Option<String>,

    /// Single repository to migrate, as "name" or "owner/name"
    #[arg(long, short = 'r', env = "GHRM_REPOSITORY", value_name = "REPO")]
    repository: Option<String>,

    /// File listing one repository per line
    #[arg(long, short = 'l', env = "GHRM_REPOSITORY_LIST", value_name = "PATH")]
    repository_list: Option<PathBuf>,

    /// File of "source,target" handle and URL rewrites for release notes
    #[arg(long, short = 'm', env = "GHRM_MAPPING_FILE", value_name = "PATH")]
    mapping_file: Option<PathBuf>,

    /// Directory assets are staged in between download and upload
    #[arg(long, env = "GHRM_SCRATCH_DIR", value_name = "PATH")]
    scratch_dir: Option<PathBuf>,

    /// Source API URL (overrides the hostname; defaults to https://api.github.com)
    #[arg(long, value_name = "URL")]
    source_api_url: Option<String>,

    /// Target API URL (defaults to https://api.github.com)
    #[arg(long, value_name = "URL")]
    target_api_url: Option<String>,
}

impl From<Cli> for ConfigOptions {
    fn from(cli: Cli) -> Self {
        ConfigOptions {
            source_token: cli.source_token,
            target_token: cli.target_token,
            source_organization: cli.source_organization,
            target_organization: cli.target_organization,
            source_hostname: cli.source_hostname,
            source_api_url: cli.source_api_url,
            target_api_url: cli.target_api_url,
            repository: cli.repository,
            repository_list: cli.repository_list,
            mapping_file: cli.mapping_file,
            scratch_dir: cli.scratch_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = MigrationConfig::from_options(cli.into())?;
    debug!("{:?}", config);

    let runtime = std::sync::Arc::new(ghrm::runtime::RealRuntime);
    ghrm::driver::run(runtime, &config).await?;
    Ok(())
}
