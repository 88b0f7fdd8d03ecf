//! GitHub release API: wire types, repository references and the release
//! directory used on both sides of a migration.

mod client;
mod repo;
mod types;

pub use client::{DEFAULT_API_URL, GitHub, IssueComments, ReleaseDirectory, expand_upload_url};
#[cfg(test)]
pub use client::{MockIssueComments, MockReleaseDirectory};
pub use repo::RepoRef;
pub use types::{Author, NewRelease, Release, ReleaseAsset, ReleasePatch};
