//! Release-notes rewriting applied before a release is recreated.
//!
//! The engine runs an ordered list of [`BodyTransform`]s. A stage that fails
//! is skipped and the body produced by the previous stages is kept.

mod mapping;
mod provenance;

use anyhow::Result;

use crate::github::{Release, RepoRef};

pub use mapping::HandleMapping;
pub use provenance::ProvenanceStamp;

#[cfg_attr(test, mockall::automock)]
pub trait BodyTransform: Send + Sync {
    /// Short label used in warnings.
    fn name(&self) -> &str;

    /// Rewrites `body` of a release that lives in `source`.
    fn transform(&self, source: &RepoRef, release: &Release, body: &str) -> Result<String>;
}
