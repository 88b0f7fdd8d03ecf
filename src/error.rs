//! Error taxonomy shared by the release directory, the transfer pipeline
//! and the reconciliation engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::github::Release;

/// Failures surfaced by remote directories and the asset pipeline.
///
/// Only `Configuration` is fatal to a run. Everything else is handled at the
/// smallest scope it concerns (one release, one asset, one latest-flag edit).
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The requested release, tag or latest release does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target already holds an object under the same key.
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Any other unsuccessful exchange with the remote host.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Local scratch storage could not be created, written or removed.
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Invalid or contradictory run configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MigrateError {
    pub fn transfer(err: anyhow::Error) -> Self {
        MigrateError::Transfer(format!("{:#}", err))
    }

    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        MigrateError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrateError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, MigrateError::Conflict(_))
    }
}

/// A listing that stopped part way through.
///
/// `fetched` holds every release read before the failing page.
#[derive(Debug, Error)]
#[error("{error} (after {} release(s) were listed)", fetched.len())]
pub struct ListError {
    pub fetched: Vec<Release>,
    #[source]
    pub error: MigrateError,
}
