//! # contract: interfaces between the sync core and its remote collaborators
//!
//! This module defines the two traits the synchronisation job depends on and
//! nothing else: a remote directory that can be listed and downloaded from,
//! and a ledger that knows which files were already ingested.
//!
//! ## Interface & Extensibility
//! - Implement [`RemoteDirectory`] for a new file backend (SharePoint via
//!   Graph is the shipped one, see the `remote` module).
//! - Implement [`IngestionLedger`] for whatever records ingestion (the
//!   shipped `ledger` module talks to an HTTP API).
//! - All methods are async and return boxed error trait objects, so
//!   implementors convert their own error types at the boundary.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`, so tests can generate
//! deterministic mocks; the `test-export-mocks` feature exports them to
//! integration tests and downstream crates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type shared by all client traits (boxed trait object).
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// A remote folder that can be enumerated and downloaded from.
///
/// Implementations are thin transport wrappers; retry policy and filtering
/// live in the caller ([`crate::sync_job::SyncJob`]).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// List the filenames currently present in `folder`.
    ///
    /// Returns an empty list when the folder has no files. Errors on
    /// connectivity or authentication failure.
    async fn list_files(&self, folder: &str) -> Result<Vec<String>, ClientError>;

    /// Download `filename` from `folder` to the local path `dest`, creating
    /// parent directories as needed. Returns the path written.
    ///
    /// Errors on any transport or filesystem failure; the caller owns retries.
    async fn download_file(
        &self,
        folder: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<PathBuf, ClientError>;
}

/// The record of which files have already been ingested downstream.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait IngestionLedger: Send + Sync {
    /// Filenames known to be ingested within the half-open window
    /// `[start_iso, end_iso)`. Both bounds are ISO-8601 UTC timestamps with
    /// second precision. Returns an empty list when nothing matches.
    async fn ingested_files(
        &self,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<Vec<String>, ClientError>;
}
