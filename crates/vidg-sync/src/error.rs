//! Sync error types.

use thiserror::Error;

use vidg_catalog::StoreError;
use vidg_core::ScanError;

/// Errors that abort a sync pass.
///
/// Per-file extraction failures never appear here; they are recorded in
/// the [`SyncReport`](crate::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking scan task panicked or was aborted.
    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
