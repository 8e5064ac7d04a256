//! Catalog error types.

use std::path::PathBuf;

use thiserror::Error;
use vidg_core::FileId;

/// Errors from catalog reads and writes.
///
/// These are never retried; they surface to whoever called the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("Catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No entry with this identity.
    #[error("No catalog entry with id {0}")]
    NotFound(FileId),

    /// Another entry already holds this identity or path.
    #[error("Catalog already contains id {id} or path {path}")]
    Conflict { id: FileId, path: PathBuf },

    /// A path that cannot be stored relative to the library root.
    #[error("Cannot store path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// A stored row that does not decode into an entry.
    #[error("Corrupt catalog row {id}: {message}")]
    Corrupt { id: FileId, message: String },

    /// Moving files to the trash failed.
    #[error("Failed to move files to trash: {0}")]
    Trash(#[from] trash::Error),
}
