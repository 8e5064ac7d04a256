//! Sync progress events and the final report.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use vidg_core::ScanWarning;

/// Progress of a running sync pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncProgress {
    /// The scan finished.
    Scanned { found: usize, warnings: usize },
    /// The scan was reconciled with the catalog.
    Diffed {
        added: usize,
        removed: usize,
        renamed: usize,
    },
    /// Extraction started for one file.
    Processing {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// The pass is over, cancelled or not.
    Finished,
}

/// A file whose extraction failed. It stays out of the catalog (or stays
/// incomplete) until a later pass succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub path: PathBuf,
    pub error: String,
}

/// What one sync pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Media files found by the scan.
    pub found: usize,
    /// New entries inserted.
    pub added: usize,
    /// Entries removed because their file is gone.
    pub removed: usize,
    /// Entries whose path was updated.
    pub renamed: usize,
    /// Incomplete entries completed by re-extraction.
    pub completed: usize,
    pub failed: Vec<SyncFailure>,
    pub warnings: Vec<ScanWarning>,
    /// Whether the pass stopped early on request.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SyncReport {
    /// Whether the catalog was modified.
    pub fn has_changes(&self) -> bool {
        self.added + self.removed + self.renamed + self.completed > 0
    }
}
