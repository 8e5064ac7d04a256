//! The sync orchestrator.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vidg_catalog::CatalogStore;
use vidg_core::{CatalogEntry, FileId, LibraryConfig, Media, TRACK_PATH, diff};
use vidg_extract::{ExtractionError, MediaExtractor};
use vidg_scan::{LibraryScanner, ScanOutput, ScanProgress};

use crate::error::SyncError;
use crate::report::{SyncFailure, SyncProgress, SyncReport};

/// Outcome of one extraction raced against cancellation.
enum Attempt {
    Done(Result<Media, ExtractionError>),
    Cancelled,
}

/// Brings a catalog in line with the library on disk.
///
/// One pass scans, diffs against the catalog, removes vanished entries,
/// updates renamed paths, then extracts and inserts new files one at a
/// time. Each file is committed as soon as it is done, so an interrupted
/// pass leaves every processed file in the catalog.
pub struct Syncer<E> {
    config: LibraryConfig,
    extractor: E,
    scanner: Arc<LibraryScanner>,
    cancel: CancellationToken,
    progress_tx: broadcast::Sender<SyncProgress>,
}

impl<E: MediaExtractor> Syncer<E> {
    pub fn new(config: LibraryConfig, extractor: E) -> Self {
        let (progress_tx, _) = broadcast::channel(256);
        Self {
            config,
            extractor,
            scanner: Arc::new(LibraryScanner::new()),
            cancel: CancellationToken::new(),
            progress_tx,
        }
    }

    /// Use `token` to stop the pass between (or during) extractions.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels running and future passes of this syncer.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Subscribe to sync progress.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.progress_tx.subscribe()
    }

    /// Subscribe to progress of the scan phase.
    pub fn subscribe_scan(&self) -> broadcast::Receiver<ScanProgress> {
        self.scanner.subscribe()
    }

    fn emit(&self, event: SyncProgress) {
        let _ = self.progress_tx.send(event);
    }

    /// Run one sync pass against `store`.
    pub async fn sync<S: CatalogStore>(&self, store: &mut S) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        let output = self.scan().await?;
        report.found = output.files.len();
        report.warnings = output.warnings;
        self.emit(SyncProgress::Scanned {
            found: report.found,
            warnings: report.warnings.len(),
        });

        let changes = diff(store.all()?, output.files, &[TRACK_PATH]);
        let renamed = changes.changed(TRACK_PATH.name);
        info!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            renamed = renamed.len(),
            unchanged = changes.unchanged.len(),
            "Reconciled scan with catalog"
        );
        self.emit(SyncProgress::Diffed {
            added: changes.added.len(),
            removed: changes.removed.len(),
            renamed: renamed.len(),
        });

        for gone in &changes.removed {
            if store.remove(gone.id)? {
                debug!(id = %gone.id, path = %gone.path.display(), "Removed");
                report.removed += 1;
            }
        }

        // One batch, so swapped names and shifted chains never collide halfway.
        let moves: Vec<_> = renamed.iter().map(|m| (m.id, m.path.clone())).collect();
        if !moves.is_empty() {
            store.set_paths(&moves)?;
            for (id, path) in &moves {
                debug!(id = %id, path = %path.display(), "Path updated");
            }
            report.renamed = moves.len();
        }

        let total = changes.added.len();
        let mut inserted = HashSet::with_capacity(total);
        for (index, found) in changes.added.into_iter().enumerate() {
            self.emit(SyncProgress::Processing {
                index,
                total,
                path: found.path.clone(),
            });

            match self.attempt(&found.path).await {
                Attempt::Cancelled => {
                    report.cancelled = true;
                    break;
                }
                Attempt::Done(Ok(media)) => {
                    let id = found.id;
                    store.insert(&CatalogEntry::from_scan(found, media))?;
                    inserted.insert(id);
                    report.added += 1;
                }
                Attempt::Done(Err(err)) => record_failure(&mut report, &found.path, &err),
            }
        }

        if self.config.retry_incomplete && !report.cancelled {
            self.complete_incomplete(store, &inserted, &mut report).await?;
        }

        report.elapsed = start.elapsed();
        self.emit(SyncProgress::Finished);
        info!(
            added = report.added,
            removed = report.removed,
            renamed = report.renamed,
            completed = report.completed,
            failed = report.failed.len(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Sync finished"
        );
        Ok(report)
    }

    async fn scan(&self) -> Result<ScanOutput, SyncError> {
        let scanner = Arc::clone(&self.scanner);
        let config = self.config.clone();
        let output = tokio::task::spawn_blocking(move || scanner.scan(&config)).await??;
        Ok(output)
    }

    /// Re-extract entries that are in the catalog without a preview.
    async fn complete_incomplete<S: CatalogStore>(
        &self,
        store: &mut S,
        skip: &HashSet<FileId>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let pending: Vec<CatalogEntry> = store
            .incomplete()?
            .into_iter()
            .filter(|e| !skip.contains(&e.id))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        info!(count = pending.len(), "Retrying incomplete entries");

        let total = pending.len();
        for (index, entry) in pending.into_iter().enumerate() {
            self.emit(SyncProgress::Processing {
                index,
                total,
                path: entry.path.clone(),
            });

            match self.attempt(&entry.path).await {
                Attempt::Cancelled => {
                    report.cancelled = true;
                    break;
                }
                Attempt::Done(Ok(media)) => {
                    store.set_media(entry.id, &media)?;
                    report.completed += 1;
                }
                Attempt::Done(Err(err)) => record_failure(report, &entry.path, &err),
            }
        }
        Ok(())
    }

    /// Extract one file unless cancelled first. Cancelling drops the
    /// extraction future, which kills any running child process.
    async fn attempt(&self, path: &Path) -> Attempt {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!(path = %path.display(), "Sync cancelled");
                Attempt::Cancelled
            }
            result = self.extractor.extract(path) => Attempt::Done(result),
        }
    }
}

fn record_failure(report: &mut SyncReport, path: &Path, err: &ExtractionError) {
    warn!(path = %path.display(), "Skipping file: {err}");
    report.failed.push(SyncFailure {
        path: path.to_path_buf(),
        error: err.to_string(),
    });
}
