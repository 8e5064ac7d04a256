//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Stage a library scan is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanPhase {
    /// Walking the directory tree.
    #[default]
    Walking,
    /// Sorting the files found into media and everything else.
    Classifying,
    /// Counters are final.
    Done,
}

/// Snapshot of a running library scan.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    /// Regular files seen by the walk.
    pub files_seen: u64,
    /// Files kept as media so far.
    pub media_found: u64,
    /// Bytes of the media kept.
    pub media_bytes: u64,
    /// Files dropped as auxiliary, excluded, unknown or duplicate.
    pub skipped: u64,
    /// Of the skipped files, those with an unrecognised extension.
    pub unknown_types: u64,
    pub warnings: u64,
    /// File most recently seen by the walk.
    pub current_path: PathBuf,
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Share of the seen files already classified, in `0.0..=1.0`.
    pub fn classified_fraction(&self) -> f64 {
        match (self.phase, self.files_seen) {
            (ScanPhase::Done, _) => 1.0,
            (_, 0) => 0.0,
            (_, seen) => ((self.media_found + self.skipped) as f64 / seen as f64).min(1.0),
        }
    }
}

/// Running counters for one scan.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start: Instant,
    current: ScanProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            current: ScanProgress::default(),
        }
    }

    pub fn see_file(&mut self, path: PathBuf) {
        self.current.files_seen += 1;
        self.current.current_path = path;
    }

    pub fn set_phase(&mut self, phase: ScanPhase) {
        self.current.phase = phase;
    }

    pub fn keep_media(&mut self, size: u64) {
        self.current.media_found += 1;
        self.current.media_bytes += size;
    }

    pub fn skip(&mut self) {
        self.current.skipped += 1;
    }

    pub fn skip_unknown(&mut self) {
        self.current.unknown_types += 1;
        self.skip();
    }

    pub fn warning(&mut self) {
        self.current.warnings += 1;
    }

    pub fn files_seen(&self) -> u64 {
        self.current.files_seen
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            elapsed: self.elapsed(),
            ..self.current.clone()
        }
    }
}
