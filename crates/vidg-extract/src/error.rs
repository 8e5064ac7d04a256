//! Extraction error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that make one file's extraction fail.
///
/// Every variant is scoped to a single file; callers processing a batch
/// log it and move on.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// An external program could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on an external program failed.
    #[error("Failed to read output of {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program did not finish in time and was killed.
    #[error("{program} timed out after {timeout:?} on {path}")]
    Timeout {
        program: String,
        path: PathBuf,
        timeout: Duration,
    },

    /// The probe output lacks duration, bitrate or video stream details.
    #[error("unprobable: {path}")]
    Unprobable { path: PathBuf },

    /// Every sampled frame came back empty.
    #[error("No frame could be sampled from {path}")]
    NoFrames { path: PathBuf },

    /// Encoding the contact sheet failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
