//! Core types for vidg.
//!
//! This crate provides the data model shared by every other vidg crate:
//! catalog entries and scan records, the identity-keyed diff used to
//! reconcile a catalog with the filesystem, the [`Cursor`] navigation
//! view, and library configuration.

mod config;
mod cursor;
mod diff;
mod entry;
mod error;

pub use config::{
    CONFIG_FILE_NAME, ConfigError, ExtractConfig, ExtractConfigBuilder, LibraryConfig,
    LibraryConfigBuilder,
};
pub use cursor::{Cursor, Rated, Step};
pub use diff::{Changeset, Keyed, TRACK_PATH, Tracked, diff};
pub use entry::{
    CatalogEntry, ColorSummary, FileId, InodeInfo, Media, MediaStats, Rating, ScanResult,
};
pub use error::{ScanError, ScanWarning, WarningKind};
