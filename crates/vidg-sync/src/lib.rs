//! Library synchronization for vidg.
//!
//! A [`Syncer`] runs one pass of
//!
//! 1. scan the library root,
//! 2. diff the scan against the catalog by file identity, tracking paths,
//! 3. remove entries whose file is gone,
//! 4. update paths of renamed or moved files (no re-extraction),
//! 5. extract and insert new files, one at a time,
//! 6. re-extract entries left incomplete by earlier passes.
//!
//! A file whose extraction fails is logged, reported and skipped; it is
//! picked up again on the next pass. Catalog errors abort the pass.
//!
//! ```rust,no_run
//! use vidg_catalog::SqliteCatalog;
//! use vidg_core::LibraryConfig;
//! use vidg_extract::FfmpegExtractor;
//! use vidg_sync::Syncer;
//!
//! # async fn run() -> Result<(), vidg_sync::SyncError> {
//! let config = LibraryConfig::new("/videos");
//! let mut catalog = SqliteCatalog::open_library(&config)?;
//! let syncer = Syncer::new(config.clone(), FfmpegExtractor::new(config.extract.clone()));
//!
//! let report = syncer.sync(&mut catalog).await?;
//! println!("added {}, removed {}", report.added, report.removed);
//! # Ok(())
//! # }
//! ```

mod error;
mod report;
mod syncer;

pub use error::SyncError;
pub use report::{SyncFailure, SyncProgress, SyncReport};
pub use syncer::Syncer;
