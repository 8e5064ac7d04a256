//! Media library scanning engine for vidg.
//!
//! Walks a library root in parallel with jwalk and reports every media file
//! it finds as a [`ScanResult`] keyed by its filesystem identity.
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Progress updates** via broadcast channels
//! - **Identity dedupe** so one identity never maps to two paths (hardlinks,
//!   repeated inode numbers across mounts)
//! - **Extension policy** with glob exclusions (`**/tools/**` by default)
//!
//! Symbolic links are never followed. Unreadable subtrees and unknown file
//! types are reported as [`ScanWarning`]s rather than failing the scan.
//!
//! # Example
//!
//! ```rust,no_run
//! use vidg_scan::{LibraryConfig, LibraryScanner};
//!
//! let config = LibraryConfig::new("/path/to/library");
//! let scanner = LibraryScanner::new();
//! let output = scanner.scan(&config).unwrap();
//!
//! println!("Found {} media files", output.files.len());
//! for warning in &output.warnings {
//!     eprintln!("{}", warning.message);
//! }
//! ```

mod identity;
mod policy;
mod progress;
mod scanner;

pub use identity::{Clash, IdentityTracker};
pub use policy::{FileClass, MediaFilter};
pub use progress::{ScanPhase, ScanProgress};
pub use scanner::{LibraryScanner, ScanOutput, ScanSummary};

// Re-export core types for convenience
pub use vidg_core::{FileId, LibraryConfig, ScanError, ScanResult, ScanWarning, WarningKind};
