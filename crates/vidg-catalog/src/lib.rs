//! Persistent media catalog for vidg.
//!
//! [`CatalogStore`] is the interface the sync engine and the browser work
//! against. [`SqliteCatalog`] keeps one row per file in `.vidg.sqlite`
//! inside the library, with paths relative to the library root.
//! [`MemoryCatalog`] is a drop-in for tests and dry runs.
//!
//! ```rust,no_run
//! use vidg_catalog::{CatalogStore, SqliteCatalog};
//! use vidg_core::LibraryConfig;
//!
//! let config = LibraryConfig::new("/videos");
//! let catalog = SqliteCatalog::open_library(&config).unwrap();
//! println!("{} files catalogued", catalog.len().unwrap());
//! ```

mod error;
mod memory;
mod recycle;
mod sqlite;
mod store;

pub use error::StoreError;
pub use memory::MemoryCatalog;
pub use recycle::{SystemTrash, TrashBin};
pub use sqlite::SqliteCatalog;
pub use store::CatalogStore;
