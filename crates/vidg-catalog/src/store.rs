//! The catalog store interface.

use std::path::{Path, PathBuf};

use vidg_core::{CatalogEntry, FileId, Media, Rating};

use crate::error::StoreError;

/// Persistent set of [`CatalogEntry`] records.
///
/// Identities and paths are unique. Paths go in and come out absolute;
/// how they are stored is up to the implementation.
pub trait CatalogStore {
    /// Every entry.
    fn all(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Entries without a preview.
    fn incomplete(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    fn get(&self, id: FileId) -> Result<Option<CatalogEntry>, StoreError>;

    /// Insert a new entry. Fails with [`StoreError::Conflict`] if its id or path is taken.
    fn insert(&mut self, entry: &CatalogEntry) -> Result<(), StoreError>;

    /// Remove an entry. Returns whether it existed.
    fn remove(&mut self, id: FileId) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] if another entry holds `path`.
    fn set_path(&mut self, id: FileId, path: &Path) -> Result<(), StoreError> {
        self.set_paths(&[(id, path.to_path_buf())])
    }

    /// Move several entries at once.
    ///
    /// Only the final layout has to be unique, so entries may swap paths or
    /// shift along a chain (`ep2 -> ep3`, `ep1 -> ep2`). On error nothing
    /// is changed.
    fn set_paths(&mut self, moves: &[(FileId, PathBuf)]) -> Result<(), StoreError>;

    fn set_rating(&mut self, id: FileId, rating: Rating) -> Result<(), StoreError>;

    /// Store freshly extracted media for an existing entry.
    fn set_media(&mut self, id: FileId, media: &Media) -> Result<(), StoreError>;

    /// Entries rated [`Rating::TRASH`].
    fn trashed(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Delete every trashed entry. Returns how many were removed.
    fn remove_trashed(&mut self) -> Result<usize, StoreError>;

    /// Identities whose path contains `text` (ASCII case-insensitive),
    /// largest files first.
    fn search(&self, text: &str) -> Result<Vec<FileId>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
