//! In-memory catalog.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use vidg_core::{CatalogEntry, FileId, Media, Rating};

use crate::error::StoreError;
use crate::store::CatalogStore;

/// Catalog kept in insertion order, lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: IndexMap<FileId, CatalogEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, id: FileId) -> Result<&mut CatalogEntry, StoreError> {
        self.entries.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    fn filtered(&self, keep: impl Fn(&CatalogEntry) -> bool) -> Vec<CatalogEntry> {
        self.entries.values().filter(|e| keep(e)).cloned().collect()
    }
}

impl FromIterator<CatalogEntry> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

impl CatalogStore for MemoryCatalog {
    fn all(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(self.filtered(|_| true))
    }

    fn incomplete(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(self.filtered(CatalogEntry::is_incomplete))
    }

    fn get(&self, id: FileId) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(self.entries.get(&id).cloned())
    }

    fn insert(&mut self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let taken = self.entries.contains_key(&entry.id)
            || self.entries.values().any(|e| e.path == entry.path);
        if taken {
            return Err(StoreError::Conflict {
                id: entry.id,
                path: entry.path.clone(),
            });
        }
        self.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    fn remove(&mut self, id: FileId) -> Result<bool, StoreError> {
        Ok(self.entries.shift_remove(&id).is_some())
    }

    fn set_paths(&mut self, moves: &[(FileId, PathBuf)]) -> Result<(), StoreError> {
        let moving: HashSet<FileId> = moves.iter().map(|(id, _)| *id).collect();
        let mut taken: HashSet<&Path> = self
            .entries
            .values()
            .filter(|e| !moving.contains(&e.id))
            .map(|e| e.path.as_path())
            .collect();

        for (id, path) in moves {
            if !self.entries.contains_key(id) {
                return Err(StoreError::NotFound(*id));
            }
            if !taken.insert(path.as_path()) {
                return Err(StoreError::Conflict {
                    id: *id,
                    path: path.clone(),
                });
            }
        }

        for (id, path) in moves {
            self.entry_mut(*id)?.path = path.clone();
        }
        Ok(())
    }

    fn set_rating(&mut self, id: FileId, rating: Rating) -> Result<(), StoreError> {
        self.entry_mut(id)?.rating = rating;
        Ok(())
    }

    fn set_media(&mut self, id: FileId, media: &Media) -> Result<(), StoreError> {
        self.entry_mut(id)?.apply_media(media.clone());
        Ok(())
    }

    fn trashed(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(self.filtered(|e| e.rating.is_trash()))
    }

    fn remove_trashed(&mut self) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.rating.is_trash());
        Ok(before - self.entries.len())
    }

    fn search(&self, text: &str) -> Result<Vec<FileId>, StoreError> {
        let needle = text.to_ascii_lowercase();
        let mut hits: Vec<&CatalogEntry> = self
            .entries
            .values()
            .filter(|e| {
                e.path
                    .to_string_lossy()
                    .to_ascii_lowercase()
                    .contains(&needle)
            })
            .collect();
        hits.sort_by(|a, b| b.stats.size.cmp(&a.stats.size));
        Ok(hits.into_iter().map(|e| e.id).collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}
