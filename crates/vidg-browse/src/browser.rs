//! Interactive browsing over a catalog snapshot.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use vidg_catalog::{CatalogStore, StoreError, TrashBin};
use vidg_core::{CatalogEntry, Cursor, FileId, Rating, Step};

use crate::filter::{Filters, Predicate};
use crate::sort::{SortKey, SortOrder};
use crate::stats::{RatingBucket, StatRanges, rating_histogram};

/// A [`Cursor`] over the whole catalog plus the catalog-backed operations
/// the UI needs: filters, sorting, rating and trash emptying.
///
/// The browser reads the store only on [`load`](Self::load), text search
/// and rating changes; everything else works on the loaded snapshot.
pub struct Browser {
    cursor: Cursor<CatalogEntry>,
    ranges: StatRanges,
    filters: Filters,
}

impl Browser {
    /// Load the full catalog, worst rated first, largest first within a rating.
    pub fn load<S: CatalogStore>(store: &S) -> Result<Self, StoreError> {
        let mut entries = store.all()?;
        entries.sort_by(load_order);
        let ranges = StatRanges::of(entries.iter());
        info!(entries = entries.len(), "Loaded catalog");

        Ok(Self {
            cursor: Cursor::new(entries),
            ranges,
            filters: Filters::default(),
        })
    }

    pub fn cursor(&self) -> &Cursor<CatalogEntry> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor<CatalogEntry> {
        &mut self.cursor
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.cursor.current()
    }

    pub fn next(&mut self, step: Step) -> Option<&CatalogEntry> {
        self.cursor.next(step)
    }

    pub fn previous(&mut self, step: Step) -> Option<&CatalogEntry> {
        self.cursor.previous(step)
    }

    /// Filters currently applied.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Reset to the whole catalog, then keep only entries passing every filter.
    pub fn apply_filters<S: CatalogStore>(
        &mut self,
        store: &S,
        filters: Filters,
    ) -> Result<(), StoreError> {
        if filters.is_empty() {
            self.cursor.filter(None, false);
        } else {
            let ids = match filters.text() {
                Some(text) => Some(store.search(text)?.into_iter().collect::<HashSet<_>>()),
                None => None,
            };
            let predicate = Predicate::new(&filters, self.cursor.universe(), ids);
            self.cursor
                .filter(Some(&|entry: &CatalogEntry| predicate.matches(entry)), false);
        }

        debug!(?filters, kept = self.cursor.len(), "Filters applied");
        self.filters = filters;
        Ok(())
    }

    /// Reorder the view and rewind to its first entry.
    pub fn sort(&mut self, key: SortKey, order: SortOrder) {
        match key {
            SortKey::Random => self.cursor.shuffle(&mut rand::thread_rng()),
            key => self.cursor.sort_by(key.comparator(order)),
        }
    }

    /// Raise the rating of `id` (or the current entry) by one, up to 5.
    pub fn increase<S: CatalogStore>(
        &mut self,
        store: &mut S,
        id: Option<FileId>,
    ) -> Result<Option<Rating>, StoreError> {
        self.rate(store, id, Rating::increased)
    }

    /// Lower the rating of `id` (or the current entry) by one, down to -1.
    pub fn decrease<S: CatalogStore>(
        &mut self,
        store: &mut S,
        id: Option<FileId>,
    ) -> Result<Option<Rating>, StoreError> {
        self.rate(store, id, Rating::decreased)
    }

    /// Apply `change` to the stored rating and mirror it in memory.
    ///
    /// Returns the resulting rating, or `None` when no id was given and
    /// there is no current entry.
    fn rate<S: CatalogStore>(
        &mut self,
        store: &mut S,
        id: Option<FileId>,
        change: fn(Rating) -> Rating,
    ) -> Result<Option<Rating>, StoreError> {
        let Some(id) = id.or_else(|| self.current().map(|e| e.id)) else {
            return Ok(None);
        };
        let stored = store.get(id)?.ok_or(StoreError::NotFound(id))?;

        let rating = change(stored.rating);
        if rating != stored.rating {
            store.set_rating(id, rating)?;
            debug!(%id, from = %stored.rating, to = %rating, "Rating changed");
        }
        if let Some(entry) = self.cursor.find_mut(|e| e.id == id) {
            entry.rating = rating;
        }
        Ok(Some(rating))
    }

    /// Total bytes of the entries in view.
    pub fn total_size(&self) -> u64 {
        let mut total = 0;
        self.cursor.each(|entry| total += entry.stats.size);
        total
    }

    /// Count and bytes per rating for the entries in view.
    pub fn rating_histogram(&self) -> BTreeMap<Rating, RatingBucket> {
        rating_histogram(self.cursor.iter())
    }

    /// Value ranges of the catalog as loaded.
    pub fn ranges(&self) -> &StatRanges {
        &self.ranges
    }

    /// Move every trashed file to `trash`, drop them from the catalog and reload.
    ///
    /// Files already gone from disk are dropped from the catalog too.
    /// Returns the number of entries removed.
    pub fn empty_trash<S: CatalogStore, T: TrashBin>(
        &mut self,
        store: &mut S,
        trash: &T,
    ) -> Result<usize, StoreError> {
        let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) = store
            .trashed()?
            .into_iter()
            .map(|e| e.path)
            .partition(|path| path.exists());
        for path in &missing {
            warn!(path = %path.display(), "Trashed file already gone");
        }

        trash.discard(&present)?;
        let removed = store.remove_trashed()?;
        info!(removed, "Emptied trash");

        *self = Self::load(store)?;
        Ok(removed)
    }
}

fn load_order(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    a.rating
        .cmp(&b.rating)
        .then_with(|| b.stats.size.cmp(&a.stats.size))
}
