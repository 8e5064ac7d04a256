//! Identity-keyed reconciliation of two record sets.
//!
//! [`diff`] compares what the catalog knows with what a scan found. Records
//! are matched by [`Keyed::key`]; matched pairs are compared attribute by
//! attribute using a list of [`Tracked`] comparators.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::entry::{CatalogEntry, FileId, ScanResult};

/// Records that can be matched by a stable key.
pub trait Keyed {
    type Key: Eq + Hash;

    fn key(&self) -> Self::Key;
}

impl Keyed for CatalogEntry {
    type Key = FileId;

    fn key(&self) -> FileId {
        self.id
    }
}

impl Keyed for ScanResult {
    type Key = FileId;

    fn key(&self) -> FileId {
        self.id
    }
}

/// A named attribute compared between a known and a found record.
pub struct Tracked<K, F> {
    pub name: &'static str,
    pub same: fn(&K, &F) -> bool,
}

impl<K, F> Tracked<K, F> {
    pub const fn new(name: &'static str, same: fn(&K, &F) -> bool) -> Self {
        Self { name, same }
    }
}

impl<K, F> Clone for Tracked<K, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, F> Copy for Tracked<K, F> {}

/// The `path` attribute of a catalog entry against a scan result.
pub const TRACK_PATH: Tracked<CatalogEntry, ScanResult> =
    Tracked::new("path", |known, found| known.path == found.path);

/// Classification of known records against found records.
#[derive(Debug, Clone, PartialEq)]
pub struct Changeset<K, F> {
    /// Found records whose key is unknown, in `found` order.
    pub added: Vec<F>,
    /// Known records whose key was not found, in `known` order.
    pub removed: Vec<K>,
    /// Per tracked attribute, the found records whose value differs.
    pub changed: IndexMap<&'static str, Vec<F>>,
    /// Known records whose tracked attributes all match, in `known` order.
    pub unchanged: Vec<K>,
}

impl<K, F> Changeset<K, F> {
    /// Records whose `attr` changed; empty for untracked attributes.
    pub fn changed(&self, attr: &str) -> &[F] {
        self.changed.get(attr).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether applying this changeset would modify anything.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.values().all(Vec::is_empty)
    }
}

/// Reconcile `known` against `found`.
///
/// A record changed in several tracked attributes lands in each of their
/// buckets. When a key repeats within one input, the last record wins.
/// Output order follows input order, so identical inputs always produce
/// identical changesets.
pub fn diff<K, F>(known: Vec<K>, found: Vec<F>, tracked: &[Tracked<K, F>]) -> Changeset<K, F>
where
    K: Keyed,
    F: Keyed<Key = K::Key> + Clone,
{
    let known: IndexMap<K::Key, K> = known.into_iter().map(|k| (k.key(), k)).collect();
    let mut found: IndexMap<K::Key, F> = found.into_iter().map(|f| (f.key(), f)).collect();

    let mut changeset = Changeset {
        added: Vec::new(),
        removed: Vec::new(),
        changed: tracked.iter().map(|t| (t.name, Vec::new())).collect(),
        unchanged: Vec::new(),
    };

    for (key, known_record) in known {
        let Some(found_record) = found.shift_remove(&key) else {
            changeset.removed.push(known_record);
            continue;
        };

        let mut has_change = false;
        for attr in tracked {
            if !(attr.same)(&known_record, &found_record) {
                changeset
                    .changed
                    .entry(attr.name)
                    .or_default()
                    .push(found_record.clone());
                has_change = true;
            }
        }

        if !has_change {
            changeset.unchanged.push(known_record);
        }
    }

    changeset.added.extend(found.into_values());
    changeset
}
