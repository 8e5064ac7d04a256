//! Filtered, sorted, position-tracked navigation over a list of entries.
//!
//! A [`Cursor`] owns the full list (the *universe*) and exposes a view of
//! it (the *active list*) narrowed by [`Cursor::filter`] and reordered by
//! [`Cursor::sort_by`]. Both operations reset the position to the first
//! entry; only navigation moves it.
//!
//! The active list stores indices into the universe, so an entry mutated
//! through [`Cursor::current_mut`] or [`Cursor::find_mut`] is the same value
//! seen by every later filter.

use std::cmp::Ordering;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::entry::CatalogEntry;

/// Entries that carry a curation state navigation can skip over.
pub trait Rated {
    fn is_unrated(&self) -> bool;
}

impl Rated for CatalogEntry {
    fn is_unrated(&self) -> bool {
        self.rating.is_unrated()
    }
}

/// How far `next`/`previous` travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    /// Keep moving until an unrated entry (or the boundary) is reached.
    pub unrated_only: bool,
}

impl Step {
    /// Move exactly one entry.
    pub const ANY: Step = Step {
        unrated_only: false,
    };

    /// Move to the nearest unrated entry in the direction of travel.
    pub const UNRATED: Step = Step { unrated_only: true };
}

/// Stateful view over a list of entries.
#[derive(Debug, Clone)]
pub struct Cursor<T> {
    base: Vec<T>,
    active: Vec<usize>,
    position: usize,
}

impl<T> Default for Cursor<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> Cursor<T> {
    /// Create a cursor over `items`, unfiltered, positioned on the first entry.
    pub fn new(items: Vec<T>) -> Self {
        let active = (0..items.len()).collect();
        Self {
            base: items,
            active,
            position: 0,
        }
    }

    /// Entry under the cursor, or `None` when the active list is empty.
    pub fn current(&self) -> Option<&T> {
        self.active.get(self.position).map(|&i| &self.base[i])
    }

    /// Mutable access to the entry under the cursor.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        let index = *self.active.get(self.position)?;
        self.base.get_mut(index)
    }

    /// Index of the current entry within the active list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of entries in the active list.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of entries in the universe.
    pub fn universe_len(&self) -> usize {
        self.base.len()
    }

    /// Recompute the active list from the universe.
    ///
    /// `None` clears the filter. With `commit`, the filtered list becomes
    /// the new universe for the lifetime of this cursor.
    pub fn filter(&mut self, predicate: Option<&dyn Fn(&T) -> bool>, commit: bool) {
        match predicate {
            Some(predicate) => {
                self.active = self
                    .base
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| predicate(item))
                    .map(|(i, _)| i)
                    .collect();

                if commit {
                    self.commit_active();
                }
            }
            None => self.active = (0..self.base.len()).collect(),
        }

        self.position = 0;
    }

    /// Reorder the active list with `compare` (stable) and rewind.
    ///
    /// When the active list spans the whole universe, the universe is
    /// reordered too, so the order survives a later filter reset.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if self.spans_universe() {
            self.base.sort_by(&mut compare);
            self.active = (0..self.base.len()).collect();
        } else {
            let base = &self.base;
            self.active.sort_by(|&a, &b| compare(&base[a], &base[b]));
        }

        self.position = 0;
    }

    /// Shuffle the active list and rewind.
    pub fn shuffle<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.spans_universe() {
            self.base.shuffle(rng);
            self.active = (0..self.base.len()).collect();
        } else {
            self.active.shuffle(rng);
        }

        self.position = 0;
    }

    pub fn has_next(&self) -> bool {
        self.position + 1 < self.active.len()
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    /// Advance to the next entry matching `accept`, landing on the last
    /// entry if none does. A no-op at the end of the list.
    pub fn next_where<P>(&mut self, accept: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        if self.has_next() {
            let last = self.active.len() - 1;
            self.position = (self.position + 1..=last)
                .find(|&i| accept(&self.base[self.active[i]]))
                .unwrap_or(last);
        }
        self.current()
    }

    /// Retreat to the previous entry matching `accept`, landing on the
    /// first entry if none does. A no-op at the start of the list.
    pub fn previous_where<P>(&mut self, accept: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        if self.has_previous() {
            self.position = (0..self.position)
                .rev()
                .find(|&i| accept(&self.base[self.active[i]]))
                .unwrap_or(0);
        }
        self.current()
    }

    /// Visit every entry of the active list in order.
    pub fn each<F>(&self, mut visitor: F)
    where
        F: FnMut(&T),
    {
        for item in self.iter() {
            visitor(item);
        }
    }

    /// Iterate the active list in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.active.iter().map(|&i| &self.base[i])
    }

    /// Iterate the universe in its own order.
    pub fn universe(&self) -> impl Iterator<Item = &T> + '_ {
        self.base.iter()
    }

    /// Find an entry anywhere in the universe.
    pub fn find_mut<P>(&mut self, predicate: P) -> Option<&mut T>
    where
        P: Fn(&T) -> bool,
    {
        self.base.iter_mut().find(|item| predicate(item))
    }

    /// Consume the cursor, returning the universe.
    pub fn into_inner(self) -> Vec<T> {
        self.base
    }

    fn spans_universe(&self) -> bool {
        self.active.len() == self.base.len()
    }

    fn commit_active(&mut self) {
        let mut slots: Vec<Option<T>> = std::mem::take(&mut self.base)
            .into_iter()
            .map(Some)
            .collect();
        self.base = self
            .active
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect();
        self.active = (0..self.base.len()).collect();
    }
}

impl<T: Rated> Cursor<T> {
    /// Move forward one entry, or to the next unrated entry with [`Step::UNRATED`].
    pub fn next(&mut self, step: Step) -> Option<&T> {
        self.next_where(|item| !step.unrated_only || item.is_unrated())
    }

    /// Move back one entry, or to the previous unrated entry with [`Step::UNRATED`].
    pub fn previous(&mut self, step: Step) -> Option<&T> {
        self.previous_where(|item| !step.unrated_only || item.is_unrated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        rating: i8,
    }

    impl Rated for Item {
        fn is_unrated(&self) -> bool {
            self.rating == 0
        }
    }

    fn rated(ratings: &[i8]) -> Cursor<Item> {
        const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
        Cursor::new(
            ratings
                .iter()
                .zip(NAMES)
                .map(|(&rating, name)| Item { name, rating })
                .collect(),
        )
    }

    fn names(cursor: &Cursor<Item>) -> Vec<&'static str> {
        cursor.iter().map(|item| item.name).collect()
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor: Cursor<Item> = Cursor::default();
        assert!(cursor.current().is_none());
        assert!(!cursor.has_next());
        assert!(!cursor.has_previous());
        assert!(cursor.next(Step::ANY).is_none());
        assert!(cursor.previous(Step::UNRATED).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_navigation_boundaries() {
        let mut cursor = rated(&[1, 2, 3]);
        assert!(!cursor.has_previous());
        assert_eq!(cursor.previous(Step::ANY).unwrap().name, "a");
        assert_eq!(cursor.position(), 0);

        cursor.next(Step::ANY);
        cursor.next(Step::ANY);
        assert!(!cursor.has_next());
        assert_eq!(cursor.next(Step::ANY).unwrap().name, "c");
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_next_unrated() {
        let mut cursor = rated(&[2, 0, 3, 0, 1]);
        cursor.next(Step::UNRATED);
        assert_eq!(cursor.position(), 1);

        cursor.next(Step::UNRATED);
        assert_eq!(cursor.position(), 3);

        // nothing unrated ahead: land on the last entry
        cursor.next(Step::UNRATED);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_previous_unrated() {
        let mut cursor = rated(&[1, 0, 3, 2, 4]);
        cursor.next(Step::ANY);
        cursor.next(Step::ANY);
        cursor.next(Step::ANY);
        cursor.next(Step::ANY);
        assert_eq!(cursor.position(), 4);

        cursor.previous(Step::UNRATED);
        assert_eq!(cursor.position(), 1);

        cursor.previous(Step::UNRATED);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_filter_resets_position() {
        let mut cursor = rated(&[1, 0, 1, 0, 1]);
        cursor.next(Step::ANY);
        cursor.next(Step::ANY);

        cursor.filter(Some(&|item: &Item| item.rating == 1), false);
        assert_eq!(cursor.position(), 0);
        assert_eq!(names(&cursor), ["a", "c", "e"]);

        cursor.filter(None, false);
        assert_eq!(names(&cursor), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_filter_to_empty() {
        let mut cursor = rated(&[1, 2]);
        cursor.filter(Some(&|item: &Item| item.rating > 3), false);
        assert!(cursor.is_empty());
        assert!(cursor.current().is_none());
        assert!(cursor.next(Step::ANY).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_committed_filter_narrows_universe() {
        let mut cursor = rated(&[0, 1, 0, 1]);
        cursor.filter(Some(&|item: &Item| item.rating == 0), true);
        assert_eq!(cursor.universe_len(), 2);

        cursor.filter(None, false);
        assert_eq!(names(&cursor), ["a", "c"]);
    }

    #[test]
    fn test_sort_resets_position() {
        let mut cursor = rated(&[3, 1, 2]);
        cursor.next(Step::ANY);

        cursor.sort_by(|a, b| a.rating.cmp(&b.rating));
        assert_eq!(cursor.position(), 0);
        assert_eq!(names(&cursor), ["b", "c", "a"]);

        // unfiltered sort order survives a filter reset
        cursor.filter(None, false);
        assert_eq!(names(&cursor), ["b", "c", "a"]);
    }

    #[test]
    fn test_sort_filtered_view_keeps_universe_order() {
        let mut cursor = rated(&[3, 0, 1, 2]);
        cursor.filter(Some(&|item: &Item| item.rating > 0), false);
        cursor.sort_by(|a, b| a.rating.cmp(&b.rating));
        assert_eq!(names(&cursor), ["c", "d", "a"]);

        cursor.filter(None, false);
        assert_eq!(names(&cursor), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_shuffle_keeps_entries() {
        let mut cursor = rated(&[1, 2, 3, 4, 5, 1, 2, 3]);
        cursor.next(Step::ANY);
        cursor.shuffle(&mut rand::thread_rng());
        assert_eq!(cursor.position(), 0);

        let mut shuffled = names(&cursor);
        shuffled.sort_unstable();
        assert_eq!(shuffled, ["a", "b", "c", "d", "e", "f", "g", "h"]);
    }

    #[test]
    fn test_mutation_visible_after_filter() {
        let mut cursor = rated(&[0, 0, 0]);
        cursor.filter(Some(&|item: &Item| item.name != "a"), false);
        cursor.current_mut().unwrap().rating = 4;

        cursor.filter(Some(&|item: &Item| item.rating == 4), false);
        assert_eq!(names(&cursor), ["b"]);

        cursor.find_mut(|item| item.name == "c").unwrap().rating = 4;
        cursor.filter(Some(&|item: &Item| item.rating == 4), false);
        assert_eq!(names(&cursor), ["b", "c"]);
    }

    #[test]
    fn test_each_visits_active_list() {
        let mut cursor = rated(&[1, 2, 3, 4]);
        cursor.filter(Some(&|item: &Item| item.rating % 2 == 0), false);

        let mut total = 0;
        cursor.each(|item| total += item.rating as i32);
        assert_eq!(total, 6);
        assert_eq!(cursor.position(), 0);
    }
}
