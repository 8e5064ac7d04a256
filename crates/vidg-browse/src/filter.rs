//! Filters over catalog entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use vidg_core::{CatalogEntry, FileId, Rating};

/// How an entry's rating is compared with the filter rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RatingMode {
    /// Exactly the rating.
    #[default]
    Equal,
    /// The rating or lower.
    Max,
    /// The rating or higher.
    Min,
}

/// Keep entries by rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFilter {
    pub rating: Rating,
    #[serde(default)]
    pub mode: RatingMode,
}

impl RatingFilter {
    pub fn new(rating: Rating, mode: RatingMode) -> Self {
        Self { rating, mode }
    }

    pub fn matches(&self, rating: Rating) -> bool {
        match self.mode {
            RatingMode::Equal => rating == self.rating,
            RatingMode::Max => rating <= self.rating,
            RatingMode::Min => rating >= self.rating,
        }
    }
}

/// A technical attribute entries can share.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatKey {
    Size,
    Duration,
    Bitrate,
    Colors,
    Width,
    Height,
    Fps,
    Created,
}

/// Hashable form of one entry's value for a [`StatKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StatValue {
    Number(u64),
    Text(String),
}

impl StatKey {
    /// `None` when the entry has no value for this attribute yet.
    fn value(self, entry: &CatalogEntry) -> Option<StatValue> {
        let stats = &entry.stats;
        let number = match self {
            Self::Size => Some(stats.size),
            Self::Duration => stats.duration.map(f64::to_bits),
            Self::Bitrate => stats.bitrate.map(u64::from),
            Self::Width => stats.width.map(u64::from),
            Self::Height => stats.height.map(u64::from),
            Self::Fps => stats.fps.map(f64::to_bits),
            Self::Created => stats.created.map(|c| c as u64),
            Self::Colors => {
                return stats
                    .colors
                    .as_ref()
                    .filter(|c| !c.is_empty())
                    .map(|c| StatValue::Text(c.to_string()));
            }
        };
        number.map(StatValue::Number)
    }
}

/// Filters applied together; an entry must pass every one that is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub rating: Option<RatingFilter>,
    /// Path substring, matched by the catalog's search.
    pub text: Option<String>,
    /// Keep only entries sharing this attribute's value with another entry.
    pub duplicate: Option<StatKey>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.text().is_none() && self.duplicate.is_none()
    }

    /// The text filter, ignoring blank input.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Values of `key` held by more than one of `entries`.
fn shared_values<'a>(
    key: StatKey,
    entries: impl Iterator<Item = &'a CatalogEntry>,
) -> HashSet<StatValue> {
    let mut seen = HashSet::new();
    let mut shared = HashSet::new();
    for value in entries.filter_map(|e| key.value(e)) {
        if !seen.insert(value.clone()) {
            shared.insert(value);
        }
    }
    shared
}

/// The conjunction of a set of [`Filters`], ready to test entries.
pub(crate) struct Predicate {
    rating: Option<RatingFilter>,
    ids: Option<HashSet<FileId>>,
    duplicate: Option<(StatKey, HashSet<StatValue>)>,
}

impl Predicate {
    /// `universe` is scanned once for the duplicate filter; `ids` holds the
    /// identities found by the text search, if one was run.
    pub(crate) fn new<'a>(
        filters: &Filters,
        universe: impl Iterator<Item = &'a CatalogEntry>,
        ids: Option<HashSet<FileId>>,
    ) -> Self {
        Self {
            rating: filters.rating,
            ids,
            duplicate: filters
                .duplicate
                .map(|key| (key, shared_values(key, universe))),
        }
    }

    pub(crate) fn matches(&self, entry: &CatalogEntry) -> bool {
        self.rating.is_none_or(|f| f.matches(entry.rating))
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&entry.id))
            && self.duplicate.as_ref().is_none_or(|(key, shared)| {
                key.value(entry).is_some_and(|v| shared.contains(&v))
            })
    }
}
