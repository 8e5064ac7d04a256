//! Aggregates over catalog entries.

use std::collections::BTreeMap;

use serde::Serialize;

use vidg_core::{CatalogEntry, Rating};

/// Smallest and largest value of one attribute; `None` when no entry has it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Span<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Span<T> {
    fn of(values: impl Iterator<Item = T>) -> Self {
        values.fold(Self { min: None, max: None }, |span, v| Self {
            min: Some(span.min.map_or(v, |m| if v < m { v } else { m })),
            max: Some(span.max.map_or(v, |m| if v > m { v } else { m })),
        })
    }
}

/// Value ranges of the library, for range sliders and summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatRanges {
    pub bitrate: Span<u32>,
    pub created: Span<i64>,
    pub duration: Span<f64>,
    pub height: Span<u32>,
    pub size: Span<u64>,
    pub width: Span<u32>,
}

impl StatRanges {
    pub fn of<'a>(entries: impl Iterator<Item = &'a CatalogEntry> + Clone) -> Self {
        Self {
            bitrate: Span::of(entries.clone().filter_map(|e| e.stats.bitrate)),
            created: Span::of(entries.clone().filter_map(|e| e.stats.created)),
            duration: Span::of(entries.clone().filter_map(|e| e.stats.duration)),
            height: Span::of(entries.clone().filter_map(|e| e.stats.height)),
            size: Span::of(entries.clone().map(|e| e.stats.size)),
            width: Span::of(entries.filter_map(|e| e.stats.width)),
        }
    }
}

/// Entry count and byte total of one rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RatingBucket {
    pub count: usize,
    pub size: u64,
}

/// Rating → bucket, for the ratings present in `entries`.
pub fn rating_histogram<'a>(
    entries: impl Iterator<Item = &'a CatalogEntry>,
) -> BTreeMap<Rating, RatingBucket> {
    let mut histogram: BTreeMap<Rating, RatingBucket> = BTreeMap::new();
    for entry in entries {
        let bucket = histogram.entry(entry.rating).or_default();
        bucket.count += 1;
        bucket.size += entry.stats.size;
    }
    histogram
}
