//! Browsing and curation over a vidg catalog.
//!
//! [`Browser`] wraps the core [`Cursor`](vidg_core::Cursor) with the
//! operations a UI drives: combined filters (rating, path text, shared
//! attribute), sort keys, rating changes that write through to the
//! catalog, size and rating aggregates, and emptying the trash.

mod browser;
mod filter;
mod sort;
mod stats;

pub use browser::Browser;
pub use filter::{Filters, RatingFilter, RatingMode, StatKey};
pub use sort::{SortKey, SortOrder};
pub use stats::{RatingBucket, Span, StatRanges, rating_histogram};
