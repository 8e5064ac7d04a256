//! Sort keys for the browsing view.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use vidg_core::CatalogEntry;

/// Attribute to order entries by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Rating,
    #[default]
    Size,
    Duration,
    Bitrate,
    Created,
    Width,
    Height,
    Fps,
    Path,
    /// Uniform shuffle; the order is ignored.
    Random,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

fn by_float(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => a.is_some().cmp(&b.is_some()),
    }
}

impl SortKey {
    /// Compare two entries by this key in ascending order. Missing values
    /// sort before present ones. [`SortKey::Random`] compares equal.
    pub fn compare(self, a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        let (x, y) = (&a.stats, &b.stats);
        match self {
            Self::Rating => a.rating.cmp(&b.rating),
            Self::Size => x.size.cmp(&y.size),
            Self::Duration => by_float(x.duration, y.duration),
            Self::Bitrate => x.bitrate.cmp(&y.bitrate),
            Self::Created => x.created.cmp(&y.created),
            Self::Width => x.width.cmp(&y.width),
            Self::Height => x.height.cmp(&y.height),
            Self::Fps => by_float(x.fps, y.fps),
            Self::Path => a.path.cmp(&b.path),
            Self::Random => Ordering::Equal,
        }
    }

    /// Comparator for this key in `order`.
    pub fn comparator(self, order: SortOrder) -> impl Fn(&CatalogEntry, &CatalogEntry) -> Ordering {
        move |a, b| order.apply(self.compare(a, b))
    }
}
