//! Catalog entry and scan record types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identity of a physical file (the inode on Unix).
///
/// Survives renames and moves within the same filesystem, which is what
/// lets a sync pass tell a rename apart from a delete followed by an add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl FileId {
    /// Create a new FileId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inode information used to keep identities unique within one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// Curation rating of an entry.
///
/// `-1` marks the file for removal, `0` is unrated, `1..=5` are keep tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(i8);

impl Rating {
    /// Marked for removal.
    pub const TRASH: Rating = Rating(-1);
    /// Default for newly catalogued entries.
    pub const UNRATED: Rating = Rating(0);
    /// Highest keep tier.
    pub const MAX: Rating = Rating(5);

    /// Create a rating, rejecting values outside `-1..=5`.
    pub fn new(value: i64) -> Option<Self> {
        (Self::TRASH.value()..=Self::MAX.value())
            .contains(&value)
            .then(|| Self(value as i8))
    }

    /// Numeric value of the rating.
    pub fn value(self) -> i64 {
        self.0 as i64
    }

    /// One tier up, saturating at 5.
    pub fn increased(self) -> Self {
        Self((self.0 + 1).min(Self::MAX.0))
    }

    /// One tier down, saturating at -1.
    pub fn decreased(self) -> Self {
        Self((self.0 - 1).max(Self::TRASH.0))
    }

    pub fn is_unrated(self) -> bool {
        self == Self::UNRATED
    }

    pub fn is_trash(self) -> bool {
        self == Self::TRASH
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::UNRATED
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rating {value} is outside -1..=5"))
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dominant colors of a preview, most frequent first.
///
/// Rendered as concatenated six-digit hex triples, e.g. `"a0b0c0102030"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ColorSummary(pub Vec<[u8; 3]>);

impl ColorSummary {
    pub fn new(colors: Vec<[u8; 3]>) -> Self {
        Self(colors)
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ColorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for [r, g, b] in &self.0 {
            write!(f, "{r:02x}{g:02x}{b:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ColorSummary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() % 6 != 0 || !s.is_ascii() {
            return Err(format!("invalid color summary: {s:?}"));
        }

        let colors = s
            .as_bytes()
            .chunks(6)
            .map(|chunk| {
                let hex = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 2], 16)
                        .map_err(|_| format!("invalid color summary: {s:?}"))
                };
                Ok([channel(0)?, channel(2)?, channel(4)?])
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self(colors))
    }
}

impl From<ColorSummary> for String {
    fn from(summary: ColorSummary) -> Self {
        summary.to_string()
    }
}

impl TryFrom<String> for ColorSummary {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Technical attributes of a media file.
///
/// Everything except `size` stays `None` until derived by extraction or
/// the filesystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaStats {
    /// Bitrate in kb/s.
    pub bitrate: Option<u32>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Frames per second.
    pub fps: Option<f64>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// File size in bytes.
    pub size: u64,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: Option<i64>,
    /// Dominant colors of the preview.
    pub colors: Option<ColorSummary>,
}

/// Everything the extraction pipeline derives for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub bitrate: Option<u32>,
    pub duration: Option<f64>,
    pub fps: Option<f64>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// Encoded contact sheet (JPEG).
    #[serde(skip)]
    pub preview: Vec<u8>,
    pub colors: ColorSummary,
}

/// One persisted catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable identity, unique within the catalog.
    pub id: FileId,
    /// Absolute path at runtime, unique within the catalog.
    pub path: PathBuf,
    /// Curation rating.
    pub rating: Rating,
    /// Encoded preview image; empty until extraction completes.
    #[serde(skip)]
    pub preview: Vec<u8>,
    /// Technical attributes.
    pub stats: MediaStats,
}

impl CatalogEntry {
    /// Build a fresh, unrated entry from a scan record and its extracted media.
    pub fn from_scan(scan: ScanResult, media: Media) -> Self {
        let mut entry = Self {
            id: scan.id,
            path: scan.path,
            rating: Rating::UNRATED,
            preview: Vec::new(),
            stats: MediaStats {
                size: scan.size,
                created: scan.created,
                ..MediaStats::default()
            },
        };
        entry.apply_media(media);
        entry
    }

    /// Overwrite the derived attributes with freshly extracted media.
    pub fn apply_media(&mut self, media: Media) {
        self.preview = media.preview;
        self.stats.bitrate = media.bitrate;
        self.stats.duration = media.duration;
        self.stats.fps = media.fps;
        self.stats.height = media.height;
        self.stats.width = media.width;
        self.stats.colors = Some(media.colors);
    }

    /// An entry without a preview is eligible for (re-)extraction.
    pub fn is_incomplete(&self) -> bool {
        self.preview.is_empty()
    }
}

/// A file found by one scan pass. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Filesystem identity.
    pub id: FileId,
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Creation time in milliseconds since the Unix epoch, if the platform reports it.
    pub created: Option<i64>,
}

impl ScanResult {
    pub fn new(id: FileId, path: impl Into<PathBuf>, size: u64, created: Option<i64>) -> Self {
        Self {
            id,
            path: path.into(),
            size,
            created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert_eq!(Rating::new(-1), Some(Rating::TRASH));
        assert_eq!(Rating::new(5), Some(Rating::MAX));
        assert!(Rating::new(6).is_none());
        assert!(Rating::new(-2).is_none());
    }

    #[test]
    fn test_rating_clamps() {
        assert_eq!(Rating::MAX.increased(), Rating::MAX);
        assert_eq!(Rating::TRASH.decreased(), Rating::TRASH);
        assert_eq!(Rating::UNRATED.increased().value(), 1);
        assert_eq!(Rating::UNRATED.decreased(), Rating::TRASH);
    }

    #[test]
    fn test_color_summary_hex() {
        let summary = ColorSummary::new(vec![[0xa0, 0xb0, 0xc0], [0x10, 0x20, 0x30]]);
        assert_eq!(summary.to_string(), "a0b0c0102030");

        let parsed: ColorSummary = "a0b0c0102030".parse().unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_color_summary_rejects_garbage() {
        assert!("a0b0c".parse::<ColorSummary>().is_err());
        assert!("zzzzzz".parse::<ColorSummary>().is_err());
        assert!("".parse::<ColorSummary>().unwrap().is_empty());
    }

    #[test]
    fn test_entry_from_scan() {
        let scan = ScanResult::new(FileId::new(7), "/lib/a.mp4", 1024, Some(1_000));
        let media = Media {
            duration: Some(12.5),
            preview: vec![1, 2, 3],
            ..Media::default()
        };

        let entry = CatalogEntry::from_scan(scan, media);
        assert_eq!(entry.rating, Rating::UNRATED);
        assert_eq!(entry.stats.size, 1024);
        assert_eq!(entry.stats.duration, Some(12.5));
        assert!(!entry.is_incomplete());
    }
}
