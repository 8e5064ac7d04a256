//! Extension allow-list and path exclusion rules.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use vidg_core::{LibraryConfig, ScanError};

/// How a scanned file is treated by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileClass {
    /// A media file to catalog.
    Media,
    /// A known non-media file (subtitles, the catalog itself, ...). Dropped silently.
    Auxiliary,
    /// Matches an exclusion pattern. Dropped regardless of extension.
    Excluded,
    /// Any other extension. Dropped with a warning.
    Unknown(String),
}

/// Decides which scanned files belong in the catalog.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    exclude: GlobSet,
    media: Vec<String>,
    auxiliary: Vec<String>,
}

impl MediaFilter {
    /// Build the filter from a library configuration.
    pub fn from_config(config: &LibraryConfig) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad exclude pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            exclude,
            media: lowercase(&config.media_extensions),
            auxiliary: lowercase(&config.auxiliary_extensions),
        })
    }

    /// Classify a file by its path relative to the library root.
    pub fn classify(&self, relative: &Path) -> FileClass {
        if self.exclude.is_match(relative) {
            return FileClass::Excluded;
        }

        let ext = relative
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if self.media.contains(&ext) {
            FileClass::Media
        } else if self.auxiliary.contains(&ext) {
            FileClass::Auxiliary
        } else {
            FileClass::Unknown(ext)
        }
    }
}

fn lowercase(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.to_lowercase()).collect()
}
