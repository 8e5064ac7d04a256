//! Library and extraction configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the optional per-library settings file.
pub const CONFIG_FILE_NAME: &str = ".vidg.toml";

/// Errors loading a library configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for one media library.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct LibraryConfig {
    /// Library root directory.
    #[serde(skip)]
    pub root: PathBuf,

    /// Catalog file name, created inside the root.
    #[builder(default = "default_catalog_file()")]
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,

    /// Extensions (lowercase, without dot) that are catalogued.
    #[builder(default = "default_media_extensions()")]
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,

    /// Extensions that are expected in a library but silently skipped.
    #[builder(default = "default_auxiliary_extensions()")]
    #[serde(default = "default_auxiliary_extensions")]
    pub auxiliary_extensions: Vec<String>,

    /// Glob patterns, relative to the root, that are never catalogued.
    #[builder(default = "default_exclude_patterns()")]
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Descend into directories mounted from other filesystems.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub cross_filesystems: bool,

    /// Number of threads for scanning (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Re-run extraction for catalogued entries that have no preview yet.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub retry_incomplete: bool,

    /// Extraction pipeline settings.
    #[builder(default)]
    #[serde(default)]
    pub extract: ExtractConfig,
}

fn default_true() -> bool {
    true
}

fn default_catalog_file() -> String {
    ".vidg.sqlite".to_string()
}

fn default_media_extensions() -> Vec<String> {
    [
        "3gp", "asf", "avi", "divx", "m4v", "mkv", "mov", "mp2t", "mp4", "mpeg", "mpg", "ogv",
        "quicktime", "webm", "wmv",
    ]
    .map(String::from)
    .to_vec()
}

fn default_auxiliary_extensions() -> Vec<String> {
    [
        "gif", "jpeg", "jpg", "png", "sqlite", "srt", "toml", "txt", "webp",
    ]
    .map(String::from)
    .to_vec()
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["**/tools/**".to_string()]
}

impl LibraryConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => {
                if let Some(ref extract) = self.extract {
                    extract.validate()?;
                }
                Ok(())
            }
            None => Err("Root path is required".to_string()),
        }
    }
}

impl LibraryConfig {
    /// Create a new library config builder.
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder::default()
    }

    /// Create a default config for a library root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            catalog_file: default_catalog_file(),
            media_extensions: default_media_extensions(),
            auxiliary_extensions: default_auxiliary_extensions(),
            exclude_patterns: default_exclude_patterns(),
            cross_filesystems: true,
            threads: 0,
            retry_incomplete: true,
            extract: ExtractConfig::default(),
        }
    }

    /// Load the config for `root`, reading `.vidg.toml` from it when present.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let path = root.join(CONFIG_FILE_NAME);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<Self>(&text)
                .map_err(|source| ConfigError::Parse { path, source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::new(&root),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        config.root = root;
        config.extract.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Absolute path of the catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.catalog_file)
    }

    /// Whether files with this extension are catalogued.
    pub fn is_media_extension(&self, ext: &str) -> bool {
        contains_ignore_case(&self.media_extensions, ext)
    }

    /// Whether files with this extension are skipped without a warning.
    pub fn is_auxiliary_extension(&self, ext: &str) -> bool {
        contains_ignore_case(&self.auxiliary_extensions, ext)
    }

    /// Path of `path` relative to the library root, if it lies inside it.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }
}

fn contains_ignore_case(list: &[String], ext: &str) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Configuration for the probe/sample/composite pipeline.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ExtractConfig {
    /// Frames sampled per file.
    #[builder(default = "15")]
    pub frame_count: u32,

    /// Frames per contact sheet row.
    #[builder(default = "5")]
    pub columns: u32,

    /// Width of one sampled frame.
    #[builder(default = "200")]
    pub frame_width: u32,

    /// Height of one sampled frame.
    #[builder(default = "150")]
    pub frame_height: u32,

    /// Pixels between contact sheet cells.
    #[builder(default = "0")]
    pub padding: u32,

    /// Seconds per frame assumed when the duration is unknown.
    #[builder(default = "30.0")]
    pub fallback_secs_per_frame: f64,

    /// Channel quantization step for dominant colors.
    #[builder(default = "16")]
    pub color_bin: u16,

    /// Number of dominant colors kept.
    #[builder(default = "5")]
    pub color_count: usize,

    /// Preview JPEG quality (1-100).
    #[builder(default = "80")]
    pub jpeg_quality: u8,

    /// Metadata probe executable.
    #[builder(default = "\"ffprobe\".to_string()")]
    pub probe_program: String,

    /// Frame sampler executable.
    #[builder(default = "\"ffmpeg\".to_string()")]
    pub sampler_program: String,

    /// Per-process timeout in seconds (0 = none).
    #[builder(default = "60")]
    pub timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            frame_count: 15,
            columns: 5,
            frame_width: 200,
            frame_height: 150,
            padding: 0,
            fallback_secs_per_frame: 30.0,
            color_bin: 16,
            color_count: 5,
            jpeg_quality: 80,
            probe_program: "ffprobe".to_string(),
            sampler_program: "ffmpeg".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ExtractConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let non_zero = [
            ("frame_count", self.frame_count),
            ("columns", self.columns),
            ("frame_width", self.frame_width),
            ("frame_height", self.frame_height),
        ];
        for (name, value) in non_zero {
            if value == Some(0) {
                return Err(format!("{name} must be greater than zero"));
            }
        }
        if self.color_bin.is_some_and(|bin| !(1..=256).contains(&bin)) {
            return Err("color_bin must be within 1..=256".to_string());
        }
        if self.jpeg_quality.is_some_and(|quality| !(1..=100).contains(&quality)) {
            return Err("jpeg_quality must be within 1..=100".to_string());
        }
        Ok(())
    }
}

impl ExtractConfig {
    /// Create a new extract config builder.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    /// Check invariants on an already constructed config.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_count == 0 || self.columns == 0 {
            return Err("frame_count and columns must be greater than zero".to_string());
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err("frame dimensions must be greater than zero".to_string());
        }
        if !(1..=256).contains(&self.color_bin) {
            return Err("color_bin must be within 1..=256".to_string());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err("jpeg_quality must be within 1..=100".to_string());
        }
        Ok(())
    }

    /// Number of contact sheet rows.
    pub fn rows(&self) -> u32 {
        self.frame_count.div_ceil(self.columns)
    }

    /// Pixel width of the whole contact sheet.
    pub fn sheet_width(&self) -> u32 {
        self.columns * self.frame_width + (self.columns - 1) * self.padding
    }

    /// Pixel height of the whole contact sheet.
    pub fn sheet_height(&self) -> u32 {
        let rows = self.rows();
        rows * self.frame_height + rows.saturating_sub(1) * self.padding
    }

    /// Span used for position planning when the probe reports no duration.
    pub fn fallback_duration(&self) -> f64 {
        self.fallback_secs_per_frame * self.frame_count as f64
    }

    /// Timeout applied to each external process.
    pub fn process_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_builder() {
        let config = LibraryConfig::builder()
            .root("/media/videos")
            .threads(4usize)
            .exclude_patterns(vec!["**/private/**".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/media/videos"));
        assert_eq!(config.threads, 4);
        assert_eq!(config.catalog_file, ".vidg.sqlite");
        assert_eq!(config.exclude_patterns, vec!["**/private/**".to_string()]);
        assert!(config.retry_incomplete);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(LibraryConfig::builder().build().is_err());
        assert!(LibraryConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_extension_policy() {
        let config = LibraryConfig::new("/media");
        assert!(config.is_media_extension("mp4"));
        assert!(config.is_media_extension("MKV"));
        assert!(!config.is_media_extension("srt"));
        assert!(config.is_auxiliary_extension("srt"));
        assert!(config.is_auxiliary_extension("sqlite"));
        assert!(!config.is_auxiliary_extension("doc"));
    }

    #[test]
    fn test_extract_config_geometry() {
        let config = ExtractConfig::default();
        assert_eq!(config.rows(), 3);
        assert_eq!(config.sheet_width(), 1000);
        assert_eq!(config.sheet_height(), 450);
        assert_eq!(config.fallback_duration(), 450.0);

        let padded = ExtractConfig::builder()
            .frame_count(7u32)
            .columns(3u32)
            .padding(2u32)
            .build()
            .unwrap();
        assert_eq!(padded.rows(), 3);
        assert_eq!(padded.sheet_width(), 3 * 200 + 2 * 2);
        assert_eq!(padded.sheet_height(), 3 * 150 + 2 * 2);
    }

    #[test]
    fn test_extract_builder_validation() {
        assert!(ExtractConfig::builder().columns(0u32).build().is_err());
        assert!(ExtractConfig::builder().color_bin(0u16).build().is_err());
        assert!(ExtractConfig::builder().jpeg_quality(0u8).build().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = LibraryConfig::load(temp.path()).unwrap();
        assert_eq!(config.root, temp.path());
        assert_eq!(config.extract, ExtractConfig::default());
    }

    #[test]
    fn test_load_from_toml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "exclude_patterns = [\"**/raw/**\"]\n\n[extract]\nframe_count = 10\ncolumns = 2\n",
        )
        .unwrap();

        let config = LibraryConfig::load(temp.path()).unwrap();
        assert_eq!(config.exclude_patterns, vec!["**/raw/**".to_string()]);
        assert_eq!(config.extract.frame_count, 10);
        assert_eq!(config.extract.columns, 2);
        assert_eq!(config.extract.frame_width, 200);
        assert!(config.is_media_extension("mp4"));
    }

    #[test]
    fn test_load_rejects_invalid_extract() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[extract]\ncolumns = 0\n",
        )
        .unwrap();

        assert!(matches!(
            LibraryConfig::load(temp.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
