//! JWalk-based parallel library scanner.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use vidg_core::{FileId, InodeInfo, LibraryConfig, ScanError, ScanResult, ScanWarning, WarningKind};

use crate::identity::{Clash, IdentityTracker};
use crate::policy::{FileClass, MediaFilter};
use crate::progress::{ProgressTracker, ScanPhase, ScanProgress};

/// Files between two progress broadcasts.
const PROGRESS_INTERVAL: u64 = 256;

/// Counters describing what one scan saw and kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files visited.
    pub files_visited: u64,
    /// Directories visited (excluding the root).
    pub dirs_visited: u64,
    /// Symbolic links skipped.
    pub symlinks: u64,
    /// Files kept as media.
    pub media: u64,
    /// Known auxiliary files dropped.
    pub auxiliary: u64,
    /// Files dropped by an exclusion pattern.
    pub excluded: u64,
    /// Files with an unknown extension dropped.
    pub unknown: u64,
}

/// Result of one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Root that was scanned.
    pub root: PathBuf,
    /// Media files found, in traversal order.
    pub files: Vec<ScanResult>,
    /// Non-fatal problems encountered.
    pub warnings: Vec<ScanWarning>,
    pub summary: ScanSummary,
    pub duration: Duration,
}

/// A regular file seen by the walk, before the extension policy is applied.
struct Candidate {
    record: ScanResult,
    inode: InodeInfo,
}

/// Scanner producing [`ScanResult`]s for every media file under a library root.
pub struct LibraryScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl LibraryScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the library rooted at `config.root`.
    ///
    /// Symbolic links are never followed. Unreadable directories and
    /// unreadable entries become warnings; only a bad root is an error.
    pub fn scan(&self, config: &LibraryConfig) -> Result<ScanOutput, ScanError> {
        let root = config.root.clone();
        let root_metadata = std::fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let filter = MediaFilter::from_config(config)?;
        let mut tracker = ProgressTracker::new();
        let mut summary = ScanSummary::default();
        let mut warnings = Vec::new();

        info!(root = %root.display(), "Scanning library");

        let candidates = self.walk(
            config,
            &root,
            get_dev(&root_metadata),
            &mut tracker,
            &mut summary,
            &mut warnings,
        );
        tracker.set_phase(ScanPhase::Classifying);
        let _ = self.progress_tx.send(tracker.snapshot());

        let files = apply_policy(
            &root,
            &filter,
            candidates,
            &mut tracker,
            &mut summary,
            &mut warnings,
        );

        tracker.set_phase(ScanPhase::Done);
        let duration = tracker.elapsed();
        let _ = self.progress_tx.send(tracker.snapshot());

        info!(
            found = files.len(),
            visited = summary.files_visited,
            warnings = warnings.len(),
            elapsed_ms = duration.as_millis() as u64,
            "Scan finished"
        );

        Ok(ScanOutput {
            root,
            files,
            warnings,
            summary,
            duration,
        })
    }

    /// Walk the tree and collect every regular file.
    fn walk(
        &self,
        config: &LibraryConfig,
        root: &Path,
        root_device: u64,
        tracker: &mut ProgressTracker,
        summary: &mut ScanSummary,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<Candidate> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        let mut candidates = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::read_error(&path, io),
                        None => ScanWarning::new(&path, err.to_string(), WarningKind::ReadError),
                    };
                    warn!(path = %path.display(), "Skipping unreadable entry: {err}");
                    tracker.warning();
                    warnings.push(warning);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_symlink() {
                warn!(path = %path.display(), "Ignoring symbolic link");
                summary.symlinks += 1;
                tracker.warning();
                warnings.push(ScanWarning::symlink(&path));
                continue;
            }

            if !file_type.is_dir() && !file_type.is_file() {
                debug!(path = %path.display(), "Skipping special file");
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    tracker.warning();
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            let device = get_dev(&metadata);
            if file_type.is_dir() {
                summary.dirs_visited += 1;
                if !config.cross_filesystems && device != root_device {
                    tracker.warning();
                    warnings.push(ScanWarning::new(
                        &path,
                        format!("Not crossing into another filesystem: {}", path.display()),
                        WarningKind::CrossFilesystem,
                    ));
                }
                continue;
            }

            if !config.cross_filesystems && device != root_device {
                continue;
            }

            summary.files_visited += 1;
            tracker.see_file(path.clone());
            if tracker.files_seen() % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(tracker.snapshot());
            }

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .ok()
                .and_then(to_millis);

            candidates.push(Candidate {
                inode: InodeInfo::new(get_ino(&metadata, &path), device),
                record: ScanResult::new(
                    FileId::new(get_ino(&metadata, &path)),
                    path,
                    metadata.len(),
                    created,
                ),
            });
        }

        candidates
    }
}

impl Default for LibraryScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the extension allow-list and exclusion rules, then drop repeated identities.
fn apply_policy(
    root: &Path,
    filter: &MediaFilter,
    candidates: Vec<Candidate>,
    tracker: &mut ProgressTracker,
    summary: &mut ScanSummary,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<ScanResult> {
    let mut identities = IdentityTracker::new();
    let mut files = Vec::with_capacity(candidates.len());

    for Candidate { record, inode } in candidates {
        let relative = record.path.strip_prefix(root).unwrap_or(&record.path);

        match filter.classify(relative) {
            FileClass::Media => {}
            FileClass::Auxiliary => {
                summary.auxiliary += 1;
                tracker.skip();
                continue;
            }
            FileClass::Excluded => {
                debug!(path = %record.path.display(), "Excluded by pattern");
                summary.excluded += 1;
                tracker.skip();
                continue;
            }
            FileClass::Unknown(ext) => {
                warn!(path = %record.path.display(), "Unknown file type '{}'", ext.to_uppercase());
                summary.unknown += 1;
                tracker.skip_unknown();
                tracker.warning();
                warnings.push(ScanWarning::unknown_type(&record.path, &ext));
                continue;
            }
        }

        if let Err(clash) = identities.claim(record.id, inode, &record.path) {
            let message = match &clash {
                Clash::SameFile(first) => format!("Same file as {}", first.display()),
                Clash::OtherDevice(first) => format!(
                    "Identity {} already taken by {} on another device",
                    record.id,
                    first.display()
                ),
            };
            warn!(path = %record.path.display(), "Skipping file: {message}");
            tracker.skip();
            tracker.warning();
            warnings.push(ScanWarning::new(
                &record.path,
                message,
                WarningKind::DuplicateIdentity,
            ));
            continue;
        }

        summary.media += 1;
        tracker.keep_media(record.size);
        files.push(record);
    }

    files
}

fn to_millis(time: SystemTime) -> Option<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as i64)
}

// Cross-platform metadata helpers

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &std::fs::Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the file identity from metadata.
#[cfg(unix)]
fn get_ino(metadata: &std::fs::Metadata, _path: &Path) -> u64 {
    metadata.ino()
}

/// Without inodes, fall back to a hash of the path. Renames then show up
/// as a removal plus an addition.
#[cfg(not(unix))]
fn get_ino(_metadata: &std::fs::Metadata, path: &Path) -> u64 {
    let hash = blake3::hash(path.as_os_str().as_encoded_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_library() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("season1/extras")).unwrap();
        fs::create_dir(root.join("tools")).unwrap();

        fs::write(root.join("a.mp4"), "aaaa").unwrap();
        fs::write(root.join("season1/b.mkv"), "bbbbbbbb").unwrap();
        fs::write(root.join("season1/extras/c.webm"), "cc").unwrap();
        fs::write(root.join("season1/b.srt"), "subs").unwrap();
        fs::write(root.join("notes.docx"), "doc").unwrap();
        fs::write(root.join("tools/encode.mp4"), "tool").unwrap();

        temp
    }

    fn names(output: &ScanOutput) -> Vec<String> {
        output
            .files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(&output.root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_library();
        let output = LibraryScanner::new()
            .scan(&LibraryConfig::new(temp.path()))
            .unwrap();

        assert_eq!(
            names(&output),
            ["a.mp4", "season1/b.mkv", "season1/extras/c.webm"]
        );
        assert_eq!(output.summary.media, 3);
        assert_eq!(output.summary.auxiliary, 1);
        assert_eq!(output.summary.excluded, 1);
        assert_eq!(output.summary.unknown, 1);
        assert_eq!(output.summary.files_visited, 6);
    }

    #[test]
    fn test_records_size_and_identity() {
        let temp = create_library();
        let output = LibraryScanner::new()
            .scan(&LibraryConfig::new(temp.path()))
            .unwrap();

        let b = output
            .files
            .iter()
            .find(|f| f.path.ends_with("b.mkv"))
            .unwrap();
        assert_eq!(b.size, 8);
        assert!(b.created.is_some());

        let ids: std::collections::HashSet<_> = output.files.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), output.files.len());
    }

    #[test]
    fn test_unknown_type_warning() {
        let temp = create_library();
        let output = LibraryScanner::new()
            .scan(&LibraryConfig::new(temp.path()))
            .unwrap();

        let unknown: Vec<_> = output
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::UnknownType)
            .collect();
        assert_eq!(unknown.len(), 1);
        assert!(unknown[0].path.ends_with("notes.docx"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let temp = create_library();
        let root = temp.path();
        std::os::unix::fs::symlink(root.join("a.mp4"), root.join("link.mp4")).unwrap();
        std::os::unix::fs::symlink(root.join("season1"), root.join("linked-season")).unwrap();

        let output = LibraryScanner::new()
            .scan(&LibraryConfig::new(root))
            .unwrap();

        assert_eq!(output.files.len(), 3);
        assert_eq!(output.summary.symlinks, 2);
        assert_eq!(
            output
                .warnings
                .iter()
                .filter(|w| w.kind == WarningKind::Symlink)
                .count(),
            2
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlinks_keep_first_path() {
        let temp = create_library();
        let root = temp.path();
        fs::hard_link(root.join("a.mp4"), root.join("z-copy.mp4")).unwrap();

        let output = LibraryScanner::new()
            .scan(&LibraryConfig::new(root))
            .unwrap();

        assert!(names(&output).contains(&"a.mp4".to_string()));
        assert!(!names(&output).contains(&"z-copy.mp4".to_string()));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::DuplicateIdentity));
    }

    #[test]
    fn test_same_inode_on_two_devices_keeps_first() {
        let root = Path::new("/lib");
        let filter = MediaFilter::from_config(&LibraryConfig::new(root)).unwrap();
        let candidate = |name: &str, device: u64| Candidate {
            record: ScanResult::new(FileId::new(5), root.join(name), 10, None),
            inode: InodeInfo::new(5, device),
        };

        let mut tracker = ProgressTracker::new();
        let mut summary = ScanSummary::default();
        let mut warnings = Vec::new();
        let files = apply_policy(
            root,
            &filter,
            vec![candidate("a.mp4", 1), candidate("mnt/b.mp4", 2)],
            &mut tracker,
            &mut summary,
            &mut warnings,
        );

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, root.join("a.mp4"));
        assert_eq!(summary.media, 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DuplicateIdentity);
        assert!(warnings[0].path.ends_with("mnt/b.mp4"));

        let progress = tracker.snapshot();
        assert_eq!(progress.media_found, 1);
        assert_eq!(progress.skipped, 1);
    }

    #[test]
    fn test_custom_exclusions() {
        let temp = create_library();
        let config = LibraryConfig::builder()
            .root(temp.path())
            .exclude_patterns(vec!["season1/extras/**".to_string()])
            .build()
            .unwrap();

        let output = LibraryScanner::new().scan(&config).unwrap();
        assert_eq!(names(&output), ["a.mp4", "season1/b.mkv", "tools/encode.mp4"]);
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_library();
        let result = LibraryScanner::new().scan(&LibraryConfig::new(temp.path().join("a.mp4")));
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));

        let result = LibraryScanner::new().scan(&LibraryConfig::new(temp.path().join("missing")));
        assert!(matches!(result, Err(ScanError::NotFound { .. })));
    }
}
