use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vidg_catalog::{CatalogStore, MemoryCatalog, SqliteCatalog};
use vidg_core::{ColorSummary, LibraryConfig, Media, Rating};
use vidg_extract::{ExtractionError, MediaExtractor};
use vidg_sync::{SyncProgress, Syncer};

/// Extractor that never touches external tools.
#[derive(Default)]
struct FakeExtractor {
    /// File names that fail as unprobable.
    failing: Vec<&'static str>,
    /// File name that cancels the token and then never finishes.
    hang_on: Option<(&'static str, CancellationToken)>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    fn failing(names: &[&'static str]) -> Self {
        Self {
            failing: names.to_vec(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl MediaExtractor for FakeExtractor {
    async fn extract(&self, path: &Path) -> Result<Media, ExtractionError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        if let Some((hang, token)) = &self.hang_on {
            if name == *hang {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }
        if self.failing.contains(&name.as_str()) {
            return Err(ExtractionError::Unprobable {
                path: path.to_path_buf(),
            });
        }

        Ok(Media {
            bitrate: Some(1000),
            duration: Some(60.0),
            fps: Some(25.0),
            height: Some(720),
            width: Some(1280),
            preview: vec![0xff, 0xd8, 0xff, 0xd9],
            colors: ColorSummary::new(vec![[0x30, 0x40, 0x50]]),
        })
    }
}

fn library(files: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for name in files {
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, name.as_bytes()).unwrap();
    }
    temp
}

fn names(store: &impl CatalogStore, root: &Path) -> Vec<String> {
    let mut names: Vec<_> = store
        .all()
        .unwrap()
        .iter()
        .map(|e| e.path.strip_prefix(root).unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_new_file_is_added_next_to_known_one() {
    let temp = library(&["known.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = SqliteCatalog::open_library(&config).unwrap();
    let syncer = Syncer::new(config, FakeExtractor::default());

    let first = syncer.sync(&mut store).await.unwrap();
    assert_eq!(first.added, 1);

    fs::write(temp.path().join("new.mkv"), b"new").unwrap();
    let second = syncer.sync(&mut store).await.unwrap();

    assert_eq!(second.found, 2);
    assert_eq!(second.added, 1);
    assert_eq!(second.removed, 0);
    assert_eq!(syncer.extractor().calls(), ["known.mp4", "new.mkv"]);

    let entries = store.all().unwrap();
    assert_eq!(entries.len(), 2);
    let new = entries.iter().find(|e| e.path.ends_with("new.mkv")).unwrap();
    assert!(!new.preview.is_empty());
    assert_eq!(new.rating, Rating::UNRATED);
    assert_eq!(new.stats.size, 3);
    assert_eq!(new.stats.width, Some(1280));
}

#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let temp = library(&["a.mp4", "b/c.webm"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::default());

    syncer.sync(&mut store).await.unwrap();
    let again = syncer.sync(&mut store).await.unwrap();

    assert!(!again.has_changes());
    assert_eq!(again.found, 2);
    assert_eq!(syncer.extractor().calls().len(), 2);
}

#[tokio::test]
async fn test_removed_file_leaves_catalog() {
    let temp = library(&["a.mp4", "b.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    fs::remove_file(temp.path().join("a.mp4")).unwrap();
    let report = syncer.sync(&mut store).await.unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(names(&store, temp.path()), ["b.mp4"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_rename_updates_path_without_extraction() {
    let temp = library(&["inbox/a.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = SqliteCatalog::open_library(&config).unwrap();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    let id = store.all().unwrap()[0].id;
    store.set_rating(id, Rating::new(4).unwrap()).unwrap();

    fs::create_dir(temp.path().join("keep")).unwrap();
    fs::rename(temp.path().join("inbox/a.mp4"), temp.path().join("keep/a.mp4")).unwrap();
    let report = syncer.sync(&mut store).await.unwrap();

    assert_eq!(report.renamed, 1);
    assert_eq!(report.added, 0);
    assert_eq!(syncer.extractor().calls().len(), 1);

    let entry = store.get(id).unwrap().unwrap();
    assert_eq!(entry.path, temp.path().join("keep/a.mp4"));
    assert_eq!(entry.rating.value(), 4);
}

#[cfg(unix)]
#[tokio::test]
async fn test_swapped_names_keep_their_entries() {
    let temp = library(&["a.mp4", "b.mp4"]);
    let root = temp.path();
    let config = LibraryConfig::new(root);
    let mut store = SqliteCatalog::open_library(&config).unwrap();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    let id_of = |store: &SqliteCatalog, name: &str| {
        store
            .all()
            .unwrap()
            .into_iter()
            .find(|e| e.path == root.join(name))
            .unwrap()
            .id
    };
    let (a, b) = (id_of(&store, "a.mp4"), id_of(&store, "b.mp4"));

    fs::rename(root.join("a.mp4"), root.join("swap.tmp")).unwrap();
    fs::rename(root.join("b.mp4"), root.join("a.mp4")).unwrap();
    fs::rename(root.join("swap.tmp"), root.join("b.mp4")).unwrap();
    let report = syncer.sync(&mut store).await.unwrap();

    assert_eq!(report.renamed, 2);
    assert_eq!(report.added, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(store.get(a).unwrap().unwrap().path, root.join("b.mp4"));
    assert_eq!(store.get(b).unwrap().unwrap().path, root.join("a.mp4"));

    // and the library keeps syncing afterwards
    fs::write(root.join("c.mp4"), b"c").unwrap();
    let next = syncer.sync(&mut store).await.unwrap();
    assert_eq!(next.added, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_renumbered_chain_is_applied() {
    let temp = library(&["ep1.mp4", "ep2.mp4"]);
    let root = temp.path();
    let config = LibraryConfig::new(root);
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    let before: Vec<_> = store.all().unwrap();
    let id_of = |name: &str| before.iter().find(|e| e.path == root.join(name)).unwrap().id;
    let (ep1, ep2) = (id_of("ep1.mp4"), id_of("ep2.mp4"));

    fs::rename(root.join("ep2.mp4"), root.join("ep3.mp4")).unwrap();
    fs::rename(root.join("ep1.mp4"), root.join("ep2.mp4")).unwrap();
    fs::write(root.join("ep1.mp4"), b"new pilot").unwrap();
    let report = syncer.sync(&mut store).await.unwrap();

    assert_eq!(report.renamed, 2);
    assert_eq!(report.added, 1);
    assert_eq!(store.get(ep1).unwrap().unwrap().path, root.join("ep2.mp4"));
    assert_eq!(store.get(ep2).unwrap().unwrap().path, root.join("ep3.mp4"));
    assert_eq!(names(&store, root), ["ep1.mp4", "ep2.mp4", "ep3.mp4"]);
}

#[tokio::test]
async fn test_failed_extraction_is_isolated() {
    let temp = library(&["a.mp4", "broken.mp4", "c.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::failing(&["broken.mp4"]));

    let report = syncer.sync(&mut store).await.unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("broken.mp4"));
    assert!(report.failed[0].error.contains("unprobable"));
    assert_eq!(names(&store, temp.path()), ["a.mp4", "c.mp4"]);

    // retried on the next pass
    syncer.sync(&mut store).await.unwrap();
    assert_eq!(
        syncer.extractor().calls(),
        ["a.mp4", "broken.mp4", "c.mp4", "broken.mp4"]
    );
}

#[tokio::test]
async fn test_incomplete_entries_are_completed() {
    let temp = library(&["a.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    let id = store.all().unwrap()[0].id;
    let mut bare = store.get(id).unwrap().unwrap();
    bare.preview.clear();
    store.remove(id).unwrap();
    store.insert(&bare).unwrap();

    let report = syncer.sync(&mut store).await.unwrap();
    assert_eq!(report.completed, 1);
    assert!(store.incomplete().unwrap().is_empty());
}

#[tokio::test]
async fn test_incomplete_retry_can_be_disabled() {
    let temp = library(&["a.mp4"]);
    let config = LibraryConfig::builder()
        .root(temp.path())
        .retry_incomplete(false)
        .build()
        .unwrap();
    let mut store = MemoryCatalog::new();
    let syncer = Syncer::new(config, FakeExtractor::default());
    syncer.sync(&mut store).await.unwrap();

    let id = store.all().unwrap()[0].id;
    let mut bare = store.get(id).unwrap().unwrap();
    bare.preview.clear();
    store.remove(id).unwrap();
    store.insert(&bare).unwrap();

    let report = syncer.sync(&mut store).await.unwrap();
    assert_eq!(report.completed, 0);
    assert_eq!(store.incomplete().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancellation_keeps_committed_entries() {
    let temp = library(&["a.mp4", "b.mp4", "c.mp4"]);
    let config = LibraryConfig::new(temp.path());
    let token = CancellationToken::new();
    let extractor = FakeExtractor {
        hang_on: Some(("b.mp4", token.clone())),
        ..FakeExtractor::default()
    };
    let syncer = Syncer::new(config, extractor).with_cancellation(token);
    let mut store = MemoryCatalog::new();

    let report = syncer.sync(&mut store).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.added, 1);
    assert_eq!(names(&store, temp.path()), ["a.mp4"]);
}

#[tokio::test]
async fn test_progress_events() {
    let temp = library(&["a.mp4", "b.mp4"]);
    let syncer = Syncer::new(LibraryConfig::new(temp.path()), FakeExtractor::default());
    let mut progress = syncer.subscribe();
    syncer.sync(&mut MemoryCatalog::new()).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = progress.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events.first(),
        Some(&SyncProgress::Scanned {
            found: 2,
            warnings: 0
        })
    );
    assert!(events.contains(&SyncProgress::Diffed {
        added: 2,
        removed: 0,
        renamed: 0
    }));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, SyncProgress::Processing { total: 2, .. }))
            .count(),
        2
    );
    assert_eq!(events.last(), Some(&SyncProgress::Finished));
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let syncer = Syncer::new(
        LibraryConfig::new(temp.path().join("gone")),
        FakeExtractor::default(),
    );
    assert!(syncer.sync(&mut MemoryCatalog::new()).await.is_err());
}
