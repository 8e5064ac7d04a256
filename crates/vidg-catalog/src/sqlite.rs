//! SQLite-backed catalog.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode, OptionalExtension, Params, Row, params};
use tracing::{debug, info};

use vidg_core::{CatalogEntry, ColorSummary, FileId, LibraryConfig, Media, MediaStats, Rating};

use crate::error::StoreError;
use crate::store::CatalogStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id              INTEGER PRIMARY KEY,
    path            TEXT NOT NULL UNIQUE,
    preview         BLOB NOT NULL DEFAULT x'',
    rating          INTEGER NOT NULL DEFAULT 0 CHECK (rating BETWEEN -1 AND 5),
    stats_bitrate   INTEGER,
    stats_colors    TEXT,
    stats_created   INTEGER,
    stats_duration  REAL,
    stats_fps       REAL,
    stats_height    INTEGER,
    stats_size      INTEGER NOT NULL,
    stats_width     INTEGER
);
CREATE INDEX IF NOT EXISTS idx_files_rating ON files(rating);
";

const SELECT: &str = "
SELECT id, path, preview, rating,
       stats_bitrate, stats_colors, stats_created, stats_duration,
       stats_fps, stats_height, stats_size, stats_width
FROM files";

/// A row as stored, before path and value decoding.
struct StoredRow {
    id: i64,
    path: String,
    preview: Vec<u8>,
    rating: i64,
    bitrate: Option<u32>,
    colors: Option<String>,
    created: Option<i64>,
    duration: Option<f64>,
    fps: Option<f64>,
    height: Option<u32>,
    size: i64,
    width: Option<u32>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            path: row.get(1)?,
            preview: row.get(2)?,
            rating: row.get(3)?,
            bitrate: row.get(4)?,
            colors: row.get(5)?,
            created: row.get(6)?,
            duration: row.get(7)?,
            fps: row.get(8)?,
            height: row.get(9)?,
            size: row.get(10)?,
            width: row.get(11)?,
        })
    }
}

// Identities are u64 inode numbers; SQLite integers are i64. The cast
// round-trips bit for bit.
fn to_sql_id(id: FileId) -> i64 {
    id.0 as i64
}

fn from_sql_id(id: i64) -> FileId {
    FileId::new(id as u64)
}

/// Catalog stored in a SQLite file inside the library.
///
/// Paths are stored relative to the library root so the library can be
/// moved or mounted elsewhere.
pub struct SqliteCatalog {
    conn: Connection,
    root: PathBuf,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `db_path` for the library at `root`.
    pub fn open(root: impl Into<PathBuf>, db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "Opened catalog");
        Self::with_connection(root.into(), conn)
    }

    /// Open the catalog configured for a library.
    pub fn open_library(config: &LibraryConfig) -> Result<Self, StoreError> {
        Self::open(config.root.clone(), config.catalog_path())
    }

    /// A catalog that lives only as long as this value.
    pub fn open_in_memory(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_connection(root.into(), Connection::open_in_memory()?)
    }

    fn with_connection(root: PathBuf, conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, root })
    }

    /// Library root that stored paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn to_relative(&self, path: &Path) -> Result<String, StoreError> {
        let invalid = |reason| StoreError::InvalidPath {
            path: path.to_path_buf(),
            reason,
        };
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| invalid("outside the library root"))?;
        if relative.as_os_str().is_empty() {
            return Err(invalid("is the library root"));
        }
        relative
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| invalid("not valid UTF-8"))
    }

    fn decode(&self, row: StoredRow) -> Result<CatalogEntry, StoreError> {
        let id = from_sql_id(row.id);
        let corrupt = |message: String| StoreError::Corrupt { id, message };

        let rating = Rating::new(row.rating)
            .ok_or_else(|| corrupt(format!("rating {} out of range", row.rating)))?;
        let colors = row
            .colors
            .map(|c| c.parse::<ColorSummary>())
            .transpose()
            .map_err(corrupt)?;

        Ok(CatalogEntry {
            id,
            path: self.root.join(row.path),
            rating,
            preview: row.preview,
            stats: MediaStats {
                bitrate: row.bitrate,
                duration: row.duration,
                fps: row.fps,
                height: row.height,
                width: row.width,
                size: row.size.max(0) as u64,
                created: row.created,
                colors,
            },
        })
    }

    fn select<P: Params>(&self, tail: &str, params: P) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT} {tail}"))?;
        let rows = stmt.query_map(params, StoredRow::from_row)?;
        rows.map(|row| self.decode(row?)).collect()
    }

    /// Run an UPDATE for one id, failing if no row matched.
    fn update_one<P: Params>(&self, id: FileId, sql: &str, params: P) -> Result<(), StoreError> {
        match self.conn.execute(sql, params)? {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }
}

impl CatalogStore for SqliteCatalog {
    fn all(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.select("ORDER BY path", [])
    }

    fn incomplete(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.select("WHERE length(preview) = 0 ORDER BY path", [])
    }

    fn get(&self, id: FileId) -> Result<Option<CatalogEntry>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT} WHERE id = ?1"),
                [to_sql_id(id)],
                StoredRow::from_row,
            )
            .optional()?;
        row.map(|row| self.decode(row)).transpose()
    }

    fn insert(&mut self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let path = self.to_relative(&entry.path)?;
        let stats = &entry.stats;
        let result = self.conn.execute(
            "INSERT INTO files (
                id, path, preview, rating,
                stats_bitrate, stats_colors, stats_created, stats_duration,
                stats_fps, stats_height, stats_size, stats_width
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                to_sql_id(entry.id),
                path,
                entry.preview,
                entry.rating.value(),
                stats.bitrate,
                stats.colors.as_ref().map(ColorSummary::to_string),
                stats.created,
                stats.duration,
                stats.fps,
                stats.height,
                stats.size as i64,
                stats.width,
            ],
        );

        match result {
            Ok(_) => {
                debug!(id = %entry.id, path = %path, "Inserted");
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::Conflict {
                    id: entry.id,
                    path: entry.path.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&mut self, id: FileId) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM files WHERE id = ?1", [to_sql_id(id)])?;
        Ok(removed > 0)
    }

    fn set_paths(&mut self, moves: &[(FileId, PathBuf)]) -> Result<(), StoreError> {
        let mut stored = Vec::with_capacity(moves.len());
        for (id, path) in moves {
            stored.push((*id, path, self.to_relative(path)?));
        }

        let tx = self.conn.transaction()?;
        // Stored paths are relative, so an absolute placeholder never clashes.
        for (id, _, _) in &stored {
            tx.execute(
                "UPDATE files SET path = ?1 WHERE id = ?2",
                params![format!("/moving/{id}"), to_sql_id(*id)],
            )?;
        }
        for (id, path, relative) in &stored {
            match tx.execute(
                "UPDATE files SET path = ?1 WHERE id = ?2",
                params![relative, to_sql_id(*id)],
            ) {
                Ok(0) => return Err(StoreError::NotFound(*id)),
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => {
                    return Err(StoreError::Conflict {
                        id: *id,
                        path: (*path).clone(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        tx.commit()?;

        debug!(count = moves.len(), "Paths updated");
        Ok(())
    }

    fn set_rating(&mut self, id: FileId, rating: Rating) -> Result<(), StoreError> {
        self.update_one(
            id,
            "UPDATE files SET rating = ?1 WHERE id = ?2",
            params![rating.value(), to_sql_id(id)],
        )
    }

    fn set_media(&mut self, id: FileId, media: &Media) -> Result<(), StoreError> {
        self.update_one(
            id,
            "UPDATE files SET
                preview = ?1, stats_bitrate = ?2, stats_colors = ?3,
                stats_duration = ?4, stats_fps = ?5, stats_height = ?6,
                stats_width = ?7
            WHERE id = ?8",
            params![
                media.preview,
                media.bitrate,
                media.colors.to_string(),
                media.duration,
                media.fps,
                media.height,
                media.width,
                to_sql_id(id),
            ],
        )
    }

    fn trashed(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.select("WHERE rating = ?1 ORDER BY path", [Rating::TRASH.value()])
    }

    fn remove_trashed(&mut self) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM files WHERE rating = ?1", [Rating::TRASH.value()])?;
        if removed > 0 {
            self.conn.execute_batch("VACUUM")?;
        }
        info!(removed, "Removed trashed entries");
        Ok(removed)
    }

    fn search(&self, text: &str) -> Result<Vec<FileId>, StoreError> {
        let pattern = format!("%{}%", escape_like(text));
        let mut stmt = self.conn.prepare(
            "SELECT id FROM files WHERE path LIKE ?1 ESCAPE '\\' ORDER BY stats_size DESC",
        )?;
        let ids = stmt.query_map([pattern], |row| row.get::<_, i64>(0))?;
        ids.map(|id| Ok(from_sql_id(id?))).collect()
    }

    fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
