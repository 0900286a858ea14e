//! Where the snapshot lives between runs.
//!
//! Each backend holds a single slot named [`SNAPSHOT_KEY`]. Writes replace
//! the whole snapshot.

use crate::dlog;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_KEY: &str = "workouts";

pub trait SnapshotStorage {
    /// The stored snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<String>>;

    fn save(&mut self, snapshot: &str) -> Result<()>;

    /// Drop the stored snapshot. Clearing an empty slot is not an error.
    fn clear(&mut self) -> Result<()>;
}

/// Open the backend that fits `path`: `.db`/`.sqlite`/`.sqlite3` selects
/// SQLite, anything else a JSON file.
pub fn open_storage(path: &Path) -> Result<Box<dyn SnapshotStorage>> {
    let is_sqlite = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            ["db", "sqlite", "sqlite3"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });

    if is_sqlite {
        tracing::info!(path = %path.display(), "using sqlite snapshot storage");
        Ok(Box::new(SqliteStorage::open(path)?))
    } else {
        tracing::info!(path = %path.display(), "using json file snapshot storage");
        Ok(Box::new(JsonFileStorage::new(path)))
    }
}

/// Snapshot stored as a plain JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading snapshot: {}", self.path.display()));
            }
        };

        match String::from_utf8(bytes) {
            Ok(s) => Ok(Some(s)),
            Err(e) => {
                // Unreadable content counts as no snapshot; the next save replaces it.
                tracing::warn!(path = %self.path.display(), err = %e, "snapshot is not UTF-8; ignoring it");
                Ok(None)
            }
        }
    }

    fn save(&mut self, snapshot: &str) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).with_context(|| format!("creating dir: {}", dir.display()))?;

        // Write next to the target so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(snapshot.as_bytes())
            .context("writing snapshot to temp file")?;
        tmp.as_file().sync_all().context("syncing snapshot temp file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing snapshot: {}", self.path.display()))?;

        dlog!("snapshot saved path={} bytes={}", self.path.display(), snapshot.len());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing snapshot: {}", self.path.display())),
        }
    }
}

/// Snapshot stored in a one-table SQLite key/value database.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    ///
    /// A file that is not an SQLite database is renamed to `<name>.corrupt`
    /// and a fresh database is created in its place.
    pub fn open(path: &Path) -> Result<Self> {
        match Self::open_existing(path) {
            Err(e) if is_not_a_database(&e) => {
                let aside = corrupt_path(path);
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    "snapshot file is not an SQLite database; starting fresh"
                );
                fs::rename(path, &aside)
                    .with_context(|| format!("moving aside: {}", path.display()))?;
                Self::open_existing(path)
            }
            other => other,
        }
    }

    fn open_existing(path: &Path) -> Result<Self> {
        let display = path.display();
        let conn =
            Connection::open(path).with_context(|| format!("Opening SQLite DB: {display}"))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("Opening in-memory SQLite DB")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv_store (
              key    TEXT PRIMARY KEY NOT NULL,
              value  TEXT NOT NULL
            );
            ",
        )
        .context("Ensuring SQLite schema")?;
        Ok(Self { conn })
    }
}

impl SnapshotStorage for SqliteStorage {
    fn load(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Reading snapshot row")
    }

    fn save(&mut self, snapshot: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                params![SNAPSHOT_KEY, snapshot],
            )
            .context("Upserting snapshot row")?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![SNAPSHOT_KEY])
            .context("Deleting snapshot row")?;
        Ok(())
    }
}

fn is_not_a_database(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(f, _)) if f.code == rusqlite::ErrorCode::NotADatabase
    )
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Volatile slot, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    slot: Option<String>,
}

impl MemoryStorage {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    pub const fn with_snapshot(snapshot: String) -> Self {
        Self {
            slot: Some(snapshot),
        }
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.clone())
    }

    fn save(&mut self, snapshot: &str) -> Result<()> {
        self.slot = Some(snapshot.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for Box<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &str) -> Result<()> {
        (**self).save(snapshot)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}
