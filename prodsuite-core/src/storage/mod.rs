//! SQLite-backed persistence.
//!
//! One [`Storage`] is shared by the whole process. Each entity keeps its
//! queries in its own submodule as an `impl Storage` block. Every lookup is
//! scoped to the owning user, so a foreign id reads as "not found".

mod drawings;
mod folders;
mod journals;
mod lists;
pub mod migrations;
mod notes;
mod permissions;
mod push;
pub mod schema;
mod settings;
mod trackers;

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use rusqlite::types::Type;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SuiteResult;
use crate::permissions::DefaultsCache;

pub use permissions::UserQuery;

#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Mutex<Connection>,
    defaults: DefaultsCache,
}

impl Storage {
    /// Open or create the database, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> SuiteResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(path = %path.display(), "Opening database");
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!(path = %path.display(), "Database opened");
        Ok(Self::with_connection(path, conn))
    }

    pub fn open_in_memory() -> SuiteResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::initialize_schema(&conn)?;
        Ok(Self::with_connection(PathBuf::from(":memory:"), conn))
    }

    fn with_connection(path: PathBuf, conn: Connection) -> Self {
        Storage {
            path,
            conn: Mutex::new(conn),
            defaults: DefaultsCache::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: StdError + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn optional_uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn parsed_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> SuiteResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn id_text(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prodsuite.db");

        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prodsuite.db");

        let note = crate::note::Note::new(
            "u",
            crate::note::NewNote {
                title: "kept".into(),
                content: "across opens".into(),
                tags: vec![],
            },
            chrono::Utc::now(),
        );
        Storage::open(&path).unwrap().insert_note(&note).unwrap();

        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.get_note("u", note.id).unwrap().title, "kept");
    }
}
