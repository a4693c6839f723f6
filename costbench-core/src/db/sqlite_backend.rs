//! SQLite storage backend
//!
//! Keeps the saved-selection list as a JSON blob in a key-value table, the
//! same shape a browser's local storage would hold it in.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::{BackendType, SelectionBackend};
use crate::saved::SavedSelections;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Key the saved-selection list is stored under
pub const SELECTIONS_KEY: &str = "projectSelections";

/// SQLite backend implementation
///
/// The database is opened on first use, so a damaged file surfaces as a
/// failed `load` (which `load_or_empty` recovers from) rather than a failed
/// construction.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteBackend {
    /// Creates a new SQLite backend
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path,
            conn: Mutex::new(None),
        })
    }

    /// Runs `f` against the connection, opening it first if needed
    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("SQLite connection mutex poisoned"))?;

        if guard.is_none() {
            *guard = Some(open_connection(&self.path)?);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => anyhow::bail!("SQLite connection unavailable: {:?}", self.path),
        }
    }

    /// Reads a raw value from the key-value table
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    /// Writes a raw value in its own transaction
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}

/// Opens the database, enables WAL and brings the schema up to date
fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open SQLite database: {:?}", path))?;

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .with_context(|| format!("Failed to configure SQLite database: {:?}", path))?;

    init_schema(&conn).with_context(|| format!("Failed to initialize schema in {:?}", path))?;
    Ok(conn)
}

/// Initialize the database schema
fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    if current_version == 0 {
        conn.execute_batch(include_str!("schema.sql"))?;
    } else if current_version < SCHEMA_VERSION {
        anyhow::bail!(
            "Database schema version {} is outdated, expected {}",
            current_version,
            SCHEMA_VERSION
        );
    }

    Ok(())
}

impl SelectionBackend for SqliteBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Sqlite
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SavedSelections> {
        match self.get_value(SELECTIONS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse saved selections in {:?}", self.path)),
            None => Ok(SavedSelections::default()),
        }
    }

    fn save(&self, selections: &SavedSelections) -> Result<()> {
        let json = serde_json::to_string(selections).context("Failed to serialize to JSON")?;
        self.set_value(SELECTIONS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionState;
    use chrono::Utc;
    use std::fs;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_sqlite_backend_create_and_load() {
        let temp_file = NamedTempFile::with_suffix(".db").unwrap();
        let backend = SqliteBackend::new(temp_file.path()).unwrap();

        assert!(backend.load().unwrap().is_empty());
        assert_eq!(backend.backend_type(), BackendType::Sqlite);
    }

    #[test]
    fn test_sqlite_backend_add_delete_reopen() {
        let temp_file = NamedTempFile::with_suffix(".db").unwrap();
        let selection = SelectionState::default().toggle("2").toggle("9");
        {
            let backend = SqliteBackend::new(temp_file.path()).unwrap();
            backend.add_selection("Alpha", None, &selection, Utc::now()).unwrap();
            backend.add_selection("Beta", None, &selection, Utc::now()).unwrap();
            backend.delete_selection("beta").unwrap();
        }

        let reopened = SqliteBackend::new(temp_file.path()).unwrap();
        let loaded = reopened.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.resolve("alpha").unwrap().project_ids, vec!["2", "9"]);
    }

    #[test]
    fn test_sqlite_backend_malformed_blob_reads_as_empty() {
        let temp_file = NamedTempFile::with_suffix(".db").unwrap();
        let backend = SqliteBackend::new(temp_file.path()).unwrap();
        backend.set_value(SELECTIONS_KEY, "[{\"broken\"").unwrap();

        assert!(backend.load().is_err());
        assert!(backend.load_or_empty().is_empty());
    }

    #[test]
    fn test_sqlite_backend_junk_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("selections.db");
        fs::write(&path, "this is not a database\n".repeat(512)).unwrap();

        let backend = crate::db::create_backend(&path, None).unwrap();
        assert_eq!(backend.backend_type(), BackendType::Sqlite);

        let err = backend.load().unwrap_err();
        assert!(format!("{:#}", err).contains("selections.db"));
        assert!(backend.load_or_empty().is_empty());

        let selection = SelectionState::default().toggle("2");
        let err = backend
            .add_selection("Alpha", None, &selection, Utc::now())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("selections.db"));
    }
}
