//! Saved-selection storage backends
//!
//! A trait-based abstraction over where named selections are persisted
//! (YAML or JSON files, SQLite) behind one interface.

mod file_backend;
mod migration;
mod sqlite_backend;
mod traits;

pub use file_backend::{FileBackend, FileFormat};
pub use migration::migrate_selections;
pub use sqlite_backend::{SqliteBackend, SELECTIONS_KEY};
pub use traits::{BackendType, SelectionBackend};

use anyhow::Result;
use std::path::Path;

/// Infers the backend type from a file extension; unknown extensions use JSON
pub fn infer_backend_type(path: &Path) -> BackendType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => BackendType::Yaml,
        Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
        _ => BackendType::Json,
    }
}

/// Creates a backend based on the file extension or explicit type
pub fn create_backend(
    path: &Path,
    backend_type: Option<BackendType>,
) -> Result<Box<dyn SelectionBackend>> {
    let bt = backend_type.unwrap_or_else(|| infer_backend_type(path));
    log::debug!("Opening {} selection store at {:?}", bt, path);

    match bt {
        BackendType::Yaml => Ok(Box::new(FileBackend::yaml(path))),
        BackendType::Json => Ok(Box::new(FileBackend::json(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_infer_backend_type() {
        assert_eq!(infer_backend_type(Path::new("a.yml")), BackendType::Yaml);
        assert_eq!(infer_backend_type(Path::new("a.sqlite3")), BackendType::Sqlite);
        assert_eq!(infer_backend_type(Path::new("a.json")), BackendType::Json);
        assert_eq!(infer_backend_type(Path::new("selections")), BackendType::Json);
    }

    #[test]
    fn test_create_backend_honours_explicit_type() {
        let temp_dir = TempDir::new().unwrap();
        let backend = create_backend(&temp_dir.path().join("store.json"), Some(BackendType::Yaml)).unwrap();
        assert_eq!(backend.backend_type(), BackendType::Yaml);

        let backend = create_backend(&temp_dir.path().join("store.db"), None).unwrap();
        assert_eq!(backend.backend_type(), BackendType::Sqlite);
    }
}
