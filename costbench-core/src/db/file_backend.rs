//! File storage backend
//!
//! Stores the saved-selection list in a single YAML or JSON file, using the
//! locked, atomically-replaced [`Storage`] blob underneath.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::traits::{BackendType, SelectionBackend};
use crate::saved::SavedSelections;
use crate::storage::Storage;

/// Serialization format of a file backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

/// YAML or JSON file backend implementation
pub struct FileBackend {
    storage: Storage,
    path: PathBuf,
    format: FileFormat,
}

impl FileBackend {
    /// Creates a new file backend for the given path and format
    pub fn new<P: AsRef<Path>>(path: P, format: FileFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            storage: Storage::new(&path),
            path,
            format,
        }
    }

    pub fn yaml<P: AsRef<Path>>(path: P) -> Self {
        Self::new(path, FileFormat::Yaml)
    }

    pub fn json<P: AsRef<Path>>(path: P) -> Self {
        Self::new(path, FileFormat::Json)
    }

    /// Gets a reference to the underlying Storage
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn parse(&self, content: &str) -> Result<SavedSelections> {
        if content.trim().is_empty() {
            return Ok(SavedSelections::default());
        }
        match self.format {
            FileFormat::Yaml => serde_yaml::from_str(content)
                .with_context(|| format!("Failed to parse YAML from {:?}", self.path)),
            FileFormat::Json => serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON from {:?}", self.path)),
        }
    }

    fn render(&self, selections: &SavedSelections) -> Result<String> {
        Ok(match self.format {
            FileFormat::Yaml => serde_yaml::to_string(selections)?,
            FileFormat::Json => serde_json::to_string_pretty(selections)?,
        })
    }
}

impl SelectionBackend for FileBackend {
    fn backend_type(&self) -> BackendType {
        match self.format {
            FileFormat::Yaml => BackendType::Yaml,
            FileFormat::Json => BackendType::Json,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SavedSelections> {
        match self.storage.read()? {
            Some(content) => self.parse(&content),
            None => Ok(SavedSelections::default()),
        }
    }

    fn save(&self, selections: &SavedSelections) -> Result<()> {
        let content = self.render(selections)?;
        self.storage.write(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saved::SelectionError;
    use crate::selection::SelectionState;
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn picked(ids: &[&str]) -> SelectionState {
        SelectionState::default().replace_all(ids.iter().copied())
    }

    #[test]
    fn test_file_backend_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::json(temp_dir.path().join("selections.json"));
        assert!(!backend.exists());
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_backend_add_and_reload() {
        for format in [FileFormat::Yaml, FileFormat::Json] {
            let temp_dir = TempDir::new().unwrap();
            let backend = FileBackend::new(temp_dir.path().join("selections"), format);

            backend.add_selection("Alpha", None, &picked(&["2", "9"]), Utc::now()).unwrap();
            backend.add_selection("Beta", Some("refurbs"), &picked(&["11"]), Utc::now()).unwrap();

            let loaded = backend.load().unwrap();
            assert_eq!(loaded.len(), 2);
            assert_eq!(loaded.resolve("beta").unwrap().description.as_deref(), Some("refurbs"));
        }
    }

    #[test]
    fn test_file_backend_rejected_save_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::json(temp_dir.path().join("selections.json"));
        backend.add_selection("Alpha", None, &picked(&["1"]), Utc::now()).unwrap();
        let before = fs::read_to_string(backend.path()).unwrap();

        let err = backend
            .add_selection("ALPHA", None, &picked(&["2"]), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SelectionError>(),
            Some(SelectionError::DuplicateName(_))
        ));
        assert_eq!(fs::read_to_string(backend.path()).unwrap(), before);
    }

    #[test]
    fn test_file_backend_malformed_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("selections.json");
        fs::write(&path, "{ not json").unwrap();

        let backend = FileBackend::json(&path);
        assert!(backend.load().is_err());
        assert!(backend.load_or_empty().is_empty());

        // Saving over a malformed store replaces it with a valid collection
        backend.add_selection("Fresh", None, &picked(&["3"]), Utc::now()).unwrap();
        assert_eq!(backend.load().unwrap().len(), 1);
    }

    #[test]
    fn test_file_backend_delete() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::yaml(temp_dir.path().join("selections.yaml"));
        let alpha = backend.add_selection("Alpha", None, &picked(&["1"]), Utc::now()).unwrap();
        backend.add_selection("Beta", None, &picked(&["2"]), Utc::now()).unwrap();

        let removed = backend.delete_selection(&alpha.id).unwrap();
        assert_eq!(removed.name, "Alpha");
        assert!(backend.delete_selection("alpha").is_err());
        assert_eq!(backend.get_selection("beta").unwrap().project_ids, vec!["2"]);
    }
}
