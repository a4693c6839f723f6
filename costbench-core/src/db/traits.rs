//! Saved-selection backend traits
//!
//! This module defines the trait every saved-selection store implements.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::saved::{SavedSelection, SavedSelections};
use crate::selection::SelectionState;

/// Types of saved-selection backends available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// YAML file holding the list
    Yaml,
    /// JSON file holding the list
    Json,
    /// SQLite key-value table holding the list as JSON
    Sqlite,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Yaml => write!(f, "YAML"),
            BackendType::Json => write!(f, "JSON"),
            BackendType::Sqlite => write!(f, "SQLite"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(BackendType::Yaml),
            "json" => Ok(BackendType::Json),
            "sqlite" | "db" => Ok(BackendType::Sqlite),
            _ => Err(format!("Unknown backend type: {}", s)),
        }
    }
}

/// Core trait for saved-selection stores
///
/// - `load()` and `save()` move the whole collection; every change is a
///   whole-collection replace.
/// - `load_or_empty()` is the read used by the dashboard: a missing or
///   unparseable store reads as empty.
/// - The CRUD helpers are built on those two.
pub trait SelectionBackend {
    /// Returns the backend type
    fn backend_type(&self) -> BackendType;

    /// Returns the path to the store
    fn path(&self) -> &Path;

    /// Loads the whole collection. Fails on unreadable or malformed data.
    fn load(&self) -> Result<SavedSelections>;

    /// Replaces the whole collection
    fn save(&self, selections: &SavedSelections) -> Result<()>;

    /// Loads the collection, treating malformed state as empty
    fn load_or_empty(&self) -> SavedSelections {
        match self.load() {
            Ok(selections) => selections,
            Err(e) => {
                log::warn!(
                    "Saved selections at {:?} could not be read, starting empty: {:#}",
                    self.path(),
                    e
                );
                SavedSelections::default()
            }
        }
    }

    /// Validates and saves the current selection under `name`.
    /// Nothing is written when validation fails.
    fn add_selection(
        &self,
        name: &str,
        description: Option<&str>,
        selection: &SelectionState,
        now: DateTime<Utc>,
    ) -> Result<SavedSelection> {
        let mut selections = self.load_or_empty();
        let saved = selections.create(name, description, selection, now)?;
        self.save(&selections)?;
        log::info!("Saved selection '{}' with {} projects", saved.name, saved.project_ids.len());
        Ok(saved)
    }

    /// Deletes a saved selection by id or name
    fn delete_selection(&self, key: &str) -> Result<SavedSelection> {
        let mut selections = self.load_or_empty();
        let id = selections.resolve(key)?.id.clone();
        let removed = selections.remove(&id)?;
        self.save(&selections)?;
        log::info!("Deleted selection '{}'", removed.name);
        Ok(removed)
    }

    /// Looks up a saved selection by id or name
    fn get_selection(&self, key: &str) -> Result<SavedSelection> {
        let selections = self.load_or_empty();
        Ok(selections.resolve(key)?.clone())
    }

    /// Returns true if the store exists
    fn exists(&self) -> bool {
        self.path().exists()
    }
}
