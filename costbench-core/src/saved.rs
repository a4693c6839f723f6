//! Named, persisted benchmarking selections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::selection::SelectionState;

/// Validation failures when saving or addressing a selection.
/// Messages are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please enter a name for your selection")]
    EmptyName,

    #[error("A selection with this name already exists")]
    DuplicateName(String),

    #[error("Please select at least one project to save")]
    EmptySelection,

    #[error("Saved selection not found: {0}")]
    NotFound(String),
}

/// A named set of project ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSelection {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub project_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SavedSelection {
    /// The selection state this record restores. Ids no longer in the
    /// catalog are kept; they simply match nothing on display.
    pub fn restore(&self, current: SelectionState) -> SelectionState {
        current.replace_all(self.project_ids.iter().cloned())
    }
}

/// The whole persisted collection, in save order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedSelections {
    items: Vec<SavedSelection>,
}

impl SavedSelections {
    pub fn new(items: Vec<SavedSelection>) -> Self {
        Self { items }
    }

    /// Validates and builds a new record without adding it
    pub fn prepare(
        &self,
        name: &str,
        description: Option<&str>,
        selection: &SelectionState,
        now: DateTime<Utc>,
    ) -> Result<SavedSelection, SelectionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SelectionError::EmptyName);
        }
        if self.find_by_name(name).is_some() {
            return Err(SelectionError::DuplicateName(name.to_string()));
        }

        let project_ids: Vec<String> = selection.selected_ids().map(str::to_string).collect();
        if project_ids.is_empty() {
            return Err(SelectionError::EmptySelection);
        }

        Ok(SavedSelection {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            date: now,
            project_ids,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }

    /// Validates, builds and appends a new record
    pub fn create(
        &mut self,
        name: &str,
        description: Option<&str>,
        selection: &SelectionState,
        now: DateTime<Utc>,
    ) -> Result<SavedSelection, SelectionError> {
        let saved = self.prepare(name, description, selection, now)?;
        self.items.push(saved.clone());
        Ok(saved)
    }

    /// Removes a record by id
    pub fn remove(&mut self, id: &str) -> Result<SavedSelection, SelectionError> {
        let pos = self
            .items
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SelectionError::NotFound(id.to_string()))?;
        Ok(self.items.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&SavedSelection> {
        self.items.iter().find(|s| s.id == id)
    }

    /// Case-insensitive name lookup
    pub fn find_by_name(&self, name: &str) -> Option<&SavedSelection> {
        let wanted = name.trim().to_lowercase();
        self.items.iter().find(|s| s.name.to_lowercase() == wanted)
    }

    /// Looks up by id first, then by name
    pub fn resolve(&self, key: &str) -> Result<&SavedSelection, SelectionError> {
        self.get(key)
            .or_else(|| self.find_by_name(key))
            .ok_or_else(|| SelectionError::NotFound(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedSelection> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
