//! Benchmarking selection set
//!
//! Tracks which projects are part of the active comparison and which single
//! project, if any, is the primary. Updates consume the state and return the
//! next one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    selected: BTreeSet<String>,
    primary: Option<String>,
}

impl SelectionState {
    /// Flips membership of `id`. Primary status is untouched.
    pub fn toggle(mut self, id: &str) -> Self {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
        self
    }

    /// Adds `id` to the selection if it is not already there
    pub fn select(mut self, id: &str) -> Self {
        self.selected.insert(id.to_string());
        self
    }

    /// Replaces the primary project.
    ///
    /// The previous primary leaves the selection; the new primary, if any,
    /// joins it.
    pub fn set_primary(mut self, id: Option<&str>) -> Self {
        if let Some(previous) = self.primary.take() {
            self.selected.remove(&previous);
        }
        if let Some(id) = id {
            self.selected.insert(id.to_string());
            self.primary = Some(id.to_string());
        }
        self
    }

    /// Discards the current selection and selects exactly `ids`.
    /// The primary role is kept; its membership follows `ids`.
    pub fn replace_all<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_toggle_restores_state() {
        let start = SelectionState::default().toggle("a").set_primary(Some("p"));
        for id in ["a", "b", "p"] {
            let round_trip = start.clone().toggle(id).toggle(id);
            assert_eq!(round_trip, start, "toggling {} twice changed the state", id);
        }
    }

    #[test]
    fn test_toggle_ignores_primary_role() {
        let state = SelectionState::default().set_primary(Some("p")).toggle("p");
        assert_eq!(state.primary(), Some("p"));
        assert!(!state.is_selected("p"));
    }

    #[test]
    fn test_set_primary_swaps_membership() {
        let state = SelectionState::default()
            .set_primary(Some("a"))
            .set_primary(Some("b"));
        assert!(!state.is_selected("a"));
        assert!(state.is_selected("b"));
        assert_eq!(state.primary(), Some("b"));
    }

    #[test]
    fn test_previous_primary_can_be_reselected() {
        let state = SelectionState::default()
            .set_primary(Some("a"))
            .set_primary(Some("b"))
            .toggle("a");
        assert!(state.is_selected("a"));
        assert!(state.is_selected("b"));
    }

    #[test]
    fn test_clear_primary_removes_it() {
        let state = SelectionState::default()
            .toggle("x")
            .set_primary(Some("a"))
            .set_primary(None);
        assert_eq!(state.primary(), None);
        assert!(!state.is_selected("a"));
        assert!(state.is_selected("x"));
    }

    #[test]
    fn test_replace_all_discards_previous() {
        let state = SelectionState::default()
            .toggle("x")
            .set_primary(Some("p"))
            .replace_all(["y", "gone-from-catalog"]);
        let ids: Vec<&str> = state.selected_ids().collect();
        assert_eq!(ids, vec!["gone-from-catalog", "y"]);
        assert_eq!(state.primary(), Some("p"));
        assert!(!state.is_selected("p"));
        assert_eq!(state.count(), 2);
    }
}
