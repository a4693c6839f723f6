//! Result ordering and the "load more" window

use serde::{Deserialize, Serialize};

use crate::models::ProjectRecord;
use crate::selection::SelectionState;

/// Orders projects selected-first, then by catalog sequence.
///
/// The sequence key is assigned at catalog load, so the order is total and
/// deterministic whatever format the ids take.
pub fn sort_projects<'a>(
    mut projects: Vec<&'a ProjectRecord>,
    selection: &SelectionState,
) -> Vec<&'a ProjectRecord> {
    projects.sort_by_key(|p| (!selection.is_selected(&p.id), p.seq));
    projects
}

/// Page size settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub initial: usize,
    pub increment: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            initial: 8,
            increment: 4,
        }
    }
}

/// Incremental display window over a sorted list.
///
/// The page size is never reset by filter changes; the window simply clips
/// to whatever list it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    increment: usize,
}

impl Pager {
    pub fn new(config: PageConfig) -> Self {
        Self {
            page_size: config.initial,
            increment: config.increment,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Grow by one increment, capped at `len`. No-op when nothing is hidden.
    pub fn load_more(self, len: usize) -> Self {
        if !self.has_more(len) {
            return self;
        }
        Self {
            page_size: (self.page_size + self.increment).min(len),
            ..self
        }
    }

    pub fn has_more(&self, len: usize) -> bool {
        len > self.page_size
    }

    /// Number of items hidden below the window
    pub fn remaining(&self, len: usize) -> usize {
        len.saturating_sub(self.page_size)
    }

    pub fn window<'s, T>(&self, items: &'s [T]) -> &'s [T] {
        &items[..self.page_size.min(items.len())]
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(PageConfig::default())
    }
}
