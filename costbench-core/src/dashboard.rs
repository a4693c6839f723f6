//! Dashboard state and its reducer
//!
//! [`DashboardState`] is one immutable snapshot of everything a session has
//! chosen: filters, search, display toggles, selection and page size.
//! [`Dashboard::apply`] takes a snapshot and an [`Action`] and returns the
//! next snapshot. Derived views (filtered list, window, similarity ranking)
//! are recomputed from a snapshot on demand.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::filter::{filter_projects, FilterSpec};
use crate::format::UnitSystem;
use crate::models::{DateMode, ProjectRecord};
use crate::pagination::{sort_projects, Pager};
use crate::selection::SelectionState;
use crate::similarity::{rank, Ranking, Strategy};

/// Selecting a primary tagged `trigger_tag` also selects `project_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRule {
    pub trigger_tag: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub filters: FilterSpec,
    pub search: String,
    pub date_mode: DateMode,
    pub units: UnitSystem,
    pub confidential: bool,
    pub selection: SelectionState,
    pub pager: Pager,
}

/// A discrete user event
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetSearch(String),
    SetFilters(FilterSpec),
    /// Reset every filter dimension and the search term
    ClearFilters,
    SetDateMode(DateMode),
    SetUnits(UnitSystem),
    SetConfidential(bool),
    Toggle(String),
    SetPrimary(Option<String>),
    /// Replace the selection with a saved id list
    LoadSelection(Vec<String>),
    /// Toggle a similarity candidate into the selection
    AcceptCandidate(String),
    LoadMore,
}

/// What the project list shows for one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    /// The visible window, selected first
    pub visible: Vec<&'a ProjectRecord>,
    /// Projects passing the filters
    pub total: usize,
    /// Projects hidden below the window
    pub remaining: usize,
    pub active_filters: usize,
    pub selected_count: usize,
}

impl DashboardView<'_> {
    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }
}

pub struct Dashboard {
    catalog: Catalog,
    config: AppConfig,
    today: NaiveDate,
}

impl Dashboard {
    pub fn new(catalog: Catalog, config: AppConfig, today: NaiveDate) -> Self {
        Self {
            catalog,
            config,
            today,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// A default filter spec for this dashboard's date
    pub fn default_filters(&self) -> FilterSpec {
        FilterSpec::with_defaults(&self.config.filters, self.today)
    }

    pub fn initial_state(&self) -> DashboardState {
        DashboardState {
            filters: self.default_filters(),
            search: String::new(),
            date_mode: DateMode::default(),
            units: UnitSystem::default(),
            confidential: false,
            selection: SelectionState::default(),
            pager: Pager::new(self.config.pagination),
        }
    }

    pub fn apply(&self, state: DashboardState, action: Action) -> DashboardState {
        log::debug!("Applying {:?}", action);
        match action {
            Action::SetSearch(search) => DashboardState { search, ..state },
            Action::SetFilters(filters) => DashboardState { filters, ..state },
            Action::ClearFilters => DashboardState {
                filters: self.default_filters(),
                search: String::new(),
                ..state
            },
            Action::SetDateMode(date_mode) => DashboardState { date_mode, ..state },
            Action::SetUnits(units) => DashboardState { units, ..state },
            Action::SetConfidential(confidential) => DashboardState {
                confidential,
                ..state
            },
            Action::Toggle(id) | Action::AcceptCandidate(id) => DashboardState {
                selection: state.selection.toggle(&id),
                ..state
            },
            Action::SetPrimary(id) => self.set_primary(state, id),
            Action::LoadSelection(ids) => DashboardState {
                selection: state.selection.replace_all(ids),
                ..state
            },
            Action::LoadMore => {
                let len = self.filtered(&state).len();
                DashboardState {
                    pager: state.pager.load_more(len),
                    ..state
                }
            }
        }
    }

    fn set_primary(&self, state: DashboardState, id: Option<String>) -> DashboardState {
        let primary = match id.as_deref() {
            Some(id) => match self.catalog.get(id) {
                Some(project) => Some(project),
                None => {
                    log::warn!("Ignoring unknown primary project '{}'", id);
                    return state;
                }
            },
            None => None,
        };

        let mut selection = state.selection.set_primary(primary.map(|p| p.id.as_str()));
        if let Some(project) = primary {
            for rule in &self.config.anchor_rules {
                if project.scope.contains(&rule.trigger_tag)
                    && project.id != rule.project_id
                    && self.catalog.get(&rule.project_id).is_some()
                {
                    log::debug!("Anchor rule '{}' selects {}", rule.trigger_tag, rule.project_id);
                    selection = selection.select(&rule.project_id);
                }
            }
        }

        DashboardState { selection, ..state }
    }

    /// Projects passing the filters and search, in catalog order
    pub fn filtered(&self, state: &DashboardState) -> Vec<&ProjectRecord> {
        filter_projects(self.catalog.iter(), &state.filters, &state.search, state.date_mode)
    }

    /// Filtered projects, selected first
    pub fn sorted(&self, state: &DashboardState) -> Vec<&ProjectRecord> {
        sort_projects(self.filtered(state), &state.selection)
    }

    pub fn view(&self, state: &DashboardState) -> DashboardView<'_> {
        let sorted = self.sorted(state);
        let total = sorted.len();
        DashboardView {
            visible: state.pager.window(&sorted).to_vec(),
            total,
            remaining: state.pager.remaining(total),
            active_filters: state.filters.active_count(&self.config.filters, self.today),
            selected_count: state.selection.count(),
        }
    }

    pub fn primary(&self, state: &DashboardState) -> Option<&ProjectRecord> {
        state.selection.primary().and_then(|id| self.catalog.get(id))
    }

    /// Ranks the whole catalog against the primary. Filters do not apply.
    pub fn similar(&self, state: &DashboardState, strategy: Strategy) -> Option<Ranking<'_>> {
        let primary = self.primary(state)?;
        Some(rank(primary, self.catalog.iter(), strategy, state.date_mode))
    }
}
