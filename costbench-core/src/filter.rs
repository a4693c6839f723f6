//! Filter predicate engine
//!
//! A [`FilterSpec`] describes every filter dimension the dashboard exposes.
//! All dimensions combine with AND; tag sets match with OR inside a category.
//! Default values live in one [`FilterDefaults`] table which both the
//! predicate and the active-filter counter consult.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{CostMilestone, DateMode, ProjectRecord, TagCategory, WcType};

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// The window `[today - years, today]`. Feb 29 clamps to Feb 28.
    pub fn trailing_years(today: NaiveDate, years: u32) -> Self {
        let from = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// Default value table for every range-valued filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    /// Cost per ft²
    pub cost: NumericRange,
    /// Floor area in ft²
    pub size: NumericRange,
    pub reception: NumericRange,
    pub wc: NumericRange,
    /// Length of the default base-date window
    pub date_window_years: u32,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            cost: NumericRange::new(400.0, 800.0),
            size: NumericRange::new(0.0, 150_000.0),
            reception: NumericRange::new(0.0, 1_000.0),
            wc: NumericRange::new(0.0, 20_000.0),
            date_window_years: 5,
        }
    }
}

impl FilterDefaults {
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        DateRange::trailing_years(today, self.date_window_years)
    }
}

/// The full set of filter criteria. The search term is kept separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub sectors: BTreeSet<String>,
    pub scopes: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub cost: NumericRange,
    pub size: NumericRange,
    /// Carried and counted, not evaluated: no project field backs it
    pub reception: NumericRange,
    /// Carried and counted, not evaluated: no project field backs it
    pub wc: NumericRange,
    pub wc_types: BTreeSet<WcType>,
    pub latest_data: BTreeSet<CostMilestone>,
    pub date_range: DateRange,
    /// Carried and counted, not evaluated: projects carry no client association
    pub clients: BTreeSet<String>,
}

impl FilterSpec {
    /// A spec with every dimension at its default
    pub fn with_defaults(defaults: &FilterDefaults, today: NaiveDate) -> Self {
        Self {
            sectors: BTreeSet::new(),
            scopes: BTreeSet::new(),
            locations: BTreeSet::new(),
            cost: defaults.cost,
            size: defaults.size,
            reception: defaults.reception,
            wc: defaults.wc,
            wc_types: BTreeSet::new(),
            latest_data: BTreeSet::new(),
            date_range: defaults.date_range(today),
            clients: BTreeSet::new(),
        }
    }

    pub fn tags(&self, category: TagCategory) -> &BTreeSet<String> {
        match category {
            TagCategory::Sector => &self.sectors,
            TagCategory::Scope => &self.scopes,
            TagCategory::Location => &self.locations,
        }
    }

    /// True if `project` passes every dimension and the search term
    pub fn matches(&self, project: &ProjectRecord, search: &str, mode: DateMode) -> bool {
        if !matches_search(project, search) {
            return false;
        }

        for category in [TagCategory::Sector, TagCategory::Scope, TagCategory::Location] {
            let wanted = self.tags(category);
            if !wanted.is_empty()
                && !project
                    .scope
                    .in_category(category)
                    .iter()
                    .any(|tag| wanted.contains(tag))
            {
                return false;
            }
        }

        if !self.latest_data.is_empty() && !self.latest_data.contains(&project.latest_data) {
            return false;
        }

        if !self.date_range.contains(project.base_date) {
            return false;
        }

        if !self.wc_types.is_empty() {
            match project.wc_type {
                Some(wc_type) if self.wc_types.contains(&wc_type) => {}
                _ => return false,
            }
        }

        self.cost.contains(project.cost(mode)) && self.size.contains(project.area)
    }

    /// Number of dimensions set away from their defaults. Each dimension
    /// counts once however many values it holds.
    pub fn active_count(&self, defaults: &FilterDefaults, today: NaiveDate) -> usize {
        let tag_sets = [&self.sectors, &self.scopes, &self.locations, &self.clients];
        let ranges = [
            (self.cost, defaults.cost),
            (self.size, defaults.size),
            (self.reception, defaults.reception),
            (self.wc, defaults.wc),
        ];

        let mut count = tag_sets.iter().filter(|set| !set.is_empty()).count();
        count += ranges.iter().filter(|(value, default)| value != default).count();
        if !self.wc_types.is_empty() {
            count += 1;
        }
        if !self.latest_data.is_empty() {
            count += 1;
        }
        if self.date_range != defaults.date_range(today) {
            count += 1;
        }
        count
    }
}

/// Case-insensitive substring match against name or number
pub fn matches_search(project: &ProjectRecord, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    project.name.to_lowercase().contains(&needle) || project.number.to_lowercase().contains(&needle)
}

/// Projects that pass `spec`, in catalog order
pub fn filter_projects<'a, I>(
    projects: I,
    spec: &FilterSpec,
    search: &str,
    mode: DateMode,
) -> Vec<&'a ProjectRecord>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    projects
        .into_iter()
        .filter(|p| spec.matches(p, search, mode))
        .collect()
}
