//! Project catalog
//!
//! The catalog is the fixed, in-memory collection of project records the
//! dashboard browses. Records are parsed and validated once at load time and
//! never mutated afterwards.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::{ProjectEntry, ProjectRecord, Vocabulary};

/// Reference catalog bundled with the library
pub const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Errors raised while building a catalog
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate project id: {0}")]
    DuplicateId(String),

    #[error("Project {id} has a non-positive {field}: {value}")]
    NonPositive {
        id: String,
        field: &'static str,
        value: f64,
    },

    #[error("Project {id} has a net/gross ratio outside 0-100: {value}")]
    NetGrossOutOfRange { id: String, value: f64 },
}

/// Immutable collection of project records in insertion order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    projects: Vec<ProjectRecord>,
}

impl Catalog {
    /// Builds a catalog from raw entries, assigning sequence keys in order
    pub fn from_entries(
        entries: Vec<ProjectEntry>,
        vocabulary: &Vocabulary,
    ) -> std::result::Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut projects = Vec::with_capacity(entries.len());

        for (seq, entry) in entries.into_iter().enumerate() {
            validate_entry(&entry)?;
            if !seen.insert(entry.id.clone()) {
                return Err(CatalogError::DuplicateId(entry.id));
            }

            let record = ProjectRecord::from_entry(entry, seq, vocabulary);
            if !record.scope.unclassified.is_empty() {
                log::warn!(
                    "Project {} has scope tags outside the vocabulary: {:?}",
                    record.id,
                    record.scope.unclassified
                );
            }
            projects.push(record);
        }

        log::debug!("Catalog built with {} projects", projects.len());
        Ok(Self { projects })
    }

    /// The bundled reference catalog
    pub fn builtin(vocabulary: &Vocabulary) -> Result<Self> {
        let entries: Vec<ProjectEntry> =
            serde_yaml::from_str(BUILTIN_CATALOG).context("Failed to parse built-in catalog")?;
        Ok(Self::from_entries(entries, vocabulary)?)
    }

    /// Loads a catalog file; `.json` is read as JSON, anything else as YAML
    pub fn load<P: AsRef<Path>>(path: P, vocabulary: &Vocabulary) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {:?}", path))?;

        let entries: Vec<ProjectEntry> = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON catalog from {:?}", path))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML catalog from {:?}", path))?,
        };

        log::info!("Loaded {} catalog entries from {:?}", entries.len(), path);
        Self::from_entries(entries, vocabulary)
            .with_context(|| format!("Invalid catalog in {:?}", path))
    }

    pub fn projects(&self) -> &[ProjectRecord] {
        &self.projects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectRecord> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Gets a project by id
    pub fn get(&self, id: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Finds a project by id or by its short number (case-insensitive)
    pub fn lookup(&self, key: &str) -> Option<&ProjectRecord> {
        self.get(key).or_else(|| {
            self.projects
                .iter()
                .find(|p| p.number.eq_ignore_ascii_case(key))
        })
    }
}

fn validate_entry(entry: &ProjectEntry) -> std::result::Result<(), CatalogError> {
    let positive = [
        ("area", entry.area),
        ("costPerSqft", entry.cost_per_sqft),
        ("baseCostPerSqft", entry.base_cost_per_sqft),
    ];
    for (field, value) in positive {
        if !(value > 0.0) {
            return Err(CatalogError::NonPositive {
                id: entry.id.clone(),
                field,
                value,
            });
        }
    }
    if let Some(reception) = entry.reception_cost {
        if !(reception > 0.0) {
            return Err(CatalogError::NonPositive {
                id: entry.id.clone(),
                field: "receptionCost",
                value: reception,
            });
        }
    }
    if !(0.0..=100.0).contains(&entry.net_gross) {
        return Err(CatalogError::NetGrossOutOfRange {
            id: entry.id.clone(),
            value: entry.net_gross,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, WcType};
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog_loads_in_order() {
        let catalog = Catalog::builtin(&Vocabulary::default()).unwrap();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.projects()[0].id, "bunker-1");
        assert_eq!(catalog.projects()[11].id, "11");
        for (i, p) in catalog.iter().enumerate() {
            assert_eq!(p.seq, i);
            assert!(p.scope.unclassified.is_empty(), "{} has stray tags", p.id);
        }

        let finsbury = catalog.get("2").unwrap();
        assert_eq!(finsbury.status, ProjectStatus::Dead);
        assert_eq!(finsbury.wc_type, Some(WcType::SuperlooOnly));
        assert_eq!(finsbury.reception_cost, Some(650.0));
    }

    #[test]
    fn test_iter_runs_both_ways() {
        let catalog = Catalog::builtin(&Vocabulary::default()).unwrap();
        let reversed: Vec<&str> = catalog.iter().rev().map(|p| p.id.as_str()).collect();
        assert_eq!(reversed.first(), Some(&"11"));
        assert_eq!(reversed.last(), Some(&"bunker-1"));
        assert_eq!(catalog.iter().len(), catalog.len());
    }

    #[test]
    fn test_lookup_by_number() {
        let catalog = Catalog::builtin(&Vocabulary::default()).unwrap();
        assert_eq!(catalog.lookup("nep-30").map(|p| p.id.as_str()), Some("9"));
        assert_eq!(catalog.lookup("9").map(|p| p.number.as_str()), Some("NEP-30"));
        assert!(catalog.lookup("missing").is_none());
    }

    fn entry(id: &str, area: f64) -> ProjectEntry {
        ProjectEntry {
            id: id.to_string(),
            number: format!("N-{}", id),
            name: format!("Project {}", id),
            scope: "Offices • New Build • City".to_string(),
            area,
            cost_per_sqft: 500.0,
            base_cost_per_sqft: 480.0,
            net_gross: 75.0,
            latest_data: crate::models::CostMilestone::CostModel1,
            status: ProjectStatus::Live,
            base_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            data_availability: Default::default(),
            wc_type: None,
            reception_cost: None,
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::from_entries(vec![entry("a", 1.0), entry("a", 2.0)], &Vocabulary::default())
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_non_positive_area_rejected() {
        let err = Catalog::from_entries(vec![entry("a", 0.0)], &Vocabulary::default()).unwrap_err();
        assert!(matches!(err, CatalogError::NonPositive { field: "area", .. }));
    }

    #[test]
    fn test_load_json_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let json = serde_json::to_string(&vec![entry("x", 1200.0), entry("y", 800.0)]).unwrap();
        fs::write(&path, json).unwrap();

        let catalog = Catalog::load(&path, &Vocabulary::default()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("y").unwrap().seq, 1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Catalog::load(dir.path().join("nope.yaml"), &Vocabulary::default()).is_err());
    }
}
