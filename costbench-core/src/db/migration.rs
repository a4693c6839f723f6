//! Copying saved selections between backends

use anyhow::{Context, Result};

use super::traits::SelectionBackend;

/// Copies every saved selection from `source` into `target`, replacing
/// whatever `target` held. Returns the number of selections copied.
///
/// Unlike normal reads, a malformed source is an error here: migrating would
/// otherwise silently wipe the target.
pub fn migrate_selections(
    source: &dyn SelectionBackend,
    target: &dyn SelectionBackend,
) -> Result<usize> {
    let selections = source
        .load()
        .with_context(|| format!("Failed to load {} store {:?}", source.backend_type(), source.path()))?;

    target
        .save(&selections)
        .with_context(|| format!("Failed to save to {} store {:?}", target.backend_type(), target.path()))?;

    log::info!(
        "Migrated {} selections from {:?} to {:?}",
        selections.len(),
        source.path(),
        target.path()
    );
    Ok(selections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileBackend, SqliteBackend};
    use crate::selection::SelectionState;
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_migrate_yaml_to_sqlite_and_back() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = FileBackend::yaml(temp_dir.path().join("selections.yaml"));
        let sqlite = SqliteBackend::new(temp_dir.path().join("selections.db")).unwrap();
        let json = FileBackend::json(temp_dir.path().join("selections.json"));

        let selection = SelectionState::default().toggle("5");
        yaml.add_selection("Alpha", Some("one"), &selection, Utc::now()).unwrap();
        yaml.add_selection("Beta", None, &selection, Utc::now()).unwrap();

        assert_eq!(migrate_selections(&yaml, &sqlite).unwrap(), 2);
        assert_eq!(migrate_selections(&sqlite, &json).unwrap(), 2);
        assert_eq!(json.load().unwrap(), yaml.load().unwrap());
    }

    #[test]
    fn test_migrate_refuses_malformed_source() {
        let temp_dir = TempDir::new().unwrap();
        let broken_path = temp_dir.path().join("broken.json");
        fs::write(&broken_path, "not json at all").unwrap();
        let broken = FileBackend::json(&broken_path);

        let target = FileBackend::yaml(temp_dir.path().join("target.yaml"));
        target
            .add_selection("Keep", None, &SelectionState::default().toggle("1"), Utc::now())
            .unwrap();

        assert!(migrate_selections(&broken, &target).is_err());
        assert_eq!(target.load().unwrap().len(), 1);
    }
}
