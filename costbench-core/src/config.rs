//! Application configuration
//!
//! A YAML file holding the filter default table, paging, vocabularies,
//! anchor rules and store locations. Missing keys take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dashboard::AnchorRule;
use crate::db::BackendType;
use crate::filter::FilterDefaults;
use crate::models::Vocabulary;
use crate::pagination::PageConfig;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "COSTBENCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub filters: FilterDefaults,
    pub pagination: PageConfig,
    pub vocabulary: Vocabulary,
    pub anchor_rules: Vec<AnchorRule>,
    /// Catalog file; the built-in catalog is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Saved-selection store; defaults under the data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Store backend; inferred from the store extension when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_backend: Option<BackendType>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            filters: FilterDefaults::default(),
            pagination: PageConfig::default(),
            vocabulary: Vocabulary::default(),
            anchor_rules: vec![AnchorRule {
                trigger_tag: "New Build".to_string(),
                project_id: "bunker-1".to_string(),
            }],
            catalog_path: None,
            store_path: None,
            store_backend: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config, writing a default one first if none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            log::info!("Creating default config at {:?}", path.as_ref());
            Self::default().save(&path)?;
        }
        Self::load(path)
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        // Ensure parent directories exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// The saved-selection store location
    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join("selections.json")),
        }
    }
}

/// Gets the configuration directory (~/.config/costbench on Linux)
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(base.join("costbench"))
}

/// Gets the data directory used for saved selections
pub fn get_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base.join("costbench"))
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join("config.yaml"))
}
