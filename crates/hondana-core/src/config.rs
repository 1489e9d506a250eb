use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::HondanaError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Quiet time after the last keystroke before a search fires, in
    /// milliseconds.
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub page_size: u32,
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise built-in
    /// defaults.
    pub fn load() -> Result<Self, HondanaError> {
        let defaults: AppConfig =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| HondanaError::Config(e.to_string()))?;

        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(defaults);
        }
        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| HondanaError::Config(e.to_string()))
    }

    /// Write the config to the user config file.
    pub fn save(&self) -> Result<(), HondanaError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw =
            toml::to_string_pretty(self).map_err(|e| HondanaError::Config(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Path of the user config file.
    pub fn config_path() -> Result<PathBuf, HondanaError> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create the data directory if needed and return the database path.
    pub fn ensure_db_path() -> Result<PathBuf, HondanaError> {
        let dirs = Self::project_dirs()?;
        std::fs::create_dir_all(dirs.data_dir())?;
        Ok(dirs.data_dir().join("hondana.db"))
    }

    fn project_dirs() -> Result<ProjectDirs, HondanaError> {
        ProjectDirs::from("", "", "hondana")
            .ok_or_else(|| HondanaError::Config("no home directory".into()))
    }
}
