//! Configuration for windowstore

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::persist::{DEFAULT_VERSION, FileStorage};
use crate::window::{BuildMode, StoreOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted state files
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Production or development store composition
    #[serde(default)]
    pub build_mode: BuildMode,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); the CLI flag wins
    #[serde(default)]
    pub log_level: Option<String>,

    /// Version written into persisted blobs
    #[serde(default = "default_persist_version")]
    pub persist_version: u32,
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("windowstore")
}

fn default_persist_version() -> u32 {
    DEFAULT_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            build_mode: BuildMode::default(),
            log_level: None,
            persist_version: default_persist_version(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("windowstore").join("config.yml")),
            Some(PathBuf::from("windowstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        debug!("Config::load: no config file found, using defaults");
        Ok(Config::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Config::load_from: called");
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Log level from the config file, ignoring any load error
    ///
    /// Read before logging is set up, so failures surface later through [`Config::load`].
    pub fn load_log_level(path: Option<&PathBuf>) -> Option<String> {
        Self::load(path).ok().and_then(|config| config.log_level)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Store options backed by file storage under `storage_dir`
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new(Arc::new(FileStorage::new(&self.storage_dir)))
            .with_build_mode(self.build_mode)
            .with_persist_version(self.persist_version)
    }
}
