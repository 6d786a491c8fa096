use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{
    clock_config::ClockConfig, director_config::DirectorConfig, player_config::PlayerConfig,
};

const APPLICATION: &str = "tableau";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error on config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Could not determine the config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to `{data_dir}/logs/{component}.log`
    pub file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableauConfig {
    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub director: DirectorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hero player used when there is no server to provide one
    #[serde(default)]
    pub player: PlayerConfig,
}

impl TableauConfig {
    fn project_dirs() -> Result<directories::ProjectDirs, ConfigLoadError> {
        directories::ProjectDirs::from("", "", APPLICATION).ok_or(ConfigLoadError::NoConfigDir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigLoadError> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory for logs and other local output
    pub fn data_dir() -> Result<PathBuf, ConfigLoadError> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigLoadError> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigLoadError> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}
