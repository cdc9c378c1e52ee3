//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional TOML configuration file contents.
///
/// Looked up at `<config dir>/tfb/config.toml` (or `/etc/tfb/config.toml`
/// on Linux). A missing or unreadable file never aborts startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Data folder override
    pub data_folder: Option<PathBuf>,
    /// Listen port override
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Load the config file if one exists, otherwise defaults.
    pub fn load() -> TomlConfig {
        let Some(path) = config_file_path() else {
            return TomlConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring malformed config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            Err(_) => TomlConfig::default(),
        }
    }
}

/// Locate the platform config file, if present.
fn config_file_path() -> Option<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        let user_config = dir.join("tfb").join("config.toml");
        if user_config.exists() {
            return Some(user_config);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/tfb/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Data folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `TFB_DATA_FOLDER` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub struct DataFolderResolver {
    cli_arg: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var("TFB_DATA_FOLDER") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = TomlConfig::load().data_folder {
            return path;
        }

        default_data_folder()
    }
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tfb"))
        .unwrap_or_else(|| PathBuf::from("./tfb_data"))
}

/// Creates the data folder on first run and derives well-known paths
/// inside it.
pub struct DataFolderInitializer {
    data_folder: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(data_folder: PathBuf) -> Self {
        Self { data_folder }
    }

    /// Create the data folder if missing.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.data_folder.exists() {
            std::fs::create_dir_all(&self.data_folder).map_err(|e| {
                Error::Config(format!(
                    "Cannot create data folder {}: {}",
                    self.data_folder.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    /// Path of the SQLite database inside the data folder.
    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("feedback.db")
    }

    /// Path of the org-specific tenet catalog inside the data folder.
    pub fn tenets_path(&self) -> PathBuf {
        self.data_folder.join("tenets.json")
    }
}
