//! Configuration management for the task tracker.
//!
//! Settings come from a `.task-tracker.yaml` file in the working directory,
//! falling back to a user-level file under the platform config directory.
//! Neither file is required.

use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project config file name, relative to the working directory.
pub const CONFIG_FILE_PATH: &str = ".task-tracker.yaml";

/// Environment variable that overrides the database path.
pub const DATABASE_ENV: &str = "TASKS_DB";

/// Contents of a config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Database file. Relative paths resolve against the config file's
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Append one JSON line per command to the event log.
    #[serde(default)]
    pub debug_logging: bool,
}

impl Config {
    /// Load config from a specific base directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&base_dir.join(CONFIG_FILE_PATH))
    }

    /// Load config from an explicit file, returning None if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Save config to a specific base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(base_dir.join(CONFIG_FILE_PATH), content)?;
        Ok(())
    }
}

/// Effective settings for one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Database file to open.
    pub db_path: PathBuf,
    /// Whether to write the event log.
    pub debug_logging: bool,
}

/// Resolve settings for a command run from `base_dir`.
///
/// The project config in `base_dir` shadows the `user_config` file.
/// `db_override` is the `--db` flag (or [`DATABASE_ENV`]) and wins over
/// either.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn resolve(
    base_dir: &Path,
    user_config: Option<&Path>,
    db_override: Option<&Path>,
) -> Result<Settings> {
    let (config, config_dir) = if let Some(config) = Config::load_from(base_dir)? {
        (config, base_dir.to_path_buf())
    } else {
        match user_config {
            Some(path) => match Config::load_file(path)? {
                Some(config) => {
                    (config, path.parent().map_or_else(|| base_dir.to_path_buf(), Path::to_path_buf))
                }
                None => (Config::default(), base_dir.to_path_buf()),
            },
            None => (Config::default(), base_dir.to_path_buf()),
        }
    };

    let db_path = match (db_override, &config.database) {
        (Some(path), _) => paths::resolve_against(base_dir, path),
        (None, Some(path)) => paths::resolve_against(&config_dir, path),
        (None, None) => paths::default_db_path(base_dir),
    };

    Ok(Settings { db_path, debug_logging: config.debug_logging })
}
