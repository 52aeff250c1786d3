//! Path utilities for locating the database, config and event log.

use std::path::{Path, PathBuf};

/// Directory name used under the user's config directory.
const APP_DIR_NAME: &str = "task-tracker";

/// The user-level config filename.
pub const USER_CONFIG_FILENAME: &str = "config.yaml";

/// The default database filename, relative to the working directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "tasks.db";

/// The event log filename, written next to the database.
pub const EVENT_LOG_FILENAME: &str = "task-events.jsonl";

/// Get the user-level config file path.
///
/// Returns `<config_dir>/task-tracker/config.yaml`, or `None` if the
/// platform config directory cannot be determined.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(USER_CONFIG_FILENAME))
}

/// Get the default database path for a working directory.
#[must_use]
pub fn default_db_path(base_dir: &Path) -> PathBuf {
    base_dir.join(DEFAULT_DATABASE_FILENAME)
}

/// Get the event log path for a database.
#[must_use]
pub fn event_log_path(db_path: &Path) -> PathBuf {
    db_path.with_file_name(EVENT_LOG_FILENAME)
}

/// Resolve `path` against `base_dir` unless it is already absolute.
#[must_use]
pub fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
