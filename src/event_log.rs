//! Debug command event logging.
//!
//! When `debug_logging` is enabled in the config, every command invocation
//! is appended as a JSONL line to `task-events.jsonl` next to the database.

use crate::config::Settings;
use crate::paths;
use std::fs::OpenOptions;
use std::io::Write;

/// Outcome of one command, as recorded in the event log.
#[derive(Debug, Clone, Copy)]
pub struct CommandEvent<'a> {
    /// Subcommand name (`add`, `list`, ...).
    pub command: &'a str,
    /// Arguments passed to the subcommand.
    pub args: &'a [String],
    /// Process exit code the command produced.
    pub exit_code: u8,
    /// Rendered error, if the command failed.
    pub error: Option<&'a str>,
}

/// Log a command event if debug logging is enabled.
///
/// Errors are silently ignored; logging never changes a command's outcome.
pub fn log_command_event(settings: &Settings, event: &CommandEvent<'_>) {
    if !settings.debug_logging {
        return;
    }
    write_command_event(settings, event);
}

fn write_command_event(settings: &Settings, event: &CommandEvent<'_>) {
    let log_path = paths::event_log_path(&settings.db_path);
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() && std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let mut entry = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "command": event.command,
        "args": event.args,
        "exit_code": event.exit_code,
    });
    if let Some(error) = event.error {
        entry["error"] = serde_json::Value::String(error.to_string());
    }

    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };
    let _ = writeln!(file, "{entry}");
}
