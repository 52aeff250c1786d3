//! Command execution for the CLI.
//!
//! Every failure is returned as an [`Error`] and turned into an exit code
//! and a message here, in one place.

use crate::cli::{Cli, Command};
use crate::config::{self, Settings};
use crate::error::{Error, Result};
use crate::event_log::{self, CommandEvent};
use crate::paths;
use crate::store::Store;
use crate::tracker::{self, TaskIndex};
use chrono::Local;
use std::path::Path;
use std::process::ExitCode;

/// Header printed by `completed`.
pub const COMPLETED_HEADER: &str = "Tasks completed today:";

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Run a parsed command from the current working directory.
pub fn run(cli: Cli) -> CliOutput {
    match std::env::current_dir() {
        Ok(cwd) => run_in(cli, &cwd),
        Err(e) => error_output(&Error::Io(e)),
    }
}

/// Run a parsed command as if started from `base_dir`.
///
/// `base_dir` is where the project config is looked up and where relative
/// database paths resolve. The user config is read from its platform
/// location.
pub fn run_in(cli: Cli, base_dir: &Path) -> CliOutput {
    run_with(cli, base_dir, paths::user_config_path().as_deref())
}

/// Run a parsed command with an explicit user config file.
///
/// `None` skips the user config entirely.
pub fn run_with(cli: Cli, base_dir: &Path, user_config: Option<&Path>) -> CliOutput {
    if !cli.command.uses_store() {
        return run_version();
    }

    let settings = match config::resolve(base_dir, user_config, cli.db.as_deref()) {
        Ok(s) => s,
        Err(e) => return error_output(&e),
    };

    let result = execute(&cli.command, &settings);
    let output = match &result {
        Ok(lines) => success_output(lines.clone()),
        Err(e) => error_output(e),
    };

    let error = result.as_ref().err().map(ToString::to_string);
    let args = cli.command.args();
    event_log::log_command_event(
        &settings,
        &CommandEvent {
            command: cli.command.name(),
            args: &args,
            exit_code: result.as_ref().map_or_else(Error::exit_code, |_| 0),
            error: error.as_deref(),
        },
    );

    output
}

fn execute(command: &Command, settings: &Settings) -> Result<Vec<String>> {
    match command {
        Command::Add { words } => {
            let mut store = Store::open(&settings.db_path)?;
            tracker::add(&mut store, words)?;
            Ok(Vec::new())
        }
        Command::List => {
            let mut store = Store::open(&settings.db_path)?;
            let (tasks, _) = tracker::list(&mut store)?;
            Ok(tasks.iter().map(|t| format!("{}. {}", t.position, t.description)).collect())
        }
        Command::Do { position } => {
            let position = tracker::parse_position(position)?;
            let mut store = Store::open(&settings.db_path)?;
            let mut index = TaskIndex::default();
            let record = tracker::complete(&mut store, &mut index, position)?;
            Ok(vec![format!("You have completed the {} task.", record.description)])
        }
        Command::Remove { position } => {
            let position = tracker::parse_position(position)?;
            let mut store = Store::open(&settings.db_path)?;
            let mut index = TaskIndex::default();
            tracker::remove(&mut store, &mut index, position)?;
            Ok(Vec::new())
        }
        Command::Completed => {
            let mut store = Store::open(&settings.db_path)?;
            let done = tracker::completed_today(&mut store, Local::now().fixed_offset())?;
            let mut lines = vec![COMPLETED_HEADER.to_string()];
            lines.extend(done);
            Ok(lines)
        }
        Command::Version => Ok(vec![version_line()]),
    }
}

fn version_line() -> String {
    format!("task v{}", crate::VERSION)
}

fn run_version() -> CliOutput {
    success_output(vec![version_line()])
}

const fn success_output(stdout: Vec<String>) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout, stderr: Vec::new() }
}

fn error_output(error: &Error) -> CliOutput {
    CliOutput {
        exit_code: ExitCode::from(error.exit_code()),
        stdout: Vec::new(),
        stderr: vec![format!("Error: {error}")],
    }
}
