//! Command-line interface for the task tracker.
//!
//! The binary parses arguments into [`Cli`] and hands it to [`run`], which
//! returns everything to print plus the exit code.

mod run;


pub use run::{run, run_in, run_with, CliOutput, COMPLETED_HEADER};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personal task tracker.
///
/// Tasks are numbered by `list`; `do` and `remove` take those numbers.
#[derive(Parser, Debug)]
#[command(name = "task")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file (defaults to tasks.db in the current directory)
    #[arg(long, global = true, env = "TASKS_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a task. All arguments are joined into its description.
    Add {
        /// Task description
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// List all active tasks.
    List,

    /// Mark a task as done.
    Do {
        /// Task number as shown by `list`
        position: String,
    },

    /// Delete a task.
    Remove {
        /// Task number as shown by `list`
        position: String,
    },

    /// Show tasks completed today.
    Completed,

    /// Show version information.
    Version,
}

impl Command {
    /// Subcommand name, as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::List => "list",
            Self::Do { .. } => "do",
            Self::Remove { .. } => "remove",
            Self::Completed => "completed",
            Self::Version => "version",
        }
    }

    /// Arguments given to the subcommand.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Add { words } => words.clone(),
            Self::Do { position } | Self::Remove { position } => vec![position.clone()],
            Self::List | Self::Completed | Self::Version => Vec::new(),
        }
    }

    /// Returns true if this command opens the database.
    #[must_use]
    pub const fn uses_store(&self) -> bool {
        !matches!(self, Self::Version)
    }
}
