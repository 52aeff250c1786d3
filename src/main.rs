//! CLI binary for `task_tracker`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the library.

use clap::Parser;
use std::process::ExitCode;
use task_tracker::cli::{self, Cli};

fn main() -> ExitCode {
    let output = cli::run(Cli::parse());

    for line in output.stdout {
        println!("{line}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}
