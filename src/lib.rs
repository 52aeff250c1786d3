//! # `task_tracker`
//!
//! A personal task tracker kept in a single-file embedded store.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod event_log;
pub mod paths;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
