//! Error types for `task_tracker`.

/// Errors that can occur while running a task command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encoding error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A write was attempted inside a read-only transaction.
    #[error("transaction not writable")]
    TxNotWritable,

    /// A bucket required by the command does not exist.
    #[error("bucket {0:?} not found")]
    BucketNotFound(String),

    /// A key resolved from the task index is missing from the bucket.
    #[error("no task stored under key {0}")]
    KeyNotFound(u64),

    /// A stored value could not be decoded as a task record.
    #[error("corrupt task record at key {key}: {reason}")]
    CorruptRecord {
        /// Sequence number of the offending entry.
        key: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// A stored key is not an 8-byte big-endian sequence number.
    #[error("invalid key of {0} bytes (expected 8)")]
    InvalidKey(usize),

    /// A position argument was not a decimal integer.
    #[error("invalid task number {0:?}: expected a positive integer")]
    InvalidPosition(String),

    /// A position argument does not name a listed task.
    #[error("task number {position} is out of range ({count} active tasks)")]
    PositionOutOfRange {
        /// The 1-based position requested.
        position: usize,
        /// Number of tasks in the index.
        count: usize,
    },
}

impl Error {
    /// Process exit code for this error.
    ///
    /// User input errors exit with 2, on-disk corruption with 3, and
    /// everything else with 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidPosition(_) | Self::PositionOutOfRange { .. } => 2,
            Self::CorruptRecord { .. } | Self::InvalidKey(_) => 3,
            _ => 1,
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
