//! Task record and key codec.
//!
//! Records are stored as JSON objects with the field names `IsActive`,
//! `Description` and `FinishedAt`. An unset `FinishedAt` is written as the
//! zero timestamp `0001-01-01T00:00:00Z`; a set one keeps the UTC offset it
//! was recorded in. Keys are bucket sequence numbers encoded as 8 bytes
//! big-endian.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Serialized form of an unset timestamp.
pub const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Unix timestamp of [`ZERO_TIME`].
const ZERO_TIME_UNIX: i64 = -62_135_596_800;

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskRecord {
    /// True while the task is pending.
    pub is_active: bool,
    /// Free-form description.
    pub description: String,
    /// When the task was completed. `None` while active.
    #[serde(default, with = "finished_at")]
    pub finished_at: Option<DateTime<FixedOffset>>,
}

impl TaskRecord {
    /// Create a new active task.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self { is_active: true, description: description.into(), finished_at: None }
    }

    /// Mark the task completed at `at`.
    ///
    /// Completion is one-way: calling this on an already completed task
    /// leaves it untouched and returns `false`.
    pub fn complete(&mut self, at: DateTime<FixedOffset>) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.finished_at = Some(at);
        true
    }

    /// Encode the record for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode the value stored under sequence number `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptRecord`] if the bytes are not a task record,
    /// or decode to one that is inactive without a completion time (or the
    /// reverse).
    pub fn decode(key: u64, bytes: &[u8]) -> Result<Self> {
        let record: Self = serde_json::from_slice(bytes)
            .map_err(|e| Error::CorruptRecord { key, reason: e.to_string() })?;
        match (record.is_active, record.finished_at.is_some()) {
            (true, true) => Err(Error::CorruptRecord {
                key,
                reason: "active task has a completion time".to_string(),
            }),
            (false, false) => Err(Error::CorruptRecord {
                key,
                reason: "completed task has no completion time".to_string(),
            }),
            _ => Ok(record),
        }
    }
}

/// Encode a sequence number as a store key.
#[must_use]
pub const fn encode_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

/// Decode a store key back into its sequence number.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] unless `key` is exactly 8 bytes.
pub fn decode_key(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| Error::InvalidKey(key.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

mod finished_at {
    use super::{ZERO_TIME, ZERO_TIME_UNIX};
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_str(ZERO_TIME),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let at = DateTime::parse_from_rfc3339(&raw).map_err(D::Error::custom)?;
        if at.timestamp() == ZERO_TIME_UNIX && at.timestamp_subsec_nanos() == 0 {
            Ok(None)
        } else {
            Ok(Some(at))
        }
    }
}
