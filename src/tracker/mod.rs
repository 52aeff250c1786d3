//! Task tracking operations.
//!
//! Every task lives in the `task` bucket of a [`Store`], keyed by the
//! bucket's sequence number. Commands that address tasks by position
//! (`complete`, `remove`) go through a [`TaskIndex`] built by [`list`] or
//! [`rebuild_index`]; an empty index is rebuilt before it is used.
//!
//! # Example
//!
//! ```no_run
//! use task_tracker::store::Store;
//! use task_tracker::tracker::{self, TaskIndex};
//!
//! let mut store = Store::open("tasks.db").unwrap();
//! tracker::add(&mut store, &["buy".to_string(), "milk".to_string()]).unwrap();
//!
//! let mut index = TaskIndex::default();
//! let done = tracker::complete(&mut store, &mut index, 1).unwrap();
//! assert_eq!(done.description, "buy milk");
//! ```

mod index;
mod record;

pub use index::{parse_position, TaskIndex};
pub use record::{decode_key, encode_key, TaskRecord, ZERO_TIME};

use crate::error::{Error, Result};
use crate::store::{Store, Tx};
use chrono::{DateTime, Datelike, FixedOffset, Local};

/// Name of the bucket holding task records.
pub const TASK_BUCKET: &str = "task";

/// An active task as shown by [`list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedTask {
    /// 1-based display position.
    pub position: usize,
    /// Store key of the task.
    pub key: u64,
    /// Task description.
    pub description: String,
}

/// Create a new active task from `words` joined with single spaces.
///
/// An empty `words` slice yields a task with an empty description.
/// Returns the sequence number the task was stored under.
///
/// # Errors
///
/// Returns an error if the write transaction fails.
pub fn add(store: &mut Store, words: &[String]) -> Result<u64> {
    let record = TaskRecord::new(words.join(" "));
    store.update(|tx| {
        let bucket = tx.create_bucket_if_not_exists(TASK_BUCKET)?;
        let seq = bucket.next_sequence()?;
        bucket.put(&encode_key(seq), &record.encode()?)?;
        Ok(seq)
    })
}

/// List active tasks and build a fresh index over them.
///
/// A store without a task bucket lists nothing.
///
/// # Errors
///
/// Returns an error if the read fails or any stored record is corrupt.
pub fn list(store: &mut Store) -> Result<(Vec<ListedTask>, TaskIndex)> {
    store.view(|tx| {
        let mut tasks = Vec::new();
        let mut index = TaskIndex::default();
        for_each_record(tx, |key, record| {
            if record.is_active {
                index.push(key);
                tasks.push(ListedTask {
                    position: index.len(),
                    key,
                    description: record.description,
                });
            }
            Ok(())
        })?;
        Ok((tasks, index))
    })
}

/// Build an index over the active tasks without listing them.
///
/// # Errors
///
/// Returns an error if the read fails or any stored record is corrupt.
pub fn rebuild_index(store: &mut Store) -> Result<TaskIndex> {
    list(store).map(|(_, index)| index)
}

/// Mark the task at `position` completed now.
///
/// # Errors
///
/// See [`complete_at`].
pub fn complete(store: &mut Store, index: &mut TaskIndex, position: usize) -> Result<TaskRecord> {
    complete_at(store, index, position, Local::now().fixed_offset())
}

/// Mark the task at `position` completed at `at`.
///
/// A task that is already completed is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::PositionOutOfRange`] if `position` is not in the index,
/// [`Error::BucketNotFound`] or [`Error::KeyNotFound`] if the task is gone
/// from the store, or a corrupt-record error if it cannot be decoded.
pub fn complete_at(
    store: &mut Store,
    index: &mut TaskIndex,
    position: usize,
    at: DateTime<FixedOffset>,
) -> Result<TaskRecord> {
    let key = resolve(store, index, position)?;
    store.update(|tx| {
        let bucket = tx
            .bucket(TASK_BUCKET)?
            .ok_or_else(|| Error::BucketNotFound(TASK_BUCKET.to_string()))?;
        let raw = bucket.get(&encode_key(key))?.ok_or(Error::KeyNotFound(key))?;
        let mut record = TaskRecord::decode(key, &raw)?;
        if record.complete(at) {
            bucket.put(&encode_key(key), &record.encode()?)?;
        }
        Ok(record)
    })
}

/// Delete the task at `position`. Returns the deleted key.
///
/// Deleting a key that is already gone succeeds.
///
/// # Errors
///
/// Returns [`Error::PositionOutOfRange`] if `position` is not in the index,
/// or [`Error::BucketNotFound`] if the task bucket does not exist.
pub fn remove(store: &mut Store, index: &mut TaskIndex, position: usize) -> Result<u64> {
    let key = resolve(store, index, position)?;
    store.update(|tx| {
        let bucket = tx
            .bucket(TASK_BUCKET)?
            .ok_or_else(|| Error::BucketNotFound(TASK_BUCKET.to_string()))?;
        bucket.delete(&encode_key(key))?;
        Ok(key)
    })
}

/// Descriptions of tasks completed "today" relative to `now`.
///
/// See [`finished_today`] for what counts as today.
///
/// # Errors
///
/// Returns an error if the read fails or any stored record is corrupt.
pub fn completed_today(store: &mut Store, now: DateTime<FixedOffset>) -> Result<Vec<String>> {
    store.view(|tx| {
        let mut done = Vec::new();
        for_each_record(tx, |_, record| {
            if let (false, Some(finished)) = (record.is_active, record.finished_at) {
                if finished_today(now, finished) {
                    done.push(record.description);
                }
            }
            Ok(())
        })?;
        Ok(done)
    })
}

/// Whether a task finished at `finished` counts as completed today.
///
/// Only the day-of-month is compared: the task matches when `now`'s day is
/// not after `finished`'s day. The month and year are ignored, so a task
/// finished on the 31st of an earlier month still matches on the 2nd.
#[must_use]
pub fn finished_today(now: DateTime<FixedOffset>, finished: DateTime<FixedOffset>) -> bool {
    i64::from(now.day()) - i64::from(finished.day()) <= 0
}

fn resolve(store: &mut Store, index: &mut TaskIndex, position: usize) -> Result<u64> {
    if index.is_empty() {
        *index = rebuild_index(store)?;
    }
    index.resolve(position)
}

/// Decode and visit every record in the task bucket, in key order.
fn for_each_record<F>(tx: &Tx<'_>, mut f: F) -> Result<()>
where
    F: FnMut(u64, TaskRecord) -> Result<()>,
{
    let Some(bucket) = tx.bucket(TASK_BUCKET)? else {
        return Ok(());
    };
    bucket.for_each(|k, v| {
        let key = decode_key(k)?;
        f(key, TaskRecord::decode(key, v)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("tasks.db")).unwrap();
        (dir, store)
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn descriptions(store: &mut Store) -> Vec<String> {
        list(store).unwrap().0.into_iter().map(|t| t.description).collect()
    }

    fn raw_records(store: &mut Store) -> Vec<(u64, TaskRecord)> {
        store
            .view(|tx| {
                let mut out = Vec::new();
                for_each_record(tx, |k, r| {
                    out.push((k, r));
                    Ok(())
                })?;
                Ok(out)
            })
            .unwrap()
    }

    #[test]
    fn test_add_joins_words_and_assigns_sequence() {
        let (_dir, mut store) = create_test_store();
        assert_eq!(add(&mut store, &words("buy milk")).unwrap(), 1);
        assert_eq!(add(&mut store, &words("walk  the dog")).unwrap(), 2);

        let (tasks, index) = list(&mut store).unwrap();
        assert_eq!(
            tasks,
            vec![
                ListedTask { position: 1, key: 1, description: "buy milk".to_string() },
                ListedTask { position: 2, key: 2, description: "walk the dog".to_string() },
            ]
        );
        assert_eq!(index.keys(), &[1, 2]);
    }

    #[test]
    fn test_add_empty_description_is_allowed() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &[]).unwrap();
        assert_eq!(descriptions(&mut store), vec![String::new()]);
    }

    #[test]
    fn test_list_without_bucket_is_empty() {
        let (_dir, mut store) = create_test_store();
        let (tasks, index) = list(&mut store).unwrap();
        assert!(tasks.is_empty());
        assert!(index.is_empty());
        assert!(completed_today(&mut store, at("2024-05-10T12:00:00Z")).unwrap().is_empty());
    }

    #[test]
    fn test_complete_skips_line_numbers() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("a")).unwrap();
        add(&mut store, &words("b")).unwrap();
        add(&mut store, &words("c")).unwrap();

        let mut index = TaskIndex::default();
        let done = complete_at(&mut store, &mut index, 2, at("2024-05-10T12:00:00Z")).unwrap();
        assert_eq!(done.description, "b");
        assert!(!done.is_active);

        let (tasks, index) = list(&mut store).unwrap();
        let shown: Vec<_> = tasks.iter().map(|t| (t.position, t.description.as_str())).collect();
        assert_eq!(shown, vec![(1, "a"), (2, "c")]);
        assert_eq!(index.keys(), &[1, 3]);
    }

    #[test]
    fn test_complete_stamps_finished_at() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("y")).unwrap();
        let when = at("2024-05-10T12:34:56.5+02:00");
        complete_at(&mut store, &mut TaskIndex::default(), 1, when).unwrap();

        let records = raw_records(&mut store);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.finished_at, Some(when));
        assert!(!records[0].1.is_active);
    }

    #[test]
    fn test_complete_out_of_range_mutates_nothing() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("a")).unwrap();
        add(&mut store, &words("b")).unwrap();
        let before = raw_records(&mut store);

        let err = complete(&mut store, &mut TaskIndex::default(), 5).unwrap_err();
        assert!(matches!(err, Error::PositionOutOfRange { position: 5, count: 2 }));
        assert_eq!(raw_records(&mut store), before);
    }

    #[test]
    fn test_complete_on_empty_store_is_out_of_range() {
        let (_dir, mut store) = create_test_store();
        let err = complete(&mut store, &mut TaskIndex::default(), 1).unwrap_err();
        assert!(matches!(err, Error::PositionOutOfRange { position: 1, count: 0 }));
    }

    #[test]
    fn test_index_is_not_refreshed_after_add() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("first")).unwrap();
        let (_, mut index) = list(&mut store).unwrap();

        add(&mut store, &words("second")).unwrap();
        let err = complete(&mut store, &mut index, 2).unwrap_err();
        assert!(matches!(err, Error::PositionOutOfRange { position: 2, count: 1 }));

        let (_, mut fresh) = list(&mut store).unwrap();
        assert_eq!(complete(&mut store, &mut fresh, 2).unwrap().description, "second");
    }

    #[test]
    fn test_stale_index_reports_missing_key() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        let (_, mut stale) = list(&mut store).unwrap();
        remove(&mut store, &mut TaskIndex::default(), 1).unwrap();

        let err = complete(&mut store, &mut stale, 1).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(1)));
    }

    #[test]
    fn test_missing_bucket_with_stale_index_is_reported() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        let (_, mut stale) = list(&mut store).unwrap();
        store.update(|tx| tx.delete_bucket(TASK_BUCKET)).unwrap();

        let err = complete(&mut store, &mut stale.clone(), 1).unwrap_err();
        assert!(matches!(err, Error::BucketNotFound(_)));
        let err = remove(&mut store, &mut stale, 1).unwrap_err();
        assert!(matches!(err, Error::BucketNotFound(_)));
    }

    #[test]
    fn test_completing_twice_keeps_first_timestamp() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        let (_, stale) = list(&mut store).unwrap();
        let first = at("2024-05-10T08:00:00Z");
        complete_at(&mut store, &mut stale.clone(), 1, first).unwrap();

        let again = complete_at(&mut store, &mut stale.clone(), 1, at("2024-05-11T08:00:00Z"))
            .unwrap();
        assert_eq!(again.finished_at, Some(first));
        assert_eq!(raw_records(&mut store)[0].1.finished_at, Some(first));
    }

    #[test]
    fn test_remove_deletes_record() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        add(&mut store, &words("y")).unwrap();

        let mut index = TaskIndex::default();
        assert_eq!(remove(&mut store, &mut index, 1).unwrap(), 1);
        assert_eq!(descriptions(&mut store), vec!["y".to_string()]);
        assert_eq!(raw_records(&mut store).len(), 1);
    }

    #[test]
    fn test_remove_absent_key_succeeds() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        let (_, stale) = list(&mut store).unwrap();
        remove(&mut store, &mut stale.clone(), 1).unwrap();
        remove(&mut store, &mut stale.clone(), 1).unwrap();
        assert!(descriptions(&mut store).is_empty());
    }

    #[test]
    fn test_remove_completed_task() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("x")).unwrap();
        let (_, stale) = list(&mut store).unwrap();
        complete(&mut store, &mut stale.clone(), 1).unwrap();
        remove(&mut store, &mut stale.clone(), 1).unwrap();
        assert!(raw_records(&mut store).is_empty());
    }

    #[test]
    fn test_corrupt_record_aborts_listing() {
        let (_dir, mut store) = create_test_store();
        add(&mut store, &words("fine")).unwrap();
        store
            .update(|tx| {
                let b = tx.create_bucket_if_not_exists(TASK_BUCKET)?;
                b.put(&encode_key(2), b"{broken")
            })
            .unwrap();

        let err = list(&mut store).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { key: 2, .. }));
        let err = completed_today(&mut store, at("2024-05-10T12:00:00Z")).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { key: 2, .. }));
        let err = complete(&mut store, &mut TaskIndex::default(), 1).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { key: 2, .. }));
    }

    #[test]
    fn test_malformed_key_aborts_listing() {
        let (_dir, mut store) = create_test_store();
        store
            .update(|tx| {
                let b = tx.create_bucket_if_not_exists(TASK_BUCKET)?;
                b.put(b"abc", &TaskRecord::new("odd").encode()?)
            })
            .unwrap();
        assert!(matches!(list(&mut store), Err(Error::InvalidKey(3))));
    }

    #[test]
    fn test_completed_today_lists_matching_descriptions() {
        let (_dir, mut store) = create_test_store();
        for d in ["early", "today", "active"] {
            add(&mut store, &words(d)).unwrap();
        }
        complete_at(&mut store, &mut TaskIndex::default(), 1, at("2024-05-03T09:00:00Z")).unwrap();
        complete_at(&mut store, &mut TaskIndex::default(), 1, at("2024-05-10T09:00:00Z")).unwrap();

        let done = completed_today(&mut store, at("2024-05-10T18:00:00Z")).unwrap();
        assert_eq!(done, vec!["today".to_string()]);
    }

    #[test]
    fn test_finished_today_compares_day_of_month_only() {
        let now = at("2024-03-02T10:00:00Z");
        assert!(finished_today(now, at("2024-03-02T01:00:00Z")));
        assert!(!finished_today(now, at("2024-03-01T23:00:00Z")));
        // Later day-of-month in an earlier month still matches.
        assert!(finished_today(now, at("2024-01-31T12:00:00Z")));
        assert!(finished_today(now, at("2023-03-02T12:00:00Z")));
    }

    #[test]
    fn test_finished_today_uses_recorded_offset() {
        let now = at("2024-03-02T10:00:00+00:00");
        // 23:30 on the 1st in UTC-05:00 is the 2nd in UTC, but the day is read
        // in the offset the task was recorded with.
        assert!(!finished_today(now, at("2024-03-01T23:30:00-05:00")));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Complete(usize),
        Remove(usize),
    }

    fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
        let op = prop_oneof![
            3 => Just(Op::Add),
            1 => (1usize..6).prop_map(Op::Complete),
            1 => (1usize..6).prop_map(Op::Remove),
        ];
        proptest::collection::vec(op, 0..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_keys_strictly_increase(ops in arb_ops()) {
            let (_dir, mut store) = create_test_store();
            let mut last = 0u64;
            for op in ops {
                match op {
                    Op::Add => {
                        let key = add(&mut store, &words("t")).unwrap();
                        prop_assert!(key > last);
                        last = key;
                    }
                    Op::Complete(p) => { let _ = complete(&mut store, &mut TaskIndex::default(), p); }
                    Op::Remove(p) => { let _ = remove(&mut store, &mut TaskIndex::default(), p); }
                }
            }
        }

        #[test]
        fn prop_index_matches_active_records(ops in arb_ops()) {
            let (_dir, mut store) = create_test_store();
            for op in ops {
                match op {
                    Op::Add => { add(&mut store, &words("t")).unwrap(); }
                    Op::Complete(p) => { let _ = complete(&mut store, &mut TaskIndex::default(), p); }
                    Op::Remove(p) => { let _ = remove(&mut store, &mut TaskIndex::default(), p); }
                }
            }

            let records = raw_records(&mut store);
            let active: Vec<u64> =
                records.iter().filter(|(_, r)| r.is_active).map(|(k, _)| *k).collect();
            let index = rebuild_index(&mut store).unwrap();
            prop_assert_eq!(index.keys(), active.as_slice());
            prop_assert!(index.keys().windows(2).all(|w| w[0] < w[1]));
            for (_, r) in &records {
                prop_assert_eq!(r.is_active, r.finished_at.is_none());
            }
        }
    }
}
