//! Single-file transactional bucket store.
//!
//! The store exposes named buckets of byte-string keys and values inside
//! read-only or read-write transactions. It is backed by one `SQLite`
//! file: keys are stored as BLOBs, which `SQLite` orders with `memcmp`, so
//! big-endian encoded sequence numbers iterate in ascending numeric order.
//!
//! # Example
//!
//! ```no_run
//! use task_tracker::store::Store;
//!
//! let mut store = Store::open("/tmp/example.db").unwrap();
//! store
//!     .update(|tx| {
//!         let bucket = tx.create_bucket_if_not_exists("notes")?;
//!         let seq = bucket.next_sequence()?;
//!         bucket.put(&seq.to_be_bytes(), b"hello")
//!     })
//!     .unwrap();
//! ```

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

/// Schema for the bucket tables.
const SCHEMA: &str = r"
    -- One row per bucket; `sequence` backs next_sequence()
    CREATE TABLE IF NOT EXISTS buckets (
        name TEXT PRIMARY KEY,
        sequence INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS entries (
        bucket TEXT NOT NULL REFERENCES buckets(name) ON DELETE CASCADE,
        key BLOB NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (bucket, key)
    ) WITHOUT ROWID;
";

/// An open handle on a store file.
///
/// The handle is meant to live for a single command: open it, run one
/// transaction, drop it.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `path`, creating the file if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file is not a usable database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Run `f` inside a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a database error if the
    /// transaction cannot be started.
    pub fn view<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&Tx { conn: &tx, writable: false })?;
        tx.rollback()?;
        Ok(out)
    }

    /// Run `f` inside a read-write transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise,
    /// so a failing command never leaves partial writes behind.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a database error if the
    /// transaction cannot be started or committed.
    pub fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&Tx { conn: &tx, writable: true })?;
        tx.commit()?;
        Ok(out)
    }
}

/// A transaction on a [`Store`].
#[derive(Debug)]
pub struct Tx<'a> {
    conn: &'a Connection,
    writable: bool,
}

impl<'a> Tx<'a> {
    /// Look up an existing bucket. Returns `None` if it has not been created.
    ///
    /// # Errors
    ///
    /// Returns a database error if the lookup fails.
    pub fn bucket(&self, name: &str) -> Result<Option<Bucket<'a>>> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM buckets WHERE name = ?1", params![name], |_| Ok(()))
            .optional()?;
        Ok(exists.map(|()| self.handle(name)))
    }

    /// Create the bucket if it does not exist and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TxNotWritable`] in a read-only transaction.
    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<Bucket<'a>> {
        self.ensure_writable()?;
        self.conn
            .execute("INSERT OR IGNORE INTO buckets (name, sequence) VALUES (?1, 0)", params![name])?;
        Ok(self.handle(name))
    }

    /// Delete a bucket together with all of its entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketNotFound`] if there is no such bucket, or
    /// [`Error::TxNotWritable`] in a read-only transaction.
    pub fn delete_bucket(&self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let rows = self.conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
        if rows == 0 {
            return Err(Error::BucketNotFound(name.to_string()));
        }
        Ok(())
    }

    fn handle(&self, name: &str) -> Bucket<'a> {
        Bucket { conn: self.conn, name: name.to_string(), writable: self.writable }
    }

    const fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::TxNotWritable)
        }
    }
}

/// A named key/value namespace, valid for the lifetime of its transaction.
#[derive(Debug)]
pub struct Bucket<'a> {
    conn: &'a Connection,
    name: String,
    writable: bool,
}

impl Bucket<'_> {
    /// Return the next sequence number for this bucket, starting from 1.
    ///
    /// The counter is persisted, so values are never handed out twice even
    /// after the entries they keyed are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TxNotWritable`] in a read-only transaction.
    pub fn next_sequence(&self) -> Result<u64> {
        self.ensure_writable()?;
        let seq: u64 = self.conn.query_row(
            "UPDATE buckets SET sequence = sequence + 1 WHERE name = ?1 RETURNING sequence",
            params![&self.name],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE bucket = ?1 AND key = ?2",
                params![&self.name, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for an empty key, or
    /// [`Error::TxNotWritable`] in a read-only transaction.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        if key.is_empty() {
            return Err(Error::InvalidKey(0));
        }
        self.conn.execute(
            "INSERT INTO entries (bucket, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (bucket, key) DO UPDATE SET value = excluded.value",
            params![&self.name, key, value],
        )?;
        Ok(())
    }

    /// Delete `key`. Deleting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TxNotWritable`] in a read-only transaction.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.conn.execute(
            "DELETE FROM entries WHERE bucket = ?1 AND key = ?2",
            params![&self.name, key],
        )?;
        Ok(())
    }

    /// Visit every entry in ascending key order.
    ///
    /// The first error returned by `f` stops the walk and is propagated.
    /// `f` must not modify this bucket.
    ///
    /// # Errors
    ///
    /// Returns a database error or the first error returned by `f`.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let mut stmt =
            self.conn.prepare("SELECT key, value FROM entries WHERE bucket = ?1 ORDER BY key")?;
        let mut rows = stmt.query(params![&self.name])?;
        while let Some(row) = rows.next()? {
            let key: Vec<u8> = row.get(0)?;
            let value: Vec<u8> = row.get(1)?;
            f(&key, &value)?;
        }
        Ok(())
    }

    /// Number of entries in the bucket.
    ///
    /// # Errors
    ///
    /// Returns a database error if the count fails.
    pub fn len(&self) -> Result<usize> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
            params![&self.name],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether the bucket has no entries.
    ///
    /// # Errors
    ///
    /// Returns a database error if the count fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    const fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::TxNotWritable)
        }
    }
}
