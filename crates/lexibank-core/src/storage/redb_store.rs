//! # redb-backed Key-Value Storage
//!
//! A disk-backed store using the redb embedded database, providing:
//! - ACID transactions (a [`WriteBatch`] commits as one transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Everything lives in one `entries` table of `&str -> &str`, so the chunked
//! layout written by the repository is identical across backends.

use super::{KeyValueStore, WriteBatch, WriteOp, check_value_size};
use crate::LexiError;
use crate::primitives::MAX_VALUE_BYTES;
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for entries: key string -> JSON value string
const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

fn io_error(e: impl std::fmt::Display) -> LexiError {
    LexiError::IoError(e.to_string())
}

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Where the database lives, for diagnostics.
    path: PathBuf,
    value_limit: usize,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("value_limit", &self.value_limit)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LexiError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Initialize the table so read transactions never see it missing
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(ENTRIES).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened redb store");

        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
            value_limit: MAX_VALUE_BYTES,
        })
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), LexiError> {
        self.db.compact().map_err(io_error)?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, LexiError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(ENTRIES).map_err(io_error)?;
        let value = table
            .get(key)
            .map_err(io_error)?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LexiError> {
        check_value_size(key, value, self.value_limit)?;

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(ENTRIES).map_err(io_error)?;
            table.insert(key, value).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, LexiError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        let existed = {
            let mut table = write_txn.open_table(ENTRIES).map_err(io_error)?;
            let removed = table.remove(key).map_err(io_error)?;
            removed.is_some()
        };
        write_txn.commit().map_err(io_error)?;
        Ok(existed)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LexiError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(ENTRIES).map_err(io_error)?;

        let mut keys = Vec::new();
        for entry in table.range(prefix..).map_err(io_error)? {
            let (key, _) = entry.map_err(io_error)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        Ok(keys)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), LexiError> {
        // Validate before the transaction opens; a rejected batch writes nothing.
        batch.validate(self.value_limit)?;
        if batch.is_empty() {
            return Ok(());
        }

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(ENTRIES).map_err(io_error)?;
            for op in batch.ops() {
                match op {
                    WriteOp::Put { key, value } => {
                        table
                            .insert(key.as_str(), value.as_str())
                            .map_err(io_error)?;
                    }
                    WriteOp::Delete { key } => {
                        table.remove(key.as_str()).map_err(io_error)?;
                    }
                }
            }
        }
        write_txn.commit().map_err(io_error)?;

        tracing::trace!(ops = batch.len(), "committed write batch");
        Ok(())
    }

    fn len(&self) -> Result<usize, LexiError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(ENTRIES).map_err(io_error)?;
        Ok(table.len().map_err(io_error)? as usize)
    }

    fn max_value_bytes(&self) -> usize {
        self.value_limit
    }
}
