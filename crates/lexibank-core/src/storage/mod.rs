//! # Storage Module
//!
//! A string key-value store holding JSON blobs, in the shape of browser
//! local storage: whole values are read and written by key, and every value
//! is subject to a per-key size limit.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: `BTreeMap`-backed, volatile unless explicitly snapshotted
//! - [`RedbStore`]: disk-backed using redb (ACID, crash safe)
//!
//! [`StorageBackend`] wraps either one and is what the repository holds.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::LexiError;

// =============================================================================
// WRITE BATCH
// =============================================================================

/// A single buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: String, value: String },
    Delete { key: String },
}

/// An ordered group of writes applied as one unit.
///
/// Stores validate the whole batch before touching any key, so a rejected
/// batch leaves the store unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ops.push(WriteOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Queue a delete.
    pub fn delete(&mut self, key: impl Into<String>) {
        self.ops.push(WriteOp::Delete { key: key.into() });
    }

    /// Append all writes of `other` after the writes already queued.
    pub fn extend(&mut self, other: WriteBatch) {
        self.ops.extend(other.ops);
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Check every queued put against a per-value byte limit.
    pub fn validate(&self, limit: usize) -> Result<(), LexiError> {
        for op in &self.ops {
            if let WriteOp::Put { key, value } = op {
                check_value_size(key, value, limit)?;
            }
        }
        Ok(())
    }
}

/// Reject a value larger than `limit` bytes.
pub(crate) fn check_value_size(key: &str, value: &str, limit: usize) -> Result<(), LexiError> {
    if value.len() > limit {
        return Err(LexiError::ValueTooLarge {
            key: key.to_string(),
            size: value.len(),
            limit,
        });
    }
    Ok(())
}

// =============================================================================
// KEYVALUESTORE TRAIT
// =============================================================================

/// The key-value operations the persistence layer is built on.
///
/// All fallible operations return `Result<T, LexiError>` so in-memory and
/// persistent backends can be used uniformly.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, LexiError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), LexiError>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool, LexiError>;

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LexiError>;

    /// Apply a batch of writes in order, all or nothing.
    fn apply(&mut self, batch: WriteBatch) -> Result<(), LexiError>;

    /// Number of keys in the store.
    fn len(&self) -> Result<usize, LexiError>;

    /// Per-key value limit in bytes.
    fn max_value_bytes(&self) -> usize;

    /// Check if the store holds no keys.
    fn is_empty(&self) -> Result<bool, LexiError> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a repository.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// A redb database handle cannot be safely cloned.

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.get(key),
            StorageBackend::Persistent(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.set(key, value),
            StorageBackend::Persistent(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<bool, LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.remove(key),
            StorageBackend::Persistent(store) => store.remove(key),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.keys_with_prefix(prefix),
            StorageBackend::Persistent(store) => store.keys_with_prefix(prefix),
        }
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.apply(batch),
            StorageBackend::Persistent(store) => store.apply(batch),
        }
    }

    fn len(&self) -> Result<usize, LexiError> {
        match self {
            StorageBackend::InMemory(store) => store.len(),
            StorageBackend::Persistent(store) => store.len(),
        }
    }

    fn max_value_bytes(&self) -> usize {
        match self {
            StorageBackend::InMemory(store) => store.max_value_bytes(),
            StorageBackend::Persistent(store) => store.max_value_bytes(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn batch_validation_reports_offending_key() {
        let mut batch = WriteBatch::new();
        batch.put("small", "ok");
        batch.put("big", "x".repeat(11));
        batch.delete("gone");

        let result = batch.validate(10);
        match result {
            Err(LexiError::ValueTooLarge { key, size, limit }) => {
                assert_eq!(key, "big");
                assert_eq!(size, 11);
                assert_eq!(limit, 10);
            }
            other => panic!("expected ValueTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn batch_extend_preserves_order() {
        let mut first = WriteBatch::new();
        first.put("a", "1");
        let mut second = WriteBatch::new();
        second.delete("a");

        first.extend(second);

        assert_eq!(first.len(), 2);
        assert!(matches!(first.ops()[1], WriteOp::Delete { .. }));
    }

    #[test]
    fn default_backend_is_in_memory() {
        let backend = StorageBackend::default();
        assert!(matches!(backend, StorageBackend::InMemory(_)));
        assert!(backend.is_empty().expect("len"));
    }
}
