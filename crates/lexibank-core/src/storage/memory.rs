//! In-memory key-value store.

use super::{KeyValueStore, WriteBatch, WriteOp, check_value_size};
use crate::LexiError;
use crate::primitives::MAX_VALUE_BYTES;
use std::collections::BTreeMap;

/// A `BTreeMap`-backed store. Iteration order is the key order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    value_limit: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with the default per-value limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_value_limit(MAX_VALUE_BYTES)
    }

    /// Create an empty store with a custom per-value limit.
    #[must_use]
    pub fn with_value_limit(value_limit: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            value_limit,
        }
    }

    /// Iterate all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LexiError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LexiError> {
        check_value_size(key, value, self.value_limit)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, LexiError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LexiError> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), LexiError> {
        batch.validate(self.value_limit)?;
        for op in batch.ops {
            match op {
                WriteOp::Put { key, value } => {
                    self.entries.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    self.entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, LexiError> {
        Ok(self.entries.len())
    }

    fn max_value_bytes(&self) -> usize {
        self.value_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        assert!(store.remove("k").expect("remove"));
        assert!(!store.remove("k").expect("remove"));
        assert!(store.get("k").expect("get").is_none());
    }

    #[test]
    fn oversized_value_rejected() {
        let mut store = MemoryStore::with_value_limit(4);
        assert!(matches!(
            store.set("k", "12345"),
            Err(LexiError::ValueTooLarge { .. })
        ));
        assert!(store.get("k").expect("get").is_none());
    }

    #[test]
    fn prefix_scan_is_sorted_and_bounded() {
        let mut store = MemoryStore::new();
        for key in ["b:2", "a:1", "b:1", "b", "c:1"] {
            store.set(key, "x").expect("set");
        }
        let keys = store.keys_with_prefix("b:").expect("scan");
        assert_eq!(keys, vec!["b:1".to_string(), "b:2".to_string()]);
    }

    #[test]
    fn rejected_batch_leaves_store_unchanged() {
        let mut store = MemoryStore::with_value_limit(3);
        store.set("keep", "old").expect("set");

        let mut batch = WriteBatch::new();
        batch.put("keep", "new");
        batch.delete("keep");
        batch.put("huge", "too long");

        assert!(store.apply(batch).is_err());
        assert_eq!(store.get("keep").expect("get").as_deref(), Some("old"));
        assert_eq!(store.len().expect("len"), 1);
    }
}
