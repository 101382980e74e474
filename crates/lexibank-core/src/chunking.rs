//! # Chunked Collections
//!
//! Splits a JSON-serializable list across several keys so no single value
//! exceeds the store's per-key limit. The configured chunk size is an upper
//! bound; collections of large items are written with fewer per chunk.
//!
//! ## Layout
//!
//! ```text
//! {base}:header    -> {"chunk_count":3,"total_count":450,"chunk_size":200}
//! {base}:chunk:0   -> [item 0 .. item 199]
//! {base}:chunk:1   -> [item 200 .. item 399]
//! {base}:chunk:2   -> [item 400 .. item 449]
//! ```
//!
//! A bare array stored directly under `{base}` (written before chunking
//! existed) is still readable; the next save replaces it with the chunked
//! layout.
//!
//! ## Integrity
//!
//! Reads verify that every chunk named by the header is present and that
//! the concatenated length equals `total_count`. Nothing is repaired
//! silently: inconsistencies surface as [`LexiError::CorruptedChunk`].

use crate::LexiError;
use crate::primitives::MAX_CHUNK_SIZE;
use crate::storage::{KeyValueStore, WriteBatch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// =============================================================================
// KEYS
// =============================================================================

/// Key of the header record for `base`.
#[must_use]
pub fn header_key(base: &str) -> String {
    format!("{}:header", base)
}

/// Key of chunk `index` for `base`.
#[must_use]
pub fn chunk_key(base: &str, index: usize) -> String {
    format!("{}:chunk:{}", base, index)
}

fn chunk_prefix(base: &str) -> String {
    format!("{}:chunk:", base)
}

/// Parse the index out of a chunk key, if it is one of `base`'s chunks.
fn chunk_index(base: &str, key: &str) -> Option<usize> {
    key.strip_prefix(&chunk_prefix(base))?.parse().ok()
}

// =============================================================================
// HEADER
// =============================================================================

/// Record stored alongside the chunks of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkHeader {
    pub chunk_count: usize,
    pub total_count: usize,
    pub chunk_size: usize,
}

/// A planned write of a chunked collection.
#[derive(Debug, Clone)]
pub struct ChunkWrite {
    pub batch: WriteBatch,
    pub header: ChunkHeader,
}

// =============================================================================
// PARTITION
// =============================================================================

/// Check that a chunk size is usable.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), LexiError> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(LexiError::InvalidChunkSize(chunk_size));
    }
    Ok(())
}

/// Split `items` into consecutive slices of `chunk_size`.
///
/// Every slice but the last is exactly `chunk_size` long; an empty input
/// yields no slices.
pub fn partition<T>(items: &[T], chunk_size: usize) -> Result<Vec<&[T]>, LexiError> {
    validate_chunk_size(chunk_size)?;
    Ok(items.chunks(chunk_size).collect())
}

// =============================================================================
// WRITE
// =============================================================================

/// Encoded length of a JSON array holding `lengths`-sized elements.
fn array_len(lengths: &[usize]) -> usize {
    lengths.iter().sum::<usize>() + lengths.len().saturating_sub(1) + 2
}

/// A size not above `chunk_size` whose chunks all fit in `limit`.
///
/// Halves until every chunk fits or the size reaches one. A single item
/// larger than `limit` is left for the store to reject.
fn fit_chunk_size(lengths: &[usize], chunk_size: usize, limit: usize) -> usize {
    let mut size = chunk_size;
    while size > 1 && lengths.chunks(size).any(|chunk| array_len(chunk) > limit) {
        size /= 2;
    }
    size
}

/// Build the writes that store `items` under `base`.
///
/// Chunks hold at most `chunk_size` items. When that many would overflow
/// the store's value limit the collection is written with a smaller size,
/// recorded in the header.
///
/// Includes deletes for chunks beyond the new count left behind by an
/// earlier, longer save, and for a legacy unchunked value.
pub fn plan_chunked_write<S, T>(
    store: &S,
    base: &str,
    items: &[T],
    chunk_size: usize,
) -> Result<ChunkWrite, LexiError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    validate_chunk_size(chunk_size)?;
    let encoded = items
        .iter()
        .map(|item| {
            serde_json::to_string(item).map_err(|e| LexiError::SerializationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let lengths: Vec<usize> = encoded.iter().map(String::len).collect();
    let effective = fit_chunk_size(&lengths, chunk_size, store.max_value_bytes());
    if effective < chunk_size {
        tracing::debug!(base, chunk_size, effective, "shrunk chunk size to fit value limit");
    }

    let slices = partition(&encoded, effective)?;
    let header = ChunkHeader {
        chunk_count: slices.len(),
        total_count: items.len(),
        chunk_size: effective,
    };

    let mut batch = WriteBatch::new();
    for (index, slice) in slices.iter().enumerate() {
        batch.put(chunk_key(base, index), format!("[{}]", slice.join(",")));
    }

    for stale in store.keys_with_prefix(&chunk_prefix(base))? {
        match chunk_index(base, &stale) {
            Some(index) if index < header.chunk_count => {}
            _ => batch.delete(stale),
        }
    }
    if store.get(base)?.is_some() {
        batch.delete(base);
    }

    let header_json = serde_json::to_string(&header)
        .map_err(|e| LexiError::SerializationError(e.to_string()))?;
    batch.put(header_key(base), header_json);

    Ok(ChunkWrite { batch, header })
}

/// Store `items` under `base` in one batch.
pub fn save_chunked<S, T>(
    store: &mut S,
    base: &str,
    items: &[T],
    chunk_size: usize,
) -> Result<ChunkHeader, LexiError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let ChunkWrite { batch, header } = plan_chunked_write(store, base, items, chunk_size)?;
    store.apply(batch)?;
    tracing::debug!(
        base,
        chunks = header.chunk_count,
        items = header.total_count,
        "saved chunked collection"
    );
    Ok(header)
}

// =============================================================================
// READ
// =============================================================================

/// Read the header for `base` without loading any items.
pub fn read_header<S>(store: &S, base: &str) -> Result<Option<ChunkHeader>, LexiError>
where
    S: KeyValueStore + ?Sized,
{
    let key = header_key(base);
    match store.get(&key)? {
        None => Ok(None),
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| LexiError::CorruptedChunk {
                key,
                reason: format!("unreadable header: {}", e),
            }),
    }
}

/// Load the collection stored under `base`.
///
/// A missing collection is empty. A collection without a header but with
/// a bare array under `base` is read as that array.
pub fn load_chunked<S, T>(store: &S, base: &str) -> Result<Vec<T>, LexiError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(header) = read_header(store, base)? else {
        return match store.get(base)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                LexiError::SerializationError(format!("legacy value '{}': {}", base, e))
            }),
        };
    };

    let mut items = Vec::with_capacity(header.total_count.min(MAX_CHUNK_SIZE));
    for index in 0..header.chunk_count {
        let key = chunk_key(base, index);
        let json = store.get(&key)?.ok_or_else(|| LexiError::CorruptedChunk {
            key: key.clone(),
            reason: format!("missing chunk {} of {}", index, header.chunk_count),
        })?;
        let chunk: Vec<T> = serde_json::from_str(&json)
            .map_err(|e| LexiError::SerializationError(format!("chunk '{}': {}", key, e)))?;
        items.extend(chunk);
    }

    if items.len() != header.total_count {
        return Err(LexiError::CorruptedChunk {
            key: header_key(base),
            reason: format!(
                "header says {} items, chunks hold {}",
                header.total_count,
                items.len()
            ),
        });
    }

    Ok(items)
}

// =============================================================================
// DELETE
// =============================================================================

/// Build the deletes that remove everything stored under `base`.
pub fn plan_chunked_removal<S>(store: &S, base: &str) -> Result<WriteBatch, LexiError>
where
    S: KeyValueStore + ?Sized,
{
    let mut batch = WriteBatch::new();
    for key in store.keys_with_prefix(&chunk_prefix(base))? {
        batch.delete(key);
    }
    let header = header_key(base);
    if store.get(&header)?.is_some() {
        batch.delete(header);
    }
    if store.get(base)?.is_some() {
        batch.delete(base);
    }
    Ok(batch)
}

/// Remove the header, all chunks and any legacy value for `base`.
///
/// Returns the number of keys removed.
pub fn remove_chunked<S>(store: &mut S, base: &str) -> Result<usize, LexiError>
where
    S: KeyValueStore + ?Sized,
{
    let batch = plan_chunked_removal(store, base)?;
    let removed = batch.len();
    store.apply(batch)?;
    Ok(removed)
}

// =============================================================================
// TESTS
// =============================================================================
