//! # Primitives
//!
//! Hardcoded runtime constants for the Lexibank core.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Configuration may pick a chunk size, but never outside the bounds below.

/// Lowest stage in the review progression (a new word).
pub const MIN_STAGE: u8 = 1;

/// Highest stage in the review progression (a mastered word).
pub const MAX_STAGE: u8 = 9;

/// Number of distinct stages.
pub const STAGE_COUNT: usize = MAX_STAGE as usize;

// =============================================================================
// STORAGE LIMITS
// =============================================================================

/// Default upper bound on items written per chunk.
///
/// Writers shrink the effective size for a collection whose chunks would
/// otherwise exceed [`MAX_VALUE_BYTES`].
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 10_000;

/// Per-key value limit in bytes.
///
/// Mirrors the per-entry quota of browser storage. Collections that would
/// exceed it must be chunked.
pub const MAX_VALUE_BYTES: usize = 512 * 1024;

/// Namespace prefix for every key written by the repository.
pub const KEY_NAMESPACE: &str = "lexibank";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a word's term, in bytes.
pub const MAX_TERM_LENGTH: usize = 256;

/// Maximum length of a word's meaning, in bytes.
pub const MAX_MEANING_LENGTH: usize = 4096;

/// Maximum length of a bank or course name, in bytes.
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum number of words accepted by a single import.
pub const MAX_IMPORT_WORDS: usize = 10_000;

/// Upper bound on the JSON encoding of one valid word.
///
/// Escaping can grow a byte to six (`\u0000`); the remainder covers ids,
/// stage, counters and field names.
pub const MAX_ENCODED_WORD_BYTES: usize = 6 * (MAX_TERM_LENGTH + MAX_MEANING_LENGTH) + 256;

// A chunk holding a single word must always fit under the value limit.
const _: () = assert!(MAX_ENCODED_WORD_BYTES + 2 <= MAX_VALUE_BYTES);

// =============================================================================
// SCHEDULING
// =============================================================================

/// Days to wait after a review before a word is due again, indexed by
/// `stage - 1` for stages 1..=8. Stage 9 is mastered and never due.
pub const REVIEW_INTERVALS: [u32; 8] = [0, 1, 2, 4, 7, 15, 30, 60];

/// Days after a course study day on which that day's list is revisited.
pub const COURSE_REVIEW_OFFSETS: [u32; 5] = [1, 2, 4, 7, 15];

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"LXBK";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;
