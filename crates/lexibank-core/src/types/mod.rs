//! # Core Type Definitions
//!
//! This module contains all core types for Lexibank:
//! - Identifiers (`BankId`, `WordId`, `CourseId`) and the `Day` index
//! - Vocabulary records (`Word`, `NewWord`, `WordBank`)
//! - Error types (`LexiError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for counters to prevent overflow

use crate::system::Stage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a word bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BankId(pub u64);

/// Unique identifier for a word. Word ids are global, not per bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordId(pub u64);

/// Unique identifier for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourseId(pub u64);

impl std::fmt::Display for BankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for WordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DAY INDEX
// =============================================================================

/// A calendar day, counted in whole days since the Unix epoch.
///
/// The core never reads the clock. Callers pass the current day in,
/// which keeps every schedule computation reproducible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Day(pub u32);

impl Day {
    /// Create a day from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The day `days` after this one (saturating).
    #[must_use]
    pub const fn plus(self, days: u32) -> Self {
        Self(self.0.saturating_add(days))
    }

    /// Whole days from `earlier` to `self`, zero if `earlier` is later.
    #[must_use]
    pub const fn since(self, earlier: Day) -> u32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Get the raw day index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {}", self.0)
    }
}

// =============================================================================
// WORDS
// =============================================================================

/// A vocabulary entry together with its review state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub term: String,
    pub meaning: String,
    pub stage: Stage,
    /// Day of the most recent recorded recall, `None` until first reviewed.
    #[serde(default)]
    pub last_reviewed: Option<Day>,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub miss_count: u32,
}

impl Word {
    /// Create a fresh word at stage 1.
    #[must_use]
    pub fn new(id: WordId, term: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            id,
            term: term.into(),
            meaning: meaning.into(),
            stage: Stage::NEW,
            last_reviewed: None,
            correct_count: 0,
            miss_count: 0,
        }
    }

    /// Clear all review state, returning the word to stage 1.
    pub fn reset_progress(&mut self) {
        self.stage = Stage::NEW;
        self.last_reviewed = None;
        self.correct_count = 0;
        self.miss_count = 0;
    }

    /// Normalized form of the term used for duplicate detection.
    #[must_use]
    pub fn term_key(&self) -> String {
        normalize_key(&self.term)
    }
}

/// Input shape for adding or importing a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWord {
    pub term: String,
    pub meaning: String,
}

impl NewWord {
    /// Create a new word input.
    #[must_use]
    pub fn new(term: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            meaning: meaning.into(),
        }
    }
}

/// Lowercased, trimmed key for case-insensitive uniqueness checks.
#[must_use]
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

// =============================================================================
// WORD BANK
// =============================================================================

/// A named collection of words grouped for study.
///
/// The words themselves live under their own chunked key; a bank record
/// only carries identity and naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBank {
    pub id: BankId,
    pub name: String,
    pub created: Day,
}

impl WordBank {
    /// Create a new bank record.
    #[must_use]
    pub fn new(id: BankId, name: impl Into<String>, created: Day) -> Self {
        Self {
            id,
            name: name.into(),
            created,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Lexibank.
///
/// - No silent failures
/// - Use `Result<T, LexiError>` for fallible operations
/// - The core should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum LexiError {
    /// A word failed validation (empty or oversized term/meaning).
    #[error("Invalid word: {0}")]
    InvalidWord(String),

    /// A bank or course name failed validation.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// A stage value outside 1..=9.
    #[error("Invalid stage: {0} (expected 1..=9)")]
    InvalidStage(u8),

    /// A chunk or grid size of zero or above the maximum.
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    /// The requested bank does not exist.
    #[error("Bank not found: {0}")]
    BankNotFound(BankId),

    /// The requested word does not exist in the bank.
    #[error("Word not found: {0}")]
    WordNotFound(WordId),

    /// The requested course does not exist.
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    /// A bank with the same name (case-insensitive) already exists.
    #[error("Bank already exists: {0}")]
    DuplicateBank(String),

    /// A value exceeds the store's per-key limit.
    #[error("Value for key '{key}' is {size} bytes, limit is {limit}")]
    ValueTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },

    /// A chunked collection is inconsistent with its header.
    #[error("Corrupted chunk '{key}': {reason}")]
    CorruptedChunk { key: String, reason: String },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage engine error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// TESTS
// =============================================================================
