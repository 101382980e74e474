//! # lexibank-core
//!
//! Vocabulary banks with a nine-stage review ladder, persisted through a
//! chunked key-value layout.
//!
//! ## Layers
//!
//! - `storage`: key-value stores (in-memory and redb) with atomic write batches
//! - `chunking`: large collections split into bounded chunks under a header key
//! - `system`: the stage ladder and its transition policies
//! - `review` / `course`: grid review, anti-forgetting review, course plans
//! - `repository`: bank, word, review and course operations over a store
//! - `formats`: binary snapshots of a whole repository
//!
//! ## Constraints
//!
//! - No async, no network, no clock access: callers pass the current [`Day`]
//! - Integer arithmetic only, `BTreeMap`/`BTreeSet` for deterministic order

// =============================================================================
// MODULES
// =============================================================================

pub mod chunking;
pub mod course;
pub mod formats;
pub mod import;
pub mod primitives;
pub mod repository;
pub mod review;
pub mod storage;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{BankId, CourseId, Day, LexiError, NewWord, Word, WordBank, WordId};

// =============================================================================
// RE-EXPORTS: Storage & Repository
// =============================================================================

pub use chunking::{ChunkHeader, load_chunked, remove_chunked, save_chunked};
pub use repository::{
    AddOutcome, BankOverview, CollectionReport, Counters, Repository, ReviewOutcome,
    StorageReport,
};
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend, WriteBatch};

// =============================================================================
// RE-EXPORTS: Review & Courses
// =============================================================================

pub use course::{Course, CourseDay, CoursePlan, NewCourse};
pub use import::WordImporter;
pub use review::{ANTI_FORGETTING_POLICY, DueWord, GridCell, ReviewGrid, StageFilter, due_words};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use formats::snapshot_checksum;
pub use formats::{BankSnapshot, PersistenceHeader, Snapshot, snapshot_from_bytes, snapshot_to_bytes};

// =============================================================================
// RE-EXPORTS: System
// =============================================================================

pub use system::{
    Recall, Stage, StageChange, StageDistribution, StageMachine, StageProgress, TransitionPolicy,
};
