//! # Snapshot Format
//!
//! Binary serialization of an entire repository: counters, banks with their
//! words, and courses.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot.
//! - 4 bytes: Magic ("LXBK")
//! - 1 byte: Version
//!
//! ## Validation
//!
//! Size limits and the header are checked before the payload is decoded,
//! so corrupted or hostile files fail fast without large allocations.

use crate::course::Course;
use crate::primitives;
use crate::repository::Counters;
use crate::types::normalize_key;
use crate::{LexiError, Word, WordBank};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted snapshot size.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

/// Minimum valid snapshot size (header only).
const HEADER_SIZE: usize = 5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A bank together with all of its words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub bank: WordBank,
    pub words: Vec<Word>,
}

/// Everything a repository stores, in id order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub counters: Counters,
    pub banks: Vec<BankSnapshot>,
    pub courses: Vec<Course>,
}

impl Snapshot {
    /// Total number of words across all banks.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.banks.iter().map(|b| b.words.len()).sum()
    }

    /// Check the invariants a repository keeps on its own writes.
    ///
    /// Bank ids, course ids and word ids are unique. Bank names are valid
    /// and unique ignoring case, terms are unique per bank ignoring case,
    /// and every course refers to a bank in the snapshot.
    pub fn validate(&self) -> Result<(), LexiError> {
        let mut bank_ids = BTreeSet::new();
        let mut bank_names = BTreeSet::new();
        let mut word_ids = BTreeSet::new();

        for entry in &self.banks {
            let bank = &entry.bank;
            if !bank_ids.insert(bank.id) {
                return Err(invalid(format!("duplicate bank id {}", bank.id)));
            }
            let name = bank.name.trim();
            if name.is_empty() || name.len() > primitives::MAX_NAME_LENGTH {
                return Err(invalid(format!("bank {} has an invalid name", bank.id)));
            }
            if !bank_names.insert(normalize_key(name)) {
                return Err(invalid(format!("duplicate bank name '{}'", name)));
            }

            let mut terms = BTreeSet::new();
            for word in &entry.words {
                if !word_ids.insert(word.id) {
                    return Err(invalid(format!("duplicate word id {}", word.id)));
                }
                if !terms.insert(normalize_key(&word.term)) {
                    return Err(invalid(format!(
                        "duplicate term '{}' in bank {}",
                        word.term, bank.id
                    )));
                }
            }
        }

        let mut course_ids = BTreeSet::new();
        for course in &self.courses {
            if !course_ids.insert(course.id) {
                return Err(invalid(format!("duplicate course id {}", course.id)));
            }
            if !bank_ids.contains(&course.bank) {
                return Err(invalid(format!(
                    "course {} refers to missing bank {}",
                    course.id, course.bank
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> LexiError {
    LexiError::InvalidConfig(format!("snapshot: {}", reason))
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), LexiError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LexiError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LexiError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LexiError> {
        if bytes.len() < HEADER_SIZE {
            return Err(LexiError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, LexiError> {
    let header = PersistenceHeader::new();
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| LexiError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
///
/// Checks, in order: minimum size, maximum size, header magic and version.
/// Only then is the payload decoded.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, LexiError> {
    if bytes.len() < HEADER_SIZE {
        return Err(LexiError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }

    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(LexiError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        LexiError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })
}

/// BLAKE3 hash of the serialized snapshot, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
pub fn snapshot_checksum(snapshot: &Snapshot) -> Result<String, LexiError> {
    let bytes = snapshot_to_bytes(snapshot)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BankId, CourseId, Day, Stage, WordId};

    fn sample() -> Snapshot {
        let mut word = Word::new(WordId(1), "river", "a stream");
        word.stage = Stage::new(4).expect("stage");
        word.last_reviewed = Some(Day(20_000));
        Snapshot {
            counters: Counters {
                next_bank_id: 2,
                next_word_id: 2,
                next_course_id: 1,
            },
            banks: vec![BankSnapshot {
                bank: WordBank::new(BankId(1), "Nature", Day(19_990)),
                words: vec![word],
            }],
            courses: Vec::new(),
        }
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let restored = PersistenceHeader::from_bytes(&header.to_bytes()).expect("parse header");
        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let bytes1 = snapshot_to_bytes(&sample()).expect("first serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");

        assert_eq!(restored, sample());
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = snapshot_to_bytes(&Snapshot::default()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        let err = snapshot_from_bytes(&bytes).expect_err("should fail");
        assert!(err.to_string().contains("Unsupported version"));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = snapshot_to_bytes(&sample()).expect("serialize");
        assert!(snapshot_from_bytes(&bytes[..bytes.len() - 3]).is_err());
        assert!(snapshot_from_bytes(&bytes[..3]).is_err());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn checksum_is_stable_hex() {
        let a = snapshot_checksum(&sample()).expect("hash");
        let b = snapshot_checksum(&sample()).expect("hash");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn validate_accepts_consistent_snapshot() {
        assert!(sample().validate().is_ok());
        assert!(Snapshot::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangling_course_and_repeated_terms() {
        let mut dangling = sample();
        dangling.courses.push(Course {
            id: CourseId(1),
            name: "Lost".to_string(),
            bank: BankId(7),
            daily_new: 5,
            start: Day(0),
        });
        let err = dangling.validate().expect_err("missing bank");
        assert!(err.to_string().contains("missing bank 7"));

        let mut repeated = sample();
        repeated.banks[0]
            .words
            .push(Word::new(WordId(2), "River", "again"));
        assert!(matches!(
            repeated.validate(),
            Err(LexiError::InvalidConfig(_))
        ));
    }
}
