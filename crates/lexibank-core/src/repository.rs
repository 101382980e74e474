//! # Repository
//!
//! Bank, word, review and course operations over a [`StorageBackend`].
//!
//! ## Key Layout
//!
//! ```text
//! lexibank:meta                 -> Counters (id allocation)
//! lexibank:banks                -> chunked Vec<WordBank>
//! lexibank:bank:{id}:words      -> chunked Vec<Word>
//! lexibank:courses              -> chunked Vec<Course>
//! ```
//!
//! Every mutation builds one [`WriteBatch`] holding the chunk writes of each
//! collection it touches plus the counters, so a persistent backend commits
//! it atomically.
//!
//! ## Storage Backends
//!
//! - `InMemory`: a [`MemoryStore`] (fast, volatile unless explicitly snapshotted)
//! - `Persistent`: a [`RedbStore`] for disk-backed ACID storage

use crate::chunking::{
    ChunkHeader, load_chunked, plan_chunked_removal, plan_chunked_write, read_header,
    validate_chunk_size,
};
use crate::course::{Course, CoursePlan, NewCourse};
use crate::formats::{BankSnapshot, Snapshot};
use crate::import::WordImporter;
use crate::primitives::{DEFAULT_CHUNK_SIZE, KEY_NAMESPACE, MAX_NAME_LENGTH};
use crate::review::{DueWord, ReviewGrid, StageFilter, due_words};
use crate::storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend, WriteBatch};
use crate::system::{
    Recall, StageChange, StageDistribution, StageMachine, StageProgress, TransitionPolicy,
};
use crate::types::normalize_key;
use crate::{BankId, CourseId, Day, LexiError, NewWord, Word, WordBank, WordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// =============================================================================
// KEYS
// =============================================================================

fn meta_key() -> String {
    format!("{}:meta", KEY_NAMESPACE)
}

fn banks_key() -> String {
    format!("{}:banks", KEY_NAMESPACE)
}

fn courses_key() -> String {
    format!("{}:courses", KEY_NAMESPACE)
}

fn words_key(bank: BankId) -> String {
    format!("{}:bank:{}:words", KEY_NAMESPACE, bank.0)
}

// =============================================================================
// ERROR LOGGING HELPERS
// =============================================================================

/// Log a read error and fall back to a default value.
///
/// Used only where a partial answer beats no answer (overviews); every
/// other read propagates the error.
#[inline]
fn log_and_default<T: Default>(result: Result<T, LexiError>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(context, error = %e, "storage read failed, using empty default");
            T::default()
        }
    }
}

// =============================================================================
// COUNTERS
// =============================================================================

/// Next identifiers to hand out. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_bank_id: u64,
    pub next_word_id: u64,
    pub next_course_id: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_bank_id: 1,
            next_word_id: 1,
            next_course_id: 1,
        }
    }
}

impl Counters {
    fn take_bank_id(&mut self) -> BankId {
        let id = BankId(self.next_bank_id);
        self.next_bank_id = self.next_bank_id.saturating_add(1);
        id
    }

    fn take_word_id(&mut self) -> WordId {
        let id = WordId(self.next_word_id);
        self.next_word_id = self.next_word_id.saturating_add(1);
        id
    }

    fn take_course_id(&mut self) -> CourseId {
        let id = CourseId(self.next_course_id);
        self.next_course_id = self.next_course_id.saturating_add(1);
        id
    }

    /// Raise every counter above the ids present in `snapshot`.
    fn covering(mut self, snapshot: &Snapshot) -> Self {
        for entry in &snapshot.banks {
            self.next_bank_id = self.next_bank_id.max(entry.bank.id.0.saturating_add(1));
            for word in &entry.words {
                self.next_word_id = self.next_word_id.max(word.id.0.saturating_add(1));
            }
        }
        for course in &snapshot.courses {
            self.next_course_id = self.next_course_id.max(course.id.0.saturating_add(1));
        }
        self
    }
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Result of adding words to a bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub added: Vec<WordId>,
    /// Terms skipped because the bank (or the same input) already had them.
    pub duplicates: Vec<String>,
}

/// Result of recording a batch of recalls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub changes: Vec<StageChange>,
    /// Per-stage counts after the batch was applied.
    pub distribution: StageDistribution,
}

/// Summary line for one bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankOverview {
    pub bank: WordBank,
    pub word_count: usize,
    pub distribution: StageDistribution,
}

/// Chunk layout of one stored collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub key: String,
    pub header: Option<ChunkHeader>,
}

/// Physical storage summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageReport {
    pub persistent: bool,
    pub key_count: usize,
    pub value_limit: usize,
    pub chunk_size: usize,
    pub collections: Vec<CollectionReport>,
}

// =============================================================================
// REPOSITORY
// =============================================================================

/// High-level access to banks, words, reviews and courses.
#[derive(Debug)]
pub struct Repository {
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
    /// Items per chunk for every collection written.
    chunk_size: usize,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an empty repository with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Create a repository over an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Open or create a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, LexiError> {
        Ok(Self::with_redb_store(RedbStore::open(path)?))
    }

    /// Create a repository over an existing redb store.
    #[must_use]
    pub fn with_redb_store(store: RedbStore) -> Self {
        Self {
            backend: StorageBackend::Persistent(store),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create an in-memory repository holding `snapshot`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, LexiError> {
        let mut repo = Self::new();
        repo.restore(snapshot)?;
        Ok(repo)
    }

    /// Use `chunk_size` items per chunk for subsequent writes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, LexiError> {
        validate_chunk_size(chunk_size)?;
        self.chunk_size = chunk_size;
        Ok(self)
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    // =========================================================================
    // COUNTERS
    // =========================================================================

    /// Current id counters.
    pub fn counters(&self) -> Result<Counters, LexiError> {
        match self.backend.get(&meta_key())? {
            None => Ok(Counters::default()),
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| LexiError::SerializationError(format!("counters: {}", e))),
        }
    }

    fn put_counters(batch: &mut WriteBatch, counters: &Counters) -> Result<(), LexiError> {
        let json = serde_json::to_string(counters)
            .map_err(|e| LexiError::SerializationError(e.to_string()))?;
        batch.put(meta_key(), json);
        Ok(())
    }

    fn plan<T: Serialize>(&self, base: &str, items: &[T]) -> Result<WriteBatch, LexiError> {
        Ok(plan_chunked_write(&self.backend, base, items, self.chunk_size)?.batch)
    }

    // =========================================================================
    // BANKS
    // =========================================================================

    /// All banks, in creation order.
    pub fn banks(&self) -> Result<Vec<WordBank>, LexiError> {
        load_chunked(&self.backend, &banks_key())
    }

    /// A single bank.
    pub fn bank(&self, id: BankId) -> Result<WordBank, LexiError> {
        self.banks()?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or(LexiError::BankNotFound(id))
    }

    /// Create a bank. Names are unique, compared case-insensitively.
    pub fn create_bank(&mut self, name: &str, today: Day) -> Result<WordBank, LexiError> {
        let name = validate_name(name)?;
        let mut banks = self.banks()?;
        ensure_unique_bank_name(&banks, &name, None)?;

        let mut counters = self.counters()?;
        let bank = WordBank::new(counters.take_bank_id(), name, today);
        banks.push(bank.clone());

        let mut batch = self.plan(&banks_key(), &banks)?;
        batch.extend(self.plan::<Word>(&words_key(bank.id), &[])?);
        Self::put_counters(&mut batch, &counters)?;
        self.backend.apply(batch)?;

        tracing::info!(bank = bank.id.0, name = %bank.name, "created bank");
        Ok(bank)
    }

    /// Rename a bank.
    pub fn rename_bank(&mut self, id: BankId, name: &str) -> Result<WordBank, LexiError> {
        let name = validate_name(name)?;
        let mut banks = self.banks()?;
        ensure_unique_bank_name(&banks, &name, Some(id))?;

        let bank = banks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(LexiError::BankNotFound(id))?;
        bank.name = name;
        let renamed = bank.clone();

        let batch = self.plan(&banks_key(), &banks)?;
        self.backend.apply(batch)?;
        Ok(renamed)
    }

    /// Delete a bank together with its words and any courses over it.
    pub fn delete_bank(&mut self, id: BankId) -> Result<(), LexiError> {
        let mut banks = self.banks()?;
        let before = banks.len();
        banks.retain(|b| b.id != id);
        if banks.len() == before {
            return Err(LexiError::BankNotFound(id));
        }

        let mut courses = self.courses()?;
        let courses_before = courses.len();
        courses.retain(|c| c.bank != id);

        let mut batch = self.plan(&banks_key(), &banks)?;
        batch.extend(plan_chunked_removal(&self.backend, &words_key(id))?);
        if courses.len() != courses_before {
            batch.extend(self.plan(&courses_key(), &courses)?);
        }
        self.backend.apply(batch)?;

        tracing::info!(
            bank = id.0,
            courses_removed = courses_before - courses.len(),
            "deleted bank"
        );
        Ok(())
    }

    /// Number of words in a bank, read from the chunk header.
    pub fn word_count(&self, bank: BankId) -> Result<usize, LexiError> {
        self.bank(bank)?;
        match read_header(&self.backend, &words_key(bank))? {
            Some(header) => Ok(header.total_count),
            None => Ok(self.load_words(bank)?.len()),
        }
    }

    // =========================================================================
    // WORDS
    // =========================================================================

    fn load_words(&self, bank: BankId) -> Result<Vec<Word>, LexiError> {
        load_chunked(&self.backend, &words_key(bank))
    }

    fn store_words(
        &mut self,
        bank: BankId,
        words: &[Word],
        counters: Option<&Counters>,
    ) -> Result<(), LexiError> {
        let mut batch = self.plan(&words_key(bank), words)?;
        if let Some(counters) = counters {
            Self::put_counters(&mut batch, counters)?;
        }
        self.backend.apply(batch)
    }

    /// All words of a bank, in insertion order.
    pub fn words(&self, bank: BankId) -> Result<Vec<Word>, LexiError> {
        self.bank(bank)?;
        self.load_words(bank)
    }

    /// A single word.
    pub fn word(&self, bank: BankId, id: WordId) -> Result<Word, LexiError> {
        self.words(bank)?
            .into_iter()
            .find(|w| w.id == id)
            .ok_or(LexiError::WordNotFound(id))
    }

    /// Add words to a bank, skipping terms it already holds.
    pub fn add_words(&mut self, bank: BankId, new: &[NewWord]) -> Result<AddOutcome, LexiError> {
        let validated = WordImporter::validate_all(new)?;
        let mut words = self.words(bank)?;
        let mut known: BTreeSet<String> = words.iter().map(Word::term_key).collect();
        let mut counters = self.counters()?;
        let mut outcome = AddOutcome::default();

        for input in validated {
            if !known.insert(normalize_key(&input.term)) {
                outcome.duplicates.push(input.term);
                continue;
            }
            let word = Word::new(counters.take_word_id(), input.term, input.meaning);
            outcome.added.push(word.id);
            words.push(word);
        }

        if !outcome.added.is_empty() {
            self.store_words(bank, &words, Some(&counters))?;
        }

        tracing::info!(
            bank = bank.0,
            added = outcome.added.len(),
            duplicates = outcome.duplicates.len(),
            "added words"
        );
        Ok(outcome)
    }

    /// Change a word's term and/or meaning. Review state is kept.
    pub fn update_word(
        &mut self,
        bank: BankId,
        id: WordId,
        term: Option<&str>,
        meaning: Option<&str>,
    ) -> Result<Word, LexiError> {
        let mut words = self.words(bank)?;
        let position = words
            .iter()
            .position(|w| w.id == id)
            .ok_or(LexiError::WordNotFound(id))?;

        let current = &words[position];
        let edited = WordImporter::validate(&NewWord::new(
            term.unwrap_or(current.term.as_str()),
            meaning.unwrap_or(current.meaning.as_str()),
        ))?;

        let key = normalize_key(&edited.term);
        if words.iter().any(|w| w.id != id && w.term_key() == key) {
            return Err(LexiError::InvalidWord(format!(
                "term '{}' already exists in bank {}",
                edited.term, bank
            )));
        }

        let word = &mut words[position];
        word.term = edited.term;
        word.meaning = edited.meaning;
        let updated = word.clone();

        self.store_words(bank, &words, None)?;
        Ok(updated)
    }

    /// Remove words by id. Unknown ids are ignored; returns how many were removed.
    pub fn remove_words(&mut self, bank: BankId, ids: &[WordId]) -> Result<usize, LexiError> {
        let targets: BTreeSet<WordId> = ids.iter().copied().collect();
        let mut words = self.words(bank)?;
        let before = words.len();
        words.retain(|w| !targets.contains(&w.id));
        let removed = before - words.len();

        if removed > 0 {
            self.store_words(bank, &words, None)?;
        }
        Ok(removed)
    }

    /// Send every word of a bank back to stage 1.
    ///
    /// Returns the number of words that had any review state.
    pub fn reset_progress(&mut self, bank: BankId) -> Result<usize, LexiError> {
        let mut words = self.words(bank)?;
        let mut changed = 0usize;
        for word in &mut words {
            let fresh = Word::new(word.id, word.term.clone(), word.meaning.clone());
            if *word != fresh {
                word.reset_progress();
                changed += 1;
            }
        }

        if changed > 0 {
            self.store_words(bank, &words, None)?;
        }
        tracing::info!(bank = bank.0, changed, "reset review progress");
        Ok(changed)
    }

    // =========================================================================
    // REVIEW
    // =========================================================================

    /// Record recall outcomes and return the resulting transitions.
    ///
    /// Every id is checked before anything is applied. A word listed more
    /// than once receives each outcome in order.
    pub fn record_recalls(
        &mut self,
        bank: BankId,
        results: &[(WordId, Recall)],
        policy: TransitionPolicy,
        today: Day,
    ) -> Result<ReviewOutcome, LexiError> {
        let mut words = self.words(bank)?;
        let index: BTreeMap<WordId, usize> =
            words.iter().enumerate().map(|(i, w)| (w.id, i)).collect();

        let mut positions = Vec::with_capacity(results.len());
        for (id, _) in results {
            positions.push(*index.get(id).ok_or(LexiError::WordNotFound(*id))?);
        }

        let machine = StageMachine::new(policy);
        let changes: Vec<StageChange> = positions
            .iter()
            .zip(results)
            .map(|(&pos, (_, recall))| machine.apply(&mut words[pos], *recall, today))
            .collect();

        if !changes.is_empty() {
            self.store_words(bank, &words, None)?;
        }

        let distribution = StageDistribution::from_words(&words);
        tracing::debug!(
            bank = bank.0,
            recorded = changes.len(),
            mastered = distribution.mastered(),
            "recorded recalls"
        );
        Ok(ReviewOutcome {
            changes,
            distribution,
        })
    }

    /// Per-stage word counts of a bank.
    pub fn stage_distribution(&self, bank: BankId) -> Result<StageDistribution, LexiError> {
        Ok(StageDistribution::from_words(&self.words(bank)?))
    }

    /// Progress summary of a bank.
    pub fn stage_progress(&self, bank: BankId) -> Result<StageProgress, LexiError> {
        Ok(StageProgress::from_distribution(
            self.stage_distribution(bank)?,
        ))
    }

    /// Grid review layout of a bank.
    pub fn review_grid(
        &self,
        bank: BankId,
        filter: StageFilter,
        columns: usize,
    ) -> Result<ReviewGrid, LexiError> {
        ReviewGrid::build(&self.words(bank)?, filter, columns)
    }

    /// Words of a bank due for anti-forgetting review on `today`.
    pub fn due_words(&self, bank: BankId, today: Day) -> Result<Vec<DueWord>, LexiError> {
        Ok(due_words(&self.words(bank)?, today))
    }

    // =========================================================================
    // COURSES
    // =========================================================================

    /// All courses, in creation order.
    pub fn courses(&self) -> Result<Vec<Course>, LexiError> {
        load_chunked(&self.backend, &courses_key())
    }

    /// A single course.
    pub fn course(&self, id: CourseId) -> Result<Course, LexiError> {
        self.courses()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(LexiError::CourseNotFound(id))
    }

    /// Create a course over an existing bank.
    pub fn create_course(&mut self, input: &NewCourse) -> Result<Course, LexiError> {
        let input = input.validated()?;
        self.bank(input.bank)?;

        let mut courses = self.courses()?;
        let mut counters = self.counters()?;
        let course = Course {
            id: counters.take_course_id(),
            name: input.name,
            bank: input.bank,
            daily_new: input.daily_new,
            start: input.start,
        };
        courses.push(course.clone());

        let mut batch = self.plan(&courses_key(), &courses)?;
        Self::put_counters(&mut batch, &counters)?;
        self.backend.apply(batch)?;

        tracing::info!(course = course.id.0, bank = course.bank.0, "created course");
        Ok(course)
    }

    /// Delete a course.
    pub fn delete_course(&mut self, id: CourseId) -> Result<(), LexiError> {
        let mut courses = self.courses()?;
        let before = courses.len();
        courses.retain(|c| c.id != id);
        if courses.len() == before {
            return Err(LexiError::CourseNotFound(id));
        }
        let batch = self.plan(&courses_key(), &courses)?;
        self.backend.apply(batch)
    }

    /// Day-by-day schedule of a course over its bank's current words.
    pub fn course_plan(&self, id: CourseId) -> Result<CoursePlan, LexiError> {
        let course = self.course(id)?;
        let ids: Vec<WordId> = self.words(course.bank)?.iter().map(|w| w.id).collect();
        CoursePlan::build(&course, &ids)
    }

    // =========================================================================
    // OVERVIEW & SNAPSHOTS
    // =========================================================================

    /// One summary per bank.
    ///
    /// A bank whose words cannot be read is reported empty (and logged)
    /// rather than failing the whole overview.
    pub fn bank_overview(&self) -> Result<Vec<BankOverview>, LexiError> {
        let banks = self.banks()?;
        Ok(banks
            .into_iter()
            .map(|bank| {
                let words = log_and_default(self.load_words(bank.id), "bank_overview");
                BankOverview {
                    word_count: words.len(),
                    distribution: StageDistribution::from_words(&words),
                    bank,
                }
            })
            .collect())
    }

    /// Capture everything stored.
    pub fn snapshot(&self) -> Result<Snapshot, LexiError> {
        let banks = self
            .banks()?
            .into_iter()
            .map(|bank| {
                let words = self.load_words(bank.id)?;
                Ok(BankSnapshot { bank, words })
            })
            .collect::<Result<Vec<_>, LexiError>>()?;

        Ok(Snapshot {
            counters: self.counters()?,
            banks,
            courses: self.courses()?,
        })
    }

    /// Replace everything stored with `snapshot`, in one batch.
    ///
    /// An inconsistent snapshot is rejected before anything is written.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), LexiError> {
        snapshot.validate()?;
        let mut batch = WriteBatch::new();
        for key in self
            .backend
            .keys_with_prefix(&format!("{}:", KEY_NAMESPACE))?
        {
            batch.delete(key);
        }

        let banks: Vec<WordBank> = snapshot.banks.iter().map(|b| b.bank.clone()).collect();
        batch.extend(self.plan(&banks_key(), &banks)?);
        for entry in &snapshot.banks {
            batch.extend(self.plan(&words_key(entry.bank.id), &entry.words)?);
        }
        batch.extend(self.plan(&courses_key(), &snapshot.courses)?);
        Self::put_counters(&mut batch, &snapshot.counters.covering(snapshot))?;

        self.backend.apply(batch)?;
        tracing::info!(
            banks = snapshot.banks.len(),
            words = snapshot.word_count(),
            courses = snapshot.courses.len(),
            "restored snapshot"
        );
        Ok(())
    }

    /// Physical layout of every collection.
    pub fn storage_report(&self) -> Result<StorageReport, LexiError> {
        let mut keys = vec![banks_key(), courses_key()];
        keys.extend(self.banks()?.iter().map(|b| words_key(b.id)));

        let collections = keys
            .into_iter()
            .map(|key| {
                let header = read_header(&self.backend, &key)?;
                Ok(CollectionReport { key, header })
            })
            .collect::<Result<Vec<_>, LexiError>>()?;

        Ok(StorageReport {
            persistent: self.is_persistent(),
            key_count: self.backend.len()?,
            value_limit: self.backend.max_value_bytes(),
            chunk_size: self.chunk_size,
            collections,
        })
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validate_name(name: &str) -> Result<String, LexiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LexiError::InvalidName("name is empty".to_string()));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(LexiError::InvalidName(format!(
            "name length {} exceeds maximum {} bytes",
            trimmed.len(),
            MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

fn ensure_unique_bank_name(
    banks: &[WordBank],
    name: &str,
    except: Option<BankId>,
) -> Result<(), LexiError> {
    let key = normalize_key(name);
    let clash = banks
        .iter()
        .any(|b| Some(b.id) != except && normalize_key(&b.name) == key);
    if clash {
        return Err(LexiError::DuplicateBank(name.to_string()));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
