//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use lexibank_core::{
    Course, CoursePlan, DueWord, LexiError, NewWord, Recall, ReviewGrid, Stage, StageChange,
    StageDistribution, StageFilter, StageProgress, TransitionPolicy, Word, WordBank, WordId,
    primitives::MAX_IMPORT_WORDS,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response from a read endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Repository status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub bank_count: usize,
    pub word_count: usize,
    pub mastered_count: usize,
    pub course_count: usize,
    pub persistent: bool,
}

// =============================================================================
// BANKS
// =============================================================================

/// Bank creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBankRequest {
    pub name: String,
}

/// One bank in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: u64,
    pub name: String,
    pub created: u32,
    pub word_count: usize,
    pub mastered_percent: u8,
}

/// Bank creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankResponse {
    pub success: bool,
    pub bank: Option<WordBank>,
    pub error: Option<String>,
}

impl BankResponse {
    pub fn success(bank: WordBank) -> Self {
        Self {
            success: true,
            bank: Some(bank),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            bank: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// WORDS
// =============================================================================

/// Word list request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWordsRequest {
    pub words: Vec<NewWord>,
}

impl AddWordsRequest {
    /// Reject oversized lists before taking the write lock.
    pub fn validate(&self) -> Result<(), LexiError> {
        if self.words.is_empty() {
            return Err(LexiError::InvalidWord("word list is empty".to_string()));
        }
        if self.words.len() > MAX_IMPORT_WORDS {
            return Err(LexiError::InvalidWord(format!(
                "word count {} exceeds maximum {}",
                self.words.len(),
                MAX_IMPORT_WORDS
            )));
        }
        Ok(())
    }
}

/// Word list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWordsResponse {
    pub success: bool,
    pub added: Vec<u64>,
    pub duplicates: Vec<String>,
    pub error: Option<String>,
}

impl AddWordsResponse {
    pub fn success(added: &[WordId], duplicates: Vec<String>) -> Self {
        Self {
            success: true,
            added: added.iter().map(|id| id.0).collect(),
            duplicates,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            added: vec![],
            duplicates: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Words of one bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsResponse {
    pub bank_id: u64,
    pub words: Vec<Word>,
}

// =============================================================================
// REVIEW
// =============================================================================

/// One recall result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallResult {
    pub word_id: u64,
    pub correct: bool,
}

/// Review submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// "grid" (default) or "anti-forgetting"
    #[serde(default)]
    pub mode: Option<String>,
    pub results: Vec<RecallResult>,
    /// Day index to record; the server's current day when absent.
    #[serde(default)]
    pub day: Option<u32>,
}

impl ReviewRequest {
    /// Transition policy named by `mode`.
    pub fn policy(&self) -> Result<TransitionPolicy, LexiError> {
        TransitionPolicy::parse(self.mode.as_deref().unwrap_or("grid"))
    }

    /// Results as core recall pairs.
    pub fn to_recalls(&self) -> Result<Vec<(WordId, Recall)>, LexiError> {
        if self.results.is_empty() {
            return Err(LexiError::InvalidWord("no review results".to_string()));
        }
        if self.results.len() > MAX_IMPORT_WORDS {
            return Err(LexiError::InvalidWord(format!(
                "result count {} exceeds maximum {}",
                self.results.len(),
                MAX_IMPORT_WORDS
            )));
        }
        Ok(self
            .results
            .iter()
            .map(|r| {
                let recall = if r.correct {
                    Recall::Correct
                } else {
                    Recall::Incorrect
                };
                (WordId(r.word_id), recall)
            })
            .collect())
    }
}

/// Review response: transitions plus the recomputed counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub changes: Vec<StageChange>,
    pub distribution: Option<StageDistribution>,
    pub error: Option<String>,
}

impl ReviewResponse {
    pub fn success(changes: Vec<StageChange>, distribution: StageDistribution) -> Self {
        Self {
            success: true,
            changes,
            distribution: Some(distribution),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            changes: vec![],
            distribution: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// STAGES
// =============================================================================

/// Word count at one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: u8,
    pub name: String,
    pub count: usize,
}

/// Stage distribution response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub stages: Vec<StageCount>,
    pub total: usize,
    pub mastered: usize,
    pub mastered_percent: u8,
    pub lowest_stage: Option<u8>,
    pub complete: bool,
}

impl From<&StageProgress> for StagesResponse {
    fn from(progress: &StageProgress) -> Self {
        let distribution = &progress.distribution;
        Self {
            stages: distribution
                .iter()
                .map(|(stage, count)| StageCount {
                    stage: stage.value(),
                    name: stage.name().to_string(),
                    count,
                })
                .collect(),
            total: distribution.total(),
            mastered: distribution.mastered(),
            mastered_percent: progress.mastered_percent,
            lowest_stage: progress.lowest.map(Stage::value),
            complete: progress.complete,
        }
    }
}

// =============================================================================
// GRID & DUE
// =============================================================================

/// Grid query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridQuery {
    pub columns: Option<usize>,
    /// Only words at this stage.
    pub stage: Option<u8>,
    /// Include mastered words.
    #[serde(default)]
    pub all: bool,
}

impl GridQuery {
    pub fn filter(&self) -> Result<StageFilter, LexiError> {
        match (self.stage, self.all) {
            (Some(value), _) => Ok(StageFilter::Only(Stage::new(value)?)),
            (None, true) => Ok(StageFilter::All),
            (None, false) => Ok(StageFilter::Unmastered),
        }
    }
}

/// Grid response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridResponse {
    pub bank_id: u64,
    pub cell_count: usize,
    pub grid: ReviewGrid,
}

/// Day query parameter for due lists and course agendas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayQuery {
    pub day: Option<u32>,
}

/// Due list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueResponse {
    pub bank_id: u64,
    pub day: u32,
    pub due: Vec<DueWord>,
}

// =============================================================================
// COURSES
// =============================================================================

/// Course creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub name: String,
    pub bank_id: u64,
    pub daily_new: u32,
    /// First study day; the server's current day when absent.
    #[serde(default)]
    pub start: Option<u32>,
}

/// Course creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub success: bool,
    pub course: Option<Course>,
    pub error: Option<String>,
}

impl CourseResponse {
    pub fn success(course: Course) -> Self {
        Self {
            success: true,
            course: Some(course),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            course: None,
            error: Some(msg.into()),
        }
    }
}

/// Course plan response. With a `day` query, `words` holds that day's list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: CoursePlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordId>>,
}

// =============================================================================
// EXPORT & HASH
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<String>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: String) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}

/// Snapshot hash response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub hash: String,
    pub algorithm: String,
    pub word_count: usize,
}
