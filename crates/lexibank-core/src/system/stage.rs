//! # Stage Machine
//!
//! A word moves through a fixed linear progression of nine stages.
//!
//! | Stage | Name | Meaning |
//! |-------|------|---------|
//! | S1 | New | Never recalled correctly |
//! | S2..S8 | Review 1..7 | Recalled correctly 1..7 times in a row |
//! | S9 | Mastered | Terminal; excluded from due lists |
//!
//! A correct recall always advances one stage. What an incorrect recall does
//! depends on the [`TransitionPolicy`]: grid review sends the word back to
//! S1, anti-forgetting review steps it back a single stage.

use crate::primitives::{MAX_STAGE, MIN_STAGE, STAGE_COUNT};
use crate::{Day, LexiError, Word, WordId};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE
// =============================================================================

/// Position of a word in the review progression, always within 1..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    /// Stage of a freshly added word.
    pub const NEW: Stage = Stage(MIN_STAGE);

    /// Terminal stage.
    pub const MASTERED: Stage = Stage(MAX_STAGE);

    /// Create a stage, rejecting values outside 1..=9.
    pub fn new(value: u8) -> Result<Self, LexiError> {
        if (MIN_STAGE..=MAX_STAGE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LexiError::InvalidStage(value))
        }
    }

    /// Get the raw stage number.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Zero-based index, for per-stage arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - MIN_STAGE) as usize
    }

    /// The next stage up, saturating at [`Stage::MASTERED`].
    #[must_use]
    pub const fn advance(self) -> Self {
        if self.0 >= MAX_STAGE {
            Self(MAX_STAGE)
        } else {
            Self(self.0 + 1)
        }
    }

    /// One stage down, saturating at [`Stage::NEW`].
    #[must_use]
    pub const fn step_back(self) -> Self {
        if self.0 <= MIN_STAGE {
            Self(MIN_STAGE)
        } else {
            Self(self.0 - 1)
        }
    }

    /// Back to the first stage.
    #[must_use]
    pub const fn reset(self) -> Self {
        Self::NEW
    }

    /// Check if this stage is terminal (S9).
    #[must_use]
    pub const fn is_mastered(self) -> bool {
        self.0 == MAX_STAGE
    }

    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "New",
            2 => "Review 1",
            3 => "Review 2",
            4 => "Review 3",
            5 => "Review 4",
            6 => "Review 5",
            7 => "Review 6",
            8 => "Review 7",
            _ => "Mastered",
        }
    }

    /// All stages in ascending order.
    pub fn all() -> impl Iterator<Item = Stage> {
        (MIN_STAGE..=MAX_STAGE).map(Stage)
    }
}

impl TryFrom<u8> for Stage {
    type Error = LexiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::new(value)
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.0
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}: {}", self.0, self.name())
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Outcome of a single recall attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recall {
    Correct,
    Incorrect,
}

/// How an incorrect recall moves a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Grid review: a miss sends the word back to S1.
    #[default]
    ResetOnMiss,
    /// Anti-forgetting review: a miss steps back one stage.
    StepBackOnMiss,
}

impl TransitionPolicy {
    /// Stage after `recall` from `stage`.
    #[must_use]
    pub fn next(self, stage: Stage, recall: Recall) -> Stage {
        match (recall, self) {
            (Recall::Correct, _) => stage.advance(),
            (Recall::Incorrect, TransitionPolicy::ResetOnMiss) => stage.reset(),
            (Recall::Incorrect, TransitionPolicy::StepBackOnMiss) => stage.step_back(),
        }
    }

    /// Parse a policy name as used on the command line and in the API.
    pub fn parse(name: &str) -> Result<Self, LexiError> {
        match name {
            "grid" | "reset_on_miss" => Ok(TransitionPolicy::ResetOnMiss),
            "anti-forgetting" | "step_back_on_miss" => Ok(TransitionPolicy::StepBackOnMiss),
            other => Err(LexiError::InvalidConfig(format!(
                "Unknown review policy: {}. Use: grid, anti-forgetting",
                other
            ))),
        }
    }
}

/// A single recorded stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub word: WordId,
    pub from: Stage,
    pub to: Stage,
}

/// Applies recall outcomes to words under a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageMachine {
    policy: TransitionPolicy,
}

impl StageMachine {
    #[must_use]
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Record a recall on `word`, updating its stage, counters and review day.
    pub fn apply(&self, word: &mut Word, recall: Recall, today: Day) -> StageChange {
        let from = word.stage;
        let to = self.policy.next(from, recall);

        match recall {
            Recall::Correct => word.correct_count = word.correct_count.saturating_add(1),
            Recall::Incorrect => word.miss_count = word.miss_count.saturating_add(1),
        }
        word.stage = to;
        word.last_reviewed = Some(today);

        StageChange {
            word: word.id,
            from,
            to,
        }
    }
}

// =============================================================================
// DISTRIBUTION
// =============================================================================

/// Number of words at each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageDistribution {
    counts: [usize; STAGE_COUNT],
}

impl StageDistribution {
    /// Count the words at each stage.
    #[must_use]
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a Word>) -> Self {
        let mut counts = [0usize; STAGE_COUNT];
        for word in words {
            let slot = &mut counts[word.stage.index()];
            *slot = slot.saturating_add(1);
        }
        Self { counts }
    }

    /// Words at `stage`.
    #[must_use]
    pub fn count(&self, stage: Stage) -> usize {
        self.counts[stage.index()]
    }

    /// `(stage, count)` pairs in ascending stage order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, usize)> + '_ {
        Stage::all().map(|stage| (stage, self.count(stage)))
    }

    /// Total number of words counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().fold(0usize, |acc, c| acc.saturating_add(*c))
    }

    /// Words at the terminal stage.
    #[must_use]
    pub fn mastered(&self) -> usize {
        self.count(Stage::MASTERED)
    }

    /// Share of mastered words as an integer percentage (0 for an empty bank).
    #[must_use]
    pub fn mastered_percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.mastered() as u64).saturating_mul(100) / (total as u64)).min(100) as u8
    }

    /// The lowest stage holding at least one word.
    #[must_use]
    pub fn lowest_occupied(&self) -> Option<Stage> {
        self.iter().find(|(_, c)| *c > 0).map(|(stage, _)| stage)
    }
}

/// Progress summary for a bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgress {
    pub distribution: StageDistribution,
    pub lowest: Option<Stage>,
    pub mastered_percent: u8,
    /// True when the bank is non-empty and every word is mastered.
    pub complete: bool,
}

impl StageProgress {
    #[must_use]
    pub fn from_distribution(distribution: StageDistribution) -> Self {
        let lowest = distribution.lowest_occupied();
        Self {
            distribution,
            lowest,
            mastered_percent: distribution.mastered_percent(),
            complete: lowest == Some(Stage::MASTERED),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(n: u8) -> Stage {
        Stage::new(n).expect("valid stage")
    }

    fn word_at(id: u64, n: u8) -> Word {
        let mut word = Word::new(WordId(id), format!("w{}", id), "m");
        word.stage = stage(n);
        word
    }

    #[test]
    fn stage_bounds_enforced() {
        assert!(matches!(Stage::new(0), Err(LexiError::InvalidStage(0))));
        assert!(matches!(Stage::new(10), Err(LexiError::InvalidStage(10))));
        assert_eq!(Stage::all().count(), 9);
    }

    #[test]
    fn advance_saturates_at_mastered() {
        assert_eq!(stage(8).advance(), Stage::MASTERED);
        assert_eq!(Stage::MASTERED.advance(), Stage::MASTERED);
    }

    #[test]
    fn step_back_saturates_at_new() {
        assert_eq!(stage(2).step_back(), Stage::NEW);
        assert_eq!(Stage::NEW.step_back(), Stage::NEW);
    }

    #[test]
    fn reset_on_miss_returns_to_first_stage() {
        let policy = TransitionPolicy::ResetOnMiss;
        assert_eq!(policy.next(stage(7), Recall::Incorrect), Stage::NEW);
        assert_eq!(policy.next(stage(7), Recall::Correct), stage(8));
    }

    #[test]
    fn step_back_on_miss_drops_one_stage() {
        let policy = TransitionPolicy::StepBackOnMiss;
        assert_eq!(policy.next(stage(7), Recall::Incorrect), stage(6));
        assert_eq!(policy.next(Stage::NEW, Recall::Incorrect), Stage::NEW);
    }

    #[test]
    fn machine_updates_counters_and_day() {
        let machine = StageMachine::new(TransitionPolicy::ResetOnMiss);
        let mut word = word_at(1, 4);

        let change = machine.apply(&mut word, Recall::Correct, Day(100));
        assert_eq!(change.from, stage(4));
        assert_eq!(change.to, stage(5));
        assert_eq!(word.correct_count, 1);
        assert_eq!(word.last_reviewed, Some(Day(100)));

        let change = machine.apply(&mut word, Recall::Incorrect, Day(101));
        assert_eq!(change.to, Stage::NEW);
        assert_eq!(word.miss_count, 1);
    }

    #[test]
    fn distribution_counts_each_stage() {
        let words = vec![word_at(1, 1), word_at(2, 1), word_at(3, 5), word_at(4, 9)];
        let dist = StageDistribution::from_words(&words);

        assert_eq!(dist.count(Stage::NEW), 2);
        assert_eq!(dist.count(stage(5)), 1);
        assert_eq!(dist.mastered(), 1);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.mastered_percent(), 25);
        assert_eq!(dist.lowest_occupied(), Some(Stage::NEW));
    }

    #[test]
    fn empty_distribution_is_zero_percent() {
        let dist = StageDistribution::from_words(&[]);
        assert_eq!(dist.mastered_percent(), 0);
        assert!(!StageProgress::from_distribution(dist).complete);
    }

    #[test]
    fn all_mastered_is_complete() {
        let words = vec![word_at(1, 9), word_at(2, 9)];
        let progress = StageProgress::from_distribution(StageDistribution::from_words(&words));
        assert!(progress.complete);
        assert_eq!(progress.mastered_percent, 100);
    }

    #[test]
    fn stage_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&stage(4)).expect("ser"), "4");
        assert!(serde_json::from_str::<Stage>("12").is_err());
    }

    #[test]
    fn stage_display() {
        assert_eq!(format!("{}", Stage::NEW), "S1: New");
        assert_eq!(format!("{}", Stage::MASTERED), "S9: Mastered");
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!(
            TransitionPolicy::parse("anti-forgetting").expect("parse"),
            TransitionPolicy::StepBackOnMiss
        );
        assert!(TransitionPolicy::parse("random").is_err());
    }
}
