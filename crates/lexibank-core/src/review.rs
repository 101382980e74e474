//! # Review
//!
//! The two review modes built on the stage machine.
//!
//! - **Grid review** lays a bank out as a grid of cards, lowest stage first.
//!   Misses reset to S1 ([`TransitionPolicy::ResetOnMiss`]).
//! - **Anti-forgetting review** only shows words whose review interval has
//!   elapsed. Misses step back one stage ([`TransitionPolicy::StepBackOnMiss`]).

use crate::primitives::{MAX_CHUNK_SIZE, REVIEW_INTERVALS};
use crate::system::{Stage, TransitionPolicy};
use crate::{Day, LexiError, Word, WordId};
use serde::{Deserialize, Serialize};

// =============================================================================
// GRID REVIEW
// =============================================================================

/// Which words a review grid includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "stage")]
pub enum StageFilter {
    All,
    /// Every word below S9.
    #[default]
    Unmastered,
    Only(Stage),
}

impl StageFilter {
    #[must_use]
    pub fn matches(&self, stage: Stage) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Unmastered => !stage.is_mastered(),
            StageFilter::Only(only) => *only == stage,
        }
    }
}

/// One card in a review grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub word: WordId,
    pub term: String,
    pub stage: Stage,
}

/// Words laid out in rows for grid review.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewGrid {
    pub columns: usize,
    pub rows: Vec<Vec<GridCell>>,
}

impl ReviewGrid {
    /// Policy used when recording grid results.
    pub const POLICY: TransitionPolicy = TransitionPolicy::ResetOnMiss;

    /// Build a grid of the words matching `filter`, ordered by (stage, id).
    pub fn build(words: &[Word], filter: StageFilter, columns: usize) -> Result<Self, LexiError> {
        if columns == 0 || columns > MAX_CHUNK_SIZE {
            return Err(LexiError::InvalidChunkSize(columns));
        }

        let mut selected: Vec<&Word> = words.iter().filter(|w| filter.matches(w.stage)).collect();
        selected.sort_by_key(|w| (w.stage, w.id));

        let rows = selected
            .chunks(columns)
            .map(|row| {
                row.iter()
                    .map(|w| GridCell {
                        word: w.id,
                        term: w.term.clone(),
                        stage: w.stage,
                    })
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Number of cards across all rows.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// ANTI-FORGETTING REVIEW
// =============================================================================

/// Policy used when recording anti-forgetting results.
pub const ANTI_FORGETTING_POLICY: TransitionPolicy = TransitionPolicy::StepBackOnMiss;

/// Day on which `word` is next due, or `None` for mastered words.
///
/// A word that has never been reviewed is due immediately, which is
/// reported as `Day(0)`.
#[must_use]
pub fn next_due(word: &Word) -> Option<Day> {
    if word.stage.is_mastered() {
        return None;
    }
    match word.last_reviewed {
        None => Some(Day(0)),
        Some(reviewed) => Some(reviewed.plus(REVIEW_INTERVALS[word.stage.index()])),
    }
}

/// A word due for anti-forgetting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueWord {
    pub word: WordId,
    pub term: String,
    pub stage: Stage,
    pub due: Day,
    /// Days past the due day.
    pub overdue_days: u32,
}

/// Words due on `today`, most overdue first, then by (stage, id).
#[must_use]
pub fn due_words(words: &[Word], today: Day) -> Vec<DueWord> {
    let mut due: Vec<DueWord> = words
        .iter()
        .filter_map(|word| {
            let due = next_due(word)?;
            (due <= today).then(|| DueWord {
                word: word.id,
                term: word.term.clone(),
                stage: word.stage,
                due,
                overdue_days: today.since(due),
            })
        })
        .collect();
    due.sort_by_key(|d| (d.due, d.stage, d.word));
    due
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: u64, stage: u8, last: Option<u32>) -> Word {
        let mut w = Word::new(WordId(id), format!("term{}", id), "meaning");
        w.stage = Stage::new(stage).expect("stage");
        w.last_reviewed = last.map(Day);
        w
    }

    #[test]
    fn grid_orders_by_stage_then_id() {
        let words = vec![word(3, 2, None), word(1, 5, None), word(2, 2, None)];
        let grid = ReviewGrid::build(&words, StageFilter::All, 2).expect("grid");

        let ids: Vec<u64> = grid.rows.iter().flatten().map(|c| c.word.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1].len(), 1);
    }

    #[test]
    fn grid_filters_mastered_by_default() {
        let words = vec![word(1, 9, None), word(2, 1, None)];
        let grid = ReviewGrid::build(&words, StageFilter::default(), 4).expect("grid");
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn grid_single_stage_filter() {
        let words = vec![word(1, 3, None), word(2, 4, None), word(3, 3, None)];
        let only = StageFilter::Only(Stage::new(3).expect("stage"));
        let grid = ReviewGrid::build(&words, only, 10).expect("grid");
        assert_eq!(grid.cell_count(), 2);
    }

    #[test]
    fn grid_rejects_zero_columns() {
        assert!(ReviewGrid::build(&[], StageFilter::All, 0).is_err());
    }

    #[test]
    fn unreviewed_word_is_due_immediately() {
        assert_eq!(next_due(&word(1, 1, None)), Some(Day(0)));
    }

    #[test]
    fn interval_grows_with_stage() {
        assert_eq!(next_due(&word(1, 2, Some(100))), Some(Day(101)));
        assert_eq!(next_due(&word(1, 5, Some(100))), Some(Day(107)));
        assert_eq!(next_due(&word(1, 8, Some(100))), Some(Day(160)));
    }

    #[test]
    fn mastered_word_never_due() {
        assert_eq!(next_due(&word(1, 9, Some(0))), None);
        assert!(due_words(&[word(1, 9, Some(0))], Day(10_000)).is_empty());
    }

    #[test]
    fn due_words_sorted_most_overdue_first() {
        let words = vec![
            word(1, 4, Some(95)), // due 99
            word(2, 2, Some(90)), // due 91
            word(3, 6, Some(99)), // due 114, not yet
            word(4, 1, None),     // due 0
        ];
        let due = due_words(&words, Day(100));
        let ids: Vec<u64> = due.iter().map(|d| d.word.0).collect();
        assert_eq!(ids, vec![4, 2, 1]);
        assert_eq!(due[1].overdue_days, 9);
    }
}
