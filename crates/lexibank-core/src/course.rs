//! # Course Scheduling
//!
//! A course walks through a bank a fixed number of new words per day and
//! revisits each day's list on the days given by [`COURSE_REVIEW_OFFSETS`].
//!
//! ```text
//! study day d:   new list L(d)
//! day d+1:       review L(d)
//! day d+2:       review L(d)
//! day d+4:       review L(d)
//! day d+7:       review L(d)
//! day d+15:      review L(d)
//! ```

use crate::primitives::{COURSE_REVIEW_OFFSETS, MAX_IMPORT_WORDS, MAX_NAME_LENGTH};
use crate::{BankId, CourseId, Day, LexiError, WordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A stored course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub bank: BankId,
    pub daily_new: u32,
    pub start: Day,
}

/// Input shape for creating a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub bank: BankId,
    pub daily_new: u32,
    pub start: Day,
}

impl NewCourse {
    /// Validate and trim the course input.
    pub fn validated(&self) -> Result<NewCourse, LexiError> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(LexiError::InvalidName(format!(
                "course name must be 1..={} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if self.daily_new == 0 || self.daily_new as usize > MAX_IMPORT_WORDS {
            return Err(LexiError::InvalidConfig(format!(
                "daily_new must be 1..={}, got {}",
                MAX_IMPORT_WORDS, self.daily_new
            )));
        }
        Ok(NewCourse {
            name: name.to_string(),
            ..self.clone()
        })
    }
}

/// Work scheduled for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDay {
    pub day: Day,
    pub new_words: Vec<WordId>,
    /// Earlier study days whose lists are revisited today.
    pub review_of: Vec<Day>,
}

/// The full day-by-day schedule of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePlan {
    pub course: CourseId,
    pub days: Vec<CourseDay>,
}

impl CoursePlan {
    /// Build the schedule for `course` over `word_ids` (in bank order).
    pub fn build(course: &Course, word_ids: &[WordId]) -> Result<Self, LexiError> {
        if course.daily_new == 0 {
            return Err(LexiError::InvalidConfig(
                "daily_new must be at least 1".to_string(),
            ));
        }

        let mut by_day: BTreeMap<Day, CourseDay> = BTreeMap::new();

        for (offset, list) in word_ids.chunks(course.daily_new as usize).enumerate() {
            let study_day = course.start.plus(offset as u32);
            by_day
                .entry(study_day)
                .or_insert_with(|| CourseDay::empty(study_day))
                .new_words
                .extend_from_slice(list);

            for gap in COURSE_REVIEW_OFFSETS {
                let review_day = study_day.plus(gap);
                by_day
                    .entry(review_day)
                    .or_insert_with(|| CourseDay::empty(review_day))
                    .review_of
                    .push(study_day);
            }
        }

        Ok(Self {
            course: course.id,
            days: by_day.into_values().collect(),
        })
    }

    /// The schedule entry for `day`, if any work falls on it.
    #[must_use]
    pub fn agenda(&self, day: Day) -> Option<&CourseDay> {
        self.days
            .binary_search_by_key(&day, |d| d.day)
            .ok()
            .map(|i| &self.days[i])
    }

    /// New words of a study day, empty if `day` is not one.
    #[must_use]
    pub fn new_words_on(&self, day: Day) -> &[WordId] {
        self.agenda(day).map(|d| d.new_words.as_slice()).unwrap_or(&[])
    }

    /// Every word to study on `day`: the new list, then each reviewed list
    /// in study-day order, without repeats.
    #[must_use]
    pub fn words_for(&self, day: Day) -> Vec<WordId> {
        let Some(entry) = self.agenda(day) else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut words = Vec::new();
        let reviewed = entry
            .review_of
            .iter()
            .flat_map(|study_day| self.new_words_on(*study_day).iter());
        for word in entry.new_words.iter().chain(reviewed) {
            if seen.insert(*word) {
                words.push(*word);
            }
        }
        words
    }

    /// Last day with scheduled work.
    #[must_use]
    pub fn last_day(&self) -> Option<Day> {
        self.days.last().map(|d| d.day)
    }

    /// Number of study days (days introducing new words).
    #[must_use]
    pub fn study_days(&self) -> usize {
        self.days.iter().filter(|d| !d.new_words.is_empty()).count()
    }
}

impl CourseDay {
    fn empty(day: Day) -> Self {
        Self {
            day,
            new_words: Vec::new(),
            review_of: Vec::new(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
