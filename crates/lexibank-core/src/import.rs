//! # Word Importer
//!
//! Turns raw input into validated [`NewWord`]s.
//!
//! Supported inputs:
//! - JSON: an array of `{"term": "...", "meaning": "..."}` objects
//! - Text: one word per line, `term<TAB>meaning` or `term:meaning`
//!
//! Input that cannot be represented as a term/meaning pair is rejected with
//! the offending line or index named; nothing is imported partially.

use crate::primitives::{MAX_IMPORT_WORDS, MAX_MEANING_LENGTH, MAX_TERM_LENGTH};
use crate::{LexiError, NewWord};

/// Parsing and validation for word input.
pub struct WordImporter;

impl WordImporter {
    /// Validate a word, returning a trimmed copy.
    pub fn validate(word: &NewWord) -> Result<NewWord, LexiError> {
        let term = word.term.trim();
        let meaning = word.meaning.trim();

        if term.is_empty() {
            return Err(LexiError::InvalidWord("term is empty".to_string()));
        }
        if meaning.is_empty() {
            return Err(LexiError::InvalidWord(format!(
                "meaning of '{}' is empty",
                term
            )));
        }
        if term.len() > MAX_TERM_LENGTH {
            return Err(LexiError::InvalidWord(format!(
                "term length {} exceeds maximum {} bytes",
                term.len(),
                MAX_TERM_LENGTH
            )));
        }
        if meaning.len() > MAX_MEANING_LENGTH {
            return Err(LexiError::InvalidWord(format!(
                "meaning length {} exceeds maximum {} bytes",
                meaning.len(),
                MAX_MEANING_LENGTH
            )));
        }

        Ok(NewWord::new(term, meaning))
    }

    /// Validate a whole list, enforcing the import size limit.
    pub fn validate_all(words: &[NewWord]) -> Result<Vec<NewWord>, LexiError> {
        check_count(words.len())?;
        words.iter().map(Self::validate).collect()
    }

    /// Parse a JSON array of words.
    pub fn parse_json(bytes: &[u8]) -> Result<Vec<NewWord>, LexiError> {
        let words: Vec<NewWord> = serde_json::from_slice(bytes)
            .map_err(|e| LexiError::SerializationError(format!("word list: {}", e)))?;
        check_count(words.len())?;

        words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Self::validate(w).map_err(|e| LexiError::InvalidWord(format!("entry {}: {}", i, e)))
            })
            .collect()
    }

    /// Parse line-oriented text.
    ///
    /// A tab separates term and meaning when present; otherwise the first
    /// `:` does. Blank lines and lines starting with `#` are skipped.
    pub fn parse_text(text: &str) -> Result<Vec<NewWord>, LexiError> {
        let mut words = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (term, meaning) = line
                .split_once('\t')
                .or_else(|| line.split_once(':'))
                .ok_or_else(|| {
                    LexiError::InvalidWord(format!("line {}: missing separator", number + 1))
                })?;

            let word = Self::validate(&NewWord::new(term, meaning))
                .map_err(|e| LexiError::InvalidWord(format!("line {}: {}", number + 1, e)))?;
            words.push(word);
            check_count(words.len())?;
        }

        Ok(words)
    }

    /// Parse by format name (`json` or `text`).
    pub fn parse(bytes: &[u8], format: &str) -> Result<Vec<NewWord>, LexiError> {
        match format {
            "json" => Self::parse_json(bytes),
            "text" => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    LexiError::SerializationError(format!("text input is not UTF-8: {}", e))
                })?;
                Self::parse_text(text)
            }
            other => Err(LexiError::SerializationError(format!(
                "Unknown format: {}. Use: json, text",
                other
            ))),
        }
    }
}

fn check_count(count: usize) -> Result<(), LexiError> {
    if count > MAX_IMPORT_WORDS {
        return Err(LexiError::InvalidWord(format!(
            "word count {} exceeds maximum {}",
            count, MAX_IMPORT_WORDS
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
