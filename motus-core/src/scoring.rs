use motus_types::{LetterResult, LetterStatus};

use crate::word_list::WordList;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuessError {
    #[error("Invalid guess length")]
    InvalidLength,
    #[error("Invalid guess: word isn't in the list")]
    UnknownWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessEvaluation {
    pub result: Vec<LetterResult>,
    pub won: bool,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Reject guesses longer than the longest listed word, or not listed at all.
    pub fn validate_guess(guess: &str, words: &WordList) -> Result<(), GuessError> {
        if guess.chars().count() > words.max_word_length() {
            return Err(GuessError::InvalidLength);
        }
        if !words.contains(guess) {
            return Err(GuessError::UnknownWord);
        }
        Ok(())
    }

    /// Validate a guess, then score it letter by letter against the target.
    pub fn evaluate_guess(
        guess: &str,
        target: &str,
        words: &WordList,
    ) -> Result<GuessEvaluation, GuessError> {
        Self::validate_guess(guess, words)?;

        Ok(GuessEvaluation {
            result: Self::score_letters(guess, target),
            won: guess == target,
        })
    }

    /// Positional scoring without letter budgeting: a letter that occurs
    /// anywhere in the target is `Misplaced` at every non-matching position.
    pub fn score_letters(guess: &str, target: &str) -> Vec<LetterResult> {
        let target_chars: Vec<char> = target.chars().collect();

        guess
            .chars()
            .enumerate()
            .map(|(i, letter)| {
                let status = if target_chars.get(i) == Some(&letter) {
                    LetterStatus::Correct
                } else if target_chars.contains(&letter) {
                    LetterStatus::Misplaced
                } else {
                    LetterStatus::Wrong
                };

                LetterResult {
                    letter: letter.to_string(),
                    status,
                }
            })
            .collect()
    }
}
