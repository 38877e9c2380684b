use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::seed::Seed;

#[derive(Debug, thiserror::Error)]
pub enum WordListError {
    #[error("Word list is empty")]
    Empty,
    #[error("Failed to read word list: {0}")]
    Io(#[from] std::io::Error),
}

/// The guessable words, in file order. Built once at start-up and shared
/// read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
    known: HashSet<String>,
    max_word_length: usize,
}

impl WordList {
    pub fn new<I, S>(words: I) -> Result<Self, WordListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        if words.is_empty() {
            return Err(WordListError::Empty);
        }

        let max_word_length = words
            .iter()
            .map(|word| word.chars().count())
            .max()
            .unwrap_or(0);
        let known = words.iter().cloned().collect();

        Ok(Self {
            words,
            known,
            max_word_length,
        })
    }

    /// Parse a word list: one word per line, blank lines and `#` comments skipped.
    pub fn from_text(text: &str) -> Result<Self, WordListError> {
        let words = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        Self::new(words)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WordListError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let list = Self::from_text(&text)?;
        info!(
            "Loaded {} words from {} (longest: {} letters)",
            list.len(),
            path.as_ref().display(),
            list.max_word_length
        );
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    pub fn contains(&self, word: &str) -> bool {
        self.known.contains(word)
    }

    /// The target word for a seed: `words[seed mod len]`.
    pub fn select(&self, seed: Seed) -> &str {
        let index = (seed % self.words.len() as u64) as usize;
        &self.words[index]
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}
