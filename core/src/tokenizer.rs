use crate::error::{Result, SearchError};
use std::collections::BTreeSet;

/// Split text into words on ASCII spaces. Runs of spaces never produce empty
/// words. The iterator borrows `text` and can be cloned to restart it.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> + Clone {
    text.split(' ').filter(|w| !w.is_empty())
}

/// A word is valid unless it contains a control character (code point below 0x20).
pub fn is_valid_word(word: &str) -> bool {
    !word.bytes().any(|b| b < b' ')
}

pub fn split_into_valid_words(text: &str) -> Result<Vec<&str>> {
    split_into_words(text)
        .map(|w| if is_valid_word(w) { Ok(w) } else { Err(SearchError::InvalidWord(w.to_string())) })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// Build from any sequence of words. Empty strings are skipped.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() { continue; }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            set.insert(word.to_string());
        }
        Ok(Self { words: set })
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn contains(&self, word: &str) -> bool { self.words.contains(word) }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &str> { self.words.iter().map(String::as_str) }
}
