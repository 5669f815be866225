use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};

/// A parsed query. Both word lists are sorted and free of duplicates and stop
/// words. Words borrow from the raw query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
}

fn parse_query_word(word: &str) -> Result<QueryWord<'_>> {
    let (data, is_minus) = match word.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (word, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(SearchError::InvalidQueryWord(word.to_string()));
    }
    Ok(QueryWord { data, is_minus })
}

impl<'a> Query<'a> {
    pub fn parse(text: &'a str, stop_words: &StopWords) -> Result<Self> {
        let mut query = Query::default();
        for word in split_into_words(text) {
            let word = parse_query_word(word)?;
            if stop_words.contains(word.data) {
                continue;
            }
            if word.is_minus {
                query.minus_words.push(word.data);
            } else {
                query.plus_words.push(word.data);
            }
        }
        sort_unique(&mut query.plus_words);
        sort_unique(&mut query.minus_words);
        tracing::trace!(plus = query.plus_words.len(), minus = query.minus_words.len(), "parsed query");
        Ok(query)
    }

    pub fn is_empty(&self) -> bool { self.plus_words.is_empty() && self.minus_words.is_empty() }
}

fn sort_unique(words: &mut Vec<&str>) {
    words.sort_unstable();
    words.dedup();
}
