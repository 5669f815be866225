use crate::document::DocumentStatus;
use crate::error::{Result, SearchError};
use crate::DocId;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An indexed word. Each distinct word is allocated once and shared by both
/// directions of the index.
pub type Term = Arc<str>;

pub type Postings = BTreeMap<DocId, f64>;

pub type TermFrequencies = BTreeMap<Term, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentData {
    pub rating: i32,
    pub status: DocumentStatus,
    pub text: String,
}

/// Two-way term/document frequency index.
///
/// A `(term, doc)` pair is present in `term_to_docs` iff it is present in
/// `doc_to_terms`, with the same frequency. Posting lists are never left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    term_to_docs: BTreeMap<Term, Postings>,
    doc_to_terms: BTreeMap<DocId, TermFrequencies>,
    documents: BTreeMap<DocId, DocumentData>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Index `words` (already validated, stop words removed) under `id`.
    pub fn insert(&mut self, id: DocId, words: &[&str], data: DocumentData) -> Result<()> {
        if id < 0 || self.documents.contains_key(&id) {
            return Err(SearchError::DuplicateOrInvalidId(id));
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for &word in words {
            *counts.entry(word).or_insert(0) += 1;
        }
        let total = words.len() as f64;
        let mut freqs = TermFrequencies::new();
        for (word, count) in counts {
            let term = self.intern(word);
            let tf = count as f64 / total;
            self.term_to_docs.entry(term.clone()).or_default().insert(id, tf);
            freqs.insert(term, tf);
        }
        self.doc_to_terms.insert(id, freqs);
        self.documents.insert(id, data);
        Ok(())
    }

    fn intern(&self, word: &str) -> Term {
        match self.term_to_docs.get_key_value(word) {
            Some((term, _)) => term.clone(),
            None => Arc::from(word),
        }
    }

    pub fn remove(&mut self, id: DocId) -> Option<DocumentData> {
        let data = self.documents.remove(&id)?;
        let terms = self.doc_to_terms.remove(&id).unwrap_or_default();
        for term in terms.keys() {
            if let Some(postings) = self.term_to_docs.get_mut(term) {
                postings.remove(&id);
                if postings.is_empty() {
                    self.term_to_docs.remove(term);
                }
            }
        }
        Some(data)
    }

    /// Same as [`remove`](Self::remove), with the per-term posting updates
    /// spread over `pool`. Only the document's own posting lists are taken out
    /// of the map; each worker owns a disjoint subset of them.
    pub fn remove_parallel(&mut self, id: DocId, pool: &ThreadPool) -> Option<DocumentData> {
        let data = self.documents.remove(&id)?;
        let terms = self.doc_to_terms.remove(&id).unwrap_or_default();
        let mut affected: Vec<(Term, Postings)> =
            terms.keys().filter_map(|term| self.term_to_docs.remove_entry(term)).collect();
        pool.install(|| {
            affected.par_iter_mut().for_each(|(_, postings)| {
                postings.remove(&id);
            })
        });
        self.term_to_docs.extend(affected.into_iter().filter(|(_, postings)| !postings.is_empty()));
        Some(data)
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> { self.term_to_docs.get(term) }

    pub fn lookup(&self, term: &str) -> Option<(&str, &Postings)> {
        self.term_to_docs.get_key_value(term).map(|(t, p)| (&**t, p))
    }

    pub fn term_frequencies(&self, id: DocId) -> Option<&TermFrequencies> { self.doc_to_terms.get(&id) }

    pub fn document(&self, id: DocId) -> Option<&DocumentData> { self.documents.get(&id) }

    pub fn contains(&self, id: DocId) -> bool { self.documents.contains_key(&id) }

    /// `ln(N / df)`. `df` is the length of a non-empty posting list.
    pub fn inverse_document_freq(&self, postings: &Postings) -> f64 {
        (self.documents.len() as f64 / postings.len() as f64).ln()
    }

    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ { self.documents.keys().copied() }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn term_count(&self) -> usize { self.term_to_docs.len() }
}

/// Arithmetic mean truncated toward zero; 0 for no ratings.
pub fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::ThreadPoolBuilder;

    fn data(text: &str) -> DocumentData {
        DocumentData { rating: 0, status: DocumentStatus::Actual, text: text.to_string() }
    }

    fn add(index: &mut InvertedIndex, id: DocId, text: &str) {
        let words: Vec<&str> = text.split(' ').collect();
        index.insert(id, &words, data(text)).unwrap();
    }

    fn sample() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        add(&mut index, 1, "fluffy cat fluffy tail");
        add(&mut index, 2, "groomed dog expressive eyes");
        add(&mut index, 3, "white cat fancy collar");
        index
    }

    #[test]
    fn both_directions_agree() {
        let index = sample();
        for id in index.ids() {
            for (term, tf) in index.term_frequencies(id).unwrap() {
                assert_eq!(index.postings(term).unwrap().get(&id), Some(tf));
            }
        }
        assert_eq!(index.postings("fluffy").unwrap().get(&1), Some(&0.5));
        assert_eq!(index.postings("cat").unwrap().len(), 2);
    }

    #[test]
    fn terms_share_one_allocation() {
        let index = sample();
        let (forward, _) = index.term_to_docs.get_key_value("cat").unwrap();
        let (backward, _) = index.doc_to_terms[&3].get_key_value("cat").unwrap();
        assert!(Arc::ptr_eq(forward, backward));
    }

    #[test]
    fn rejects_negative_and_duplicate_ids() {
        let mut index = sample();
        assert_eq!(index.insert(-1, &["a"], data("a")), Err(SearchError::DuplicateOrInvalidId(-1)));
        assert_eq!(index.insert(2, &["a"], data("a")), Err(SearchError::DuplicateOrInvalidId(2)));
        assert_eq!(index, sample());
    }

    #[test]
    fn document_without_words_is_tracked() {
        let mut index = InvertedIndex::new();
        index.insert(7, &[], data("")).unwrap();
        assert!(index.contains(7));
        assert!(index.term_frequencies(7).unwrap().is_empty());
        assert!(index.remove(7).is_some());
        assert!(index.is_empty());
    }

    #[test]
    fn removal_prunes_postings() {
        let mut index = sample();
        index.remove(1).unwrap();
        assert!(index.postings("fluffy").is_none());
        assert_eq!(index.postings("cat").unwrap().keys().copied().collect::<Vec<_>>(), vec![3]);
        assert!(index.remove(1).is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn parallel_removal_matches_sequential() {
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let mut seq = sample();
        let mut par = sample();
        for id in [3, 1, 42] {
            assert_eq!(seq.remove(id).is_some(), par.remove_parallel(id, &pool).is_some());
            assert_eq!(seq, par);
        }
        assert_eq!(par.term_count(), 4);
    }

    #[test]
    fn parallel_removal_leaves_other_terms_untouched() {
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let mut seq = InvertedIndex::new();
        for id in 0..5_000 {
            let text = format!("unique{id} shared");
            add(&mut seq, id, &text);
        }
        let mut par = seq.clone();
        for id in 0..200 {
            seq.remove(id);
            par.remove_parallel(id, &pool);
        }
        assert_eq!(seq, par);
        assert_eq!(par.term_count(), 4_801);
        assert_eq!(par.postings("shared").unwrap().len(), 4_800);
        assert!(par.postings("unique199").is_none());
        assert_eq!(par.postings("unique200").unwrap().keys().copied().collect::<Vec<_>>(), vec![200]);
    }

    #[test]
    fn average_rating_truncates_toward_zero() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[8, -3]), 2);
        assert_eq!(compute_average_rating(&[5, -12, 2, 1]), -1);
        assert_eq!(compute_average_rating(&[-7]), -7);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }
}
