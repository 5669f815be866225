use crate::accumulator::ConcurrentAccumulator;
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::{compute_average_rating, DocumentData, InvertedIndex};
use crate::query::Query;
use crate::tokenizer::{split_into_valid_words, StopWords};
use crate::{DocId, MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeMap;

pub const DEFAULT_ACCUMULATOR_SHARDS: usize = 100;

/// How an operation that can fan out should run. Parallel work is executed on
/// the given pool; there is no implicit global pool.
#[derive(Clone, Copy)]
pub enum Execution<'a> {
    Sequential,
    Parallel(&'a ThreadPool),
}

/// TF-IDF search engine over an in-memory [`InvertedIndex`].
///
/// Read-only operations may run concurrently from several threads. Mutations
/// take `&mut self`, so overlapping a removal with a query needs external
/// synchronisation such as a `RwLock`.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    stop_words: StopWords,
    index: InvertedIndex,
    accumulator_shards: usize,
}

impl SearchEngine {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words, index: InvertedIndex::new(), accumulator_shards: DEFAULT_ACCUMULATOR_SHARDS }
    }

    pub fn with_stop_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(StopWords::new(words)?))
    }

    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Ok(Self::new(StopWords::from_text(text)?))
    }

    pub fn with_accumulator_shards(mut self, shards: usize) -> Self {
        self.accumulator_shards = shards.max(1);
        self
    }

    pub fn stop_words(&self) -> &StopWords { &self.stop_words }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn add_document(&mut self, id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        if id < 0 || self.index.contains(id) {
            return Err(SearchError::DuplicateOrInvalidId(id));
        }
        let words: Vec<&str> = split_into_valid_words(text)?
            .into_iter()
            .filter(|w| !self.stop_words.contains(w))
            .collect();
        let data = DocumentData { rating: compute_average_rating(ratings), status, text: text.to_string() };
        self.index.insert(id, &words, data)?;
        tracing::debug!(id, words = words.len(), "added document");
        Ok(())
    }

    /// Top documents among those admitted by `predicate(id, status, rating)`.
    pub fn find_top_documents_with<P>(&self, execution: Execution<'_>, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let matched = match execution {
            Execution::Sequential => self.find_all_documents(&query, &predicate),
            Execution::Parallel(pool) => pool.install(|| self.find_all_documents_parallel(&query, &predicate)),
        };
        Ok(select_top(matched))
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(Execution::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_by_status(&self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, s, _| s == status)
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    fn find_all_documents<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let mut relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.index.postings(word) else { continue };
            let idf = self.index.inverse_document_freq(postings);
            for (&id, &tf) in postings {
                let Some(doc) = self.index.document(id) else { continue };
                if predicate(id, doc.status, doc.rating) {
                    *relevance.entry(id).or_insert(0.0) += tf * idf;
                }
            }
        }
        for word in &query.minus_words {
            let Some(postings) = self.index.postings(word) else { continue };
            for id in postings.keys() {
                relevance.remove(id);
            }
        }
        self.to_documents(relevance)
    }

    // Must run inside the caller's pool.
    fn find_all_documents_parallel<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let relevance = ConcurrentAccumulator::<f64>::new(self.accumulator_shards);
        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.index.postings(word) else { return };
            let idf = self.index.inverse_document_freq(postings);
            postings.par_iter().for_each(|(&id, &tf)| {
                let Some(doc) = self.index.document(id) else { return };
                if predicate(id, doc.status, doc.rating) {
                    *relevance.access(id) += tf * idf;
                }
            });
        });
        query.minus_words.par_iter().for_each(|word| {
            if let Some(postings) = self.index.postings(word) {
                postings.keys().for_each(|&id| relevance.erase(id));
            }
        });
        self.to_documents(relevance.drain())
    }

    fn to_documents(&self, relevance: BTreeMap<DocId, f64>) -> Vec<Document> {
        relevance
            .into_iter()
            .filter_map(|(id, rel)| self.index.document(id).map(|doc| Document::new(id, rel, doc.rating)))
            .collect()
    }

    /// Inclusion words of `raw_query` present in document `id`, or nothing if
    /// any exclusion word is present. Words borrow from the index.
    pub fn match_document(&self, raw_query: &str, id: DocId) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(Execution::Sequential, raw_query, id)
    }

    pub fn match_document_with(&self, execution: Execution<'_>, raw_query: &str, id: DocId) -> Result<(Vec<&str>, DocumentStatus)> {
        let status = self.index.document(id).ok_or(SearchError::NoSuchDocument(id))?.status;
        let query = Query::parse(raw_query, &self.stop_words)?;
        let contains = |word: &&str| self.index.postings(word).is_some_and(|p| p.contains_key(&id));
        let lookup = |word: &&str| self.index.lookup(word).filter(|(_, p)| p.contains_key(&id)).map(|(term, _)| term);

        let matched = match execution {
            Execution::Sequential => {
                if query.minus_words.iter().any(contains) {
                    Vec::new()
                } else {
                    query.plus_words.iter().filter_map(lookup).collect()
                }
            }
            Execution::Parallel(pool) => pool.install(|| {
                if query.minus_words.par_iter().any(contains) {
                    Vec::new()
                } else {
                    // plus_words is sorted and unique, so the collected order is too.
                    query.plus_words.par_iter().filter_map(lookup).collect()
                }
            }),
        };
        Ok((matched, status))
    }

    /// Remove a document. Removing an absent id is a no-op.
    pub fn remove_document(&mut self, id: DocId) {
        self.remove_document_with(Execution::Sequential, id)
    }

    pub fn remove_document_with(&mut self, execution: Execution<'_>, id: DocId) {
        let removed = match execution {
            Execution::Sequential => self.index.remove(id),
            Execution::Parallel(pool) => self.index.remove_parallel(id, pool),
        };
        if removed.is_some() {
            tracing::debug!(id, "removed document");
        }
    }

    /// Strict removal: fails with [`SearchError::NoSuchDocument`] for an absent id.
    pub fn try_remove_document(&mut self, id: DocId) -> Result<()> {
        self.index.remove(id).map(|_| ()).ok_or(SearchError::NoSuchDocument(id))
    }

    /// A fresh copy of the document's word frequencies; empty for unknown ids.
    pub fn word_frequencies(&self, id: DocId) -> BTreeMap<&str, f64> {
        self.index
            .term_frequencies(id)
            .map(|freqs| freqs.iter().map(|(term, &tf)| (&**term, tf)).collect())
            .unwrap_or_default()
    }

    pub fn document_count(&self) -> usize { self.index.len() }

    pub fn document_ids(&self) -> impl Iterator<Item = DocId> + '_ { self.index.ids() }

    pub fn contains(&self, id: DocId) -> bool { self.index.contains(id) }

    pub fn document_status(&self, id: DocId) -> Option<DocumentStatus> { self.index.document(id).map(|d| d.status) }

    pub fn document_text(&self, id: DocId) -> Option<&str> { self.index.document(id).map(|d| d.text.as_str()) }
}

impl<'a> IntoIterator for &'a SearchEngine {
    type Item = DocId;
    type IntoIter = Box<dyn Iterator<Item = DocId> + 'a>;

    fn into_iter(self) -> Self::IntoIter { Box::new(self.document_ids()) }
}

fn outranks(a: &Document, b: &Document) -> bool {
    if (a.relevance - b.relevance).abs() < RELEVANCE_EPSILON {
        a.rating > b.rating
    } else {
        a.relevance > b.relevance
    }
}

/// Pick the best [`MAX_RESULT_DOCUMENT_COUNT`] documents in rank order.
/// Documents that rank equal keep their input (ascending id) order.
fn select_top(mut docs: Vec<Document>) -> Vec<Document> {
    let k = docs.len().min(MAX_RESULT_DOCUMENT_COUNT);
    for slot in 0..k {
        let mut best = slot;
        for i in slot + 1..docs.len() {
            if outranks(&docs[i], &docs[best]) {
                best = i;
            }
        }
        docs[slot..=best].rotate_right(1);
    }
    docs.truncate(k);
    docs
}
