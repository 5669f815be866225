use crate::document::{Document, DocumentStatus};
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::DocId;
use std::collections::VecDeque;

/// Number of requests kept in the window: one per minute of a day.
pub const REQUEST_WINDOW: u64 = 1440;

#[derive(Debug, Clone, Copy)]
struct QueryResult {
    tick: u64,
    results: usize,
}

/// Tracks how many of the most recent [`REQUEST_WINDOW`] find requests came
/// back empty. Every request advances the clock by one tick.
pub struct RequestQueue<'a> {
    engine: &'a SearchEngine,
    requests: VecDeque<QueryResult>,
    current_tick: u64,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self { engine, requests: VecDeque::new(), current_tick: 0, no_result_requests: 0 }
    }

    pub fn add_find_request_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let docs = self.engine.find_top_documents_by(raw_query, predicate)?;
        self.record(docs.len());
        Ok(docs)
    }

    pub fn add_find_request_by_status(&mut self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        let docs = self.engine.find_top_documents_by_status(raw_query, status)?;
        self.record(docs.len());
        Ok(docs)
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let docs = self.engine.find_top_documents(raw_query)?;
        self.record(docs.len());
        Ok(docs)
    }

    pub fn no_result_requests(&self) -> usize { self.no_result_requests }

    fn record(&mut self, results: usize) {
        self.current_tick += 1;
        while let Some(oldest) = self.requests.front() {
            if self.current_tick - oldest.tick < REQUEST_WINDOW {
                break;
            }
            if oldest.results == 0 {
                self.no_result_requests -= 1;
            }
            self.requests.pop_front();
        }
        self.requests.push_back(QueryResult { tick: self.current_tick, results });
        if results == 0 {
            self.no_result_requests += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let mut engine = SearchEngine::from_stop_words_text("and in at").unwrap();
        engine.add_document(1, "curly cat curly tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
        engine.add_document(2, "curly dog and fancy collar", DocumentStatus::Actual, &[1, 2, 3]).unwrap();
        engine.add_document(3, "big cat fancy collar ", DocumentStatus::Actual, &[1, 2, 8]).unwrap();
        engine.add_document(4, "big dog sparrow Eugene", DocumentStatus::Actual, &[1, 3, 2]).unwrap();
        engine.add_document(5, "big dog sparrow Vasiliy", DocumentStatus::Actual, &[1, 1, 1]).unwrap();
        engine
    }

    #[test]
    fn old_empty_requests_leave_the_window() {
        let engine = engine();
        let mut queue = RequestQueue::new(&engine);
        for _ in 0..1439 {
            queue.add_find_request("empty request").unwrap();
        }
        assert_eq!(queue.no_result_requests(), 1439);
        queue.add_find_request("curly dog").unwrap();
        assert_eq!(queue.no_result_requests(), 1439);
        queue.add_find_request("big collar").unwrap();
        assert_eq!(queue.no_result_requests(), 1438);
        queue.add_find_request("sparrow").unwrap();
        assert_eq!(queue.no_result_requests(), 1437);
    }

    #[test]
    fn failed_queries_are_not_recorded() {
        let engine = engine();
        let mut queue = RequestQueue::new(&engine);
        assert!(queue.add_find_request("--bad").is_err());
        assert_eq!(queue.add_find_request_by_status("cat", DocumentStatus::Banned).unwrap().len(), 0);
        assert_eq!(queue.add_find_request_by("cat", |id, _, _| id == 3).unwrap().len(), 1);
        assert_eq!(queue.no_result_requests(), 1);
    }
}
