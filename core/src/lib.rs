//! In-memory TF-IDF search over short documents.
//!
//! Documents are added one at a time into an [`InvertedIndex`] owned by a
//! [`SearchEngine`]. Queries carry inclusion words and `-`-prefixed exclusion
//! words and return at most [`MAX_RESULT_DOCUMENT_COUNT`] ranked [`Document`]s.

pub mod accumulator;
pub mod batch;
pub mod dedup;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod profile;
pub mod query;
pub mod request_queue;
pub mod tokenizer;

pub use accumulator::ConcurrentAccumulator;
pub use batch::{process_queries, process_queries_joined};
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentStatus};
pub use engine::{Execution, SearchEngine};
pub use error::{Result, SearchError};
pub use index::InvertedIndex;
pub use profile::LogDuration;
pub use query::Query;
pub use request_queue::RequestQueue;
pub use tokenizer::StopWords;

/// Caller-assigned document identifier. Negative values are rejected on insert.
pub type DocId = i32;

/// Upper bound on the number of documents returned by a single query.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

/// Relevance values closer than this are ranked by rating instead.
pub const RELEVANCE_EPSILON: f64 = 1e-6;
