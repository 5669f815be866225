//! Run many independent queries against one engine on a worker pool.
//!
//! The engine must not be mutated while a batch is running; the shared borrow
//! enforces this for callers within safe code.

use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Evaluate every query with the default (`ACTUAL` status) ranking. Result `i`
/// belongs to query `i`. The first invalid query fails the whole batch.
pub fn process_queries<S>(pool: &ThreadPool, engine: &SearchEngine, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    pool.install(|| queries.par_iter().map(|q| engine.find_top_documents(q.as_ref())).collect())
}

/// [`process_queries`] flattened in query order, then rank order.
pub fn process_queries_joined<S>(pool: &ThreadPool, engine: &SearchEngine, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(pool, engine, queries)?.into_iter().flatten().collect())
}
