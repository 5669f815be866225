use crate::engine::SearchEngine;
use crate::DocId;
use std::collections::BTreeSet;

/// Remove documents whose set of indexed words equals that of a document with
/// a lower id. Frequencies are ignored. Returns the removed ids, ascending.
pub fn remove_duplicates(engine: &mut SearchEngine) -> Vec<DocId> {
    let mut seen: BTreeSet<Vec<&str>> = BTreeSet::new();
    let duplicates: Vec<DocId> = engine
        .document_ids()
        .filter(|&id| !seen.insert(engine.word_frequencies(id).into_keys().collect()))
        .collect();
    drop(seen);
    for &id in &duplicates {
        tracing::info!(id, "found duplicate document id");
        engine.remove_document(id);
    }
    duplicates
}
