use crate::DocId;
use thiserror::Error;

/// Errors surfaced by the search engine. All of them are precondition
/// violations detected before any state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A document or stop word contains a control character.
    #[error("invalid word {0:?}: contains a control character")]
    InvalidWord(String),

    /// A query word is malformed: a lone `-`, a leading `--`, or a control character.
    #[error("invalid query word {0:?}")]
    InvalidQueryWord(String),

    #[error("document id {0} is negative or already present")]
    DuplicateOrInvalidId(DocId),

    #[error("no document with id {0}")]
    NoSuchDocument(DocId),
}

pub type Result<T> = std::result::Result<T, SearchError>;
