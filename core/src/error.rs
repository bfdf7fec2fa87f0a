//! Error types for the search core.

use thiserror::Error;

/// Result type alias for search-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by loading, validating or querying an index.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The snapshot violates a structural invariant. The previously loaded
    /// snapshot, if any, keeps serving.
    #[error("malformed index: {0}")]
    MalformedIndex(String),

    /// `search` was called before any snapshot was loaded.
    #[error("no index loaded")]
    IndexNotLoaded,

    /// The caller abandoned the query between resolution steps.
    #[error("query cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedIndex(msg.into())
    }
}
