//! Error types for the index crate.

/// Errors that can occur during integrity index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// I/O error from the persistence layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A primary hash is not a valid record key.
    #[error("invalid primary hash: {0:?}")]
    InvalidKey(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
