//! Error types for the chunk crate.

/// Errors that can occur while chunking a stream.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Reading from the source stream failed.
    #[error("failed to read source stream: {0}")]
    Io(#[from] std::io::Error),

    /// The chunking parameters are unusable.
    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for chunk results.
pub type ChunkResult<T> = Result<T, ChunkError>;
