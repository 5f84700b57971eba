use ariteg_types::{LinkType, Multihash};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Multihash),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object bytes cannot be decoded as the expected node.
    #[error("corrupt {kind} object: {reason}")]
    CorruptObject { kind: LinkType, reason: String },

    /// A tree was built with two entries of the same name.
    #[error("duplicate tree entry: {0}")]
    DuplicateEntry(String),

    /// A tree entry name is empty or contains a path separator.
    #[error("invalid tree entry name: {0:?}")]
    InvalidEntryName(String),

    /// Compressing or decompressing a committed representation failed.
    #[error("compression error: {0}")]
    Compression(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
