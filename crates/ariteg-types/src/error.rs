use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown multihash code: {0:#x}")]
    UnknownAlgorithm(u64),

    #[error("malformed varint in multihash")]
    MalformedVarint,

    #[error("trailing bytes after multihash: {0}")]
    TrailingBytes(usize),

    #[error("unknown link type tag: {0}")]
    UnknownLinkType(u8),

    #[error("invalid link string: {0}")]
    InvalidLink(String),
}
