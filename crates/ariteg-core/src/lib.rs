//! The Ariteg store/restore pipeline.
//!
//! [`Ariteg`] turns byte streams into a content-addressed object graph and
//! back. On the way in it chunks, hashes, skips what is already stored,
//! writes the rest in the background and records an integrity entry per
//! object. On the way out it checks availability, verifies both hashes and
//! reassembles.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), ariteg_core::AritegError> {
//! use std::sync::Arc;
//! use ariteg_core::{Ariteg, AritegConfig};
//! use ariteg_index::InMemoryProtoMetaRepository;
//! use ariteg_store::InMemoryObjectStore;
//!
//! let ariteg = Ariteg::new(
//!     Arc::new(InMemoryObjectStore::new()),
//!     Arc::new(InMemoryProtoMetaRepository::new()),
//!     AritegConfig::default(),
//! )?;
//! let link = ariteg.store_stream(&b"hello"[..]).await?.durable().await?;
//! assert_eq!(ariteg.restore_bytes(&link).await?, b"hello");
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod receipt;
pub mod restore;

#[cfg(test)]
pub(crate) mod test_support;

pub use commit::CommitDraft;
pub use config::{AritegConfig, ConfigError};
pub use error::{AritegError, AritegResult, BoxError, Direction, Stage};
pub use lifecycle::Operation;
pub use pipeline::Ariteg;
pub use receipt::{Completion, StoreReceipt, WriteOutcome};
pub use restore::GraphSummary;

// Re-export the types callers need to drive the pipeline.
pub use ariteg_chunk::ChunkingStrategy;
pub use ariteg_store::{Commit, List, Tree, TreeEntry};
pub use ariteg_types::{AritegLink, HashAlgorithm, LinkType, Multihash, ProtoMeta, StorageStatus};
