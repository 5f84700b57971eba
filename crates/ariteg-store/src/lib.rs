//! Object model and backing storage for Ariteg.
//!
//! This crate defines what Ariteg stores and the contract a backing store
//! must satisfy. Every node -- blob, list, tree, commit -- is an immutable
//! byte string keyed by its multihash.
//!
//! # Object Types
//!
//! - blob -- raw chunk bytes, stored as-is and addressed by their digest
//! - [`List`] -- ordered links whose contents concatenate into one stream
//! - [`Tree`] -- ordered `(name, link)` entries
//! - [`Commit`] -- root link, parent commits, and metadata
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one file per object under a root directory
//! - [`ZstdObjectStore`] -- wraps another store and compresses what it commits
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. `put` is idempotent: writing the same digest twice is a no-op.
//! 3. Concurrent reads are always safe (objects are immutable).
//! 4. The store never interprets object contents -- it is a pure key-value store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod compress;
pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use compress::ZstdObjectStore;
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Commit, List, Node, Tree, TreeEntry};
pub use traits::ObjectStore;
