//! Integrity index for Ariteg.
//!
//! Records, per stored object, the pair of its content digest (primary
//! hash) and a second digest of the bytes actually committed to the backing
//! store (secondary hash). Restores consult the index to confirm that what
//! comes back is what was accepted.
//!
//! # Key Types
//!
//! - [`ProtoMetaRepository`] -- CRUD contract keyed by primary hash
//! - [`InMemoryProtoMetaRepository`] -- `HashMap`-backed repository
//! - [`FsProtoMetaRepository`] -- one JSON record per file

pub mod error;
pub mod fs;
pub mod memory;
pub mod repository;

pub use error::{IndexError, IndexResult};
pub use fs::FsProtoMetaRepository;
pub use memory::InMemoryProtoMetaRepository;
pub use repository::ProtoMetaRepository;
