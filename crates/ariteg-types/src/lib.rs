//! Foundation types for Ariteg.
//!
//! This crate provides the identity and structural types shared by every
//! other Ariteg crate. Nothing here performs hashing or I/O; digests are
//! computed by `ariteg-crypto` and persisted by `ariteg-store`.
//!
//! # Key Types
//!
//! - [`Multihash`] -- Self-describing digest (algorithm code + length + bytes)
//! - [`HashAlgorithm`] -- Multihash algorithm codes known to Ariteg
//! - [`AritegLink`] -- Typed, content-addressed reference to a stored node
//! - [`LinkType`] -- Blob, List, Tree, or Commit
//! - [`StorageStatus`] -- Availability window and size of a stored object
//! - [`ProtoMeta`] -- Primary/secondary hash pair of the integrity index

pub mod error;
pub mod link;
pub mod meta;
pub mod multihash;
pub mod status;

pub use error::TypeError;
pub use link::{AritegLink, LinkType};
pub use meta::ProtoMeta;
pub use multihash::{HashAlgorithm, Multihash};
pub use status::{now_millis, StorageStatus};
