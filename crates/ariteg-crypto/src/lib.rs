//! Multihash digest computation for Ariteg.
//!
//! Each supported hash algorithm is a [`MultihashProvider`]. Providers are
//! collected in a [`MultihashRegistry`], which maps an algorithm code to the
//! provider that computes it. Algorithms that are known on the wire but have
//! no registered provider yield [`UnsupportedAlgorithm`]; callers treat that
//! as "skip", not as a broken registry.
//!
//! All digest operations wrap established libraries (`sha2`, `blake3`).

pub mod provider;
pub mod registry;

pub use provider::{
    Blake3Provider, IdentityProvider, MultihashProvider, Sha2_256Provider, Sha2_512Provider,
};
pub use registry::{MultihashRegistry, UnsupportedAlgorithm};
