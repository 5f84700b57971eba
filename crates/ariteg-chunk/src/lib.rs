//! Stream chunking for Ariteg.
//!
//! A [`ChunkProvider`] turns one byte stream into a lazy sequence of chunks.
//! An empty chunk is the end-of-stream sentinel; concatenating every chunk
//! before it reproduces the stream exactly.
//!
//! # Strategies
//!
//! - [`FixedLengthChunkProvider`] -- cut every `size` bytes
//! - [`ContentDefinedChunkProvider`] -- cut where a Gear rolling hash over
//!   the content hits a mask, so boundaries survive insertions and deletions
//!
//! A [`ChunkProviderFactory`] built from a [`ChunkingStrategy`] hands out one
//! provider per stream.

pub mod cdc;
pub mod error;
pub mod factory;
pub mod fixed;
pub mod provider;

pub use cdc::ContentDefinedChunkProvider;
pub use error::{ChunkError, ChunkResult};
pub use factory::{ChunkProviderFactory, ChunkingStrategy};
pub use fixed::FixedLengthChunkProvider;
pub use provider::{ChunkProvider, Chunks, MAX_CHUNK_SIZE};
