use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cdc::{self, ContentDefinedChunkProvider};
use crate::error::{ChunkError, ChunkResult};
use crate::fixed::FixedLengthChunkProvider;
use crate::provider::{check_max_size, ChunkProvider};

/// Default fixed chunk size: 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// How a stream is split into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ChunkingStrategy {
    /// Cut every `size` bytes.
    FixedLength { size: usize },
    /// Cut at content-defined boundaries.
    ContentDefined {
        min_size: usize,
        avg_size: usize,
        max_size: usize,
    },
}

impl ChunkingStrategy {
    /// Content-defined chunking around a target average, with the usual
    /// quarter/four-times bounds. An average too large for that bound
    /// yields a strategy that fails [`validate`](Self::validate).
    pub fn content_defined(avg_size: usize) -> Self {
        Self::ContentDefined {
            min_size: avg_size / 4,
            avg_size,
            max_size: avg_size.checked_mul(4).unwrap_or(usize::MAX),
        }
    }

    /// Check that the parameters describe a usable splitter.
    pub fn validate(&self) -> ChunkResult<()> {
        match *self {
            Self::FixedLength { size } if size == 0 => Err(ChunkError::InvalidConfig(
                "fixed chunk size must be non-zero".to_string(),
            )),
            Self::FixedLength { size } => check_max_size(size),
            Self::ContentDefined {
                min_size,
                avg_size,
                max_size,
            } => cdc::validate(min_size, avg_size, max_size),
        }
    }

    /// Largest chunk this strategy can produce.
    pub fn max_chunk_size(&self) -> usize {
        match *self {
            Self::FixedLength { size } => size,
            Self::ContentDefined { max_size, .. } => max_size,
        }
    }
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        Self::FixedLength {
            size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Hands out one [`ChunkProvider`] per stream for a fixed strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkProviderFactory {
    strategy: ChunkingStrategy,
}

impl ChunkProviderFactory {
    /// Create a factory, validating the strategy once up front.
    pub fn new(strategy: ChunkingStrategy) -> ChunkResult<Self> {
        strategy.validate()?;
        Ok(Self { strategy })
    }

    /// The strategy this factory applies.
    pub fn strategy(&self) -> ChunkingStrategy {
        self.strategy
    }

    /// Create a provider that takes ownership of `reader`.
    pub fn new_instance<'a, R>(&self, reader: R) -> ChunkResult<Box<dyn ChunkProvider + Send + 'a>>
    where
        R: Read + Send + 'a,
    {
        debug!(strategy = ?self.strategy, "new chunk provider");
        Ok(match self.strategy {
            ChunkingStrategy::FixedLength { size } => {
                Box::new(FixedLengthChunkProvider::new(reader, size)?)
            }
            ChunkingStrategy::ContentDefined {
                min_size,
                avg_size,
                max_size,
            } => Box::new(ContentDefinedChunkProvider::new(
                reader, min_size, avg_size, max_size,
            )?),
        })
    }
}

impl Default for ChunkProviderFactory {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::default(),
        }
    }
}
