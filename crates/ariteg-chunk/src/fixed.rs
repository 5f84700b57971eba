use std::io::Read;

use crate::error::{ChunkError, ChunkResult};
use crate::provider::{check_max_size, read_full, ChunkProvider};

/// Splits a stream into chunks of exactly `size` bytes.
///
/// The last chunk may be shorter. A stream whose length is an exact multiple
/// of `size` ends with the empty sentinel and no short chunk; a stream
/// shorter than `size` yields one chunk and then the sentinel.
pub struct FixedLengthChunkProvider<R> {
    reader: R,
    buffer: Vec<u8>,
    finished: bool,
}

impl<R: Read> FixedLengthChunkProvider<R> {
    /// Wrap `reader`, cutting every `size` bytes.
    pub fn new(reader: R, size: usize) -> ChunkResult<Self> {
        if size == 0 {
            return Err(ChunkError::InvalidConfig(
                "fixed chunk size must be non-zero".to_string(),
            ));
        }
        check_max_size(size)?;
        Ok(Self {
            reader,
            buffer: vec![0u8; size],
            finished: false,
        })
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Release the source stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ChunkProvider for FixedLengthChunkProvider<R> {
    fn next_chunk(&mut self) -> ChunkResult<Vec<u8>> {
        if self.finished {
            return Ok(Vec::new());
        }
        let read = read_full(&mut self.reader, &mut self.buffer)?;
        if read < self.buffer.len() {
            self.finished = true;
        }
        Ok(self.buffer[..read].to_vec())
    }
}

impl<R> std::fmt::Debug for FixedLengthChunkProvider<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedLengthChunkProvider")
            .field("chunk_size", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}
