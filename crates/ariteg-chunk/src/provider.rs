use std::io::{ErrorKind, Read};

use crate::error::{ChunkError, ChunkResult};

/// Single-pass splitter of one byte stream.
///
/// Each call to [`next_chunk`](ChunkProvider::next_chunk) returns the next
/// piece of the stream. An empty vector means the stream is exhausted, and
/// every later call returns an empty vector again. A provider owns its
/// source; dropping the provider releases it.
pub trait ChunkProvider {
    /// Read the next chunk, or an empty vector at end of stream.
    fn next_chunk(&mut self) -> ChunkResult<Vec<u8>>;

    /// Iterate over the remaining non-empty chunks.
    fn chunks(&mut self) -> Chunks<'_, Self>
    where
        Self: Sized,
    {
        Chunks {
            provider: self,
            done: false,
        }
    }
}

impl<P: ChunkProvider + ?Sized> ChunkProvider for Box<P> {
    fn next_chunk(&mut self) -> ChunkResult<Vec<u8>> {
        (**self).next_chunk()
    }
}

/// Iterator over the non-empty chunks of a provider.
///
/// Stops at the end-of-stream sentinel or after the first error.
pub struct Chunks<'a, P: ChunkProvider + ?Sized> {
    provider: &'a mut P,
    done: bool,
}

impl<P: ChunkProvider + ?Sized> Iterator for Chunks<'_, P> {
    type Item = ChunkResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.provider.next_chunk() {
            Ok(chunk) if chunk.is_empty() => {
                self.done = true;
                None
            }
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Largest chunk any provider will buffer: 64 MiB.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Reject a chunk bound no provider can buffer.
pub(crate) fn check_max_size(size: usize) -> ChunkResult<()> {
    if size > MAX_CHUNK_SIZE {
        return Err(ChunkError::InvalidConfig(format!(
            "chunk size {size} exceeds the {MAX_CHUNK_SIZE}-byte limit"
        )));
    }
    Ok(())
}

/// Read into `buf` until it is full or the source reports EOF.
///
/// Short reads are accumulated so chunk boundaries never depend on how the
/// source happens to deliver bytes.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{self, Read};

    /// Source that returns at most `step` bytes per read call.
    pub struct Trickle<'a> {
        pub data: &'a [u8],
        pub step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Source that fails after yielding `ok_bytes`.
    pub struct Failing {
        pub ok_bytes: usize,
    }

    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ok_bytes == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "source went away"));
            }
            let n = self.ok_bytes.min(buf.len());
            buf[..n].fill(0x5a);
            self.ok_bytes -= n;
            Ok(n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Trickle;
    use super::*;

    #[test]
    fn read_full_accumulates_short_reads() {
        let data = [7u8; 10];
        let mut src = Trickle { data: &data, step: 3 };
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 8);
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 2);
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 0);
    }
}
