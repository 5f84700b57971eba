//! Content-defined chunking with a Gear rolling hash.
//!
//! Boundaries follow the FastCDC scheme: no cut before `min_size`, a strict
//! mask up to `avg_size`, a looser mask after it, and a forced cut at
//! `max_size`. Because a boundary depends only on the bytes just before it,
//! an insertion early in a stream shifts at most a few chunks.

use std::io::Read;

use crate::error::{ChunkError, ChunkResult};
use crate::provider::{check_max_size, read_full, ChunkProvider};

/// Smallest average chunk size accepted.
pub const MIN_AVG_SIZE: usize = 64;

const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    (state, z ^ (z >> 31))
}

const fn gear_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut state = 0x4172_6974_6567_0001; // fixed seed: boundaries must never change
    let mut i = 0;
    while i < 256 {
        let (next, value) = splitmix64(state);
        state = next;
        table[i] = value;
        i += 1;
    }
    table
}

static GEAR: [u64; 256] = gear_table();

/// Mask with `bits` ones in the most significant positions.
fn top_mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else {
        !0u64 << (64 - bits.min(64))
    }
}

/// Splits a stream at content-defined boundaries.
pub struct ContentDefinedChunkProvider<R> {
    reader: R,
    min_size: usize,
    avg_size: usize,
    max_size: usize,
    mask_small: u64,
    mask_large: u64,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Read> ContentDefinedChunkProvider<R> {
    /// Wrap `reader` with the given size bounds.
    ///
    /// Requires `0 < min_size <= avg_size <= max_size` and
    /// `avg_size >= MIN_AVG_SIZE`.
    pub fn new(reader: R, min_size: usize, avg_size: usize, max_size: usize) -> ChunkResult<Self> {
        validate(min_size, avg_size, max_size)?;
        let bits = avg_size.ilog2();
        Ok(Self {
            reader,
            min_size,
            avg_size,
            max_size,
            mask_small: top_mask(bits + 1),
            mask_large: top_mask(bits - 1),
            pending: Vec::with_capacity(max_size),
            eof: false,
        })
    }

    /// Release the source stream. Buffered but unreturned bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> ChunkResult<()> {
        while !self.eof && self.pending.len() < self.max_size {
            let start = self.pending.len();
            self.pending.resize(self.max_size, 0);
            match read_full(&mut self.reader, &mut self.pending[start..]) {
                Ok(n) => {
                    self.pending.truncate(start + n);
                    if n == 0 {
                        self.eof = true;
                    }
                }
                Err(e) => {
                    self.pending.truncate(start);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Length of the next chunk at the front of `data`.
    fn boundary(&self, data: &[u8]) -> usize {
        if data.len() <= self.min_size {
            return data.len();
        }
        let end = data.len().min(self.max_size);
        let normal = self.avg_size.min(end);
        let mut hash = 0u64;
        for (i, byte) in data.iter().enumerate().take(normal).skip(self.min_size) {
            hash = (hash << 1).wrapping_add(GEAR[*byte as usize]);
            if hash & self.mask_small == 0 {
                return i + 1;
            }
        }
        for (i, byte) in data.iter().enumerate().take(end).skip(normal) {
            hash = (hash << 1).wrapping_add(GEAR[*byte as usize]);
            if hash & self.mask_large == 0 {
                return i + 1;
            }
        }
        end
    }
}

pub(crate) fn validate(min_size: usize, avg_size: usize, max_size: usize) -> ChunkResult<()> {
    if min_size == 0 || min_size > avg_size || avg_size > max_size {
        return Err(ChunkError::InvalidConfig(format!(
            "content-defined sizes must satisfy 0 < min <= avg <= max (got {min_size}/{avg_size}/{max_size})"
        )));
    }
    if avg_size < MIN_AVG_SIZE {
        return Err(ChunkError::InvalidConfig(format!(
            "average chunk size must be at least {MIN_AVG_SIZE} bytes (got {avg_size})"
        )));
    }
    check_max_size(max_size)
}

impl<R: Read> ChunkProvider for ContentDefinedChunkProvider<R> {
    fn next_chunk(&mut self) -> ChunkResult<Vec<u8>> {
        self.fill()?;
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let cut = self.boundary(&self.pending);
        let rest = self.pending.split_off(cut);
        Ok(std::mem::replace(&mut self.pending, rest))
    }
}

impl<R> std::fmt::Debug for ContentDefinedChunkProvider<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentDefinedChunkProvider")
            .field("min_size", &self.min_size)
            .field("avg_size", &self.avg_size)
            .field("max_size", &self.max_size)
            .field("buffered", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;
    use crate::provider::test_support::Trickle;

    fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill_bytes(&mut data);
        data
    }

    fn split<R: Read>(reader: R) -> Vec<Vec<u8>> {
        let mut provider = ContentDefinedChunkProvider::new(reader, 256, 1024, 4096).unwrap();
        provider.chunks().collect::<ChunkResult<Vec<_>>>().unwrap()
    }

    #[test]
    fn gear_table_is_stable() {
        // Changing the table would silently change every boundary.
        assert_eq!(GEAR.len(), 256);
        assert_ne!(GEAR[0], GEAR[1]);
        assert_eq!(GEAR, gear_table());
    }

    #[test]
    fn reproduces_input_and_respects_bounds() {
        let data = random_bytes(1, 64 * 1024);
        let chunks = split(Cursor::new(data.clone()));
        assert!(chunks.len() > 4);
        let (last, body) = chunks.split_last().unwrap();
        assert!(body.iter().all(|c| c.len() >= 256 && c.len() <= 4096));
        assert!(!last.is_empty() && last.len() <= 4096);
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn deterministic_across_read_patterns() {
        let data = random_bytes(2, 20_000);
        let whole = split(Cursor::new(data.clone()));
        let trickled = split(Trickle { data: &data, step: 7 });
        assert_eq!(whole, trickled);
    }

    #[test]
    fn insertion_only_disturbs_nearby_chunks() {
        let data = random_bytes(3, 64 * 1024);
        let edited = [&data[..100], &b"inserted bytes"[..], &data[100..]].concat();

        let before = split(Cursor::new(data));
        let after = split(Cursor::new(edited));
        let shared = after.iter().filter(|c| before.contains(c)).count();
        assert!(shared * 2 > before.len(), "shared {shared} of {}", before.len());
    }

    #[test]
    fn constant_input_stays_in_bounds() {
        let data = vec![0u8; 10_000];
        let chunks = split(Cursor::new(data));
        assert!(chunks.iter().all(|c| c.len() <= 4096));
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 10_000);
    }

    #[test]
    fn short_input_is_one_chunk() {
        let mut provider =
            ContentDefinedChunkProvider::new(Cursor::new(b"tiny".to_vec()), 256, 1024, 4096).unwrap();
        assert_eq!(provider.next_chunk().unwrap(), b"tiny");
        assert!(provider.next_chunk().unwrap().is_empty());
        assert!(provider.next_chunk().unwrap().is_empty());
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        for (min, avg, max) in [
            (0, 1024, 4096),
            (2048, 1024, 4096),
            (256, 8192, 4096),
            (8, 16, 32),
            (1024, 4096, usize::MAX),
        ] {
            let err = ContentDefinedChunkProvider::new(Cursor::new(Vec::new()), min, avg, max).unwrap_err();
            assert!(matches!(err, ChunkError::InvalidConfig(_)));
        }
    }

    proptest! {
        #[test]
        fn concatenation_is_lossless(data in proptest::collection::vec(any::<u8>(), 0..5000)) {
            let mut provider = ContentDefinedChunkProvider::new(Cursor::new(data.clone()), 64, 128, 512).unwrap();
            let chunks = provider.chunks().collect::<ChunkResult<Vec<_>>>().unwrap();
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 512));
            prop_assert_eq!(chunks.concat(), data);
        }
    }
}
