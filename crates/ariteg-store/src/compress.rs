use ariteg_types::{Multihash, StorageStatus};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Default zstd compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// Wraps a store and zstd-compresses everything it commits.
///
/// Callers still `put` and `get` the uncompressed representation; only the
/// inner store sees compressed bytes. The digest keying the inner store is
/// unchanged. [`ObjectStore::status`] reports the inner (compressed) size.
#[derive(Debug)]
pub struct ZstdObjectStore<S> {
    inner: S,
    level: i32,
}

impl<S: ObjectStore> ZstdObjectStore<S> {
    /// Wrap `inner` with the default compression level.
    pub fn new(inner: S) -> Self {
        Self::with_level(inner, DEFAULT_LEVEL)
    }

    /// Wrap `inner` with an explicit compression level.
    pub fn with_level(inner: S, level: i32) -> Self {
        Self { inner, level }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ObjectStore> ObjectStore for ZstdObjectStore<S> {
    fn exists(&self, digest: &Multihash) -> StoreResult<bool> {
        self.inner.exists(digest)
    }

    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()> {
        if self.inner.exists(digest)? {
            return Ok(());
        }
        let compressed = zstd::encode_all(data, self.level)
            .map_err(|e| StoreError::Compression(e.to_string()))?;
        self.inner.put(digest, &compressed)
    }

    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        match self.inner.get(digest)? {
            Some(compressed) => zstd::decode_all(compressed.as_slice())
                .map(Some)
                .map_err(|e| StoreError::Compression(e.to_string())),
            None => Ok(None),
        }
    }

    fn delete(&self, digest: &Multihash) -> StoreResult<bool> {
        self.inner.delete(digest)
    }

    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        self.inner.status(digest)
    }
}
