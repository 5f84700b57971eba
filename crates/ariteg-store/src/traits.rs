use std::sync::Arc;

use ariteg_types::{Multihash, StorageStatus};

use crate::error::StoreResult;

/// Backing store for Ariteg objects.
///
/// All implementations must satisfy these invariants:
/// - `put` is idempotent. Writing the same digest twice is a no-op, never
///   corruption; this is what makes a racy exists-then-put harmless.
/// - Objects are immutable once written.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents. It may transform what it
///   commits (compression, encryption) as long as `get` returns the bytes
///   that were given to `put`.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists.
    fn exists(&self, digest: &Multihash) -> StoreResult<bool>;

    /// Store `data` under `digest`. The caller has already computed the
    /// digest; the store does not recompute it.
    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()>;

    /// Read an object. Returns `Ok(None)` if it does not exist.
    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>>;

    /// Delete an object. Returns `true` if it existed.
    ///
    /// Intended for garbage collection only. Deleting referenced objects
    /// breaks every graph that points at them.
    fn delete(&self, digest: &Multihash) -> StoreResult<bool>;

    /// Availability window and size of an object, or `None` if it does not
    /// exist.
    ///
    /// The default treats every present object as permanently readable.
    /// Tiered backends (cold storage, retention policies) override this.
    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        Ok(self
            .get(digest)?
            .map(|data| StorageStatus::permanent(data.len() as i64)))
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn exists(&self, digest: &Multihash) -> StoreResult<bool> {
        (**self).exists(digest)
    }

    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()> {
        (**self).put(digest, data)
    }

    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(digest)
    }

    fn delete(&self, digest: &Multihash) -> StoreResult<bool> {
        (**self).delete(digest)
    }

    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        (**self).status(digest)
    }
}
