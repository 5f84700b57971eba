use std::sync::Arc;

use ariteg_types::ProtoMeta;

use crate::error::IndexResult;

/// Persistence contract for [`ProtoMeta`] records.
///
/// Records are keyed by `primary_hash`; there is at most one per key.
/// Implementations must be safe for concurrent use.
pub trait ProtoMetaRepository: Send + Sync {
    /// Exact lookup by primary hash.
    fn get(&self, primary_hash: &str) -> IndexResult<Option<ProtoMeta>>;

    /// Insert or replace the record for `meta.primary_hash`.
    fn save(&self, meta: &ProtoMeta) -> IndexResult<()>;

    /// Delete by primary hash. Returns `true` if a record existed.
    fn delete(&self, primary_hash: &str) -> IndexResult<bool>;

    /// Returns `true` if a record exists for `primary_hash`.
    fn exists(&self, primary_hash: &str) -> IndexResult<bool> {
        Ok(self.get(primary_hash)?.is_some())
    }

    /// Returns `true` if the record for `primary_hash` carries exactly
    /// `secondary_hash`.
    fn exists_pair(&self, primary_hash: &str, secondary_hash: &str) -> IndexResult<bool> {
        Ok(self
            .get(primary_hash)?
            .is_some_and(|meta| meta.secondary_hash == secondary_hash))
    }
}

impl<R: ProtoMetaRepository + ?Sized> ProtoMetaRepository for Arc<R> {
    fn get(&self, primary_hash: &str) -> IndexResult<Option<ProtoMeta>> {
        (**self).get(primary_hash)
    }

    fn save(&self, meta: &ProtoMeta) -> IndexResult<()> {
        (**self).save(meta)
    }

    fn delete(&self, primary_hash: &str) -> IndexResult<bool> {
        (**self).delete(primary_hash)
    }

    fn exists(&self, primary_hash: &str) -> IndexResult<bool> {
        (**self).exists(primary_hash)
    }

    fn exists_pair(&self, primary_hash: &str, secondary_hash: &str) -> IndexResult<bool> {
        (**self).exists_pair(primary_hash, secondary_hash)
    }
}
