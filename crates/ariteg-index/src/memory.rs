use std::collections::HashMap;
use std::sync::RwLock;

use ariteg_types::ProtoMeta;

use crate::error::IndexResult;
use crate::repository::ProtoMetaRepository;

/// In-memory integrity index.
#[derive(Default)]
pub struct InMemoryProtoMetaRepository {
    records: RwLock<HashMap<String, ProtoMeta>>,
}

impl InMemoryProtoMetaRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProtoMetaRepository for InMemoryProtoMetaRepository {
    fn get(&self, primary_hash: &str) -> IndexResult<Option<ProtoMeta>> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(primary_hash).cloned())
    }

    fn save(&self, meta: &ProtoMeta) -> IndexResult<()> {
        let mut map = self.records.write().expect("lock poisoned");
        map.insert(meta.primary_hash.clone(), meta.clone());
        Ok(())
    }

    fn delete(&self, primary_hash: &str) -> IndexResult<bool> {
        let mut map = self.records.write().expect("lock poisoned");
        Ok(map.remove(primary_hash).is_some())
    }
}

impl std::fmt::Debug for InMemoryProtoMetaRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProtoMetaRepository")
            .field("record_count", &self.len())
            .finish()
    }
}
