use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use ariteg_types::{Multihash, StorageStatus};

use crate::error::StoreResult;
use crate::traits::ObjectStore;

struct MemoryEntry {
    data: Vec<u8>,
    status: Option<StorageStatus>,
}

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Besides the [`ObjectStore`] contract
/// it lets tests pin a [`StorageStatus`] on an object and overwrite stored
/// bytes to simulate corruption.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<Multihash, MemoryEntry>>,
    writes: AtomicU64,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|entry| entry.data.len() as u64)
            .sum()
    }

    /// Number of `put` calls that actually stored new bytes.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Pin the status reported for an object. Returns `false` if the object
    /// does not exist.
    pub fn set_status(&self, digest: &Multihash, status: StorageStatus) -> bool {
        match self.objects.write().expect("lock poisoned").get_mut(digest) {
            Some(entry) => {
                entry.status = Some(status);
                true
            }
            None => false,
        }
    }

    /// Overwrite the bytes behind `digest`, bypassing idempotence.
    ///
    /// Simulates bit rot or a misbehaving backend.
    pub fn replace_raw(&self, digest: &Multihash, data: Vec<u8>) {
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(digest.clone(), MemoryEntry { data, status: None });
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn exists(&self, digest: &Multihash) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(digest))
    }

    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: the same digest always maps to the same content.
        map.entry(digest.clone()).or_insert_with(|| {
            self.writes.fetch_add(1, Ordering::SeqCst);
            MemoryEntry {
                data: data.to_vec(),
                status: None,
            }
        });
        Ok(())
    }

    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(digest).map(|entry| entry.data.clone()))
    }

    fn delete(&self, digest: &Multihash) -> StoreResult<bool> {
        let mut map = self.objects.write().expect("lock poisoned");
        Ok(map.remove(digest).is_some())
    }

    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(digest).map(|entry| {
            entry
                .status
                .unwrap_or_else(|| StorageStatus::permanent(entry.data.len() as i64))
        }))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
