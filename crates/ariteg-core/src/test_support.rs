use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use ariteg_chunk::ChunkingStrategy;
use ariteg_index::InMemoryProtoMetaRepository;
use ariteg_store::{InMemoryObjectStore, ObjectStore, StoreError, StoreResult};
use ariteg_types::{Multihash, StorageStatus};

use crate::config::AritegConfig;
use crate::pipeline::Ariteg;

pub(crate) const CHUNK: usize = 16;

pub(crate) struct Harness {
    pub ariteg: Ariteg,
    pub store: Arc<InMemoryObjectStore>,
    pub index: Arc<InMemoryProtoMetaRepository>,
}

/// Small fixed chunks so short inputs span several blobs.
pub(crate) fn config() -> AritegConfig {
    AritegConfig {
        chunking: ChunkingStrategy::FixedLength { size: CHUNK },
        ..AritegConfig::default()
    }
}

pub(crate) fn harness() -> Harness {
    harness_with(config())
}

pub(crate) fn harness_with(config: AritegConfig) -> Harness {
    let store = Arc::new(InMemoryObjectStore::new());
    let index = Arc::new(InMemoryProtoMetaRepository::new());
    let ariteg = Ariteg::new(store.clone(), index.clone(), config).unwrap();
    Harness {
        ariteg,
        store,
        index,
    }
}

/// Backend whose every call fails.
pub(crate) struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::Other, "backend offline"))
}

impl ObjectStore for BrokenStore {
    fn exists(&self, _digest: &Multihash) -> StoreResult<bool> {
        Ok(false)
    }

    fn put(&self, _digest: &Multihash, _data: &[u8]) -> StoreResult<()> {
        Err(broken())
    }

    fn get(&self, _digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        Err(broken())
    }

    fn delete(&self, _digest: &Multihash) -> StoreResult<bool> {
        Err(broken())
    }

    fn status(&self, _digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        Err(broken())
    }
}

pub(crate) fn broken_pipeline() -> Ariteg {
    Ariteg::new(
        Arc::new(BrokenStore),
        Arc::new(InMemoryProtoMetaRepository::new()),
        config(),
    )
    .unwrap()
}

/// In-memory backend whose puts block until [`GatedStore::open`].
pub(crate) struct GatedStore {
    pub inner: InMemoryObjectStore,
    waiting: AtomicUsize,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedStore {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    /// Puts currently blocked at the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl ObjectStore for GatedStore {
    fn exists(&self, digest: &Multihash) -> StoreResult<bool> {
        self.inner.exists(digest)
    }

    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        self.inner.put(digest, data)
    }

    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(digest)
    }

    fn delete(&self, digest: &Multihash) -> StoreResult<bool> {
        self.inner.delete(digest)
    }

    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        self.inner.status(digest)
    }
}

pub(crate) fn gated_pipeline() -> (Ariteg, Arc<GatedStore>) {
    let store = Arc::new(GatedStore {
        inner: InMemoryObjectStore::new(),
        waiting: AtomicUsize::new(0),
        open: Mutex::new(false),
        opened: Condvar::new(),
    });
    let ariteg = Ariteg::new(
        store.clone(),
        Arc::new(InMemoryProtoMetaRepository::new()),
        config(),
    )
    .unwrap();
    (ariteg, store)
}
