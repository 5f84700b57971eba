use std::io::Read;
use std::sync::Arc;

use ariteg_chunk::ChunkProviderFactory;
use ariteg_crypto::MultihashRegistry;
use ariteg_index::{IndexError, ProtoMetaRepository};
use ariteg_store::{List, Node, ObjectStore, StoreError, Tree, TreeEntry};
use ariteg_types::{AritegLink, LinkType, ProtoMeta};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task;
use tracing::{debug, info, warn};

use crate::commit::CommitDraft;
use crate::config::{AritegConfig, ConfigError};
use crate::error::{AritegError, AritegResult, Direction, Stage};
use crate::receipt::{Completion, StoreReceipt, WriteOutcome};

/// The Ariteg store/restore pipeline.
///
/// Cheap to clone; clones share the backing store, the integrity index and
/// the write semaphore. Store and restore operations are `async` and must
/// run inside a tokio runtime. Backend calls are blocking and run on
/// tokio's blocking pool.
#[derive(Clone)]
pub struct Ariteg {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) index: Arc<dyn ProtoMetaRepository>,
    pub(crate) registry: Arc<MultihashRegistry>,
    chunker: ChunkProviderFactory,
    config: AritegConfig,
    write_permits: Arc<Semaphore>,
}

impl Ariteg {
    /// Create a pipeline with the built-in hash providers.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn ProtoMetaRepository>,
        config: AritegConfig,
    ) -> AritegResult<Self> {
        Self::with_registry(store, index, MultihashRegistry::default(), config)
    }

    /// Create a pipeline with a custom provider registry.
    pub fn with_registry(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn ProtoMetaRepository>,
        registry: MultihashRegistry,
        config: AritegConfig,
    ) -> AritegResult<Self> {
        config.validate()?;
        let chunker = ChunkProviderFactory::new(config.chunking)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        info!(
            primary = %config.primary_algorithm,
            secondary = %config.secondary_algorithm,
            max_in_flight_writes = config.max_in_flight_writes,
            "pipeline ready"
        );
        Ok(Self {
            store,
            index,
            registry: Arc::new(registry),
            chunker,
            write_permits: Arc::new(Semaphore::new(config.max_in_flight_writes)),
            config,
        })
    }

    pub fn config(&self) -> &AritegConfig {
        &self.config
    }

    pub fn registry(&self) -> &MultihashRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<dyn ProtoMetaRepository> {
        &self.index
    }

    // ---- Store operations ----

    /// Store one blob.
    pub async fn store_blob(&self, data: Vec<u8>) -> AritegResult<StoreReceipt> {
        let (link, meta) = self.address(LinkType::Blob, &data)?;
        self.spawn_write(link, meta, data).await
    }

    /// Chunk a stream and store it.
    ///
    /// An empty stream is stored as the empty blob and a single-chunk
    /// stream as that chunk's blob. Anything longer becomes a list whose
    /// write waits for every chunk write and fails with the first chunk
    /// failure. Chunks are stored while the stream is still being read;
    /// the write semaphore bounds how many are held at once.
    pub async fn store_stream<R>(&self, reader: R) -> AritegResult<StoreReceipt>
    where
        R: Read + Send + 'static,
    {
        let mut provider = self
            .chunker
            .new_instance(reader)
            .map_err(|e| AritegError::stage(Stage::Chunk, Direction::Store, "stream", e))?;
        let mut children: Vec<StoreReceipt> = Vec::new();
        loop {
            let (returned, chunk) = task::spawn_blocking(move || {
                let chunk = provider.next_chunk();
                (provider, chunk)
            })
            .await
            .map_err(|e| AritegError::stage(Stage::Chunk, Direction::Store, "stream", e))?;
            provider = returned;
            let chunk = chunk.map_err(|e| {
                AritegError::stage(
                    Stage::Chunk,
                    Direction::Store,
                    format!("chunk {}", children.len()),
                    e,
                )
            })?;
            if chunk.is_empty() {
                break;
            }
            children.push(self.store_blob(chunk).await?);
        }

        if children.len() <= 1 {
            return match children.pop() {
                Some(only) => Ok(only),
                None => self.store_blob(Vec::new()).await,
            };
        }
        self.store_list(children).await
    }

    /// Store a tree. Every entry must already be persisted.
    pub async fn store_tree(&self, entries: Vec<TreeEntry>) -> AritegResult<StoreReceipt> {
        let tree = Tree::new(entries)
            .map_err(|e| AritegError::stage(Stage::Tree, Direction::Store, "tree", e))?;
        self.store_node(tree).await
    }

    /// Store a commit. Its root and parents must already be persisted, and
    /// every parent must be a commit.
    pub async fn store_commit(&self, draft: CommitDraft) -> AritegResult<StoreReceipt> {
        let commit = draft.into_commit();
        if let Some(bad) = commit
            .parents
            .iter()
            .find(|p| p.link_type != LinkType::Commit)
        {
            return Err(AritegError::LinkTypeMismatch {
                link: bad.clone(),
                expected: LinkType::Commit,
            });
        }
        self.store_node(commit).await
    }

    async fn store_list(&self, children: Vec<StoreReceipt>) -> AritegResult<StoreReceipt> {
        let list = List::new(children.iter().map(|r| r.link.clone()).collect());
        let bytes = list
            .encode()
            .map_err(|e| AritegError::stage(Stage::List, Direction::Store, "list", e))?;
        let (link, meta) = self.address(LinkType::List, &bytes)?;
        info!(link = %link.short(), chunks = children.len(), "stream chunked");

        let pipeline = self.clone();
        let target = link.clone();
        let handle = tokio::spawn(async move {
            for child in children {
                if let WriteOutcome::Failed(err) = child.completion.await {
                    warn!(list = %target.short(), child = %child.link.short(), "chunk write failed");
                    return WriteOutcome::Failed(err);
                }
            }
            match pipeline.spawn_write(target, meta, bytes).await {
                Ok(receipt) => receipt.completion.await,
                Err(err) => WriteOutcome::Failed(err),
            }
        });
        Ok(StoreReceipt {
            completion: Completion::new(link.clone(), Stage::List, handle),
            link,
        })
    }

    async fn store_node<N: Node>(&self, node: N) -> AritegResult<StoreReceipt> {
        let stage = Stage::from(N::LINK_TYPE);
        let children: Vec<AritegLink> = node.children().into_iter().cloned().collect();
        self.ensure_present(stage, children).await?;
        let bytes = node
            .encode()
            .map_err(|e| AritegError::stage(stage, Direction::Store, N::LINK_TYPE, e))?;
        let (link, meta) = self.address(N::LINK_TYPE, &bytes)?;
        self.spawn_write(link, meta, bytes).await
    }

    /// Fail with [`AritegError::MissingChild`] unless every link resolves.
    async fn ensure_present(&self, parent_stage: Stage, children: Vec<AritegLink>) -> AritegResult<()> {
        if children.is_empty() {
            return Ok(());
        }
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || {
            for child in children {
                let present = store.exists(&child.multihash).map_err(|e| {
                    AritegError::stage(Stage::from(child.link_type), Direction::Store, &child, e)
                })?;
                if !present {
                    return Err(AritegError::MissingChild {
                        parent_stage,
                        child,
                    });
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| AritegError::stage(parent_stage, Direction::Store, "children", e))?
    }

    /// Primary link and integrity record for the bytes that will be put.
    fn address(&self, link_type: LinkType, bytes: &[u8]) -> AritegResult<(AritegLink, ProtoMeta)> {
        let primary = self.registry.digest(self.config.primary_algorithm, bytes)?;
        let secondary = self.registry.digest(self.config.secondary_algorithm, bytes)?;
        let meta = ProtoMeta::new(&primary, &secondary);
        Ok((AritegLink::new(link_type, primary), meta))
    }

    async fn spawn_write(
        &self,
        link: AritegLink,
        meta: ProtoMeta,
        bytes: Vec<u8>,
    ) -> AritegResult<StoreReceipt> {
        let permit = self.acquire_write_permit(&link).await?;
        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let target = link.clone();
        let handle = task::spawn_blocking(move || {
            let _permit = permit;
            persist(store.as_ref(), index.as_ref(), &target, &meta, &bytes)
        });
        Ok(StoreReceipt {
            completion: Completion::new(link.clone(), Stage::from(link.link_type), handle),
            link,
        })
    }

    async fn acquire_write_permit(&self, link: &AritegLink) -> AritegResult<OwnedSemaphorePermit> {
        Arc::clone(&self.write_permits)
            .acquire_owned()
            .await
            .map_err(|_| AritegError::Cancelled { link: link.clone() })
    }
}

impl std::fmt::Debug for Ariteg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ariteg")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("available_write_permits", &self.write_permits.available_permits())
            .finish()
    }
}

fn persist(
    store: &dyn ObjectStore,
    index: &dyn ProtoMetaRepository,
    link: &AritegLink,
    meta: &ProtoMeta,
    bytes: &[u8],
) -> WriteOutcome {
    match try_persist(store, index, link, meta, bytes) {
        Ok(true) => {
            debug!(link = %link.short(), bytes = bytes.len(), "object written");
            WriteOutcome::Written(link.multihash.clone())
        }
        Ok(false) => {
            debug!(link = %link.short(), "object already stored");
            WriteOutcome::AlreadyExists
        }
        Err(err) => {
            warn!(link = %link.short(), error = %err, "object write failed");
            WriteOutcome::Failed(err)
        }
    }
}

/// Returns `true` if new bytes were put.
fn try_persist(
    store: &dyn ObjectStore,
    index: &dyn ProtoMetaRepository,
    link: &AritegLink,
    meta: &ProtoMeta,
    bytes: &[u8],
) -> AritegResult<bool> {
    let stage = Stage::from(link.link_type);
    let store_err = |e: StoreError| AritegError::stage(stage, Direction::Store, link, e);
    let index_err = |e: IndexError| AritegError::stage(Stage::Index, Direction::Store, link, e);

    if store.exists(&link.multihash).map_err(store_err)? {
        // A crash between put and save leaves an object without a record.
        if !index.exists(&meta.primary_hash).map_err(index_err)? {
            index.save(meta).map_err(index_err)?;
            debug!(link = %link.short(), "integrity record repaired");
        }
        return Ok(false);
    }
    store.put(&link.multihash, bytes).map_err(store_err)?;
    index.save(meta).map_err(index_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ariteg_chunk::ChunkingStrategy;
    use ariteg_index::InMemoryProtoMetaRepository;
    use ariteg_store::{InMemoryObjectStore, ZstdObjectStore};
    use ariteg_types::{HashAlgorithm, Multihash};
    use proptest::prelude::*;

    use super::*;
    use crate::test_support::{broken_pipeline, config, gated_pipeline, harness, harness_with, CHUNK};

    fn sha512(data: &[u8]) -> Multihash {
        MultihashRegistry::default()
            .digest(HashAlgorithm::Sha2_512, data)
            .unwrap()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    // -----------------------------------------------------------------------
    // Blobs and dedup
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn blob_write_resolves_to_its_digest() {
        let h = harness();
        let receipt = h.ariteg.store_blob(b"hello".to_vec()).await.unwrap();
        assert_eq!(receipt.link.link_type, LinkType::Blob);
        assert_eq!(receipt.link.multihash.algorithm(), HashAlgorithm::Blake3);

        let link = receipt.link.clone();
        match receipt.completion.await {
            WriteOutcome::Written(digest) => assert_eq!(digest, link.multihash),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(h.ariteg.restore_blob(&link).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn storing_twice_dedups() {
        let h = harness();
        let first = h.ariteg.store_blob(b"same".to_vec()).await.unwrap();
        let first_link = first.link.clone();
        assert!(first.completion.await.is_written());

        let second = h.ariteg.store_blob(b"same".to_vec()).await.unwrap();
        assert_eq!(second.link, first_link);
        assert!(second.completion.await.is_already_exists());
        assert_eq!(h.store.write_count(), 1);
    }

    #[tokio::test]
    async fn integrity_record_pairs_content_and_committed_hash() {
        let h = harness();
        let link = h.ariteg.store_blob(b"indexed".to_vec()).await.unwrap().durable().await.unwrap();
        let primary = link.multihash.to_hex();

        let meta = h.index.get(&primary).unwrap().unwrap();
        assert_eq!(meta.primary_hash, primary);
        assert_eq!(meta.secondary_hash, sha512(b"indexed").to_hex());
        assert!(h.index.exists_pair(&primary, &meta.secondary_hash).unwrap());

        assert!(h.index.delete(&primary).unwrap());
        assert!(!h.index.exists(&primary).unwrap());
    }

    #[tokio::test]
    async fn dedup_hit_repairs_missing_integrity_record() {
        let h = harness();
        let link = h.ariteg.store_blob(b"orphan".to_vec()).await.unwrap().durable().await.unwrap();
        h.index.delete(&link.multihash.to_hex()).unwrap();

        let again = h.ariteg.store_blob(b"orphan".to_vec()).await.unwrap();
        assert!(again.completion.await.is_already_exists());
        assert!(h.index.exists(&link.multihash.to_hex()).unwrap());
    }

    #[tokio::test]
    async fn unsupported_primary_algorithm_is_a_capability_error() {
        let h = harness_with(AritegConfig {
            primary_algorithm: HashAlgorithm::Sha3_256,
            ..config()
        });
        let err = h.ariteg.store_blob(b"x".to_vec()).await.unwrap_err();
        assert!(err.is_unsupported());
        assert!(h.store.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Ariteg::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryProtoMetaRepository::new()),
            AritegConfig {
                max_in_flight_writes: 0,
                ..config()
            },
        );
        assert!(matches!(result, Err(AritegError::Config(_))));
    }

    // -----------------------------------------------------------------------
    // Streams
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn multi_chunk_stream_becomes_a_list() {
        let h = harness();
        let data = pattern(CHUNK * 2 + 8);
        let receipt = h.ariteg.store_stream(Cursor::new(data.clone())).await.unwrap();
        assert_eq!(receipt.link.link_type, LinkType::List);
        let link = receipt.durable().await.unwrap();

        let list = h.ariteg.restore_list(&link).await.unwrap();
        assert_eq!(list.links.len(), 3);
        assert!(list.links.iter().all(|l| l.link_type == LinkType::Blob));
        assert_eq!(h.store.len(), 4);
        assert_eq!(h.ariteg.restore_bytes(&link).await.unwrap(), data);
    }

    #[tokio::test]
    async fn single_chunk_stream_is_a_blob() {
        let h = harness();
        let direct = h.ariteg.store_blob(b"short".to_vec()).await.unwrap().link;
        let streamed = h.ariteg.store_stream(Cursor::new(b"short".to_vec())).await.unwrap();
        assert_eq!(streamed.link, direct);
    }

    #[tokio::test]
    async fn empty_stream_is_the_empty_blob() {
        let h = harness();
        let link = h
            .ariteg
            .store_stream(std::io::empty())
            .await
            .unwrap()
            .durable()
            .await
            .unwrap();
        assert_eq!(link.link_type, LinkType::Blob);
        assert!(h.ariteg.restore_bytes(&link).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restreaming_dedups_every_chunk() {
        let h = harness();
        let data = pattern(CHUNK * 5);
        h.ariteg.store_stream(Cursor::new(data.clone())).await.unwrap().durable().await.unwrap();
        let writes = h.store.write_count();

        let again = h.ariteg.store_stream(Cursor::new(data)).await.unwrap();
        assert!(again.completion.await.is_already_exists());
        assert_eq!(h.store.write_count(), writes);
    }

    #[tokio::test]
    async fn one_write_permit_still_drains() {
        let h = harness_with(AritegConfig {
            max_in_flight_writes: 1,
            ..config()
        });
        let data = pattern(CHUNK * 12 + 3);
        let link = h.ariteg.store_stream(Cursor::new(data.clone())).await.unwrap().durable().await.unwrap();
        assert_eq!(h.ariteg.restore_bytes(&link).await.unwrap(), data);
    }

    #[tokio::test]
    async fn content_defined_chunking_round_trips() {
        let h = harness_with(AritegConfig {
            chunking: ChunkingStrategy::content_defined(256),
            ..config()
        });
        let data = pattern(10_000);
        let link = h.ariteg.store_stream(Cursor::new(data.clone())).await.unwrap().durable().await.unwrap();
        assert_eq!(link.link_type, LinkType::List);
        assert_eq!(h.ariteg.restore_bytes(&link).await.unwrap(), data);
    }

    #[tokio::test]
    async fn stream_read_error_is_a_chunk_stage_error() {
        struct Unreadable;
        impl Read for Unreadable {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "bad sector"))
            }
        }

        let h = harness();
        let err = h.ariteg.store_stream(Unreadable).await.unwrap_err();
        assert!(matches!(
            err,
            AritegError::Stage {
                stage: Stage::Chunk,
                direction: Direction::Store,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Concurrency and cancellation
    // -----------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_of_same_content_converge() {
        let h = harness();
        let data = pattern(CHUNK * 6 + 5);
        let blob = b"shared blob".to_vec();
        let spawn_stream = |ariteg: Ariteg, data: Vec<u8>| {
            tokio::spawn(async move { ariteg.store_stream(Cursor::new(data)).await })
        };
        let spawn_blob =
            |ariteg: Ariteg, data: Vec<u8>| tokio::spawn(async move { ariteg.store_blob(data).await });

        let (s1, s2, b1, b2) = tokio::join!(
            spawn_stream(h.ariteg.clone(), data.clone()),
            spawn_stream(h.ariteg.clone(), data.clone()),
            spawn_blob(h.ariteg.clone(), blob.clone()),
            spawn_blob(h.ariteg.clone(), blob.clone()),
        );
        let receipts: Vec<StoreReceipt> = [s1, s2, b1, b2]
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();
        assert_eq!(receipts[0].link, receipts[1].link);
        assert_eq!(receipts[2].link, receipts[3].link);
        let stream_link = receipts[0].link.clone();
        let blob_link = receipts[2].link.clone();

        for receipt in receipts {
            let outcome = receipt.completion.await;
            assert!(!matches!(outcome, WriteOutcome::Failed(_)), "{outcome:?}");
        }
        // Seven chunks, their list, and the blob; each stored once.
        assert_eq!(h.store.len(), 9);
        assert_eq!(h.store.write_count(), 9);
        assert_eq!(h.ariteg.restore_bytes(&stream_link).await.unwrap(), data);
        assert_eq!(h.ariteg.restore_blob(&blob_link).await.unwrap(), blob);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn aborting_a_list_waiting_on_chunks_cancels_only_the_list() {
        let (ariteg, gate) = gated_pipeline();
        let data = pattern(CHUNK * 3);
        let receipt = ariteg.store_stream(Cursor::new(data.clone())).await.unwrap();
        assert_eq!(receipt.link.link_type, LinkType::List);
        let list_link = receipt.link.clone();

        receipt.completion.abort();
        match receipt.completion.await {
            WriteOutcome::Failed(AritegError::Cancelled { link }) => assert_eq!(link, list_link),
            other => panic!("unexpected outcome: {other:?}"),
        }

        gate.open();
        while gate.waiting() > 0 || gate.inner.len() < 3 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert!(!gate.inner.exists(&list_link.multihash).unwrap());

        // Storing again writes only the list; the chunks landed regardless.
        let again = ariteg.store_stream(Cursor::new(data.clone())).await.unwrap();
        assert!(again.completion.await.is_written());
        assert_eq!(gate.inner.write_count(), 4);
        assert_eq!(ariteg.restore_bytes(&list_link).await.unwrap(), data);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn aborting_a_running_write_still_resolves() {
        let (ariteg, gate) = gated_pipeline();
        let receipt = ariteg.store_blob(b"in flight".to_vec()).await.unwrap();
        while gate.waiting() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        receipt.completion.abort();
        gate.open();
        assert!(receipt.completion.await.is_written());

        let again = ariteg.store_blob(b"in flight".to_vec()).await.unwrap();
        assert!(again.completion.await.is_already_exists());
        assert_eq!(gate.inner.write_count(), 1);
        assert_eq!(ariteg.restore_blob(&again.link).await.unwrap(), b"in flight");
    }

    // -----------------------------------------------------------------------
    // Trees and commits
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn tree_requires_persisted_children() {
        let h = harness();
        let pending = h.ariteg.registry().digest(HashAlgorithm::Blake3, b"never stored").unwrap();
        let err = h
            .ariteg
            .store_tree(vec![TreeEntry::new("ghost", AritegLink::blob(pending))])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AritegError::MissingChild {
                parent_stage: Stage::Tree,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn tree_order_is_part_of_identity() {
        let h = harness();
        let a = h.ariteg.store_blob(b"a".to_vec()).await.unwrap().durable().await.unwrap();
        let b = h.ariteg.store_blob(b"b".to_vec()).await.unwrap().durable().await.unwrap();

        let ab = vec![TreeEntry::new("b.txt", b.clone()), TreeEntry::new("a.txt", a.clone())];
        let ba = vec![TreeEntry::new("a.txt", a), TreeEntry::new("b.txt", b)];
        let first = h.ariteg.store_tree(ab).await.unwrap().durable().await.unwrap();
        let second = h.ariteg.store_tree(ba).await.unwrap().durable().await.unwrap();
        assert_ne!(first, second);

        let tree = h.ariteg.restore_tree(&first).await.unwrap();
        let names: Vec<&str> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn duplicate_tree_names_keep_store_error_as_source() {
        use std::error::Error;

        let h = harness();
        let a = h.ariteg.store_blob(b"a".to_vec()).await.unwrap().durable().await.unwrap();
        let err = h
            .ariteg
            .store_tree(vec![TreeEntry::new("x", a.clone()), TreeEntry::new("x", a)])
            .await
            .unwrap_err();
        assert!(matches!(err, AritegError::Stage { stage: Stage::Tree, .. }));
        let source = err.source().and_then(|s| s.downcast_ref::<StoreError>());
        assert!(matches!(source, Some(StoreError::DuplicateEntry(name)) if name == "x"));
    }

    #[tokio::test]
    async fn identical_commits_collapse() {
        let h = harness();
        let root = h.ariteg.store_tree(Vec::new()).await.unwrap().durable().await.unwrap();
        let draft = CommitDraft::new(root)
            .with_message("first")
            .with_author("archiver")
            .with_timestamp(1_700_000_000_000);

        let first = h.ariteg.store_commit(draft.clone()).await.unwrap();
        let first_link = first.link.clone();
        assert!(first.completion.await.is_written());
        let second = h.ariteg.store_commit(draft).await.unwrap();
        assert_eq!(second.link, first_link);
        assert!(second.completion.await.is_already_exists());

        let commit = h.ariteg.restore_commit(&first_link).await.unwrap();
        assert_eq!(commit.message, "first");
        assert_eq!(commit.unix_timestamp_ms, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn commit_history_links_parents() {
        let h = harness();
        let root = h.ariteg.store_blob(b"v1".to_vec()).await.unwrap().durable().await.unwrap();
        let parent = h
            .ariteg
            .store_commit(CommitDraft::new(root.clone()).with_timestamp(1))
            .await
            .unwrap()
            .durable()
            .await
            .unwrap();
        let child = h
            .ariteg
            .store_commit(CommitDraft::new(root).with_parent(parent.clone()).with_timestamp(2))
            .await
            .unwrap()
            .durable()
            .await
            .unwrap();
        assert_eq!(h.ariteg.restore_commit(&child).await.unwrap().parents, vec![parent]);
    }

    #[tokio::test]
    async fn commit_parent_must_be_a_commit() {
        let h = harness();
        let root = h.ariteg.store_blob(b"r".to_vec()).await.unwrap().durable().await.unwrap();
        let err = h
            .ariteg
            .store_commit(CommitDraft::new(root.clone()).with_parent(root))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AritegError::LinkTypeMismatch {
                expected: LinkType::Commit,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn commit_requires_persisted_root() {
        let h = harness();
        let ghost = h.ariteg.registry().digest(HashAlgorithm::Blake3, b"ghost").unwrap();
        let err = h
            .ariteg
            .store_commit(CommitDraft::new(AritegLink::new(LinkType::Tree, ghost)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AritegError::MissingChild {
                parent_stage: Stage::Commit,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Backend failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failed_put_resolves_to_stage_error() {
        let ariteg = broken_pipeline();
        let receipt = ariteg.store_blob(b"lost".to_vec()).await.unwrap();
        match receipt.completion.await {
            WriteOutcome::Failed(AritegError::Stage {
                stage, direction, ..
            }) => {
                assert_eq!(stage, Stage::Blob);
                assert_eq!(direction, Direction::Store);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_fails_with_its_chunk_error() {
        let ariteg = broken_pipeline();
        let receipt = ariteg.store_stream(Cursor::new(pattern(CHUNK * 3))).await.unwrap();
        assert_eq!(receipt.link.link_type, LinkType::List);
        match receipt.completion.await {
            WriteOutcome::Failed(AritegError::Stage { stage, .. }) => assert_eq!(stage, Stage::Blob),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retry_after_partial_failure_resumes() {
        let h = harness();
        let data = pattern(CHUNK * 4);
        // First chunk already present, as if an earlier attempt got that far.
        h.ariteg.store_blob(data[..CHUNK].to_vec()).await.unwrap().durable().await.unwrap();

        let link = h.ariteg.store_stream(Cursor::new(data.clone())).await.unwrap().durable().await.unwrap();
        assert_eq!(h.store.write_count(), 5);
        assert_eq!(h.ariteg.restore_bytes(&link).await.unwrap(), data);
    }

    // -----------------------------------------------------------------------
    // Transforming backends
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn compressed_store_keeps_hashes_on_the_content() {
        let inner = Arc::new(InMemoryObjectStore::new());
        let index = Arc::new(InMemoryProtoMetaRepository::new());
        let ariteg = Ariteg::new(
            Arc::new(ZstdObjectStore::new(Arc::clone(&inner))),
            index.clone(),
            config(),
        )
        .unwrap();

        let data = vec![b'z'; 4096];
        let link = ariteg.store_blob(data.clone()).await.unwrap().durable().await.unwrap();
        assert_eq!(ariteg.restore_blob(&link).await.unwrap(), data);

        let raw = inner.get(&link.multihash).unwrap().unwrap();
        assert_ne!(raw, data);
        let meta = index.get(&link.multihash.to_hex()).unwrap().unwrap();
        assert_eq!(meta.secondary_hash, sha512(&data).to_hex());
        assert_ne!(meta.secondary_hash, sha512(&raw).to_hex());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn any_stream_round_trips(data in proptest::collection::vec(any::<u8>(), 0..200)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let restored = rt.block_on(async {
                let h = harness();
                let link = h
                    .ariteg
                    .store_stream(Cursor::new(data.clone()))
                    .await
                    .unwrap()
                    .durable()
                    .await
                    .unwrap();
                h.ariteg.restore_bytes(&link).await.unwrap()
            });
            prop_assert_eq!(restored, data);
        }
    }
}
