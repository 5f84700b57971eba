use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use ariteg_crypto::MultihashRegistry;
use ariteg_index::ProtoMetaRepository;
use ariteg_store::{Commit, List, Node, ObjectStore, Tree};
use ariteg_types::{AritegLink, LinkType, Multihash, StorageStatus};
use serde::Serialize;
use tokio::task;
use tracing::{debug, info, warn};

use crate::error::{AritegError, AritegResult, Direction, Stage};
use crate::lifecycle::{self, Operation};
use crate::pipeline::Ariteg;

/// Node counts and stored bytes of a fully verified object graph.
///
/// Shared subgraphs are counted once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub blobs: usize,
    pub lists: usize,
    pub trees: usize,
    pub commits: usize,
    pub bytes: u64,
}

impl GraphSummary {
    pub fn nodes(&self) -> usize {
        self.blobs + self.lists + self.trees + self.commits
    }
}

impl Ariteg {
    // ---- Restore operations ----

    /// Fetch and verify one blob.
    pub async fn restore_blob(&self, link: &AritegLink) -> AritegResult<Vec<u8>> {
        expect_type(link, LinkType::Blob)?;
        self.fetch(link).await
    }

    pub async fn restore_list(&self, link: &AritegLink) -> AritegResult<List> {
        self.restore_node(link).await
    }

    pub async fn restore_tree(&self, link: &AritegLink) -> AritegResult<Tree> {
        self.restore_node(link).await
    }

    pub async fn restore_commit(&self, link: &AritegLink) -> AritegResult<Commit> {
        self.restore_node(link).await
    }

    /// Write the stream behind a blob or list link to `writer`, in order.
    ///
    /// Every node is verified before any of its bytes reach the writer.
    /// Returns the number of bytes written.
    pub async fn restore_stream<W: Write>(&self, link: &AritegLink, writer: &mut W) -> AritegResult<u64> {
        self.write_stream(link, writer)
            .await
            .map_err(|e| AritegError::restoration(link, e))
    }

    /// [`Ariteg::restore_stream`] into memory.
    pub async fn restore_bytes(&self, link: &AritegLink) -> AritegResult<Vec<u8>> {
        let mut out = Vec::new();
        self.restore_stream(link, &mut out).await?;
        Ok(out)
    }

    /// Resolve and verify every node reachable from `link`.
    pub async fn walk(&self, link: &AritegLink) -> AritegResult<GraphSummary> {
        let summary = self
            .walk_graph(link)
            .await
            .map_err(|e| AritegError::restoration(link, e))?;
        info!(
            link = %link.short(),
            nodes = summary.nodes(),
            bytes = summary.bytes,
            "graph verified"
        );
        Ok(summary)
    }

    /// Remove an object and its integrity record.
    ///
    /// Returns `true` if the object existed. Callers are responsible for
    /// only deleting unreferenced objects.
    pub async fn delete(&self, link: &AritegLink) -> AritegResult<bool> {
        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let target = link.clone();
        let existed = task::spawn_blocking(move || -> AritegResult<bool> {
            let existed = store.delete(&target.multihash).map_err(|e| {
                AritegError::stage(Stage::from(target.link_type), Direction::Delete, &target, e)
            })?;
            index
                .delete(&target.multihash.to_hex())
                .map_err(|e| AritegError::stage(Stage::Index, Direction::Delete, &target, e))?;
            Ok(existed)
        })
        .await
        .map_err(|e| AritegError::stage(Stage::from(link.link_type), Direction::Delete, link, e))??;
        info!(link = %link.short(), existed, "object deleted");
        Ok(existed)
    }

    // ---- Status ----

    /// Raw storage status, whether or not the object is readable now.
    pub async fn status(&self, link: &AritegLink) -> AritegResult<StorageStatus> {
        let store = Arc::clone(&self.store);
        let digest = link.multihash.clone();
        let probe_err = |source| AritegError::Probe {
            link: link.clone(),
            source,
        };
        task::spawn_blocking(move || store.status(&digest))
            .await
            .map_err(|e| probe_err(e.into()))?
            .map_err(|e| probe_err(e.into()))?
            .ok_or_else(|| AritegError::NotFound(link.clone()))
    }

    /// Storage status, refused with [`AritegError::IllegalStatus`] when the
    /// object is outside its availability window.
    pub async fn probe(&self, link: &AritegLink) -> AritegResult<StorageStatus> {
        let status = self.status(link).await?;
        lifecycle::check(Operation::Probe, link, status)?;
        Ok(status)
    }

    async fn restore_node<N: Node>(&self, link: &AritegLink) -> AritegResult<N> {
        expect_type(link, N::LINK_TYPE)?;
        let bytes = self.fetch(link).await?;
        decode(link, &bytes)
    }

    async fn write_stream<W: Write>(&self, root: &AritegLink, writer: &mut W) -> AritegResult<u64> {
        let mut pending = vec![root.clone()];
        let mut written = 0u64;
        while let Some(link) = pending.pop() {
            match link.link_type {
                LinkType::Blob => {
                    let bytes = self.restore_blob(&link).await?;
                    writer.write_all(&bytes).map_err(|e| {
                        AritegError::stage(Stage::Blob, Direction::Restore, &link, e)
                    })?;
                    written += bytes.len() as u64;
                }
                LinkType::List => {
                    let list = self.restore_list(&link).await?;
                    pending.extend(list.links.into_iter().rev());
                }
                LinkType::Tree | LinkType::Commit => {
                    return Err(AritegError::LinkTypeMismatch {
                        link,
                        expected: LinkType::List,
                    });
                }
            }
        }
        writer
            .flush()
            .map_err(|e| AritegError::stage(Stage::Blob, Direction::Restore, root, e))?;
        Ok(written)
    }

    async fn walk_graph(&self, root: &AritegLink) -> AritegResult<GraphSummary> {
        let mut summary = GraphSummary::default();
        let mut seen = HashSet::new();
        let mut pending = vec![root.clone()];
        while let Some(link) = pending.pop() {
            if !seen.insert(link.clone()) {
                continue;
            }
            let bytes = self.fetch(&link).await?;
            summary.bytes += bytes.len() as u64;
            match link.link_type {
                LinkType::Blob => summary.blobs += 1,
                LinkType::List => {
                    summary.lists += 1;
                    pending.extend(decode::<List>(&link, &bytes)?.links);
                }
                LinkType::Tree => {
                    summary.trees += 1;
                    let tree: Tree = decode(&link, &bytes)?;
                    pending.extend(tree.entries().iter().map(|e| e.link.clone()));
                }
                LinkType::Commit => {
                    summary.commits += 1;
                    let commit: Commit = decode(&link, &bytes)?;
                    pending.push(commit.root);
                    pending.extend(commit.parents);
                }
            }
        }
        Ok(summary)
    }

    /// Fetch the bytes behind `link` and verify them.
    async fn fetch(&self, link: &AritegLink) -> AritegResult<Vec<u8>> {
        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let registry = Arc::clone(&self.registry);
        let target = link.clone();
        task::spawn_blocking(move || {
            fetch_verified(store.as_ref(), index.as_ref(), &registry, &target)
        })
        .await
        .map_err(|e| AritegError::stage(Stage::from(link.link_type), Direction::Restore, link, e))?
    }
}

fn expect_type(link: &AritegLink, expected: LinkType) -> AritegResult<()> {
    if link.link_type == expected {
        Ok(())
    } else {
        Err(AritegError::LinkTypeMismatch {
            link: link.clone(),
            expected,
        })
    }
}

fn decode<N: Node>(link: &AritegLink, bytes: &[u8]) -> AritegResult<N> {
    N::decode(bytes).map_err(|e| AritegError::stage(Stage::from(N::LINK_TYPE), Direction::Restore, link, e))
}

/// Status guard, read, primary check, secondary check. Never returns
/// unverified bytes.
fn fetch_verified(
    store: &dyn ObjectStore,
    index: &dyn ProtoMetaRepository,
    registry: &MultihashRegistry,
    link: &AritegLink,
) -> AritegResult<Vec<u8>> {
    let stage = Stage::from(link.link_type);
    let status = store
        .status(&link.multihash)
        .map_err(|e| AritegError::stage(stage, Direction::Restore, link, e))?
        .ok_or_else(|| AritegError::NotFound(link.clone()))?;
    lifecycle::check(Operation::Restore, link, status)?;

    let bytes = store
        .get(&link.multihash)
        .map_err(|e| AritegError::stage(stage, Direction::Restore, link, e))?
        .ok_or_else(|| AritegError::NotFound(link.clone()))?;

    let computed = registry.digest(link.multihash.algorithm(), &bytes)?;
    if computed != link.multihash {
        warn!(link = %link.short(), computed = %computed.short_hex(), "hash mismatch");
        return Err(AritegError::HashMismatch {
            link: link.clone(),
            computed,
        });
    }
    verify_secondary(index, registry, link, &bytes)?;
    debug!(link = %link.short(), bytes = bytes.len(), "object verified");
    Ok(bytes)
}

fn verify_secondary(
    index: &dyn ProtoMetaRepository,
    registry: &MultihashRegistry,
    link: &AritegLink,
    bytes: &[u8],
) -> AritegResult<()> {
    let Some(meta) = index
        .get(&link.multihash.to_hex())
        .map_err(|e| AritegError::stage(Stage::Index, Direction::Restore, link, e))?
    else {
        warn!(link = %link.short(), "no integrity record, secondary check skipped");
        return Ok(());
    };
    let expected = Multihash::from_hex(&meta.secondary_hash)
        .map_err(|e| AritegError::stage(Stage::Index, Direction::Restore, link, e))?;
    let computed = match registry.digest(expected.algorithm(), bytes) {
        Ok(computed) => computed,
        Err(unsupported) => {
            warn!(link = %link.short(), %unsupported, "secondary check skipped");
            return Ok(());
        }
    };
    if computed != expected {
        warn!(link = %link.short(), "integrity mismatch");
        return Err(AritegError::IntegrityMismatch {
            link: link.clone(),
            expected: meta.secondary_hash,
            computed: computed.to_hex(),
        });
    }
    Ok(())
}
