use std::collections::HashSet;

use ariteg_types::{AritegLink, LinkType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A structured node of the object graph.
///
/// Encoded as one tag byte (the node's [`LinkType`] tag) followed by the
/// bincode serialization of the node. The tag keeps a list, a tree, and a
/// commit with coincidentally equal bodies from sharing a digest.
pub trait Node: Serialize + DeserializeOwned + Sized {
    /// The link type that points at this kind of node.
    const LINK_TYPE: LinkType;

    /// Links this node references, in order.
    fn children(&self) -> Vec<&AritegLink>;

    /// Structural checks run after decoding.
    fn validate(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Serialize to the bytes that are hashed and stored.
    fn encode(&self) -> StoreResult<Vec<u8>> {
        let body =
            bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(Self::LINK_TYPE.tag());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode stored bytes, checking the tag and the node's invariants.
    fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::CorruptObject {
            kind: Self::LINK_TYPE,
            reason,
        };
        let (tag, body) = bytes
            .split_first()
            .ok_or_else(|| corrupt("empty object".to_string()))?;
        if *tag != Self::LINK_TYPE.tag() {
            return Err(corrupt(format!("unexpected tag {tag}")));
        }
        let node: Self = bincode::deserialize(body).map_err(|e| corrupt(e.to_string()))?;
        node.validate()?;
        Ok(node)
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Ordered links whose restored contents, concatenated, form one stream.
///
/// Children are blobs or nested lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub links: Vec<AritegLink>,
}

impl List {
    pub fn new(links: Vec<AritegLink>) -> Self {
        Self { links }
    }
}

impl Node for List {
    const LINK_TYPE: LinkType = LinkType::List;

    fn children(&self) -> Vec<&AritegLink> {
        self.links.iter().collect()
    }

    fn validate(&self) -> StoreResult<()> {
        match self
            .links
            .iter()
            .find(|l| !matches!(l.link_type, LinkType::Blob | LinkType::List))
        {
            Some(bad) => Err(StoreError::CorruptObject {
                kind: LinkType::List,
                reason: format!("list cannot contain {} links", bad.link_type),
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A single named entry in a tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub link: AritegLink,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, link: AritegLink) -> Self {
        Self {
            name: name.into(),
            link,
        }
    }
}

/// Ordered `(name, link)` listing, analogous to a directory.
///
/// Entry order is part of the content: reordering entries changes the
/// digest. Names are unique within a tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree, keeping the given order.
    pub fn new(entries: Vec<TreeEntry>) -> StoreResult<Self> {
        let tree = Self { entries };
        tree.validate()?;
        Ok(tree)
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Node for Tree {
    const LINK_TYPE: LinkType = LinkType::Tree;

    fn children(&self) -> Vec<&AritegLink> {
        self.entries.iter().map(|e| &e.link).collect()
    }

    fn validate(&self) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.name.is_empty() || entry.name.contains('/') {
                return Err(StoreError::InvalidEntryName(entry.name.clone()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(StoreError::DuplicateEntry(entry.name.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A version of some root node, linked to the commits it derives from.
///
/// The digest covers every field, so two commits with the same root,
/// parents and metadata are the same object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub root: AritegLink,
    pub parents: Vec<AritegLink>,
    pub message: String,
    pub author: String,
    pub unix_timestamp_ms: i64,
}

impl Node for Commit {
    const LINK_TYPE: LinkType = LinkType::Commit;

    fn children(&self) -> Vec<&AritegLink> {
        std::iter::once(&self.root).chain(self.parents.iter()).collect()
    }

    fn validate(&self) -> StoreResult<()> {
        match self.parents.iter().find(|p| p.link_type != LinkType::Commit) {
            Some(bad) => Err(StoreError::CorruptObject {
                kind: LinkType::Commit,
                reason: format!("parent {} is not a commit", bad.short()),
            }),
            None => Ok(()),
        }
    }
}
