use serde::{Deserialize, Serialize};

use crate::multihash::Multihash;

/// Record of the integrity index.
///
/// Pairs the content digest of an object (the primary hash, and the key of
/// the record) with a second digest of the exact bytes committed to the
/// backing store, computed with a different algorithm. A record exists only
/// once the backing store has accepted the object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtoMeta {
    pub primary_hash: String,
    pub secondary_hash: String,
}

impl ProtoMeta {
    /// Build a record from two multihashes.
    pub fn new(primary: &Multihash, secondary: &Multihash) -> Self {
        Self {
            primary_hash: primary.to_hex(),
            secondary_hash: secondary.to_hex(),
        }
    }

    /// Returns `true` if this record matches the given pair.
    pub fn matches(&self, primary: &Multihash, secondary: &Multihash) -> bool {
        self.primary_hash == primary.to_hex() && self.secondary_hash == secondary.to_hex()
    }
}
