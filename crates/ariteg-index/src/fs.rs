use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use ariteg_types::ProtoMeta;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::repository::ProtoMetaRepository;

/// Integrity index persisted as one JSON file per record.
///
/// Files live at `<root>/<primary hash>.json` and are replaced atomically
/// through a temporary file in the same directory.
#[derive(Debug, Clone)]
pub struct FsProtoMetaRepository {
    root: PathBuf,
}

impl FsProtoMetaRepository {
    /// Open (or create) a repository rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> IndexResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn record_path(&self, primary_hash: &str) -> IndexResult<PathBuf> {
        // Primary hashes are hex multihashes; anything else could escape root.
        if primary_hash.is_empty() || !primary_hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IndexError::InvalidKey(primary_hash.to_string()));
        }
        Ok(self.root.join(format!("{primary_hash}.json")))
    }
}

impl ProtoMetaRepository for FsProtoMetaRepository {
    fn get(&self, primary_hash: &str) -> IndexResult<Option<ProtoMeta>> {
        let path = self.record_path(primary_hash)?;
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| IndexError::Serialization(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, meta: &ProtoMeta) -> IndexResult<()> {
        let path = self.record_path(&meta.primary_hash)?;
        let bytes =
            serde_json::to_vec(meta).map_err(|e| IndexError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(primary = %meta.primary_hash, "proto meta saved");
        Ok(())
    }

    fn delete(&self, primary_hash: &str) -> IndexResult<bool> {
        match fs::remove_file(self.record_path(primary_hash)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, primary_hash: &str) -> IndexResult<bool> {
        Ok(self.record_path(primary_hash)?.try_exists()?)
    }
}
