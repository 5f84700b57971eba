use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use ariteg_types::{Multihash, StorageStatus};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// Filesystem object store: one file per object.
///
/// Layout under `root`:
///
/// ```text
/// objects/<algorithm>/<first 2 hex of digest>/<remaining hex>
/// tmp/                                  staging area for atomic writes
/// ```
///
/// Writes land in `tmp/` and are renamed into place, so a reader never sees
/// a half-written object. Renaming over an existing object replaces it with
/// identical bytes, which keeps racing writers harmless.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("objects"))?;
        fs::create_dir_all(root.join("tmp"))?;
        debug!(root = %root.display(), "opened filesystem object store");
        Ok(Self { root })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `digest`.
    pub fn object_path(&self, digest: &Multihash) -> PathBuf {
        let hex = hex::encode(digest.digest());
        let (fan, rest) = if hex.len() > 2 {
            hex.split_at(2)
        } else {
            ("00", hex.as_str())
        };
        let file = if rest.is_empty() { "_" } else { rest };
        self.root
            .join("objects")
            .join(digest.algorithm().name())
            .join(fan)
            .join(file)
    }
}

impl ObjectStore for FsObjectStore {
    fn exists(&self, digest: &Multihash) -> StoreResult<bool> {
        Ok(self.object_path(digest).try_exists()?)
    }

    fn put(&self, digest: &Multihash, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(digest);
        if path.try_exists()? {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = NamedTempFile::new_in(self.root.join("tmp"))?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(digest = %digest.short_hex(), bytes = data.len(), "object persisted");
        Ok(())
    }

    fn get(&self, digest: &Multihash) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.object_path(digest)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, digest: &Multihash) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(digest)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn status(&self, digest: &Multihash) -> StoreResult<Option<StorageStatus>> {
        match fs::metadata(self.object_path(digest)) {
            Ok(meta) => Ok(Some(StorageStatus::permanent(meta.len() as i64))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
