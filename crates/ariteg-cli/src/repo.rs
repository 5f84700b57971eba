use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use ariteg_core::{Ariteg, AritegConfig};
use ariteg_index::FsProtoMetaRepository;
use ariteg_store::{FsObjectStore, ObjectStore, ZstdObjectStore};
use tracing::debug;

/// Name of the configuration file at the repository root.
pub const CONFIG_FILE: &str = "ariteg.toml";

/// Directory holding integrity records.
const META_DIR: &str = "meta";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Create the repository layout and a default config.
///
/// Compression is chosen here and recorded in the config. An existing
/// config is left untouched, but asking for compression on a repository
/// that already holds plain objects is refused.
pub fn init(root: &Path, compress: bool) -> anyhow::Result<PathBuf> {
    let objects = FsObjectStore::open(root)?;
    FsProtoMetaRepository::open(root.join(META_DIR))?;
    let path = config_path(root);
    if path.exists() {
        let config = AritegConfig::load(&path)?;
        if compress && !config.compress {
            bail!(
                "{} is already initialized without compression",
                root.display()
            );
        }
        return Ok(path);
    }
    if compress && has_objects(&objects)? {
        bail!(
            "{} already holds uncompressed objects",
            root.display()
        );
    }
    let config = AritegConfig {
        compress,
        ..AritegConfig::default()
    };
    fs::write(&path, config.to_toml_string()?)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

fn has_objects(store: &FsObjectStore) -> anyhow::Result<bool> {
    let dir = store.root().join("objects");
    Ok(fs::read_dir(&dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .next()
        .is_some())
}

/// The repository's config, or the default when it has none.
pub fn load_config(root: &Path) -> anyhow::Result<AritegConfig> {
    let path = config_path(root);
    if path.exists() {
        Ok(AritegConfig::load(&path)?)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(AritegConfig::default())
    }
}

/// Open the pipeline over the repository at `root`, compressing objects
/// when its config says so.
pub fn open(root: &Path) -> anyhow::Result<Ariteg> {
    let config = load_config(root)?;
    let objects = FsObjectStore::open(root)
        .with_context(|| format!("cannot open object store at {}", root.display()))?;
    let store: Arc<dyn ObjectStore> = if config.compress {
        Arc::new(ZstdObjectStore::with_level(objects, config.compression_level))
    } else {
        Arc::new(objects)
    };
    let index = Arc::new(FsProtoMetaRepository::open(root.join(META_DIR))?);
    Ok(Ariteg::new(store, index, config)?)
}
