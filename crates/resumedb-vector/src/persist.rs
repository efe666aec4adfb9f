//! On-disk layout of a vector store directory.
//!
//! - `index.bin`: bincode [`FlatIpIndex`]
//! - `store.json`: [`PayloadStore`] in ordinal order
//! - `manifest.json`: counts plus blake3 digests binding the two files
//!
//! The three files are one unit: they are written together and a load fails
//! unless all of them are present and agree.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use resumedb_core::config::SearchConfig;
use resumedb_core::{Error, Result};

use crate::flat::FlatIpIndex;
use crate::store::{PayloadStore, VectorStore};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    pub dim: usize,
    pub count: usize,
    pub index_digest: String,
    pub store_digest: String,
    pub created_at: String,
    #[serde(default)]
    pub embedder_id: Option<String>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn index(&self) -> PathBuf {
        self.root.join("index.bin")
    }

    pub fn store(&self) -> PathBuf {
        self.root.join("store.json")
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.json")
    }
}

fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn ser_err(e: impl std::fmt::Display) -> Error {
    Error::Serialization(e.to_string())
}

fn corrupt(e: impl std::fmt::Display) -> Error {
    Error::IndexCorruption(e.to_string())
}

/// Write via a temp file in the same directory, then rename into place.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

impl VectorStore {
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let paths = IndexPaths::new(dir);
        fs::create_dir_all(&paths.root)?;
        let index_bytes = bincode::serialize(&self.index).map_err(ser_err)?;
        let store_bytes = serde_json::to_vec(&self.payload)?;
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            dim: self.dim(),
            count: self.len(),
            index_digest: digest(&index_bytes),
            store_digest: digest(&store_bytes),
            created_at: Utc::now().to_rfc3339(),
            embedder_id: self.embedder_id.clone(),
        };
        write_atomic(&paths.root, &paths.index(), &index_bytes)?;
        write_atomic(&paths.root, &paths.store(), &store_bytes)?;
        write_atomic(&paths.root, &paths.manifest(), &serde_json::to_vec_pretty(&manifest)?)?;
        info!(
            dir = %paths.root.display(),
            count = manifest.count,
            dim = manifest.dim,
            "saved vector store"
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(dir: P, policy: SearchConfig) -> Result<Self> {
        let paths = IndexPaths::new(dir);
        if !paths.root.is_dir() {
            return Err(Error::NotFound(paths.root.display().to_string()));
        }
        let manifest: Manifest = serde_json::from_slice(&read_artifact(&paths.manifest())?)?;
        let index_bytes = read_artifact(&paths.index())?;
        let store_bytes = read_artifact(&paths.store())?;

        if manifest.version != MANIFEST_VERSION {
            return Err(corrupt(format!("unsupported manifest version {}", manifest.version)));
        }
        if digest(&index_bytes) != manifest.index_digest {
            return Err(corrupt(format!("{} does not match manifest", paths.index().display())));
        }
        if digest(&store_bytes) != manifest.store_digest {
            return Err(corrupt(format!("{} does not match manifest", paths.store().display())));
        }

        let index: FlatIpIndex = bincode::deserialize(&index_bytes).map_err(corrupt)?;
        let payload: PayloadStore = serde_json::from_slice(&store_bytes).map_err(corrupt)?;
        if index.dim() != manifest.dim || index.len() != manifest.count {
            return Err(Error::IndexCorruption(format!(
                "manifest declares {} x {}d, index holds {} x {}d",
                manifest.count,
                manifest.dim,
                index.len(),
                index.dim()
            )));
        }
        let mut store = VectorStore::from_parts(index, payload, policy)?;
        store.embedder_id = manifest.embedder_id;
        info!(
            dir = %paths.root.display(),
            count = store.len(),
            dim = store.dim(),
            "loaded vector store"
        );
        Ok(store)
    }
}
