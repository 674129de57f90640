use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::collection::{Collection, CollectionParts};
use crate::ivf::{IvfConfig, IvfSnapshot};
use crate::{CollectionSchema, CompressionConfig, IndexError, SearchHit, VectorSearch};

/// Bump whenever the snapshot layout changes.
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Where and how collections are kept.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Directory holding one snapshot per collection. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub compression: CompressionConfig,
    pub ivf: IvfConfig,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn with_ivf(mut self, ivf: IvfConfig) -> Self {
        self.ivf = ivf;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// What a caller can learn about a collection without searching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionStatus {
    Missing,
    Corrupt { reason: String },
    Ready { len: usize, indexed: bool },
}

#[derive(Debug)]
enum Slot {
    Ready(Collection),
    Corrupt(String),
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format_version: u16,
    schema: CollectionSchema,
    ids: Vec<String>,
    data: Vec<f32>,
    ivf: Option<IvfSnapshot>,
}

/// Named vector collections.
///
/// Mutation (`create_collection`, `insert`, `build_index`, `persist`) needs
/// `&mut self`; once built the store is shared behind an `Arc` and searched
/// through [`VectorSearch`] without any locking.
#[derive(Debug)]
pub struct VectorStore {
    cfg: StoreConfig,
    collections: BTreeMap<String, Slot>,
}

impl VectorStore {
    /// Opens the store, loading every snapshot under `cfg.data_dir`.
    ///
    /// A snapshot that cannot be decoded does not fail the open: the
    /// collection is kept as corrupt and every search on it errors.
    pub fn open(cfg: StoreConfig) -> Result<Self, IndexError> {
        cfg.ivf.validate()?;
        let mut store = Self {
            cfg,
            collections: BTreeMap::new(),
        };
        let Some(dir) = store.cfg.data_dir.clone() else {
            return Ok(store);
        };

        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        let entries = fs::read_dir(&dir).map_err(|e| storage_error(&dir, e))?;
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| storage_error(&dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(SNAPSHOT_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match store.read_snapshot(&path, &name) {
                Ok(collection) => {
                    info!(
                        "loaded collection '{}' ({} vectors, ivf: {})",
                        name,
                        collection.len(),
                        collection.is_indexed()
                    );
                    store.collections.insert(name, Slot::Ready(collection));
                }
                Err(err) => {
                    warn!("collection '{name}' is corrupt and will not serve searches: {err}");
                    store
                        .collections
                        .insert(name, Slot::Corrupt(err.to_string()));
                }
            }
        }
        Ok(store)
    }

    pub fn in_memory(ivf: IvfConfig) -> Result<Self, IndexError> {
        Self::open(StoreConfig::in_memory().with_ivf(ivf))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn status(&self, name: &str) -> CollectionStatus {
        match self.collections.get(name) {
            None => CollectionStatus::Missing,
            Some(Slot::Corrupt(reason)) => CollectionStatus::Corrupt {
                reason: reason.clone(),
            },
            Some(Slot::Ready(c)) => CollectionStatus::Ready {
                len: c.len(),
                indexed: c.is_indexed(),
            },
        }
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, IndexError> {
        match self.collections.get(name) {
            Some(Slot::Ready(c)) => Ok(c),
            Some(Slot::Corrupt(reason)) => Err(IndexError::CollectionCorrupt {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(IndexError::CollectionNotFound(name.to_string())),
        }
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, IndexError> {
        match self.collections.get_mut(name) {
            Some(Slot::Ready(c)) => Ok(c),
            Some(Slot::Corrupt(reason)) => Err(IndexError::CollectionCorrupt {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(IndexError::CollectionNotFound(name.to_string())),
        }
    }

    /// Creates the collection unless it already exists. Returns `true` if it was created.
    ///
    /// An existing collection is left untouched even when `schema` differs. A
    /// corrupt one is replaced by a fresh, empty collection.
    pub fn create_collection(&mut self, schema: CollectionSchema) -> Result<bool, IndexError> {
        schema.validate()?;
        match self.collections.get(&schema.name) {
            Some(Slot::Ready(existing)) => {
                if existing.schema() != &schema {
                    warn!(
                        "collection '{}' already exists with a different schema; keeping existing",
                        schema.name
                    );
                } else {
                    info!("collection '{}' already exists", schema.name);
                }
                Ok(false)
            }
            Some(Slot::Corrupt(_)) | None => {
                info!(
                    "creating collection '{}' (dim {}, metric {:?})",
                    schema.name, schema.dimension, schema.metric
                );
                let name = schema.name.clone();
                self.collections
                    .insert(name, Slot::Ready(Collection::new(schema)?));
                Ok(true)
            }
        }
    }

    pub fn insert(&mut self, collection: &str, id: &str, vector: &[f32]) -> Result<bool, IndexError> {
        self.collection_mut(collection)?.insert(id, vector)
    }

    /// Inserts many entries, stopping at the first invalid one.
    pub fn insert_batch<'a, I>(&mut self, collection: &str, entries: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = (&'a str, &'a [f32])>,
    {
        let target = self.collection_mut(collection)?;
        let mut inserted = 0usize;
        for (id, vector) in entries {
            target.insert(id, vector)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Trains the IVF index of `collection` with the store's IVF settings.
    pub fn build_index(&mut self, collection: &str) -> Result<bool, IndexError> {
        let ivf = self.cfg.ivf;
        let target = self.collection_mut(collection)?;
        let indexed = target.build_index(&ivf)?;
        info!(
            "built index for '{}': {} vectors, ivf: {}",
            collection,
            target.len(),
            indexed
        );
        Ok(indexed)
    }

    /// Writes `collection` to its snapshot file. A no-op for in-memory stores.
    pub fn persist(&self, collection: &str) -> Result<(), IndexError> {
        let Some(dir) = &self.cfg.data_dir else {
            return Ok(());
        };
        let target = self.collection(collection)?;
        let parts = target.to_parts();
        let snapshot = Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            schema: parts.schema,
            ids: parts.ids,
            data: parts.data,
            ivf: parts.ivf,
        };
        let encoded = encode_to_vec(&snapshot, standard())?;
        let payload = self.cfg.compression.compress(&encoded)?;

        let path = snapshot_path(dir, collection);
        let partial = path.with_extension("partial");
        fs::write(&partial, &payload).map_err(|e| storage_error(&partial, e))?;
        fs::rename(&partial, &path).map_err(|e| storage_error(&path, e))?;
        info!(
            "persisted collection '{}' to {} ({} bytes)",
            collection,
            path.display(),
            payload.len()
        );
        Ok(())
    }

    fn read_snapshot(&self, path: &Path, name: &str) -> Result<Collection, IndexError> {
        let payload = fs::read(path).map_err(|e| storage_error(path, e))?;
        let decoded = self.cfg.compression.decompress(&payload)?;
        let (snapshot, _): (Snapshot, usize) = decode_from_slice(&decoded, standard())?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(IndexError::Decode(format!(
                "unsupported snapshot version {}",
                snapshot.format_version
            )));
        }
        if snapshot.schema.name != name {
            return Err(IndexError::Decode(format!(
                "snapshot names collection '{}'",
                snapshot.schema.name
            )));
        }
        Collection::from_parts(CollectionParts {
            schema: snapshot.schema,
            ids: snapshot.ids,
            data: snapshot.data,
            ivf: snapshot.ivf,
        })
    }
}

impl VectorSearch for VectorStore {
    fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        self.collection(collection)?
            .search(query, top_k, self.cfg.ivf.nprobe)
    }
}

fn snapshot_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{collection}.{SNAPSHOT_EXTENSION}"))
}

fn storage_error(path: &Path, err: std::io::Error) -> IndexError {
    IndexError::Storage(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> CollectionSchema {
        CollectionSchema::new(name, 3)
    }

    fn seeded(cfg: StoreConfig) -> VectorStore {
        let mut store = VectorStore::open(cfg).unwrap();
        store.create_collection(schema("research_papers")).unwrap();
        store
            .insert("research_papers", "p1", &[0.87, 0.0, 0.0])
            .unwrap();
        store
            .insert("research_papers", "p2", &[0.1, 0.2, 0.3])
            .unwrap();
        store
    }

    #[test]
    fn create_collection_is_idempotent() {
        let mut store = seeded(StoreConfig::in_memory());
        assert!(!store.create_collection(schema("research_papers")).unwrap());
        // differing schema keeps the existing data
        assert!(!store
            .create_collection(CollectionSchema::new("research_papers", 8))
            .unwrap());
        assert_eq!(
            store.status("research_papers"),
            CollectionStatus::Ready {
                len: 2,
                indexed: false
            }
        );
    }

    #[test]
    fn search_missing_collection_fails() {
        let store = seeded(StoreConfig::in_memory());
        let err = store.search("nope", &[1.0, 0.0, 0.0], 5).unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(name) if name == "nope"));
    }

    #[test]
    fn inner_product_scores_are_raw() {
        let store = seeded(StoreConfig::in_memory());
        let hits = store
            .search("research_papers", &[1.0, 0.0, 0.0], 10)
            .unwrap();
        assert_eq!(hits[0].id, "p1");
        assert!((hits[0].score - 0.87).abs() < 1e-6);
    }

    #[test]
    fn persist_and_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::on_disk(dir.path());
        let store = seeded(cfg.clone());
        store.persist("research_papers").unwrap();

        let reopened = VectorStore::open(cfg).unwrap();
        let before = store
            .search("research_papers", &[0.2, 0.5, 0.1], 2)
            .unwrap();
        let after = reopened
            .search("research_papers", &[0.2, 0.5, 0.1], 2)
            .unwrap();
        assert_eq!(before, after);
        assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["research_papers"]);
    }

    #[test]
    fn persisted_ivf_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let ivf = IvfConfig::default().with_nlist(2).with_min_vectors_for_ivf(2);
        let cfg = StoreConfig::on_disk(dir.path()).with_ivf(ivf);
        let mut store = seeded(cfg.clone());
        assert!(store.build_index("research_papers").unwrap());
        store.persist("research_papers").unwrap();

        let reopened = VectorStore::open(cfg).unwrap();
        assert_eq!(
            reopened.status("research_papers"),
            CollectionStatus::Ready {
                len: 2,
                indexed: true
            }
        );
    }

    #[test]
    fn corrupt_snapshot_isolated_from_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::on_disk(dir.path());
        let mut store = seeded(cfg.clone());
        store
            .create_collection(schema("research_papers_custom"))
            .unwrap();
        store
            .insert("research_papers_custom", "p1", &[0.0, 1.0, 0.0])
            .unwrap();
        store.persist("research_papers").unwrap();
        store.persist("research_papers_custom").unwrap();

        fs::write(
            dir.path().join("research_papers.snapshot"),
            b"definitely not zstd",
        )
        .unwrap();

        let reopened = VectorStore::open(cfg).unwrap();
        assert!(matches!(
            reopened.status("research_papers"),
            CollectionStatus::Corrupt { .. }
        ));
        assert!(matches!(
            reopened.search("research_papers", &[1.0, 0.0, 0.0], 3),
            Err(IndexError::CollectionCorrupt { .. })
        ));
        let hits = reopened
            .search("research_papers_custom", &[0.0, 1.0, 0.0], 3)
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn persist_is_noop_in_memory() {
        let store = seeded(StoreConfig::in_memory());
        assert!(store.persist("research_papers").is_ok());
    }

    #[test]
    fn insert_batch_counts_entries() {
        let mut store = seeded(StoreConfig::in_memory());
        let v = [0.0f32, 0.0, 1.0];
        let n = store
            .insert_batch("research_papers", [("p3", &v[..]), ("p4", &v[..])])
            .unwrap();
        assert_eq!(n, 2);
        assert!(store.collection("research_papers").unwrap().contains("p4"));
    }
}
