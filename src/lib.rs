//! Workspace umbrella crate for Scholar Stream.
//!
//! This crate wires the metadata store, both encoders and the vector
//! collections into one immutable [`Retriever`], and hosts the bulk build
//! that fills the collections in the first place.
//!
//! ```no_run
//! use scholar_stream::{bootstrap, ScholarConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ScholarConfig::load("scholar.yaml")?;
//! let retriever = bootstrap(&cfg).await?;
//! let result = retriever.retrieve("graph neural networks").await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod config;

pub use crate::build::{build_collections, paper_text, BuildReport, CollectionReport};
pub use crate::config::{ConfigLoadError, ScholarConfig};
pub use index::{CollectionStatus, IndexError, VectorSearch, VectorStore};
pub use metadata::{MetadataError, MetadataStore, PaperRecord};
pub use retrieval::{
    merge_for_display, QueryResult, RankedHit, RetrievalError, RetrievalService, Retriever,
    SpaceBinding, MERGE_CAVEAT,
};
pub use semantic::{EmbeddingProvider, ModelRole, SemanticError};

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

/// Anything that keeps the service from becoming ready.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("encoders: {0}")]
    Encoders(#[from] SemanticError),
    #[error("vector index: {0}")]
    Index(#[from] IndexError),
    #[error("background task failed: {0}")]
    Task(String),
}

/// Loads metadata, both encoders and the vector store, and assembles the
/// retriever. Any failure is fatal; nothing is partially installed.
pub async fn bootstrap(cfg: &ScholarConfig) -> Result<Retriever, BootstrapError> {
    let (metadata, provider, store) = load_parts(cfg).await?;
    for role in ModelRole::ALL {
        let name = cfg.collection_name(role);
        match store.status(name) {
            CollectionStatus::Ready { len, indexed } => {
                info!(collection = name, space = %role, vectors = len, indexed, "collection ready");
            }
            status => {
                warn!(collection = name, space = %role, ?status, "collection will fail every search");
            }
        }
    }
    Ok(assemble(cfg, Arc::new(metadata), &provider, Arc::new(store)))
}

/// Loads everything and runs the bulk build, persisting both collections.
pub async fn build_from_config(cfg: &ScholarConfig) -> Result<BuildReport, BootstrapError> {
    if cfg.index.data_dir.is_none() {
        return Err(ConfigLoadError::Validation(
            "index.data_dir must be set to build collections".into(),
        )
        .into());
    }
    let (metadata, provider, mut store) = load_parts(cfg).await?;
    let cfg = cfg.clone();
    tokio::task::spawn_blocking(move || {
        build_collections(&cfg, &metadata, &provider, &mut store)
    })
    .await
    .map_err(|e| BootstrapError::Task(e.to_string()))?
}

/// Builds a [`Retriever`] from already-loaded parts.
pub fn assemble(
    cfg: &ScholarConfig,
    metadata: Arc<MetadataStore>,
    provider: &EmbeddingProvider,
    index: Arc<dyn VectorSearch>,
) -> Retriever {
    let binding = |role: ModelRole| {
        SpaceBinding::new(role, provider.encoder(role), cfg.collection_name(role))
    };
    Retriever::new(
        metadata,
        index,
        binding(ModelRole::Base),
        binding(ModelRole::Custom),
        cfg.retrieval.clone(),
    )
}

async fn load_parts(
    cfg: &ScholarConfig,
) -> Result<(MetadataStore, EmbeddingProvider, VectorStore), BootstrapError> {
    cfg.validate()?;

    let path = cfg.metadata.path.clone();
    let metadata = tokio::task::spawn_blocking(move || MetadataStore::load_csv(path))
        .await
        .map_err(|e| BootstrapError::Task(e.to_string()))??;

    let provider = EmbeddingProvider::load(&cfg.models, cfg.dimension).await?;

    let store_cfg = cfg.store_config();
    let store = tokio::task::spawn_blocking(move || VectorStore::open(store_cfg))
        .await
        .map_err(|e| BootstrapError::Task(e.to_string()))??;

    Ok((metadata, provider, store))
}
