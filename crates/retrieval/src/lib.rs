//! # Scholar Stream retrieval (`retrieval`)
//!
//! ## Purpose
//!
//! `retrieval` sits on top of the metadata store (`metadata`), the encoders
//! (`semantic`) and the vector collections (`index`). For one free-text query
//! it runs two independent pipelines, one per embedding space:
//!
//! ```text
//! query -> encode(base)   -> search(base collection)   -> enrich -> result.base
//! query -> encode(custom) -> search(custom collection) -> enrich -> result.custom
//! ```
//!
//! Both pipelines run concurrently. A failure in one of them becomes a single
//! `{"error": "Search failed on <collection>"}` entry in its own list; the
//! other list is untouched.
//!
//! ## Core Types
//!
//! - [`Retriever`]: immutable context (metadata, index, two [`SpaceBinding`]s).
//! - [`RetrievalService`]: readiness gate that answers
//!   [`RetrievalError::Unavailable`] until a retriever is installed.
//! - [`QueryResult`] / [`HitView`] / [`EnrichedHit`]: the response shape.
//! - [`presenter::merge_for_display`]: one caveated list across both spaces.
//! - [`RetrievalMetrics`]: optional observer for latency and outcomes.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use index::{CollectionSchema, IvfConfig, VectorStore};
//! use metadata::{MetadataStore, PaperRecord};
//! use retrieval::{RetrievalConfig, Retriever, SpaceBinding};
//! use semantic::{ModelRole, StubEncoder};
//!
//! let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
//! for name in ["research_papers", "research_papers_custom"] {
//!     store.create_collection(CollectionSchema::new(name, 16)).unwrap();
//!     store.insert(name, "p1", &[0.25; 16]).unwrap();
//! }
//! let metadata = MetadataStore::from_records(vec![PaperRecord::new(
//!     "p1",
//!     "Deep Learning",
//!     "A survey of deep learning methods",
//! )])
//! .unwrap();
//!
//! let retriever = Retriever::new(
//!     Arc::new(metadata),
//!     Arc::new(store),
//!     SpaceBinding::new(ModelRole::Base, Arc::new(StubEncoder::new("base", 16, true)), "research_papers"),
//!     SpaceBinding::new(ModelRole::Custom, Arc::new(StubEncoder::new("custom", 16, true)), "research_papers_custom"),
//!     RetrievalConfig::default(),
//! );
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let result = rt.block_on(retriever.retrieve("deep learning")).unwrap();
//! assert_eq!(result.base[0].as_hit().unwrap().title, "Deep Learning");
//! ```

mod engine;
mod metrics;
pub mod presenter;
mod service;
mod types;

pub use crate::engine::{round_score, Retriever, SpaceBinding};
pub use crate::metrics::{set_retrieval_metrics, RetrievalMetrics};
pub use crate::presenter::{merge_for_display, MERGE_CAVEAT};
pub use crate::service::RetrievalService;
pub use crate::types::{
    EnrichedHit, HitView, QueryResult, RankedHit, RetrievalConfig, RetrievalError, SpaceError,
};
