use std::sync::Arc;
use std::time::{Duration, Instant};

use index::{SearchHit, VectorSearch};
use metadata::{MetadataStore, MISSING_FIELD};
use semantic::{ModelRole, TextEncoder};
use tokio::task::JoinError;
use tracing::{debug, error};

use crate::metrics::metrics_recorder;
use crate::types::{
    EnrichedHit, HitView, QueryResult, RetrievalConfig, RetrievalError, SpaceError,
};

/// One embedding space: the encoder that produces its vectors and the
/// collection that stores them.
#[derive(Clone)]
pub struct SpaceBinding {
    pub role: ModelRole,
    pub encoder: Arc<dyn TextEncoder>,
    pub collection: String,
}

impl SpaceBinding {
    pub fn new(
        role: ModelRole,
        encoder: Arc<dyn TextEncoder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            role,
            encoder,
            collection: collection.into(),
        }
    }
}

/// Immutable retrieval context: built once, shared by every request.
///
/// Each query runs the base and custom pipelines concurrently. A pipeline
/// that fails (encode error, search error, timeout) turns into a single
/// error entry in its own list and never touches the other list.
pub struct Retriever {
    metadata: Arc<MetadataStore>,
    index: Arc<dyn VectorSearch>,
    base: SpaceBinding,
    custom: SpaceBinding,
    cfg: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        metadata: Arc<MetadataStore>,
        index: Arc<dyn VectorSearch>,
        base: SpaceBinding,
        custom: SpaceBinding,
        cfg: RetrievalConfig,
    ) -> Self {
        Self {
            metadata,
            index,
            base,
            custom,
            cfg,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.cfg
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn binding(&self, role: ModelRole) -> &SpaceBinding {
        match role {
            ModelRole::Base => &self.base,
            ModelRole::Custom => &self.custom,
        }
    }

    /// Runs both spaces for `query` and joins the hits with metadata.
    ///
    /// Only an empty (or whitespace-only) query fails the whole request; it
    /// is rejected before any encoder or index is called.
    pub async fn retrieve(&self, query: &str) -> Result<QueryResult, RetrievalError> {
        let started = Instant::now();
        if query.trim().is_empty() {
            let err = RetrievalError::EmptyQuery;
            if let Some(metrics) = metrics_recorder() {
                metrics.record_query(started.elapsed(), Err(&err));
            }
            return Err(err);
        }

        let (base, custom) = tokio::join!(
            self.run_space(&self.base, query),
            self.run_space(&self.custom, query)
        );

        if let Some(metrics) = metrics_recorder() {
            metrics.record_query(started.elapsed(), Ok(()));
        }
        Ok(QueryResult {
            query: query.to_string(),
            base,
            custom,
        })
    }

    async fn run_space(&self, binding: &SpaceBinding, query: &str) -> Vec<HitView> {
        let started = Instant::now();
        let outcome = self.search_space(binding, query).await;
        let latency = started.elapsed();
        let metrics = metrics_recorder();

        match outcome {
            Ok(hits) => {
                if let Some(metrics) = &metrics {
                    metrics.record_space(binding.role, latency, Ok(hits.len()));
                }
                debug!(
                    collection = %binding.collection,
                    space = %binding.role,
                    hits = hits.len(),
                    latency_ms = latency.as_millis() as u64,
                    "space search finished"
                );
                hits.into_iter()
                    .map(|hit| HitView::Hit(self.enrich(hit)))
                    .collect()
            }
            Err(err) => {
                if let Some(metrics) = &metrics {
                    metrics.record_space(binding.role, latency, Err(&err));
                }
                error!(
                    collection = %binding.collection,
                    space = %binding.role,
                    query,
                    kind = err.kind(),
                    error = %err,
                    "space pipeline failed"
                );
                vec![HitView::Error {
                    error: err.public_message(),
                }]
            }
        }
    }

    async fn search_space(
        &self,
        binding: &SpaceBinding,
        query: &str,
    ) -> Result<Vec<SearchHit>, SpaceError> {
        let pipeline = async {
            let encoder = Arc::clone(&binding.encoder);
            let text = query.to_string();
            let vector = tokio::task::spawn_blocking(move || encoder.encode(&text))
                .await
                .map_err(|e| aborted(binding, e))?
                .map_err(|source| SpaceError::Encode {
                    collection: binding.collection.clone(),
                    source,
                })?;

            let index = Arc::clone(&self.index);
            let collection = binding.collection.clone();
            let top_k = self.cfg.top_k;
            tokio::task::spawn_blocking(move || index.search(&collection, &vector, top_k))
                .await
                .map_err(|e| aborted(binding, e))?
                .map_err(|source| SpaceError::Search {
                    collection: binding.collection.clone(),
                    source,
                })
        };

        let limit = Duration::from_millis(self.cfg.pipeline_timeout_ms);
        match tokio::time::timeout(limit, pipeline).await {
            Ok(result) => result,
            Err(_) => Err(SpaceError::Timeout {
                collection: binding.collection.clone(),
                after_ms: self.cfg.pipeline_timeout_ms,
            }),
        }
    }

    fn enrich(&self, hit: SearchHit) -> EnrichedHit {
        let (title, description) = match self.metadata.lookup(&hit.id) {
            Some(record) => (
                record.title.clone(),
                record
                    .description_prefix(self.cfg.description_chars)
                    .to_string(),
            ),
            None => (MISSING_FIELD.to_string(), MISSING_FIELD.to_string()),
        };
        EnrichedHit {
            score: round_score(hit.score, self.cfg.score_precision),
            id: hit.id,
            title,
            description,
        }
    }
}

fn aborted(binding: &SpaceBinding, err: JoinError) -> SpaceError {
    SpaceError::Aborted {
        collection: binding.collection.clone(),
        reason: err.to_string(),
    }
}

/// Rounds a raw inner product to `precision` decimals.
pub fn round_score(score: f32, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (f64::from(score) * factor).round() / factor
}
