use index::IndexError;
use semantic::{ModelRole, SemanticError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs for a [`Retriever`](crate::Retriever).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum hits returned per space.
    pub top_k: usize,
    /// Description prefix length, in characters.
    pub description_chars: usize,
    /// Decimal places kept on scores.
    pub score_precision: u32,
    /// Upper bound on one encode + search pipeline.
    pub pipeline_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            description_chars: 100,
            score_precision: 4,
            pipeline_timeout_ms: 10_000,
        }
    }
}

impl RetrievalConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_description_chars(mut self, chars: usize) -> Self {
        self.description_chars = chars;
        self
    }

    pub fn with_pipeline_timeout_ms(mut self, ms: u64) -> Self {
        self.pipeline_timeout_ms = ms;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be > 0".into());
        }
        if self.score_precision > 9 {
            return Err("score_precision must be <= 9".into());
        }
        if self.pipeline_timeout_ms == 0 {
            return Err("pipeline_timeout_ms must be > 0".into());
        }
        Ok(())
    }
}

/// A search hit joined with its paper metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

/// One entry of a per-space result list.
///
/// Serializes as the bare hit object, or as `{"error": "..."}` when the
/// space's pipeline failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HitView {
    Hit(EnrichedHit),
    Error { error: String },
}

impl HitView {
    pub fn as_hit(&self) -> Option<&EnrichedHit> {
        match self {
            HitView::Hit(hit) => Some(hit),
            HitView::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HitView::Error { .. })
    }
}

/// Both ranked lists for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub base: Vec<HitView>,
    pub custom: Vec<HitView>,
}

impl QueryResult {
    pub fn space(&self, role: ModelRole) -> &[HitView] {
        match role {
            ModelRole::Base => &self.base,
            ModelRole::Custom => &self.custom,
        }
    }
}

/// A hit tagged with the space it came from, for the merged display list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub origin: ModelRole,
    #[serde(flatten)]
    pub hit: EnrichedHit,
}

/// Request-level failures. Per-space failures never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("retrieval service is not ready")]
    Unavailable,
}

/// Why one space's pipeline produced no hits.
#[derive(Error, Debug)]
pub enum SpaceError {
    #[error("encoding for '{collection}' failed: {source}")]
    Encode {
        collection: String,
        #[source]
        source: SemanticError,
    },
    #[error("search on '{collection}' failed: {source}")]
    Search {
        collection: String,
        #[source]
        source: IndexError,
    },
    #[error("pipeline for '{collection}' exceeded {after_ms}ms")]
    Timeout { collection: String, after_ms: u64 },
    #[error("pipeline task for '{collection}' aborted: {reason}")]
    Aborted { collection: String, reason: String },
}

impl SpaceError {
    pub fn collection(&self) -> &str {
        match self {
            SpaceError::Encode { collection, .. }
            | SpaceError::Search { collection, .. }
            | SpaceError::Timeout { collection, .. }
            | SpaceError::Aborted { collection, .. } => collection,
        }
    }

    /// Caller-facing message; never carries the underlying cause.
    pub fn public_message(&self) -> String {
        format!("Search failed on {}", self.collection())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SpaceError::Encode { .. } => "encode",
            SpaceError::Search { .. } => "search",
            SpaceError::Timeout { .. } => "timeout",
            SpaceError::Aborted { .. } => "aborted",
        }
    }
}
