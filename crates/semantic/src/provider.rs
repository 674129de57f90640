use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::encoder::{load_encoder, TextEncoder};
use crate::{ProviderConfig, SemanticError};

/// Identity of an embedding space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Base,
    Custom,
}

impl ModelRole {
    pub const ALL: [ModelRole; 2] = [ModelRole::Base, ModelRole::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelRole::Base => "base",
            ModelRole::Custom => "custom",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder bound to a role: validates output length and optionally caches query vectors.
pub struct RoleEncoder {
    role: ModelRole,
    inner: Box<dyn TextEncoder>,
    dimension: usize,
    cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

impl RoleEncoder {
    pub fn new(
        role: ModelRole,
        inner: Box<dyn TextEncoder>,
        dimension: usize,
        cache_capacity: usize,
    ) -> Self {
        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            role,
            inner,
            dimension,
            cache,
        }
    }

    pub fn role(&self) -> ModelRole {
        self.role
    }

    fn check(&self, vector: &[f32]) -> Result<(), SemanticError> {
        if vector.len() != self.dimension {
            return Err(SemanticError::DimensionMismatch {
                model: self.inner.model_name().to_string(),
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn cached(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().ok()?;
        guard.get(text).cloned()
    }

    fn remember(&self, text: &str, vector: &[f32]) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                guard.put(text.to_string(), vector.to_vec());
            }
        }
    }
}

impl TextEncoder for RoleEncoder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        if let Some(hit) = self.cached(text) {
            return Ok(hit);
        }
        let vector = self.inner.encode(text)?;
        self.check(&vector)?;
        self.remember(text, &vector);
        Ok(vector)
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let vectors = self.inner.encode_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "model '{}' returned {} embeddings for {} inputs",
                self.inner.model_name(),
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            self.check(vector)?;
        }
        Ok(vectors)
    }
}

/// The two encoders, loaded together. Either failing to load fails the whole provider.
pub struct EmbeddingProvider {
    base: Arc<RoleEncoder>,
    custom: Arc<RoleEncoder>,
    dimension: usize,
}

impl EmbeddingProvider {
    pub async fn load(cfg: &ProviderConfig, dimension: usize) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let base = load_encoder(&cfg.base, dimension).await?;
        let custom = load_encoder(&cfg.custom, dimension).await?;
        tracing::info!(
            base = %cfg.base.model_name,
            custom = %cfg.custom.model_name,
            dimension,
            query_cache_capacity = cfg.query_cache_capacity,
            "Embedding provider loaded"
        );
        Ok(Self::from_encoders(
            base,
            custom,
            dimension,
            cfg.query_cache_capacity,
        ))
    }

    /// Wraps already-built encoders; useful for tests and embedding hosts.
    pub fn from_encoders(
        base: Box<dyn TextEncoder>,
        custom: Box<dyn TextEncoder>,
        dimension: usize,
        query_cache_capacity: usize,
    ) -> Self {
        Self {
            base: Arc::new(RoleEncoder::new(
                ModelRole::Base,
                base,
                dimension,
                query_cache_capacity,
            )),
            custom: Arc::new(RoleEncoder::new(
                ModelRole::Custom,
                custom,
                dimension,
                query_cache_capacity,
            )),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn encoder(&self, role: ModelRole) -> Arc<RoleEncoder> {
        match role {
            ModelRole::Base => Arc::clone(&self.base),
            ModelRole::Custom => Arc::clone(&self.custom),
        }
    }

    pub fn encode(&self, text: &str, role: ModelRole) -> Result<Vec<f32>, SemanticError> {
        self.encoder(role).encode(text)
    }
}
