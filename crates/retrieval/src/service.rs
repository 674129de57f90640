use std::sync::{Arc, RwLock};

use tracing::info;

use crate::engine::Retriever;
use crate::types::{QueryResult, RetrievalError};

/// Readiness gate in front of a [`Retriever`].
///
/// Starts empty; a supervisor installs the retriever once bootstrap succeeds.
/// Requests never trigger initialization themselves.
#[derive(Default)]
pub struct RetrievalService {
    current: RwLock<Option<Arc<Retriever>>>,
}

impl RetrievalService {
    /// A service that answers `Unavailable` until [`install`](Self::install) is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(retriever: Retriever) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(retriever))),
        }
    }

    pub fn install(&self, retriever: Retriever) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Arc::new(retriever));
        info!("retrieval service ready");
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    pub fn current(&self) -> Option<Arc<Retriever>> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    /// Empty queries are rejected before readiness is consulted.
    pub async fn retrieve(&self, query: &str) -> Result<QueryResult, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        let retriever = self.current().ok_or(RetrievalError::Unavailable)?;
        retriever.retrieve(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use index::{CollectionSchema, IvfConfig, VectorStore};
    use metadata::{MetadataStore, PaperRecord};
    use semantic::{ModelRole, StubEncoder};

    use crate::engine::SpaceBinding;
    use crate::types::RetrievalConfig;

    fn retriever() -> Retriever {
        let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
        for name in ["base_c", "custom_c"] {
            store
                .create_collection(CollectionSchema::new(name, 8))
                .unwrap();
            store.insert(name, "p1", &[1.0; 8]).unwrap();
        }
        let metadata =
            MetadataStore::from_records(vec![PaperRecord::new("p1", "Title", "Body")]).unwrap();
        Retriever::new(
            Arc::new(metadata),
            Arc::new(store),
            SpaceBinding::new(
                ModelRole::Base,
                Arc::new(StubEncoder::new("base", 8, true)),
                "base_c",
            ),
            SpaceBinding::new(
                ModelRole::Custom,
                Arc::new(StubEncoder::new("custom", 8, true)),
                "custom_c",
            ),
            RetrievalConfig::default(),
        )
    }

    #[tokio::test]
    async fn unavailable_until_installed() {
        let service = RetrievalService::new();
        assert!(!service.is_ready());
        assert_eq!(
            service.retrieve("graphs").await,
            Err(RetrievalError::Unavailable)
        );

        service.install(retriever());
        assert!(service.is_ready());
        let result = service.retrieve("graphs").await.unwrap();
        assert_eq!(result.base.len(), 1);
        assert_eq!(result.custom.len(), 1);
    }

    #[tokio::test]
    async fn empty_query_wins_over_unavailable() {
        let service = RetrievalService::new();
        assert_eq!(service.retrieve("  ").await, Err(RetrievalError::EmptyQuery));
    }

    #[tokio::test]
    async fn ready_constructor_serves_immediately() {
        let service = RetrievalService::ready(retriever());
        assert!(service.retrieve("q").await.is_ok());
    }
}
