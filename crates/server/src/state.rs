use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use retrieval::RetrievalService;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Where the background initializer currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InitStatus {
    /// Attempt `attempt` is running (1-based).
    Initializing { attempt: u32 },
    /// Last attempt failed; another follows after the backoff.
    Retrying { failed_attempts: u32 },
    /// Every allowed attempt failed; the service stays unavailable.
    GaveUp { failed_attempts: u32 },
    Ready,
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Readiness-gated retriever shared across requests
    pub retrieval: Arc<RetrievalService>,

    /// Prometheus render handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,

    init: Arc<RwLock<InitStatus>>,

    started: Instant,
}

impl ServerState {
    /// State whose retrieval service starts out not ready.
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        Self::with_service(config, Arc::new(RetrievalService::new()), metrics)
    }

    pub fn with_service(
        config: ServerConfig,
        retrieval: Arc<RetrievalService>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let status = if retrieval.is_ready() {
            InitStatus::Ready
        } else {
            InitStatus::Initializing { attempt: 1 }
        };
        Self {
            config: Arc::new(config),
            retrieval,
            metrics,
            init: Arc::new(RwLock::new(status)),
            started: Instant::now(),
        }
    }

    /// Time since this state was built at server start.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn init_status(&self) -> InitStatus {
        self.init
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn set_init_status(&self, status: InitStatus) {
        let mut guard = self
            .init
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn uptime_counts_from_construction() {
        let state = ServerState::new(ServerConfig::default(), None);
        tokio::time::advance(Duration::from_secs(90)).await;
        assert!(state.uptime() >= Duration::from_secs(90));
        assert!(state.clone().uptime() >= Duration::from_secs(90));
    }
}
