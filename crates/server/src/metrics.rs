//! Prometheus wiring for retrieval metrics.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use retrieval::{set_retrieval_metrics, RetrievalError, RetrievalMetrics, SpaceError};
use semantic::ModelRole;

/// Forwards retrieval observations to the `metrics` facade.
#[derive(Debug, Default)]
pub struct PrometheusRetrievalMetrics;

impl RetrievalMetrics for PrometheusRetrievalMetrics {
    fn record_space(&self, space: ModelRole, latency: Duration, result: Result<usize, &SpaceError>) {
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        counter!("scholar_space_searches_total", "space" => space.as_str(), "outcome" => outcome)
            .increment(1);
        histogram!("scholar_space_latency_seconds", "space" => space.as_str())
            .record(latency.as_secs_f64());
        if let Ok(hits) = result {
            histogram!("scholar_space_hits", "space" => space.as_str()).record(hits as f64);
        }
    }

    fn record_query(&self, latency: Duration, result: Result<(), &RetrievalError>) {
        let outcome = match result {
            Ok(()) => "ok",
            Err(RetrievalError::EmptyQuery) => "empty_query",
            Err(RetrievalError::Unavailable) => "unavailable",
        };
        counter!("scholar_queries_total", "outcome" => outcome).increment(1);
        histogram!("scholar_query_latency_seconds").record(latency.as_secs_f64());
    }
}

/// Installs the global Prometheus recorder and the retrieval observer.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    set_retrieval_metrics(Some(Arc::new(PrometheusRetrievalMetrics)));
    Ok(handle)
}
