// Metrics hooks for the `retrieval` crate.
//
// Callers install a global `RetrievalMetrics` implementation via
// [`set_retrieval_metrics`]; every `Retriever` then reports per-space pipeline
// latency and outcome plus whole-query latency. No metrics backend is linked
// here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;
use semantic::ModelRole;

use crate::types::{RetrievalError, SpaceError};

/// Metrics observer for retrieval.
pub trait RetrievalMetrics: Send + Sync {
    /// One space's encode + search pipeline finished.
    ///
    /// `result` carries the number of hits on success.
    fn record_space(&self, space: ModelRole, latency: Duration, result: Result<usize, &SpaceError>);

    /// A whole query finished, both spaces included.
    fn record_query(&self, latency: Duration, result: Result<(), &RetrievalError>);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn RetrievalMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn RetrievalMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn RetrievalMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global retrieval metrics recorder.
pub fn set_retrieval_metrics(recorder: Option<Arc<dyn RetrievalMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
