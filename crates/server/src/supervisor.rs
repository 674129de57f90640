//! Background initialization with exponential backoff.
//!
//! The HTTP listener comes up immediately with a not-ready
//! [`RetrievalService`](retrieval::RetrievalService). This task loads the
//! pipeline config and bootstraps the retriever; on failure it logs the cause,
//! waits and tries again. Requests never trigger a load themselves.

use std::future::Future;
use std::time::Duration;

use retrieval::Retriever;
use scholar_stream::{bootstrap, BootstrapError, ScholarConfig};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::state::{InitStatus, ServerState};

/// Retry schedule: `initial`, doubling, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub max_attempts: Option<u32>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self {
            initial: Duration::from_millis(cfg.init_backoff_initial_ms),
            max: Duration::from_millis(cfg.init_backoff_max_ms),
            max_attempts: cfg.init_max_attempts,
        }
    }

    /// Delay after the `failed_attempts`-th consecutive failure.
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }

    fn exhausted(&self, failed_attempts: u32) -> bool {
        self.max_attempts
            .is_some_and(|limit| failed_attempts >= limit)
    }
}

/// Runs `init` until it succeeds (installing the retriever) or the backoff
/// gives up. Returns whether the service became ready.
pub async fn run_initializer<F, Fut>(state: ServerState, backoff: Backoff, init: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Retriever, BootstrapError>>,
{
    let mut failed = 0u32;
    loop {
        state.set_init_status(InitStatus::Initializing {
            attempt: failed + 1,
        });
        match init().await {
            Ok(retriever) => {
                state.retrieval.install(retriever);
                state.set_init_status(InitStatus::Ready);
                info!(attempts = failed + 1, "initialization complete");
                return true;
            }
            Err(err) => {
                failed += 1;
                if backoff.exhausted(failed) {
                    error!(attempt = failed, error = %err, "initialization failed, giving up");
                    state.set_init_status(InitStatus::GaveUp {
                        failed_attempts: failed,
                    });
                    return false;
                }
                let delay = backoff.delay(failed);
                error!(
                    attempt = failed,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "initialization failed"
                );
                state.set_init_status(InitStatus::Retrying {
                    failed_attempts: failed,
                });
                tokio::time::sleep(delay).await;
            }
        }
    }
}

pub fn spawn_initializer<F, Fut>(state: ServerState, backoff: Backoff, init: F) -> JoinHandle<bool>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Retriever, BootstrapError>> + Send + 'static,
{
    tokio::spawn(run_initializer(state, backoff, init))
}

/// Supervises bootstrap from the pipeline YAML named in the server config.
/// The file is re-read on every attempt.
pub fn spawn_pipeline_initializer(state: ServerState) -> JoinHandle<bool> {
    let path = state.config.pipeline_config.clone();
    let backoff = Backoff::from_config(&state.config);
    spawn_initializer(state, backoff, move || {
        let path = path.clone();
        async move {
            let cfg = ScholarConfig::load(&path)?;
            bootstrap(&cfg).await
        }
    })
}
