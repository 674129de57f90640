//! Scholar Stream Server - HTTP API for dual-model paper search
//!
//! Exposes the retrieval pipeline over REST. Each query is embedded by the
//! base and the custom encoder and searched in both collections; a failure in
//! one collection shows up as an error entry in that list only.
//!
//! The listener starts before the models and indexes are loaded. A background
//! supervisor bootstraps the pipeline with exponential backoff, and search
//! endpoints answer `503` until it succeeds.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (503 until initialized)
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/search?q=...` - Results per model
//! - `GET /api/search/merged?q=...` - Single list ordered by raw score

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod supervisor;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::{InitStatus, ServerState};
