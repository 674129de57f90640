use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Scholar Stream pipeline YAML (metadata, models, collections).
    #[serde(default = "default_pipeline_config")]
    pub pipeline_config: PathBuf,

    /// First retry delay after a failed initialization.
    #[serde(default = "default_init_backoff_initial_ms")]
    pub init_backoff_initial_ms: u64,

    /// Retry delay ceiling.
    #[serde(default = "default_init_backoff_max_ms")]
    pub init_backoff_max_ms: u64,

    /// Give up after this many failed attempts; unset retries forever.
    #[serde(default)]
    pub init_max_attempts: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            pipeline_config: default_pipeline_config(),
            init_backoff_initial_ms: default_init_backoff_initial_ms(),
            init_backoff_max_ms: default_init_backoff_max_ms(),
            init_max_attempts: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file and
    /// `SCHOLAR_SERVER__*` environment variables, in that order.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("SCHOLAR_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be > 0");
        }
        if self.init_backoff_initial_ms == 0 || self.init_backoff_max_ms < self.init_backoff_initial_ms
        {
            anyhow::bail!(
                "init backoff must satisfy 0 < initial ({}) <= max ({})",
                self.init_backoff_initial_ms,
                self.init_backoff_max_ms
            );
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pipeline_config() -> PathBuf {
    PathBuf::from("scholar.yaml")
}

fn default_init_backoff_initial_ms() -> u64 {
    500
}

fn default_init_backoff_max_ms() -> u64 {
    30_000
}
