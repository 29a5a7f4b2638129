//! Configuration sections

use serde::Deserialize;
use std::time::Duration;

use crate::rates::{AggregatorSettings, StalePolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Allow cross-origin requests from any origin
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Upstream fetches allowed in flight at once
    pub max_concurrency: usize,
    /// Per-source fetch timeout in milliseconds
    pub source_timeout_ms: u64,
    /// Ceiling for a whole aggregation cycle in milliseconds
    pub global_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Freshness window in seconds
    pub ttl_secs: u64,
    /// Keep serving the previous records when a refresh returns nothing
    pub serve_stale_on_failure: bool,
    /// Populate the caches in the background at startup
    pub warm_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub vcb_enabled: bool,
    pub vietinbank_enabled: bool,
    pub techcombank_enabled: bool,
    pub tpbank_enabled: bool,
    /// BIDV renders its table client-side, so the static page is often empty
    pub bidv_enabled: bool,
    pub doji_enabled: bool,
    /// Key for the DOJI gold price API
    pub doji_api_key: String,
    /// User-Agent sent to upstream sites
    pub user_agent: String,
    /// HTTP client timeout in milliseconds
    pub http_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AggregatorConfig {
    pub fn settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            max_concurrency: self.max_concurrency,
            source_timeout: Duration::from_millis(self.source_timeout_ms),
            global_timeout: Duration::from_millis(self.global_timeout_ms),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn stale_policy(&self) -> StalePolicy {
        if self.serve_stale_on_failure {
            StalePolicy::ServeStale
        } else {
            StalePolicy::ReplaceWithEmpty
        }
    }
}
