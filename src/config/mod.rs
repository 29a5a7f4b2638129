//! Configuration management for Tygia
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub aggregator: AggregatorConfig,
    pub cache: CacheConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TYGIA_*)
            .add_source(Environment::with_prefix("TYGIA").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Built-in defaults only, no files or environment
    pub fn defaults() -> Result<Self> {
        let config = Self::builder()?
            .build()
            .context("Failed to build configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_enabled", true)?
            // Aggregator defaults
            .set_default("aggregator.max_concurrency", 3)?
            .set_default("aggregator.source_timeout_ms", 10_000)?
            .set_default("aggregator.global_timeout_ms", 30_000)?
            // Cache defaults
            .set_default("cache.ttl_secs", 300)?
            .set_default("cache.serve_stale_on_failure", true)?
            .set_default("cache.warm_on_start", true)?
            // Source defaults
            .set_default("sources.vcb_enabled", true)?
            .set_default("sources.vietinbank_enabled", true)?
            .set_default("sources.techcombank_enabled", true)?
            .set_default("sources.tpbank_enabled", true)?
            .set_default("sources.bidv_enabled", false)?
            .set_default("sources.doji_enabled", true)?
            .set_default("sources.doji_api_key", "258fbd2a72ce8481089d88c678e9fe4f")?
            .set_default(
                "sources.user_agent",
                concat!("tygia/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("sources.http_timeout_ms", 15_000)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;

        Ok(builder)
    }

    /// Reject settings the aggregator or cache cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.aggregator.max_concurrency == 0 {
            bail!("aggregator.max_concurrency must be at least 1");
        }
        if self.aggregator.source_timeout_ms == 0 || self.aggregator.global_timeout_ms == 0 {
            bail!("aggregator timeouts must be greater than zero");
        }
        if self.cache.ttl_secs == 0 {
            bail!("cache.ttl_secs must be greater than zero");
        }
        if self.sources.http_timeout_ms == 0 {
            bail!("sources.http_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Names of the enabled exchange-rate sources, in registration order
    pub fn enabled_banks(&self) -> Vec<&'static str> {
        let s = &self.sources;
        [
            (s.vcb_enabled, "VCB"),
            (s.vietinbank_enabled, "Vietinbank"),
            (s.techcombank_enabled, "Techcombank"),
            (s.tpbank_enabled, "TPBank"),
            (s.bidv_enabled, "BIDV"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "listen={}:{} banks={:?} doji={} concurrency={} source_timeout={}ms ttl={}s",
            self.server.host,
            self.server.port,
            self.enabled_banks(),
            self.sources.doji_enabled,
            self.aggregator.max_concurrency,
            self.aggregator.source_timeout_ms,
            self.cache.ttl_secs
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
