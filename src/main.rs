//! tygia - Exchange rate and gold price API server

use anyhow::Result;
use std::sync::Arc;

use tygia::api;
use tygia::config::AppConfig;
use tygia::logging;
use tygia::rates::RatesService;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging)?;

    tracing::info!("🚀 Starting tygia v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Config: {}", config.digest());

    let service = Arc::new(RatesService::from_config(&config)?);

    if config.cache.warm_on_start {
        let warm = Arc::clone(&service);
        tokio::spawn(async move { warm.warm().await });
    }

    api::start_server(service, &config.server).await
}
