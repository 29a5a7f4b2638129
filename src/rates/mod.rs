//! Rates module - Multi-source rate aggregation
//!
//! Fans out to the bank and gold-dealer adapters, caches the merged
//! snapshot and answers comparison queries over it.

mod aggregator;
mod cache;
pub mod query;
pub mod sources;

pub use aggregator::{Aggregate, Aggregator, AggregatorSettings};
pub use cache::{CacheStatus, RateCache, StalePolicy};
pub use query::{
    average_rates, best_rates, filter_by_currency, group_by_category, rank_by_buy, rank_by_sell,
    sort_by_quoted_price, spread_stats, AverageRates, BestRates, QueryError, SpreadStats,
};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::types::{AggregationResult, GoldChart, GoldRecord, RateRecord};
use sources::{ChartSource, GoldSource, RateSource, SourceRegistry};

type RatesCache = RateCache<Aggregator<RateRecord>>;
type GoldCache = RateCache<Aggregator<GoldRecord>>;
type ChartsCache = RateCache<Aggregator<GoldChart>>;

/// Health of all three caches
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub rates: CacheStatus,
    pub gold: CacheStatus,
    pub charts: CacheStatus,
}

/// One cache per record type, shared by the HTTP API and the CLI report
pub struct RatesService {
    rates: RatesCache,
    gold: GoldCache,
    charts: ChartsCache,
}

impl RatesService {
    pub fn new(
        rate_sources: Vec<RateSource>,
        gold_sources: Vec<GoldSource>,
        chart_sources: Vec<ChartSource>,
        settings: AggregatorSettings,
        ttl: Duration,
        policy: StalePolicy,
    ) -> Self {
        Self {
            rates: RateCache::new(Aggregator::new(rate_sources, settings), ttl, policy),
            gold: RateCache::new(Aggregator::new(gold_sources, settings), ttl, policy),
            charts: RateCache::new(Aggregator::new(chart_sources, settings), ttl, policy),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = SourceRegistry::from_config(&config.sources)?;
        Ok(Self::new(
            registry.rates,
            registry.gold,
            registry.charts,
            config.aggregator.settings(),
            config.cache.ttl(),
            config.cache.stale_policy(),
        ))
    }

    pub async fn rates(&self) -> Arc<AggregationResult<RateRecord>> {
        self.rates.get().await
    }

    pub async fn gold(&self) -> Arc<AggregationResult<GoldRecord>> {
        self.gold.get().await
    }

    pub async fn charts(&self) -> Arc<AggregationResult<GoldChart>> {
        self.charts.get().await
    }

    /// Names of the registered exchange-rate sources
    pub fn banks(&self) -> Vec<String> {
        self.rates.aggregator().source_names()
    }

    pub fn status(&self) -> ServiceStatus {
        let now = Utc::now();
        ServiceStatus {
            rates: self.rates.status(now),
            gold: self.gold.status(now),
            charts: self.charts.status(now),
        }
    }

    /// Populate every cache concurrently
    pub async fn warm(&self) {
        let (rates, gold, charts) = tokio::join!(self.rates(), self.gold(), self.charts());
        tracing::info!(
            rates = rates.records.len(),
            gold = gold.records.len(),
            charts = charts.records.len(),
            "Caches warmed"
        );
    }
}
