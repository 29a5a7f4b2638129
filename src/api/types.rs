//! API response types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::rates::{rank_by_buy, rank_by_sell, ServiceStatus, SpreadStats};
use crate::types::{AggregationResult, Currency, RateRecord};

pub(crate) const SUCCESS: &str = "success";

/// Full snapshot: `/api/rates`, `/api/gold/charts`
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub status: &'static str,
    pub data: Vec<T>,
    pub count: usize,
    pub failed_sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Clone> ListResponse<T> {
    pub fn from_result(result: &AggregationResult<T>) -> Self {
        Self {
            status: SUCCESS,
            data: result.records.clone(),
            count: result.records.len(),
            failed_sources: result.failed_sources.clone(),
            timestamp: result.fetched_at,
        }
    }
}

/// `/api/rates/{currency}`
#[derive(Debug, Serialize)]
pub struct CurrencyRatesResponse {
    pub status: &'static str,
    pub currency: Currency,
    pub data: Vec<RateRecord>,
    pub count: usize,
    pub failed_sources: Vec<String>,
    /// `null` with fewer than two quotes
    pub comparison: Option<SpreadStats>,
    pub timestamp: DateTime<Utc>,
}

impl CurrencyRatesResponse {
    pub fn new(
        currency: Currency,
        data: Vec<RateRecord>,
        comparison: Option<SpreadStats>,
        failed_sources: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            status: SUCCESS,
            currency,
            count: data.len(),
            data,
            failed_sources,
            comparison,
            timestamp,
        }
    }
}

/// `/api/rates/{currency}/best`
#[derive(Debug, Serialize)]
pub struct BestRatesResponse {
    pub status: &'static str,
    pub currency: Currency,
    pub best_buy: RateRecord,
    pub best_sell: RateRecord,
    pub ranking: Ranking,
    pub failed_sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Source names from best to worst quote on each side
#[derive(Debug, Serialize)]
pub struct Ranking {
    pub by_buy: Vec<String>,
    pub by_sell: Vec<String>,
}

impl Ranking {
    pub fn new(quotes: &[RateRecord]) -> Self {
        let names = |ranked: Vec<RateRecord>| -> Vec<String> {
            ranked.into_iter().map(|r| r.source).collect()
        };
        Self {
            by_buy: names(rank_by_buy(quotes)),
            by_sell: names(rank_by_sell(quotes)),
        }
    }
}

/// `/api/gold`
#[derive(Debug, Serialize)]
pub struct GoldResponse<T> {
    pub status: &'static str,
    pub data: Vec<T>,
    pub count: usize,
    /// Record count per category
    pub categories: BTreeMap<&'static str, usize>,
    pub failed_sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// `/api/gold/{category}`
#[derive(Debug, Serialize)]
pub struct GoldCategoryResponse<T> {
    pub status: &'static str,
    pub category: &'static str,
    pub data: Vec<T>,
    pub count: usize,
    pub failed_sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BanksResponse {
    pub status: &'static str,
    pub banks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub status: &'static str,
    pub currencies: Vec<&'static str>,
}

/// `/` capability descriptor
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub supported_banks: Vec<String>,
    pub supported_currencies: Vec<&'static str>,
    pub gold_categories: Vec<&'static str>,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub cache: ServiceStatus,
}
