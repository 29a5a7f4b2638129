//! Core types used throughout Tygia
//!
//! Defines the normalized records every source adapter produces and the
//! snapshot shape handed out by the aggregator and cache.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported foreign currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    JPY,
    CNY,
}

impl Currency {
    /// Every supported currency, in display order
    pub const ALL: [Currency; 4] = [Currency::USD, Currency::EUR, Currency::JPY, Currency::CNY];

    /// ISO code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::JPY => "JPY",
            Currency::CNY => "CNY",
        }
    }

    /// Parse from string (case-insensitive, surrounding whitespace ignored)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "JPY" => Some(Currency::JPY),
            "CNY" => Some(Currency::CNY),
            _ => None,
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(Currency::code).collect()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Gold price categories published by the gold dealers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldCategory {
    Domestic,
    International,
    GoldJewelry,
}

impl GoldCategory {
    pub const ALL: [GoldCategory; 3] = [
        GoldCategory::Domestic,
        GoldCategory::International,
        GoldCategory::GoldJewelry,
    ];

    /// Wire name used in records
    pub fn as_str(&self) -> &'static str {
        match self {
            GoldCategory::Domestic => "domestic",
            GoldCategory::International => "international",
            GoldCategory::GoldJewelry => "gold_jewelry",
        }
    }

    /// Name accepted in request paths
    pub fn path_name(&self) -> &'static str {
        match self {
            GoldCategory::GoldJewelry => "jewelry",
            other => other.as_str(),
        }
    }

    /// Parse a request path segment. `jewelry` is an alias of `gold_jewelry`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "domestic" => Some(GoldCategory::Domestic),
            "international" => Some(GoldCategory::International),
            "jewelry" | "gold_jewelry" => Some(GoldCategory::GoldJewelry),
            _ => None,
        }
    }

    pub fn path_names() -> Vec<&'static str> {
        Self::ALL.iter().map(GoldCategory::path_name).collect()
    }
}

impl fmt::Display for GoldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bank's quote for one currency, in VND
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    #[serde(alias = "bank")]
    pub source: String,
    pub currency: Currency,
    /// Price the bank pays for the foreign currency
    #[serde(with = "rust_decimal::serde::float")]
    pub buy: Decimal,
    /// Price the bank charges for the foreign currency
    #[serde(with = "rust_decimal::serde::float")]
    pub sell: Decimal,
}

impl RateRecord {
    pub fn new(source: impl Into<String>, currency: Currency, buy: Decimal, sell: Decimal) -> Self {
        Self {
            source: source.into(),
            currency,
            buy,
            sell,
        }
    }
}

/// Gold or jewelry quote. A zero price means the side is not quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldRecord {
    pub category: GoldCategory,
    pub name: String,
    pub original_name: String,
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell: Decimal,
    pub unit: String,
    /// Upstream timestamp, display only
    pub last_updated: String,
}

impl GoldRecord {
    /// Sell price if quoted, otherwise buy price
    pub fn quoted_price(&self) -> Decimal {
        if self.sell > Decimal::ZERO {
            self.sell
        } else {
            self.buy
        }
    }

    /// 24k / 9999 products
    pub fn is_pure_gold(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("24k") || name.contains("9999")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    InternationalChart,
    DomesticChart,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::InternationalChart => write!(f, "international_chart"),
            ChartKind::DomesticChart => write!(f, "domestic_chart"),
        }
    }
}

/// Price chart published by a gold dealer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldChart {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub name: String,
    pub original_name: String,
    pub key: String,
    pub url: String,
}

/// Output of one aggregation cycle. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult<R> {
    pub records: Vec<R>,
    pub failed_sources: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl<R> AggregationResult<R> {
    pub fn new(records: Vec<R>, failed_sources: Vec<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            failed_sources,
            fetched_at,
        }
    }

    /// Result with no records where every source failed
    pub fn failed(sources: Vec<String>, fetched_at: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), sources, fetched_at)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
