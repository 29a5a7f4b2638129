//! Query/comparison engine over aggregated records
//!
//! Pure functions: no I/O, inputs borrowed, outputs owned. Ties always go to
//! the record that appears first in the input.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{GoldCategory, GoldRecord, RateRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no records to compare")]
    NoData,
}

/// Best quotes for a customer: highest buy, lowest sell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRates {
    pub best_buy: RateRecord,
    pub best_sell: RateRecord,
}

/// Cross-source comparison for one currency, in quote values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadStats {
    /// Highest buy
    #[serde(with = "rust_decimal::serde::float")]
    pub best_buy: Decimal,
    /// Lowest buy
    #[serde(with = "rust_decimal::serde::float")]
    pub worst_buy: Decimal,
    /// Lowest sell
    #[serde(with = "rust_decimal::serde::float")]
    pub best_sell: Decimal,
    /// Highest sell
    #[serde(with = "rust_decimal::serde::float")]
    pub worst_sell: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_spread: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_spread: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRates {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell: Decimal,
}

/// Records whose currency code matches, ignoring case
pub fn filter_by_currency(records: &[RateRecord], currency: &str) -> Vec<RateRecord> {
    let wanted = currency.trim();
    records
        .iter()
        .filter(|r| r.currency.code().eq_ignore_ascii_case(wanted))
        .cloned()
        .collect()
}

pub fn best_rates(records: &[RateRecord]) -> Result<BestRates, QueryError> {
    let best_buy = first_max_by(records, |r| r.buy).ok_or(QueryError::NoData)?;
    let best_sell = first_min_by(records, |r| r.sell).ok_or(QueryError::NoData)?;

    Ok(BestRates {
        best_buy: best_buy.clone(),
        best_sell: best_sell.clone(),
    })
}

/// `None` below two records: there is nothing to compare against
pub fn spread_stats(records: &[RateRecord]) -> Option<SpreadStats> {
    if records.len() < 2 {
        return None;
    }

    let best_buy = first_max_by(records, |r| r.buy)?.buy;
    let worst_buy = first_min_by(records, |r| r.buy)?.buy;
    let best_sell = first_min_by(records, |r| r.sell)?.sell;
    let worst_sell = first_max_by(records, |r| r.sell)?.sell;

    Some(SpreadStats {
        best_buy,
        worst_buy,
        best_sell,
        worst_sell,
        buy_spread: best_buy - worst_buy,
        sell_spread: worst_sell - best_sell,
    })
}

/// Buckets in category order, input order kept inside each bucket
pub fn group_by_category(records: &[GoldRecord]) -> BTreeMap<GoldCategory, Vec<GoldRecord>> {
    let mut groups: BTreeMap<GoldCategory, Vec<GoldRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.category).or_default().push(record.clone());
    }
    groups
}

/// Highest buy first; equal quotes keep input order
pub fn rank_by_buy(records: &[RateRecord]) -> Vec<RateRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| b.buy.cmp(&a.buy));
    ranked
}

/// Lowest sell first; equal quotes keep input order
pub fn rank_by_sell(records: &[RateRecord]) -> Vec<RateRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| a.sell.cmp(&b.sell));
    ranked
}

pub fn average_rates(records: &[RateRecord]) -> Option<AverageRates> {
    if records.is_empty() {
        return None;
    }
    let count = Decimal::from(records.len());
    let buy: Decimal = records.iter().map(|r| r.buy).sum();
    let sell: Decimal = records.iter().map(|r| r.sell).sum();

    Some(AverageRates {
        count: records.len(),
        buy: buy / count,
        sell: sell / count,
    })
}

/// Most expensive first by quoted price (sell, or buy when sell is unquoted)
pub fn sort_by_quoted_price(records: &[GoldRecord]) -> Vec<GoldRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.quoted_price().cmp(&a.quoted_price()));
    sorted
}

fn first_max_by<F>(records: &[RateRecord], key: F) -> Option<&RateRecord>
where
    F: Fn(&RateRecord) -> Decimal,
{
    let mut best: Option<&RateRecord> = None;
    for record in records {
        if best.map_or(true, |b| key(record) > key(b)) {
            best = Some(record);
        }
    }
    best
}

fn first_min_by<F>(records: &[RateRecord], key: F) -> Option<&RateRecord>
where
    F: Fn(&RateRecord) -> Decimal,
{
    let mut best: Option<&RateRecord> = None;
    for record in records {
        if best.map_or(true, |b| key(record) < key(b)) {
            best = Some(record);
        }
    }
    best
}
