//! TPBank JSON rate API

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{parse_amount, SourceAdapter};
use crate::types::{Currency, RateRecord};

pub const TPBANK_URL: &str = "https://api.tpb.vn/common/exchangeRate/getExchangeRates";

const SOURCE_NAME: &str = "TPBank";

#[derive(Debug, Deserialize)]
struct TpbankResponse {
    #[serde(default)]
    data: Vec<TpbankRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TpbankRate {
    currency_code: Option<String>,
    buy: Option<Amount>,
    sell: Option<Amount>,
}

/// The API has served prices both as numbers and as formatted strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Amount::Number(value) => Decimal::from_f64(*value),
            Amount::Text(text) => parse_amount(text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TpbankSource {
    client: Client,
    url: String,
}

impl TpbankSource {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, TPBANK_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for TpbankSource {
    type Record = RateRecord;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> Result<Vec<RateRecord>> {
        let body = super::fetch_text(&self.client, &self.url).await?;
        parse_tpbank_rates(&body)
    }
}

/// Parse the `{"data": [{"currencyCode", "buy", "sell"}]}` payload.
/// A missing side counts as zero; an unparseable or negative one drops the row.
pub fn parse_tpbank_rates(json: &str) -> Result<Vec<RateRecord>> {
    let response: TpbankResponse =
        serde_json::from_str(json).context("Unexpected TPBank response shape")?;

    let rates = response
        .data
        .into_iter()
        .filter_map(|item| {
            let currency = Currency::from_str(item.currency_code.as_deref()?)?;
            let buy = match &item.buy {
                Some(amount) => amount.to_decimal()?,
                None => Decimal::ZERO,
            };
            let sell = match &item.sell {
                Some(amount) => amount.to_decimal()?,
                None => Decimal::ZERO,
            };
            if buy.is_sign_negative() || sell.is_sign_negative() {
                return None;
            }
            Some(RateRecord::new(SOURCE_NAME, currency, buy, sell))
        })
        .collect();

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_numbers_and_strings() {
        let json = r#"{"data":[
            {"currencyCode":"USD","buy":25240,"sell":"25,615"},
            {"currencyCode":"EUR","buy":"27,120.5","sell":28390.25},
            {"currencyCode":"SGD","buy":18900,"sell":19500},
            {"buy":1,"sell":2}
        ]}"#;
        let rates = parse_tpbank_rates(json).unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0], RateRecord::new("TPBank", Currency::USD, dec!(25240), dec!(25615)));
        assert_eq!(rates[1].buy, dec!(27120.5));
        assert_eq!(rates[1].sell, dec!(28390.25));
    }

    #[test]
    fn missing_side_defaults_to_zero() {
        let json = r#"{"data":[{"currencyCode":"jpy","sell":176.5}]}"#;
        let rates = parse_tpbank_rates(json).unwrap();
        assert_eq!(rates[0].currency, Currency::JPY);
        assert_eq!(rates[0].buy, Decimal::ZERO);
    }

    #[test]
    fn drops_negative_and_garbage_prices() {
        let json = r#"{"data":[
            {"currencyCode":"USD","buy":-1,"sell":25615},
            {"currencyCode":"CNY","buy":"call us","sell":3500}
        ]}"#;
        assert!(parse_tpbank_rates(json).unwrap().is_empty());
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(parse_tpbank_rates("<html>blocked</html>").is_err());
    }
}
