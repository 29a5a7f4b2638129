//! Source adapters (VCB, Vietinbank, Techcombank, BIDV, TPBank, DOJI)
//!
//! Every upstream hides behind [`SourceAdapter`]: an argumentless async fetch
//! that yields normalized records or an error. How each page is parsed stays
//! private to its adapter.

mod doji;
mod html_table;
mod tpbank;
mod vcb;

pub use doji::{
    parse_gold_charts, parse_gold_prices, translate_gold_name, DojiChartSource, DojiClient,
    DojiGoldSource, DOJI_URL,
};
pub use html_table::{parse_rate_table, HtmlTableSource, BIDV_URL, TECHCOMBANK_URL, VIETINBANK_URL};
pub use tpbank::{parse_tpbank_rates, TpbankSource, TPBANK_URL};
pub use vcb::{parse_vcb_rates, VcbSource, VCB_URL};

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::BytesStart;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::types::{GoldChart, GoldRecord, RateRecord};

/// Trait for upstream rate providers
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Record type this source produces
    type Record: Send + 'static;

    /// Source name reported in `failed_sources`
    fn name(&self) -> &str;

    /// Fetch and normalize the current quotes
    async fn fetch(&self) -> Result<Vec<Self::Record>>;
}

pub type RateSource = Arc<dyn SourceAdapter<Record = RateRecord>>;
pub type GoldSource = Arc<dyn SourceAdapter<Record = GoldRecord>>;
pub type ChartSource = Arc<dyn SourceAdapter<Record = GoldChart>>;

/// The adapters enabled by configuration, grouped by record type
pub struct SourceRegistry {
    pub rates: Vec<RateSource>,
    pub gold: Vec<GoldSource>,
    pub charts: Vec<ChartSource>,
}

impl SourceRegistry {
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let client = http_client(config)?;

        let mut rates: Vec<RateSource> = Vec::new();
        if config.vcb_enabled {
            rates.push(Arc::new(VcbSource::new(client.clone())));
        }
        if config.vietinbank_enabled {
            rates.push(Arc::new(HtmlTableSource::vietinbank(client.clone())));
        }
        if config.techcombank_enabled {
            rates.push(Arc::new(HtmlTableSource::techcombank(client.clone())));
        }
        if config.tpbank_enabled {
            rates.push(Arc::new(TpbankSource::new(client.clone())));
        }
        if config.bidv_enabled {
            rates.push(Arc::new(HtmlTableSource::bidv(client.clone())));
        }

        let mut gold: Vec<GoldSource> = Vec::new();
        let mut charts: Vec<ChartSource> = Vec::new();
        if config.doji_enabled {
            let doji = Arc::new(DojiClient::new(client, config.doji_api_key.clone()));
            gold.push(Arc::new(DojiGoldSource::new(Arc::clone(&doji))));
            charts.push(Arc::new(DojiChartSource::new(doji)));
        }

        tracing::info!(
            rate_sources = rates.len(),
            gold_sources = gold.len(),
            chart_sources = charts.len(),
            "Source registry built"
        );

        Ok(Self {
            rates,
            gold,
            charts,
        })
    }
}

/// Shared HTTP client for all adapters
pub fn http_client(config: &SourcesConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to create HTTP client")
}

pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Upstream {} returned an error status", url))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read body from {}", url))
}

/// Parse an upstream amount such as `"23,500.00"`. Thousands separators and
/// whitespace are ignored.
pub(crate) fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Like [`parse_amount`] but a blank or `-` quote means "not quoted" (zero)
pub(crate) fn parse_quote(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
        return Some(Decimal::ZERO);
    }
    parse_amount(trimmed)
}

/// Attribute name -> unescaped value
pub(crate) fn xml_attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.context("Malformed XML attribute")?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .context("Malformed XML attribute value")?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}
