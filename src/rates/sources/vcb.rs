//! Vietcombank XML rate feed

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use super::{fetch_text, parse_amount, xml_attributes, SourceAdapter};
use crate::types::{Currency, RateRecord};

pub const VCB_URL: &str = "https://portal.vietcombank.com.vn/Usercontrols/TVPortal.TyGia/pXML.aspx";

const SOURCE_NAME: &str = "VCB";

#[derive(Debug, Clone)]
pub struct VcbSource {
    client: Client,
    url: String,
}

impl VcbSource {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, VCB_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for VcbSource {
    type Record = RateRecord;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> Result<Vec<RateRecord>> {
        let body = fetch_text(&self.client, &self.url).await?;
        parse_vcb_rates(&body)
    }
}

/// Parse `<Exrate CurrencyCode=".." Transfer=".." Sell=".."/>` elements.
///
/// The transfer rate is what VCB pays for the currency; entries with a
/// missing or unparseable side are skipped.
pub fn parse_vcb_rates(xml: &str) -> Result<Vec<RateRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut rates = Vec::new();
    loop {
        match reader.read_event().context("Malformed VCB rate feed")? {
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"Exrate" =>
            {
                let attributes = xml_attributes(&element)?;
                let Some(currency) = attributes
                    .get("CurrencyCode")
                    .and_then(|code| Currency::from_str(code))
                else {
                    continue;
                };

                let buy = attributes.get("Transfer").and_then(|v| parse_amount(v));
                let sell = attributes.get("Sell").and_then(|v| parse_amount(v));
                match (buy, sell) {
                    (Some(buy), Some(sell)) => {
                        rates.push(RateRecord::new(SOURCE_NAME, currency, buy, sell));
                    }
                    _ => {
                        tracing::debug!(source = SOURCE_NAME, %currency, "Skipping unquoted rate");
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rates)
}
