//! DOJI gold price API
//!
//! One XML document carries domestic, international and jewelry price lists
//! plus chart links. The gold and chart adapters share a [`DojiClient`]; each
//! downloads the document on its own refresh.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::{parse_quote, xml_attributes, SourceAdapter};
use crate::types::{ChartKind, GoldCategory, GoldChart, GoldRecord};

pub const DOJI_URL: &str = "http://giavang.doji.vn/api/giavang/";

const SOURCE_NAME: &str = "DOJI";
const UNKNOWN_TIMESTAMP: &str = "Unknown";

/// Jewelry quotes above this are per tael, below per gram
const JEWELRY_TAEL_THRESHOLD: Decimal = Decimal::ONE_THOUSAND;

/// Vietnamese product terms and their English display form, applied in order
const NAME_TRANSLATIONS: &[(&str, &str)] = &[
    ("Vàng SJC", "SJC Gold"),
    ("Vàng DOJI", "DOJI Gold"),
    ("Vàng PNJ", "PNJ Gold"),
    ("Vàng Bảo Tín", "Bao Tin Gold"),
    ("Vàng 24k", "24k Gold"),
    ("Vàng 18k", "18k Gold"),
    ("Vàng 14k", "14k Gold"),
    ("Vàng 10k", "10k Gold"),
    ("Vàng 9999", "9999 Gold"),
    ("Vàng trang sức", "Jewelry Gold"),
    ("Vàng nhẫn", "Ring Gold"),
    ("Vàng dây chuyền", "Necklace Gold"),
    ("Vàng lắc", "Bracelet Gold"),
    ("Vàng bông tai", "Earring Gold"),
    ("chỉ", "tael"),
    ("nghìn", "thousand"),
    ("triệu", "million"),
    ("tỷ", "billion"),
    ("mua", "buy"),
    ("bán", "sell"),
    ("giá", "price"),
    ("hôm nay", "today"),
    ("cập nhật", "updated"),
    ("Vàng miếng", "Gold Bar"),
    ("Vàng lá", "Gold Leaf"),
    ("Vàng nữ trang", "Women's Jewelry"),
    ("Vàng nam", "Men's Gold"),
    ("Vàng trẻ em", "Children's Gold"),
    ("Kim cương", "Diamond"),
    ("Bạch kim", "Platinum"),
    ("Bạc", "Silver"),
];

/// Translate common Vietnamese gold terms and collapse whitespace
pub fn translate_gold_name(name: &str) -> String {
    let translated = NAME_TRANSLATIONS
        .iter()
        .fold(name.to_string(), |acc, (vi, en)| acc.replace(vi, en));
    translated.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub struct DojiClient {
    client: Client,
    url: String,
    api_key: String,
}

impl DojiClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_url(client, DOJI_URL, api_key)
    }

    pub fn with_url(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Download the raw price document
    pub async fn document(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .context("DOJI request failed")?
            .error_for_status()
            .context("DOJI returned an error status")?;

        response.text().await.context("Failed to read DOJI response")
    }
}

/// Gold and jewelry prices
#[derive(Debug, Clone)]
pub struct DojiGoldSource {
    client: Arc<DojiClient>,
}

impl DojiGoldSource {
    pub fn new(client: Arc<DojiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for DojiGoldSource {
    type Record = GoldRecord;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> Result<Vec<GoldRecord>> {
        let document = self.client.document().await?;
        let prices = parse_gold_prices(&document)?;
        tracing::debug!(source = SOURCE_NAME, count = prices.len(), "Parsed gold prices");
        Ok(prices)
    }
}

/// Chart links
#[derive(Debug, Clone)]
pub struct DojiChartSource {
    client: Arc<DojiClient>,
}

impl DojiChartSource {
    pub fn new(client: Arc<DojiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for DojiChartSource {
    type Record = GoldChart;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> Result<Vec<GoldChart>> {
        let document = self.client.document().await?;
        parse_gold_charts(&document)
    }
}

fn price_list_category(tag: &[u8]) -> Option<GoldCategory> {
    match tag {
        b"DGPlist" => Some(GoldCategory::Domestic),
        b"IGPList" => Some(GoldCategory::International),
        b"JewelryList" => Some(GoldCategory::GoldJewelry),
        _ => None,
    }
}

fn chart_list_kind(tag: &[u8]) -> Option<ChartKind> {
    match tag {
        b"IGPChart" => Some(ChartKind::InternationalChart),
        b"GPChart" => Some(ChartKind::DomesticChart),
        _ => None,
    }
}

fn unit_for(category: GoldCategory, original_name: &str, name: &str, sell: Decimal) -> &'static str {
    match category {
        GoldCategory::Domestic => "VND/tael",
        GoldCategory::International if original_name.contains("USD") => "USD/oz",
        GoldCategory::International => "VND/tael",
        GoldCategory::GoldJewelry if name.to_lowercase().contains("thousand") => "VND x1000/tael",
        GoldCategory::GoldJewelry if sell > JEWELRY_TAEL_THRESHOLD => "VND/tael",
        GoldCategory::GoldJewelry => "VND/gram",
    }
}

fn gold_row(category: GoldCategory, attributes: &HashMap<String, String>) -> Option<GoldRecord> {
    let attr = |key: &str| attributes.get(key).map(String::as_str).unwrap_or_default();
    let original_name = attr("Name");

    let (Some(buy), Some(sell)) = (parse_quote(attr("Buy")), parse_quote(attr("Sell"))) else {
        tracing::warn!(source = SOURCE_NAME, name = original_name, "Could not parse gold price");
        return None;
    };
    if buy <= Decimal::ZERO && sell <= Decimal::ZERO {
        return None;
    }

    let name = translate_gold_name(original_name);
    let unit = unit_for(category, original_name, &name, sell);
    Some(GoldRecord {
        category,
        name,
        original_name: original_name.to_string(),
        key: attr("Key").to_string(),
        buy,
        sell,
        unit: unit.to_string(),
        last_updated: String::new(),
    })
}

/// Parse the three price lists. Each list's `DateTime` child becomes the
/// `last_updated` of its rows; rows quoting neither side are dropped.
pub fn parse_gold_prices(xml: &str) -> Result<Vec<GoldRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut prices = Vec::new();
    let mut section: Option<GoldCategory> = None;
    let mut section_rows: Vec<GoldRecord> = Vec::new();
    let mut last_updated: Option<String> = None;
    let mut in_datetime = false;

    loop {
        match reader.read_event().context("Malformed DOJI price document")? {
            Event::Start(element) => {
                let tag = element.name();
                if let Some(category) = price_list_category(tag.as_ref()) {
                    section = Some(category);
                    section_rows.clear();
                    last_updated = None;
                } else if tag.as_ref() == b"DateTime" && section.is_some() {
                    in_datetime = true;
                } else if tag.as_ref() == b"Row" {
                    if let Some(category) = section {
                        let attributes = xml_attributes(&element)?;
                        section_rows.extend(gold_row(category, &attributes));
                    }
                }
            }
            Event::Empty(element) if element.name().as_ref() == b"Row" => {
                if let Some(category) = section {
                    let attributes = xml_attributes(&element)?;
                    section_rows.extend(gold_row(category, &attributes));
                }
            }
            Event::Text(text) if in_datetime => {
                last_updated = Some(text.unescape().context("Malformed DateTime")?.into_owned());
            }
            Event::End(element) => {
                let tag = element.name();
                if tag.as_ref() == b"DateTime" {
                    in_datetime = false;
                } else if price_list_category(tag.as_ref()).is_some() {
                    let stamp = last_updated
                        .take()
                        .unwrap_or_else(|| UNKNOWN_TIMESTAMP.to_string());
                    for mut row in section_rows.drain(..) {
                        row.last_updated = stamp.clone();
                        prices.push(row);
                    }
                    section = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(prices)
}

/// Parse the international and domestic chart lists
pub fn parse_gold_charts(xml: &str) -> Result<Vec<GoldChart>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut charts = Vec::new();
    let mut section: Option<ChartKind> = None;

    loop {
        match reader.read_event().context("Malformed DOJI chart document")? {
            Event::Start(element) => {
                let tag = element.name();
                if let Some(kind) = chart_list_kind(tag.as_ref()) {
                    section = Some(kind);
                } else if tag.as_ref() == b"Row" {
                    if let Some(kind) = section {
                        charts.push(chart_row(kind, &xml_attributes(&element)?));
                    }
                }
            }
            Event::Empty(element) if element.name().as_ref() == b"Row" => {
                if let Some(kind) = section {
                    charts.push(chart_row(kind, &xml_attributes(&element)?));
                }
            }
            Event::End(element) if chart_list_kind(element.name().as_ref()).is_some() => {
                section = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(charts)
}

fn chart_row(kind: ChartKind, attributes: &HashMap<String, String>) -> GoldChart {
    let attr = |key: &str| attributes.get(key).cloned().unwrap_or_default();
    let original_name = attr("Name");
    GoldChart {
        kind,
        name: translate_gold_name(&original_name),
        original_name,
        key: attr("Key"),
        url: attr("Url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<GoldList>
  <DGPlist>
    <DateTime>10:30 17/10/2026</DateTime>
    <Row Name="Vàng SJC" Key="sjc" Sell="8,450" Buy="8,250" />
    <Row Name="Vàng DOJI   HN" Key="doji_hn" Sell="-" Buy="8,240" />
    <Row Name="Vàng nhẫn" Key="ring" Sell="-" Buy="-" />
  </DGPlist>
  <IGPList>
    <DateTime>10:31 17/10/2026</DateTime>
    <Row Name="Vàng USD" Key="usd" Sell="2,655.4" Buy="2,654.9" />
    <Row Name="Vàng quy đổi" Key="vnd" Sell="8,120" Buy="0" />
  </IGPList>
  <JewelryList>
    <Row Name="Vàng 24k" Key="24k" Sell="8,350" Buy="8,150" />
    <Row Name="Vàng 18k" Key="18k" Sell="620" Buy="590" />
    <Row Name="Vàng 14k nghìn" Key="14k" Sell="480" Buy="450" />
  </JewelryList>
  <IGPChart>
    <Row Name="Vàng USD" Key="igp" Url="https://giavang.doji.vn/chart/igp.png" />
  </IGPChart>
  <GPChart>
    <Row Name="Vàng SJC" Key="gp" Url="https://giavang.doji.vn/chart/gp.png" />
  </GPChart>
</GoldList>"#;

    #[test]
    fn translates_and_normalizes_names() {
        assert_eq!(translate_gold_name("Vàng SJC"), "SJC Gold");
        assert_eq!(translate_gold_name("Vàng DOJI   HN"), "DOJI Gold HN");
        assert_eq!(translate_gold_name("Vàng 24k 1 chỉ"), "24k Gold 1 tael");
    }

    #[test]
    fn parses_all_price_lists() {
        let prices = parse_gold_prices(DOCUMENT).unwrap();
        let by_category = |category| prices.iter().filter(move |p| p.category == category).count();

        assert_eq!(by_category(GoldCategory::Domestic), 2);
        assert_eq!(by_category(GoldCategory::International), 2);
        assert_eq!(by_category(GoldCategory::GoldJewelry), 3);
    }

    #[test]
    fn unquoted_sides_are_zero_and_empty_rows_dropped() {
        let prices = parse_gold_prices(DOCUMENT).unwrap();
        let doji = prices.iter().find(|p| p.key == "doji_hn").unwrap();
        assert_eq!(doji.sell, Decimal::ZERO);
        assert_eq!(doji.buy, dec!(8240));
        assert!(prices.iter().all(|p| p.key != "ring"));
    }

    #[test]
    fn units_follow_category_rules() {
        let prices = parse_gold_prices(DOCUMENT).unwrap();
        let unit = |key: &str| prices.iter().find(|p| p.key == key).unwrap().unit.clone();

        assert_eq!(unit("sjc"), "VND/tael");
        assert_eq!(unit("usd"), "USD/oz");
        assert_eq!(unit("vnd"), "VND/tael");
        assert_eq!(unit("24k"), "VND/tael");
        assert_eq!(unit("18k"), "VND/gram");
        assert_eq!(unit("14k"), "VND x1000/tael");
    }

    #[test]
    fn last_updated_comes_from_each_list() {
        let prices = parse_gold_prices(DOCUMENT).unwrap();
        let stamp = |key: &str| prices.iter().find(|p| p.key == key).unwrap().last_updated.clone();

        assert_eq!(stamp("sjc"), "10:30 17/10/2026");
        assert_eq!(stamp("usd"), "10:31 17/10/2026");
        assert_eq!(stamp("24k"), "Unknown");
    }

    #[test]
    fn parses_chart_links() {
        let charts = parse_gold_charts(DOCUMENT).unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].kind, ChartKind::InternationalChart);
        assert_eq!(charts[0].name, "Vàng USD");
        assert_eq!(charts[1].kind, ChartKind::DomesticChart);
        assert_eq!(charts[1].name, "SJC Gold");
        assert_eq!(charts[1].url, "https://giavang.doji.vn/chart/gp.png");
    }
}
