//! Banks that publish rates as a plain HTML table
//!
//! Vietinbank, Techcombank and BIDV share the same layout: currency code in
//! the first column, buy in the second and sell in the fourth.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use super::{fetch_text, parse_amount, SourceAdapter};
use crate::types::{Currency, RateRecord};

pub const VIETINBANK_URL: &str = "https://www.vietinbank.vn/ca-nhan/ty-gia-khcn";
pub const TECHCOMBANK_URL: &str = "https://techcombank.com/cong-cu-tien-ich/ty-gia";
pub const BIDV_URL: &str = "https://bidv.com.vn/vn/ty-gia-ngoai-te";

const BUY_COLUMN: usize = 1;
const SELL_COLUMN: usize = 3;

#[derive(Debug, Clone)]
pub struct HtmlTableSource {
    name: String,
    client: Client,
    url: String,
}

impl HtmlTableSource {
    pub fn new(name: impl Into<String>, client: Client, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client,
            url: url.into(),
        }
    }

    pub fn vietinbank(client: Client) -> Self {
        Self::new("Vietinbank", client, VIETINBANK_URL)
    }

    pub fn techcombank(client: Client) -> Self {
        Self::new("Techcombank", client, TECHCOMBANK_URL)
    }

    pub fn bidv(client: Client) -> Self {
        Self::new("BIDV", client, BIDV_URL)
    }
}

#[async_trait]
impl SourceAdapter for HtmlTableSource {
    type Record = RateRecord;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RateRecord>> {
        let body = fetch_text(&self.client, &self.url).await?;
        parse_rate_table(&self.name, &body)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

/// Extract supported currencies from the first `<table>` in the page.
///
/// Fails when the page has no table at all (layout change); rows that are
/// too short or do not parse are skipped.
pub fn parse_rate_table(source: &str, html: &str) -> Result<Vec<RateRecord>> {
    let document = Html::parse_document(html);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| anyhow!("Exchange rate table not found for {}", source))?;

    let mut rates = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() <= SELL_COLUMN {
            continue;
        }

        let Some(currency) = cells[0]
            .split_whitespace()
            .next()
            .and_then(Currency::from_str)
        else {
            continue;
        };

        match (parse_amount(&cells[BUY_COLUMN]), parse_amount(&cells[SELL_COLUMN])) {
            (Some(buy), Some(sell)) => rates.push(RateRecord::new(source, currency, buy, sell)),
            _ => tracing::debug!(source, %currency, "Skipping row with unparseable prices"),
        }
    }

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PAGE: &str = r#"
<html><body>
<h1>Tỷ giá ngoại tệ</h1>
<table class="rates">
  <tr><th>Mã NT</th><th>Mua TM</th><th>Mua CK</th><th>Bán</th></tr>
  <tr><td>USD</td><td>25,230</td><td>25,260</td><td>25,620</td></tr>
  <tr><td>EUR</td><td>27,050.5</td><td>27,100</td><td>28,400.75</td></tr>
  <tr><td>GBP</td><td>31,000</td><td>31,200</td><td>32,500</td></tr>
  <tr><td>JPY</td><td>-</td><td>166</td><td>175</td></tr>
  <tr><td>CNY</td><td>3,450</td></tr>
</table>
<table><tr><td>USD</td><td>1</td><td>1</td><td>1</td></tr></table>
</body></html>"#;

    #[test]
    fn parses_supported_rows_from_first_table() {
        let rates = parse_rate_table("Vietinbank", PAGE).unwrap();
        assert_eq!(rates.len(), 2);

        assert_eq!(rates[0], RateRecord::new("Vietinbank", Currency::USD, dec!(25230), dec!(25620)));
        assert_eq!(rates[1].currency, Currency::EUR);
        assert_eq!(rates[1].buy, dec!(27050.5));
        assert_eq!(rates[1].sell, dec!(28400.75));
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = parse_rate_table("Techcombank", "<html><body><p>maintenance</p></body></html>")
            .unwrap_err();
        assert!(err.to_string().contains("table not found"));
    }

    #[test]
    fn currency_cell_may_carry_a_label() {
        let page = r#"<table><tr><td>USD (50-100)</td><td>25,200</td><td>25,210</td><td>25,600</td></tr></table>"#;
        let rates = parse_rate_table("BIDV", page).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].source, "BIDV");
    }
}
