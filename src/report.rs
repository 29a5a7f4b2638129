//! Terminal report rendering
//!
//! Every renderer returns a `String` so the CLI only has to print it. Colors
//! are plain ANSI escapes and can be switched off; cell padding is applied
//! before coloring so columns stay aligned either way.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::{self, Write};

use crate::rates::{
    average_rates, filter_by_currency, group_by_category, rank_by_buy, sort_by_quoted_price,
};
use crate::types::{AggregationResult, Currency, GoldCategory, GoldChart, GoldRecord, RateRecord};

const GOLD_NAME_WIDTH: usize = 24;
const STAR: &str = "⭐";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Green,
    Yellow,
    Magenta,
    Cyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Magenta => "\x1b[35m",
            Color::Cyan => "\x1b[36m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// ANSI coloring, or nothing at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Red text for error messages
    pub fn error(&self, text: &str) -> String {
        self.paint(Color::Red, text)
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", color.code(), text, RESET)
        } else {
            text.to_string()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(true)
    }
}

/// `1234567.891` with 2 places -> `1,234,567.89`
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(plain.len() + int_part.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// Whole-number gold price, `-` when the side is not quoted
fn format_quote(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format_amount(value, 0)
    } else {
        "-".to_string()
    }
}

fn banner(out: &mut String, palette: Palette, color: Color, title: &str, width: usize) -> fmt::Result {
    let rule = "=".repeat(width);
    writeln!(out, "{}", palette.paint(color, &rule))?;
    writeln!(out, "{}", palette.paint(color, &format!("{:^width$}", title, width = width)))?;
    writeln!(out, "{}", palette.paint(color, &rule))
}

fn failed_line<R>(out: &mut String, palette: Palette, result: &AggregationResult<R>) -> fmt::Result {
    if result.failed_sources.is_empty() {
        return Ok(());
    }
    writeln!(
        out,
        "\n{}",
        palette.paint(
            Color::Red,
            &format!("Failed sources: {}", result.failed_sources.join(", "))
        )
    )
}

// ─────────────────────────────────────────────────────────────────
// Currency rates
// ─────────────────────────────────────────────────────────────────

pub fn render_currency_rates(result: &AggregationResult<RateRecord>, palette: Palette) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_currency_rates(&mut out, result, palette);
    out
}

fn write_currency_rates(
    out: &mut String,
    result: &AggregationResult<RateRecord>,
    palette: Palette,
) -> fmt::Result {
    banner(out, palette, Color::Cyan, "CURRENCY EXCHANGE RATES", 60)?;

    if result.records.is_empty() {
        writeln!(out, "{}", palette.paint(Color::Red, "No currency rates available"))?;
        return failed_line(out, palette, result);
    }

    for currency in Currency::ALL {
        writeln!(
            out,
            "\n{}",
            palette.paint(Color::Yellow, &format!("Currency: {}", currency))
        )?;
        writeln!(out, "| Bank         | Buy          | Sell         |")?;
        writeln!(out, "|--------------|--------------|--------------|")?;

        // Best buyer on top
        let quotes = rank_by_buy(&filter_by_currency(&result.records, currency.code()));
        if quotes.is_empty() {
            writeln!(
                out,
                "| {}",
                palette.paint(Color::Red, &format!("No data available for {}", currency))
            )?;
            continue;
        }

        let max_buy = quotes.iter().map(|r| r.buy).max().unwrap_or_default();
        let min_sell = quotes.iter().map(|r| r.sell).min().unwrap_or_default();

        for quote in &quotes {
            let mut buy = format!("{:>12}", format_amount(quote.buy, 2));
            let mut sell = format!("{:>12}", format_amount(quote.sell, 2));
            if quote.buy == max_buy {
                buy = format!("{} {}", palette.paint(Color::Green, &buy), STAR);
            }
            if quote.sell == min_sell {
                sell = format!("{} {}", palette.paint(Color::Red, &sell), STAR);
            }
            writeln!(out, "| {:<12} | {} | {} |", quote.source, buy, sell)?;
        }
    }

    failed_line(out, palette, result)
}

// ─────────────────────────────────────────────────────────────────
// Gold
// ─────────────────────────────────────────────────────────────────

pub fn render_gold_prices(result: &AggregationResult<GoldRecord>, palette: Palette) -> String {
    let mut out = String::new();
    let _ = write_gold_prices(&mut out, result, palette);
    out
}

fn write_gold_prices(
    out: &mut String,
    result: &AggregationResult<GoldRecord>,
    palette: Palette,
) -> fmt::Result {
    banner(out, palette, Color::Cyan, "GOLD PRICES", 80)?;

    if result.records.is_empty() {
        writeln!(out, "{}", palette.paint(Color::Red, "No gold rates available"))?;
        return failed_line(out, palette, result);
    }

    let groups = group_by_category(&result.records);
    for (category, records) in &groups {
        let (title, rows) = match category {
            GoldCategory::Domestic => ("🏠 DOMESTIC GOLD PRICES", records.clone()),
            GoldCategory::International => ("🌍 INTERNATIONAL GOLD PRICES", records.clone()),
            GoldCategory::GoldJewelry => ("💍 JEWELRY PRICES", sort_by_quoted_price(records)),
        };

        writeln!(out, "\n{}", palette.paint(Color::Yellow, title))?;
        writeln!(out, "| Name                     | Buy          | Sell         | Unit           |")?;
        writeln!(out, "|--------------------------|--------------|--------------|----------------|")?;

        for record in &rows {
            let short: String = record.name.chars().take(GOLD_NAME_WIDTH).collect();
            let mut name = format!("{:<width$}", short, width = GOLD_NAME_WIDTH);
            if *category == GoldCategory::GoldJewelry && record.is_pure_gold() {
                name = palette.paint(Color::Yellow, &name);
            }
            writeln!(
                out,
                "| {} | {:>12} | {:>12} | {:<14} |",
                name,
                format_quote(record.buy),
                format_quote(record.sell),
                record.unit
            )?;
        }
    }

    if let Some(updated) = result.records.first().map(|r| r.last_updated.as_str()) {
        writeln!(out, "\nLast updated: {}", updated)?;
    }

    failed_line(out, palette, result)
}

pub fn render_gold_charts(result: &AggregationResult<GoldChart>, palette: Palette) -> String {
    let mut out = String::new();
    let _ = write_gold_charts(&mut out, result, palette);
    out
}

fn write_gold_charts(
    out: &mut String,
    result: &AggregationResult<GoldChart>,
    palette: Palette,
) -> fmt::Result {
    banner(out, palette, Color::Cyan, "GOLD PRICE CHARTS", 60)?;

    if result.records.is_empty() {
        writeln!(out, "{}", palette.paint(Color::Red, "No gold charts available"))?;
        return failed_line(out, palette, result);
    }

    for chart in &result.records {
        writeln!(out, "\n{}", palette.paint(Color::Yellow, &format!("📊 {}", chart.name)))?;
        writeln!(out, "   Type: {}", chart.kind)?;
        writeln!(out, "   URL:  {}", chart.url)?;
    }

    failed_line(out, palette, result)
}

// ─────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────

pub fn render_summary(
    rates: &AggregationResult<RateRecord>,
    gold: &AggregationResult<GoldRecord>,
    palette: Palette,
) -> String {
    let mut out = String::new();
    let _ = write_summary(&mut out, rates, gold, palette);
    out
}

fn write_summary(
    out: &mut String,
    rates: &AggregationResult<RateRecord>,
    gold: &AggregationResult<GoldRecord>,
    palette: Palette,
) -> fmt::Result {
    banner(out, palette, Color::Magenta, "MARKET SUMMARY", 80)?;

    writeln!(
        out,
        "\n{} {} rates available",
        palette.paint(Color::Cyan, "💱 Currency Exchange Rates:"),
        rates.records.len()
    )?;
    let usd = filter_by_currency(&rates.records, Currency::USD.code());
    if let Some(avg) = average_rates(&usd) {
        writeln!(
            out,
            "   USD Average: Buy {} | Sell {}",
            format_amount(avg.buy, 0),
            format_amount(avg.sell, 0)
        )?;
    }

    writeln!(
        out,
        "\n{} {} prices available",
        palette.paint(Color::Yellow, "🏆 Gold Prices:"),
        gold.records.len()
    )?;
    if let Some(pure) = gold
        .records
        .iter()
        .find(|r| r.name.to_lowercase().contains("24k"))
    {
        writeln!(
            out,
            "   24k Gold: Buy {} | Sell {} ({})",
            format_amount(pure.buy, 0),
            format_amount(pure.sell, 0),
            pure.unit
        )?;
    }

    let mut failed: Vec<&str> = rates
        .failed_sources
        .iter()
        .chain(&gold.failed_sources)
        .map(String::as_str)
        .collect();
    failed.dedup();
    if !failed.is_empty() {
        writeln!(
            out,
            "\n{}",
            palette.paint(Color::Red, &format!("Failed sources: {}", failed.join(", ")))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::sources::{RateSource, SourceAdapter};
    use crate::rates::{AggregatorSettings, RatesService, StalePolicy};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn rates() -> AggregationResult<RateRecord> {
        AggregationResult::new(
            vec![
                RateRecord::new("VCB", Currency::USD, dec!(25240), dec!(25615)),
                RateRecord::new("Techcombank", Currency::USD, dec!(25260), dec!(25640)),
                RateRecord::new("VCB", Currency::EUR, dec!(27120.5), dec!(28390.25)),
            ],
            vec!["TPBank".to_string()],
            Utc::now(),
        )
    }

    fn gold_record(category: GoldCategory, name: &str, buy: Decimal, sell: Decimal) -> GoldRecord {
        GoldRecord {
            category,
            name: name.to_string(),
            original_name: name.to_string(),
            key: name.to_lowercase(),
            buy,
            sell,
            unit: "VND/tael".to_string(),
            last_updated: "10:30 17/10/2026".to_string(),
        }
    }

    fn gold() -> AggregationResult<GoldRecord> {
        AggregationResult::new(
            vec![
                gold_record(GoldCategory::Domestic, "SJC Gold HN", dec!(83000000), dec!(85000000)),
                gold_record(GoldCategory::GoldJewelry, "18k Gold", dec!(5400), dec!(5600)),
                gold_record(GoldCategory::GoldJewelry, "24k Gold Ring 9999", dec!(7500), dec!(7650)),
                gold_record(GoldCategory::GoldJewelry, "Buy-only Bar", dec!(6000), Decimal::ZERO),
            ],
            vec![],
            Utc::now(),
        )
    }

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(dec!(25240), 2), "25,240.00");
        assert_eq!(format_amount(dec!(1234567.891), 2), "1,234,567.89");
        assert_eq!(format_amount(dec!(999), 0), "999");
        assert_eq!(format_amount(dec!(85000000), 0), "85,000,000");
        assert_eq!(format_amount(dec!(0.005), 2), "0.01");
        assert_eq!(format_amount(dec!(-1234.5), 0), "-1,235");
    }

    #[test]
    fn test_currency_table_marks_best_quotes() {
        let text = render_currency_rates(&rates(), Palette::plain());

        let tcb = text.lines().find(|l| l.contains("Techcombank")).unwrap();
        assert!(tcb.contains("25,260.00 ⭐"));
        assert!(!tcb.contains("25,640.00 ⭐"));

        let vcb_usd = text.lines().find(|l| l.contains("25,615.00")).unwrap();
        assert!(vcb_usd.contains("25,615.00 ⭐"));

        assert!(text.contains("No data available for JPY"));
        assert!(text.contains("Failed sources: TPBank"));
    }

    #[test]
    fn test_currency_rows_ranked_by_buy() {
        let text = render_currency_rates(&rates(), Palette::plain());
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("| Techcombank") < pos("| VCB"));
    }

    #[test]
    fn test_plain_palette_emits_no_escapes() {
        assert!(!render_currency_rates(&rates(), Palette::plain()).contains('\x1b'));
        assert!(render_currency_rates(&rates(), Palette::default()).contains("\x1b[32m"));
    }

    #[test]
    fn test_gold_tables_sort_jewelry_and_dash_unquoted() {
        let text = render_gold_prices(&gold(), Palette::plain());

        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("DOMESTIC") < pos("JEWELRY"));
        assert!(pos("24k Gold Ring 9999") < pos("Buy-only Bar"));
        assert!(pos("Buy-only Bar") < pos("18k Gold"));
        assert!(text.contains("85,000,000"));

        let buy_only = text.lines().find(|l| l.contains("Buy-only Bar")).unwrap();
        assert!(buy_only.contains("6,000"));
        assert!(buy_only.contains(" - "));
        assert!(text.contains("Last updated: 10:30 17/10/2026"));
    }

    #[test]
    fn test_gold_highlights_pure_gold_without_breaking_alignment() {
        let text = render_gold_prices(&gold(), Palette::default());
        let pure = text.lines().find(|l| l.contains("24k Gold Ring 9999")).unwrap();
        assert!(pure.contains(&format!("\x1b[33m{:<24}\x1b[0m", "24k Gold Ring 9999")));
    }

    #[test]
    fn test_empty_sections_say_so() {
        let empty: AggregationResult<GoldChart> =
            AggregationResult::failed(vec!["DOJI".to_string()], Utc::now());
        let text = render_gold_charts(&empty, Palette::plain());
        assert!(text.contains("No gold charts available"));
        assert!(text.contains("Failed sources: DOJI"));
    }

    // ==================== Service snapshots ====================

    struct FixedRates;

    #[async_trait]
    impl SourceAdapter for FixedRates {
        type Record = RateRecord;

        fn name(&self) -> &str {
            "VCB"
        }

        async fn fetch(&self) -> anyhow::Result<Vec<RateRecord>> {
            Ok(vec![RateRecord::new("VCB", Currency::USD, dec!(25240), dec!(25615))])
        }
    }

    #[tokio::test]
    async fn test_renders_service_snapshots() {
        let service = RatesService::new(
            vec![Arc::new(FixedRates) as RateSource],
            vec![],
            vec![],
            AggregatorSettings::default(),
            Duration::from_secs(300),
            StalePolicy::ServeStale,
        );

        let rates = service.rates().await;
        let gold = service.gold().await;
        let charts = service.charts().await;

        let text = render_currency_rates(&rates, Palette::plain());
        assert!(text.contains("| VCB"));
        assert!(text.contains("25,240.00 ⭐"));
        assert!(render_gold_prices(&gold, Palette::plain()).contains("No gold rates available"));
        assert!(render_gold_charts(&charts, Palette::plain()).contains("No gold charts available"));
        assert!(render_summary(&rates, &gold, Palette::plain()).contains("1 rates available"));
    }

    #[test]
    fn test_summary_shows_usd_average_and_24k_quote() {
        let text = render_summary(&rates(), &gold(), Palette::plain());

        assert!(text.contains("3 rates available"));
        assert!(text.contains("USD Average: Buy 25,250 | Sell 25,628"));
        assert!(text.contains("4 prices available"));
        assert!(text.contains("24k Gold: Buy 7,500 | Sell 7,650 (VND/tael)"));
        assert!(text.contains("Failed sources: TPBank"));
    }
}
