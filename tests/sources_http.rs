//! Source adapters against a local mock upstream

use reqwest::Client;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tygia::rates::sources::{
    DojiChartSource, DojiClient, DojiGoldSource, HtmlTableSource, SourceAdapter, TpbankSource,
    VcbSource,
};
use tygia::rates::{Aggregate, Aggregator, AggregatorSettings};
use tygia::types::{ChartKind, Currency, GoldCategory, RateRecord};

fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

const VCB_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ExrateList>
  <Exrate CurrencyCode="USD" CurrencyName="US DOLLAR" Buy="25,220.00" Transfer="25,250.00" Sell="25,610.00" />
  <Exrate CurrencyCode="JPY" CurrencyName="YEN" Buy="165.54" Transfer="167.21" Sell="175.07" />
  <Exrate CurrencyCode="THB" CurrencyName="THAI BAHT" Buy="680.10" Transfer="755.67" Sell="784.62" />
</ExrateList>"#;

const TABLE_PAGE: &str = r#"<html><body><table>
  <tr><th>Currency</th><th>Cash</th><th>Transfer</th><th>Sell</th></tr>
  <tr><td>USD Đô la Mỹ</td><td>25,240</td><td>25,270</td><td>25,630</td></tr>
  <tr><td>CNY</td><td>3,440</td><td>3,455</td><td>3,580</td></tr>
</table></body></html>"#;

const DOJI_DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<GoldList>
  <DGPlist>
    <DateTime>10:30 17/10/2026</DateTime>
    <Row Name="Vàng SJC" Key="sjc" Sell="8,450" Buy="8,250" />
  </DGPlist>
  <JewelryList>
    <Row Name="Vàng 24k" Key="24k" Sell="8,350" Buy="8,150" />
  </JewelryList>
  <IGPChart>
    <Row Name="Vàng USD" Key="igp" Url="https://giavang.doji.vn/chart/igp.png" />
  </IGPChart>
</GoldList>"#;

// ==================== VCB ====================

#[tokio::test]
async fn vcb_fetches_and_keeps_supported_currencies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pXML.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VCB_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let source = VcbSource::with_url(client(), format!("{}/pXML.aspx", server.uri()));
    let rates = source.fetch().await.unwrap();

    assert_eq!(source.name(), "VCB");
    assert_eq!(
        rates,
        vec![
            RateRecord::new("VCB", Currency::USD, dec!(25250.00), dec!(25610.00)),
            RateRecord::new("VCB", Currency::JPY, dec!(167.21), dec!(175.07)),
        ]
    );
}

#[tokio::test]
async fn server_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = VcbSource::with_url(client(), server.uri());
    assert!(source.fetch().await.is_err());
}

// ==================== HTML tables ====================

#[tokio::test]
async fn html_table_source_reads_first_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ty-gia"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TABLE_PAGE))
        .mount(&server)
        .await;

    let source = HtmlTableSource::new("Techcombank", client(), format!("{}/ty-gia", server.uri()));
    let rates = source.fetch().await.unwrap();

    assert_eq!(rates.len(), 2);
    assert_eq!(
        rates[0],
        RateRecord::new("Techcombank", Currency::USD, dec!(25240), dec!(25630))
    );
    assert_eq!(rates[1].currency, Currency::CNY);
}

#[tokio::test]
async fn page_without_table_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Loading...</body></html>"))
        .mount(&server)
        .await;

    let source = HtmlTableSource::new("BIDV", client(), server.uri());
    let err = source.fetch().await.unwrap_err();
    assert!(err.to_string().contains("BIDV"));
}

// ==================== TPBank ====================

#[tokio::test]
async fn tpbank_parses_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"data":[{"currencyCode":"EUR","buy":"27,120","sell":28390}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source = TpbankSource::with_url(client(), server.uri());
    let rates = source.fetch().await.unwrap();

    assert_eq!(
        rates,
        vec![RateRecord::new("TPBank", Currency::EUR, dec!(27120), dec!(28390))]
    );
}

// ==================== DOJI ====================

#[tokio::test]
async fn doji_gold_and_chart_sources_each_fetch_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/giavang/"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DOJI_DOCUMENT))
        .expect(2)
        .mount(&server)
        .await;

    let doji = Arc::new(DojiClient::with_url(
        client(),
        format!("{}/api/giavang/", server.uri()),
        "test-key",
    ));
    let gold = DojiGoldSource::new(Arc::clone(&doji)).fetch().await.unwrap();
    let charts = DojiChartSource::new(doji).fetch().await.unwrap();

    assert_eq!(gold.len(), 2);
    assert_eq!(gold[0].category, GoldCategory::Domestic);
    assert_eq!(gold[0].name, "SJC Gold");
    assert_eq!(gold[0].last_updated, "10:30 17/10/2026");
    assert_eq!(gold[1].category, GoldCategory::GoldJewelry);

    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].kind, ChartKind::InternationalChart);
    assert_eq!(charts[0].url, "https://giavang.doji.vn/chart/igp.png");
}

// ==================== End to end ====================

#[tokio::test]
async fn aggregator_isolates_a_slow_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vcb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VCB_FEED))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TABLE_PAGE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let sources: Vec<Arc<dyn SourceAdapter<Record = RateRecord>>> = vec![
        Arc::new(VcbSource::with_url(client(), format!("{}/vcb", server.uri()))),
        Arc::new(HtmlTableSource::new(
            "Vietinbank",
            client(),
            format!("{}/slow", server.uri()),
        )),
    ];
    let aggregator = Aggregator::new(
        sources,
        AggregatorSettings {
            max_concurrency: 2,
            source_timeout: Duration::from_millis(300),
            global_timeout: Duration::from_secs(2),
        },
    );

    let result = aggregator.aggregate().await;

    assert_eq!(result.records.len(), 2);
    assert!(result.records.iter().all(|r| r.source == "VCB"));
    assert_eq!(result.failed_sources, vec!["Vietinbank"]);
}
