//! HTTP JSON API
//!
//! Thin layer over [`RatesService`]: validate the path, read the cached
//! snapshot, run the query functions and serialize.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::{internal_error_body, ApiError};
use super::types::*;
use crate::rates::{best_rates, filter_by_currency, group_by_category, spread_stats, RatesService};
use crate::types::{Currency, GoldChart, GoldCategory, GoldRecord, RateRecord};

type AppState = Arc<RatesService>;

/// Create the API router with all endpoints
pub fn create_router(service: Arc<RatesService>, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/", get(index))
        // Exchange rates
        .route("/api/rates", get(get_rates))
        .route("/api/rates/:currency", get(get_currency_rates))
        .route("/api/rates/:currency/best", get(get_best_rates))
        // Gold
        .route("/api/gold", get(get_gold))
        .route("/api/gold/charts", get(get_gold_charts))
        .route("/api/gold/:category", get(get_gold_category))
        // Static enumerations
        .route("/api/banks", get(get_banks))
        .route("/api/currencies", get(get_currencies))
        .fallback(not_found)
        .with_state(service);

    apply_layers(router, cors_enabled)
}

fn apply_layers(router: Router, cors_enabled: bool) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
    } else {
        router
    }
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET / - Health check and capability descriptor
async fn index(State(service): State<AppState>) -> Json<IndexResponse> {
    let endpoints = BTreeMap::from([
        ("/", "Health check"),
        ("/api/rates", "Get all exchange rates"),
        ("/api/rates/<currency>", "Get rates for a specific currency"),
        ("/api/rates/<currency>/best", "Get best rates for a specific currency"),
        ("/api/gold", "Get all gold prices"),
        ("/api/gold/<category>", "Get gold prices for a category"),
        ("/api/gold/charts", "Get gold price chart links"),
        ("/api/banks", "Get list of supported banks"),
        ("/api/currencies", "Get list of supported currencies"),
    ]);

    Json(IndexResponse {
        status: "ok",
        message: "Exchange rate and gold price API is running",
        version: env!("CARGO_PKG_VERSION"),
        supported_banks: service.banks(),
        supported_currencies: Currency::codes(),
        gold_categories: GoldCategory::path_names(),
        endpoints,
        cache: service.status(),
    })
}

/// GET /api/rates - Every quote from every source
async fn get_rates(
    State(service): State<AppState>,
) -> Result<Json<ListResponse<RateRecord>>, ApiError> {
    let result = service.rates().await;
    if result.is_empty() {
        return Err(ApiError::Unavailable {
            message: "No rates available".to_string(),
            failed_sources: result.failed_sources.clone(),
        });
    }
    Ok(Json(ListResponse::from_result(&result)))
}

/// GET /api/rates/:currency - Quotes for one currency with a cross-bank comparison
async fn get_currency_rates(
    Path(raw): Path<String>,
    State(service): State<AppState>,
) -> Result<Json<CurrencyRatesResponse>, ApiError> {
    let currency = parse_currency(&raw)?;
    let result = service.rates().await;

    let data = filter_by_currency(&result.records, currency.code());
    if data.is_empty() {
        return Err(no_rates_for(currency, &result.failed_sources));
    }

    let comparison = spread_stats(&data);
    Ok(Json(CurrencyRatesResponse::new(
        currency,
        data,
        comparison,
        result.failed_sources.clone(),
        result.fetched_at,
    )))
}

/// GET /api/rates/:currency/best - Highest buy and lowest sell
async fn get_best_rates(
    Path(raw): Path<String>,
    State(service): State<AppState>,
) -> Result<Json<BestRatesResponse>, ApiError> {
    let currency = parse_currency(&raw)?;
    let result = service.rates().await;

    let data = filter_by_currency(&result.records, currency.code());
    let best = best_rates(&data).map_err(|_| no_rates_for(currency, &result.failed_sources))?;

    Ok(Json(BestRatesResponse {
        status: SUCCESS,
        currency,
        best_buy: best.best_buy,
        best_sell: best.best_sell,
        ranking: Ranking::new(&data),
        failed_sources: result.failed_sources.clone(),
        timestamp: result.fetched_at,
    }))
}

/// GET /api/gold - All gold prices with per-category counts
async fn get_gold(
    State(service): State<AppState>,
) -> Result<Json<GoldResponse<GoldRecord>>, ApiError> {
    let result = service.gold().await;
    if result.is_empty() {
        return Err(ApiError::Unavailable {
            message: "No gold prices available".to_string(),
            failed_sources: result.failed_sources.clone(),
        });
    }

    let categories = group_by_category(&result.records)
        .into_iter()
        .map(|(category, records)| (category.as_str(), records.len()))
        .collect();

    Ok(Json(GoldResponse {
        status: SUCCESS,
        data: result.records.clone(),
        count: result.records.len(),
        categories,
        failed_sources: result.failed_sources.clone(),
        timestamp: result.fetched_at,
    }))
}

/// GET /api/gold/:category - domestic, international or jewelry
async fn get_gold_category(
    Path(raw): Path<String>,
    State(service): State<AppState>,
) -> Result<Json<GoldCategoryResponse<GoldRecord>>, ApiError> {
    let category = GoldCategory::from_str(&raw)
        .ok_or_else(|| ApiError::UnsupportedCategory(raw.trim().to_lowercase()))?;
    let result = service.gold().await;

    let data = group_by_category(&result.records)
        .remove(&category)
        .unwrap_or_default();
    if data.is_empty() {
        return Err(ApiError::NotFound {
            message: format!("No gold prices found for category {}", category.path_name()),
            failed_sources: result.failed_sources.clone(),
        });
    }

    Ok(Json(GoldCategoryResponse {
        status: SUCCESS,
        category: category.as_str(),
        count: data.len(),
        data,
        failed_sources: result.failed_sources.clone(),
        timestamp: result.fetched_at,
    }))
}

/// GET /api/gold/charts - Chart image links
async fn get_gold_charts(
    State(service): State<AppState>,
) -> Result<Json<ListResponse<GoldChart>>, ApiError> {
    let result = service.charts().await;
    if result.is_empty() {
        return Err(ApiError::Unavailable {
            message: "No gold charts available".to_string(),
            failed_sources: result.failed_sources.clone(),
        });
    }
    Ok(Json(ListResponse::from_result(&result)))
}

/// GET /api/banks - Configured exchange-rate sources
async fn get_banks(State(service): State<AppState>) -> Json<BanksResponse> {
    Json(BanksResponse {
        status: SUCCESS,
        banks: service.banks(),
    })
}

/// GET /api/currencies - Supported currencies
async fn get_currencies() -> Json<CurrenciesResponse> {
    Json(CurrenciesResponse {
        status: SUCCESS,
        currencies: Currency::codes(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}

fn parse_currency(raw: &str) -> Result<Currency, ApiError> {
    Currency::from_str(raw).ok_or_else(|| ApiError::UnsupportedCurrency(raw.trim().to_uppercase()))
}

fn no_rates_for(currency: Currency, failed_sources: &[String]) -> ApiError {
    ApiError::NotFound {
        message: format!("No rates found for currency {}", currency),
        failed_sources: failed_sources.to_vec(),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, Json(internal_error_body())).into_response()
}
