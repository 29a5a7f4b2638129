//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::{Currency, GoldCategory};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Currency {0} not supported")]
    UnsupportedCurrency(String),

    #[error("Gold category {0} not supported")]
    UnsupportedCategory(String),

    /// Valid request, but the snapshot has nothing matching
    #[error("{message}")]
    NotFound {
        message: String,
        failed_sources: Vec<String>,
    },

    /// Every source failed
    #[error("{message}")]
    Unavailable {
        message: String,
        failed_sources: Vec<String>,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedCurrency(_) | ApiError::UnsupportedCategory(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let body = match self {
            ApiError::UnsupportedCurrency(_) => json!({
                "error": message,
                "supported_currencies": Currency::codes(),
            }),
            ApiError::UnsupportedCategory(_) => json!({
                "error": message,
                "supported_categories": GoldCategory::path_names(),
            }),
            ApiError::NotFound { failed_sources, .. }
            | ApiError::Unavailable { failed_sources, .. } => json!({
                "error": message,
                "failed_sources": failed_sources,
                "data": [],
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Body for 500s from the panic handler; details stay in the logs
pub(crate) fn internal_error_body() -> serde_json::Value {
    json!({
        "error": "Internal server error",
        "message": "An unexpected error occurred",
    })
}
