//! The error taxonomy and its HTTP rendering.
//!
//! Every component raises one of these variants; the transport layer (see
//! [`crate::handlers`] / [`crate::admin`]) catches them at the boundary and renders the
//! uniform `{code, message, statusCode, requestId, path, timestamp}` envelope. Nothing
//! recovers from an `ApiError` partway through — rejecting is meant to be loud.

use axum::Json;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::request_id::RequestId;
use crate::timestamp::UnixTimestamp;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("chain {0} is not configured")]
    ChainNotSupported(u64),
    #[error("chain {0} is paused")]
    ChainPaused(u64),
    #[error("pair is not enabled for trading")]
    PairNotEnabled,
    #[error("chain {0} has no active strategy configured")]
    StrategyNotConfigured(u64),
    #[error("the active strategy for chain {0} is disabled")]
    StrategyNotEnabled(u64),
    #[error("strategy {0} does not belong to chain {1}")]
    StrategyNotFound(String, u64),
    #[error("pricing service request failed: {0}")]
    PricingUpstreamFailed(String),
    #[error("strategy service request failed: {0}")]
    StrategyUpstreamFailed(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("request exceeded its global deadline")]
    RequestTimeout,
    #[error("quote {0} was not found")]
    QuoteNotFound(String),
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::ChainNotSupported(_) => "CHAIN_NOT_SUPPORTED",
            ApiError::ChainPaused(_) => "CHAIN_PAUSED",
            ApiError::PairNotEnabled => "PAIR_NOT_ENABLED",
            ApiError::StrategyNotConfigured(_) => "STRATEGY_NOT_CONFIGURED",
            ApiError::StrategyNotEnabled(_) => "STRATEGY_NOT_ENABLED",
            ApiError::StrategyNotFound(_, _) => "STRATEGY_NOT_FOUND",
            ApiError::PricingUpstreamFailed(_) => "PRICING_UPSTREAM_FAILED",
            ApiError::StrategyUpstreamFailed(_) => "STRATEGY_UPSTREAM_FAILED",
            ApiError::InvalidAmount(_) => "INVALID_AMOUNT",
            ApiError::RequestTimeout => "REQUEST_TIMEOUT",
            ApiError::QuoteNotFound(_) => "QUOTE_NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::StrategyNotFound(_, _) | ApiError::QuoteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PricingUpstreamFailed(_) | ApiError::StrategyUpstreamFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ChainNotSupported(_)
            | ApiError::ChainPaused(_)
            | ApiError::PairNotEnabled
            | ApiError::StrategyNotConfigured(_)
            | ApiError::StrategyNotEnabled(_)
            | ApiError::InvalidAmount(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    code: &'static str,
    message: String,
    status_code: u16,
    request_id: String,
    path: String,
    timestamp: UnixTimestamp,
}

/// Renders an [`ApiError`] as the uniform error envelope, given the request's path and
/// resolved [`RequestId`]. Handlers call this directly rather than relying on a blanket
/// `IntoResponse` impl, since the envelope needs context `ApiError` alone doesn't carry.
pub fn render(error: &ApiError, path: &Uri, request_id: &RequestId) -> Response {
    let status = error.status_code();
    let envelope = ErrorEnvelope {
        code: error.code(),
        message: error.to_string(),
        status_code: status.as_u16(),
        request_id: request_id.0.clone(),
        path: path.path().to_string(),
        timestamp: UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0)),
    };
    (status, Json(envelope)).into_response()
}

/// Catches the bare `408` that [`tower_http::timeout::TimeoutLayer`] produces on deadline
/// expiry and re-renders it as the same envelope every other `ApiError` uses. Must sit
/// outside `TimeoutLayer` and inside the request-id layer so the id is already attached.
pub async fn timeout_fallback(request: Request, next: Next) -> Response {
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_default();
    let response = next.run(request).await;
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return render(&ApiError::RequestTimeout, &uri, &request_id);
    }
    response
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
