//! HTTP endpoints for the quote issuance surface: `/v1/health`, `/v1/chains`,
//! `/v1/metadata`, `/v1/price`, `/v1/quote`, `/v1/quotes/{quoteId}`.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{self, ApiError};
use crate::orchestrator::Orchestrator;
use crate::request_id::RequestId;
use crate::timestamp::UnixTimestamp;
use crate::types::{ChainMetadata, HealthResponse, PriceRequest, QuoteRequest};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(get_health))
        .route("/v1/chains", get(get_chains))
        .route("/v1/metadata", get(get_metadata))
        .route("/v1/price", post(post_price))
        .route("/v1/quote", post(post_quote))
        .route("/v1/quotes/{quote_id}", get(get_quote_by_id))
}

#[instrument(skip_all)]
pub async fn get_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp: UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0)),
    })
}

#[instrument(skip_all)]
pub async fn get_chains(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.chains.list())
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    #[serde(rename = "chainId")]
    chain_id: u64,
}

#[instrument(skip(state), fields(chain_id = query.chain_id))]
pub async fn get_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match metadata(&state, query.chain_id).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

async fn metadata(state: &AppState, chain_id: u64) -> Result<ChainMetadata, ApiError> {
    let chain = state.orchestrator.chains.get(chain_id)?;
    let chain_state =
        crate::db::strategies::get_chain_state(&state.orchestrator.pool, chain_id).await?;

    let active_strategy = match chain_state.active_strategy_id {
        Some(id) => crate::db::strategies::find_by_id(&state.orchestrator.pool, id)
            .await?
            .map(|s| crate::types::StrategyRef {
                id: s.id.to_string(),
                version: s.version,
                hash: alloy_primitives::B256::from_slice(&s.hash).into(),
            }),
        None => None,
    };

    Ok(ChainMetadata {
        chain_id,
        chain_name: chain.name.clone(),
        maker: chain.maker_address.into(),
        executor: chain.executor_address.into(),
        paused: chain_state.paused,
        active_strategy,
    })
}

#[instrument(skip_all)]
pub async fn post_price(
    State(state): State<AppState>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PriceRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return errors::render(&rejection.into(), &uri, &request_id),
    };
    match state.orchestrator.get_price(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

#[instrument(skip_all)]
pub async fn post_quote(
    State(state): State<AppState>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<QuoteRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return errors::render(&rejection.into(), &uri, &request_id),
    };
    match state.orchestrator.create_quote(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

#[instrument(skip(state))]
pub async fn get_quote_by_id(
    State(state): State<AppState>,
    Path(quote_id): Path<String>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let quote_id = match Uuid::parse_str(&quote_id) {
        Ok(id) => id,
        Err(_) => {
            return errors::render(
                &ApiError::QuoteNotFound(quote_id),
                &uri,
                &request_id,
            );
        }
    };
    match state.orchestrator.get_quote_by_id(quote_id).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}
