//! Admin Surface (N): trivial CRUD over the Pair Admission Store (C) and Strategy Catalog &
//! Chain State (D), plus read-only listings over the Chains Registry (A) and Token Metadata
//! Cache (B). Same request validation and error envelope as the core surface; no
//! pricing/signing/nonce side effects.

use axum::extract::{Extension, Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical;
use crate::db::{pairs, strategies, tokens};
use crate::errors::{self, ApiError};
use crate::handlers::AppState;
use crate::request_id::RequestId;
use crate::types::ChecksumAddress;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pairs", get(list_pairs).post(upsert_pair))
        .route("/admin/strategies", get(list_strategies).post(create_strategy))
        .route("/admin/strategies/{id}/activate", post(activate_strategy))
        .route("/admin/config", put(set_paused))
        .route("/admin/tokens", get(list_tokens))
}

#[derive(Debug, Deserialize)]
struct ChainIdQuery {
    #[serde(rename = "chainId")]
    chain_id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PairView {
    chain_id: u64,
    token0: ChecksumAddress,
    token1: ChecksumAddress,
    enabled: bool,
}

async fn list_pairs(
    State(state): State<AppState>,
    Query(query): Query<ChainIdQuery>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match pairs::list(&state.orchestrator.pool, query.chain_id).await {
        Ok(records) => Json(
            records
                .into_iter()
                .filter_map(|r| to_pair_view(r).ok())
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

fn to_pair_view(record: pairs::PairRecord) -> Result<PairView, ApiError> {
    Ok(PairView {
        chain_id: record.chain_id as u64,
        token0: canonical::parse_checksummed(&record.token0)
            .map_err(|e| ApiError::Internal(format!("corrupt stored address: {e}")))?
            .into(),
        token1: canonical::parse_checksummed(&record.token1)
            .map_err(|e| ApiError::Internal(format!("corrupt stored address: {e}")))?
            .into(),
        enabled: record.enabled,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UpsertPairRequest {
    chain_id: u64,
    token_a: ChecksumAddress,
    token_b: ChecksumAddress,
    enabled: bool,
}

async fn upsert_pair(
    State(state): State<AppState>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<UpsertPairRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return errors::render(&rejection.into(), &uri, &request_id),
    };
    let result = pairs::upsert(
        &state.orchestrator.pool,
        request.chain_id,
        request.token_a.into(),
        request.token_b.into(),
        request.enabled,
    )
    .await
    .and_then(to_pair_view);
    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

async fn list_strategies(
    State(state): State<AppState>,
    Query(query): Query<ChainIdQuery>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match strategies::list(&state.orchestrator.pool, query.chain_id).await {
        Ok(records) => Json(records.into_iter().map(StrategyView::from).collect::<Vec<_>>())
            .into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyView {
    id: Uuid,
    chain_id: u64,
    name: String,
    version: i32,
    params: serde_json::Value,
    hash: String,
    enabled: bool,
}

impl From<strategies::StrategyRecord> for StrategyView {
    fn from(record: strategies::StrategyRecord) -> Self {
        Self {
            id: record.id,
            chain_id: record.chain_id as u64,
            name: record.name,
            version: record.version,
            params: record.params,
            hash: format!("0x{}", hex::encode(&record.hash)),
            enabled: record.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateStrategyRequest {
    chain_id: u64,
    name: String,
    version: i32,
    params: serde_json::Value,
    hash: String,
}

async fn create_strategy(
    State(state): State<AppState>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<CreateStrategyRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return errors::render(&rejection.into(), &uri, &request_id),
    };

    let hash = match parse_hash32(&request.hash) {
        Ok(hash) => hash,
        Err(error) => return errors::render(&error, &uri, &request_id),
    };

    let result = strategies::create(
        &state.orchestrator.pool,
        strategies::NewStrategy {
            chain_id: request.chain_id,
            name: request.name,
            version: request.version,
            params: request.params,
            hash,
        },
    )
    .await
    .map(StrategyView::from);

    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

fn parse_hash32(s: &str) -> Result<[u8; 32], ApiError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes =
        hex::decode(trimmed).map_err(|e| ApiError::BadRequest(format!("invalid hash hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::BadRequest("hash must be exactly 32 bytes".to_string()))
}

async fn activate_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ChainIdQuery>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match strategies::set_active(&state.orchestrator.pool, query.chain_id, id).await {
        Ok(chain_state) => Json(ChainStateView::from(chain_state)).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainStateView {
    chain_id: u64,
    active_strategy_id: Option<Uuid>,
    paused: bool,
}

impl From<strategies::ChainStateRecord> for ChainStateView {
    fn from(record: strategies::ChainStateRecord) -> Self {
        Self {
            chain_id: record.chain_id as u64,
            active_strategy_id: record.active_strategy_id,
            paused: record.paused,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SetPausedRequest {
    chain_id: u64,
    paused: bool,
}

async fn set_paused(
    State(state): State<AppState>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<SetPausedRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return errors::render(&rejection.into(), &uri, &request_id),
    };
    match strategies::set_paused(&state.orchestrator.pool, request.chain_id, request.paused).await
    {
        Ok(chain_state) => Json(ChainStateView::from(chain_state)).into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenView {
    chain_id: u64,
    address: String,
    decimals: i16,
    symbol: Option<String>,
}

async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<ChainIdQuery>,
    uri: Uri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match tokens::list(&state.orchestrator.pool, query.chain_id)
        .await
        .map_err(ApiError::from)
    {
        Ok(records) => Json(
            records
                .into_iter()
                .map(|r| TokenView {
                    chain_id: r.chain_id as u64,
                    address: r.address,
                    decimals: r.decimals,
                    symbol: r.symbol,
                })
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(error) => errors::render(&error, &uri, &request_id),
    }
}
