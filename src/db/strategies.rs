//! Strategy Catalog & Chain State (D): strategy definitions plus the per-chain
//! active-strategy / paused flags.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StrategyRecord {
    pub id: Uuid,
    pub chain_id: i64,
    pub name: String,
    pub version: i32,
    pub params: JsonValue,
    pub hash: Vec<u8>,
    pub enabled: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChainStateRecord {
    pub chain_id: i64,
    pub active_strategy_id: Option<Uuid>,
    pub paused: bool,
}

pub struct NewStrategy {
    pub chain_id: u64,
    pub name: String,
    pub version: i32,
    pub params: JsonValue,
    pub hash: [u8; 32],
}

/// Lists every strategy defined for a chain, newest first.
pub async fn list(pool: &PgPool, chain_id: u64) -> Result<Vec<StrategyRecord>, ApiError> {
    let records = sqlx::query_as::<_, StrategyRecord>(
        "SELECT id, chain_id, name, version, params, hash, enabled FROM strategies
         WHERE chain_id = $1 ORDER BY created_at DESC",
    )
    .bind(chain_id as i64)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Creates a new strategy. Always `enabled = true`; strategies are immutable once created
/// except for that flag, which only `setActive`/deactivation-by-replacement touches.
pub async fn create(pool: &PgPool, new: NewStrategy) -> Result<StrategyRecord, ApiError> {
    let id = Uuid::new_v4();
    let record = sqlx::query_as::<_, StrategyRecord>(
        "INSERT INTO strategies (id, chain_id, name, version, params, hash, enabled)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE)
         RETURNING id, chain_id, name, version, params, hash, enabled",
    )
    .bind(id)
    .bind(new.chain_id as i64)
    .bind(&new.name)
    .bind(new.version)
    .bind(&new.params)
    .bind(new.hash.as_slice())
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Looks up a strategy by id regardless of chain.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<StrategyRecord>, ApiError> {
    let record = sqlx::query_as::<_, StrategyRecord>(
        "SELECT id, chain_id, name, version, params, hash, enabled FROM strategies WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Reads a chain's state, creating a default `{paused: false, activeStrategyId: null}` row
/// on first read if none exists yet.
pub async fn get_chain_state(pool: &PgPool, chain_id: u64) -> Result<ChainStateRecord, ApiError> {
    let record = sqlx::query_as::<_, ChainStateRecord>(
        "INSERT INTO chain_state (chain_id, paused) VALUES ($1, FALSE)
         ON CONFLICT (chain_id) DO UPDATE SET chain_id = EXCLUDED.chain_id
         RETURNING chain_id, active_strategy_id, paused",
    )
    .bind(chain_id as i64)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Sets a chain's active strategy. Fails `STRATEGY_NOT_FOUND` if `strategy_id` doesn't
/// belong to `chain_id`.
pub async fn set_active(
    pool: &PgPool,
    chain_id: u64,
    strategy_id: Uuid,
) -> Result<ChainStateRecord, ApiError> {
    let strategy = find_by_id(pool, strategy_id)
        .await?
        .filter(|s| s.chain_id as u64 == chain_id)
        .ok_or_else(|| ApiError::StrategyNotFound(strategy_id.to_string(), chain_id))?;

    let record = sqlx::query_as::<_, ChainStateRecord>(
        "INSERT INTO chain_state (chain_id, active_strategy_id, paused) VALUES ($1, $2, FALSE)
         ON CONFLICT (chain_id) DO UPDATE SET active_strategy_id = EXCLUDED.active_strategy_id
         RETURNING chain_id, active_strategy_id, paused",
    )
    .bind(chain_id as i64)
    .bind(strategy.id)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Toggles a chain's paused flag.
pub async fn set_paused(pool: &PgPool, chain_id: u64, paused: bool) -> Result<ChainStateRecord, ApiError> {
    let record = sqlx::query_as::<_, ChainStateRecord>(
        "INSERT INTO chain_state (chain_id, paused) VALUES ($1, $2)
         ON CONFLICT (chain_id) DO UPDATE SET paused = EXCLUDED.paused
         RETURNING chain_id, active_strategy_id, paused",
    )
    .bind(chain_id as i64)
    .bind(paused)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Resolves a chain's active strategy in full, failing `STRATEGY_NOT_CONFIGURED` if none is
/// set and `STRATEGY_NOT_ENABLED` if the configured one has since been disabled.
pub async fn get_active_strategy(pool: &PgPool, chain_id: u64) -> Result<StrategyRecord, ApiError> {
    let state = get_chain_state(pool, chain_id).await?;
    let strategy_id = state
        .active_strategy_id
        .ok_or(ApiError::StrategyNotConfigured(chain_id))?;
    let strategy = find_by_id(pool, strategy_id)
        .await?
        .ok_or(ApiError::StrategyNotConfigured(chain_id))?;
    if !strategy.enabled {
        return Err(ApiError::StrategyNotEnabled(chain_id));
    }
    Ok(strategy)
}
