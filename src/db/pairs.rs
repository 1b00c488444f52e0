//! Pair Admission Store (C): enabled/disabled trading pairs keyed by the canonical
//! `(chainId, token0, token1)` ordering (see [`crate::canonical::canonical_pair`]).

use alloy_primitives::Address;
use sqlx::PgPool;

use crate::canonical::{self, canonical_pair};
use crate::errors::ApiError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PairRecord {
    pub chain_id: i64,
    pub token0: String,
    pub token1: String,
    pub enabled: bool,
}

/// Fails `PAIR_NOT_ENABLED` unless the canonicalized pair is present and enabled.
pub async fn ensure_enabled(
    pool: &PgPool,
    chain_id: u64,
    a: Address,
    b: Address,
) -> Result<(), ApiError> {
    let (token0, token1, _) = canonical_pair(a, b);
    let record = sqlx::query_as::<_, PairRecord>(
        "SELECT chain_id, token0, token1, enabled FROM pairs WHERE chain_id = $1 AND token0 = $2 AND token1 = $3",
    )
    .bind(chain_id as i64)
    .bind(canonical::checksum(&token0))
    .bind(canonical::checksum(&token1))
    .fetch_optional(pool)
    .await?;

    match record {
        Some(record) if record.enabled => Ok(()),
        _ => Err(ApiError::PairNotEnabled),
    }
}

/// Inserts or updates a pair's admission state, after canonicalizing the pair.
pub async fn upsert(
    pool: &PgPool,
    chain_id: u64,
    a: Address,
    b: Address,
    enabled: bool,
) -> Result<PairRecord, ApiError> {
    let (token0, token1, _) = canonical_pair(a, b);
    let record = sqlx::query_as::<_, PairRecord>(
        "INSERT INTO pairs (chain_id, token0, token1, enabled) VALUES ($1, $2, $3, $4)
         ON CONFLICT (chain_id, token0, token1) DO UPDATE SET enabled = EXCLUDED.enabled
         RETURNING chain_id, token0, token1, enabled",
    )
    .bind(chain_id as i64)
    .bind(canonical::checksum(&token0))
    .bind(canonical::checksum(&token1))
    .bind(enabled)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Lists every configured pair for a chain (used by the admin listing).
pub async fn list(pool: &PgPool, chain_id: u64) -> Result<Vec<PairRecord>, ApiError> {
    let records = sqlx::query_as::<_, PairRecord>(
        "SELECT chain_id, token0, token1, enabled FROM pairs WHERE chain_id = $1 ORDER BY token0, token1",
    )
    .bind(chain_id as i64)
    .fetch_all(pool)
    .await?;
    Ok(records)
}
