//! Token Metadata Cache (B): `(chainId, address) -> decimals, symbol`.

use alloy_primitives::Address;
use sqlx::PgPool;

use crate::canonical;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecord {
    pub chain_id: i64,
    pub address: String,
    pub decimals: i16,
    pub symbol: Option<String>,
}

/// Returns the cached record for `(chain_id, address)`, if one has been persisted.
pub async fn get(
    pool: &PgPool,
    chain_id: u64,
    address: Address,
) -> Result<Option<TokenRecord>, sqlx::Error> {
    sqlx::query_as::<_, TokenRecord>(
        "SELECT chain_id, address, decimals, symbol FROM tokens WHERE chain_id = $1 AND address = $2",
    )
    .bind(chain_id as i64)
    .bind(canonical::checksum(&address))
    .fetch_optional(pool)
    .await
}

/// Persists a freshly resolved token record. Tokens are never mutated once cached, so a
/// conflicting insert (a concurrent first-caller for the same token) is treated as a no-op.
pub async fn insert(
    pool: &PgPool,
    chain_id: u64,
    address: Address,
    decimals: u8,
    symbol: Option<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tokens (chain_id, address, decimals, symbol) VALUES ($1, $2, $3, $4)
         ON CONFLICT (chain_id, address) DO NOTHING",
    )
    .bind(chain_id as i64)
    .bind(canonical::checksum(&address))
    .bind(decimals as i16)
    .bind(symbol)
    .execute(pool)
    .await?;
    Ok(())
}

/// Lists every cached token for a chain (used by the read-only admin listing).
pub async fn list(pool: &PgPool, chain_id: u64) -> Result<Vec<TokenRecord>, sqlx::Error> {
    sqlx::query_as::<_, TokenRecord>(
        "SELECT chain_id, address, decimals, symbol FROM tokens WHERE chain_id = $1 ORDER BY address",
    )
    .bind(chain_id as i64)
    .fetch_all(pool)
    .await
}
