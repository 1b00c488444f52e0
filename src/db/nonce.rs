//! Nonce Allocator (G): the one hard-ordering invariant in the system. `allocate` holds a
//! row-level exclusive lock on the `(chainId, makerAddress)` row for the full
//! read-modify-write, inside a single transaction, so concurrent callers are strictly
//! serialized and no nonce is ever handed out twice.

use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use std::str::FromStr;

use crate::canonical;
use crate::errors::ApiError;

/// Returns the current `nextNonce` for `(chain_id, maker)` and atomically increments it.
/// The row is created with `nextNonce = 0` if this is the first allocation for this maker
/// on this chain. Once the transaction commits the allocated nonce is considered spent: a
/// downstream failure in the caller does not roll this back (see [`crate::orchestrator`]).
pub async fn allocate(pool: &PgPool, chain_id: u64, maker: Address) -> Result<U256, ApiError> {
    let maker = canonical::checksum(&maker);
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO nonce_state (chain_id, maker_address, next_nonce) VALUES ($1, $2, 0)
         ON CONFLICT (chain_id, maker_address) DO NOTHING",
    )
    .bind(chain_id as i64)
    .bind(&maker)
    .execute(&mut *tx)
    .await?;

    let (current,): (BigDecimal,) = sqlx::query_as(
        "SELECT next_nonce FROM nonce_state WHERE chain_id = $1 AND maker_address = $2 FOR UPDATE",
    )
    .bind(chain_id as i64)
    .bind(&maker)
    .fetch_one(&mut *tx)
    .await?;

    let next = &current + BigDecimal::from(1u8);
    sqlx::query("UPDATE nonce_state SET next_nonce = $1 WHERE chain_id = $2 AND maker_address = $3")
        .bind(&next)
        .bind(chain_id as i64)
        .bind(&maker)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    U256::from_str(&current.to_string())
        .map_err(|e| ApiError::Internal(format!("corrupt nonce value in storage: {e}")))
}
