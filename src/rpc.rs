//! Read-only JSON-RPC leg of the Token Metadata Cache (B): fetches `decimals()`/`symbol()`
//! for a token that hasn't been cached yet.
//!
//! Providers are read-only (no wallet, no gas filling) and are built lazily, one per chain,
//! the first time a call needs them. Construction is single-flight: concurrent first-callers
//! for the same chain await the same in-flight connection rather than racing to build two.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_sol_types::sol;
use tokio::sync::{Mutex, OnceCell};

use crate::config::ChainConfig;
use crate::errors::ApiError;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: Option<String>,
}

/// One read-only provider per chain, built on first use.
pub struct ProviderCache {
    entries: Mutex<HashMap<u64, Arc<OnceCell<RootProvider>>>>,
}

impl ProviderCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn get(&self, chain: &ChainConfig) -> Result<RootProvider, ApiError> {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(chain.chain_id)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_try_init(|| async {
            Ok::<_, ApiError>(ProviderBuilder::new().connect_http(chain.rpc_url.clone()))
        })
        .await
        .map(|provider| provider.clone())
    }
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `decimals()` and `symbol()` for `token` on `chain` as two parallel JSON-RPC calls.
/// A missing/reverting `symbol()` (common for some wrapped tokens) is tolerated and reported
/// as `None`; a missing `decimals()` is not, since amount math is meaningless without it.
pub async fn fetch_token_metadata(
    cache: &ProviderCache,
    chain: &ChainConfig,
    token: Address,
) -> Result<TokenMetadata, ApiError> {
    let provider = cache.get(chain).await?;
    let erc20 = IERC20::new(token, provider);

    let (decimals, symbol) = tokio::join!(erc20.decimals().call(), erc20.symbol().call());

    let decimals = decimals
        .map_err(|e| ApiError::Internal(format!("decimals() call failed for {token}: {e}")))?;
    let symbol = symbol.ok();

    Ok(TokenMetadata { decimals, symbol })
}

/// `ensure(chainId, address)`: returns the cached token record, resolving and persisting it
/// via JSON-RPC on a cache miss.
pub async fn ensure(
    pool: &sqlx::PgPool,
    cache: &ProviderCache,
    chain: &ChainConfig,
    token: Address,
) -> Result<crate::db::tokens::TokenRecord, ApiError> {
    if let Some(record) = crate::db::tokens::get(pool, chain.chain_id, token).await? {
        return Ok(record);
    }

    let metadata = fetch_token_metadata(cache, chain, token).await?;
    crate::db::tokens::insert(
        pool,
        chain.chain_id,
        token,
        metadata.decimals,
        metadata.symbol.clone(),
    )
    .await?;

    crate::db::tokens::get(pool, chain.chain_id, token)
        .await?
        .ok_or_else(|| ApiError::Internal("token record vanished after insert".into()))
}
