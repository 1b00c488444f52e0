//! Signer (H): one EIP-712 signer per chain, initialized single-flight, producing the
//! 65-byte ECDSA signature over the `Quote` typed message. Domain and type ordering are
//! load-bearing — they must byte-match the executor contract's own domain separator and type
//! hash, or every fill reverts on-chain.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_signer::Signer as _;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain, sol};
use tokio::sync::{Mutex, OnceCell};

use crate::config::ChainConfig;
use crate::errors::ApiError;

sol! {
    #[derive(Debug)]
    struct Quote {
        address maker;
        address tokenIn;
        address tokenOut;
        uint256 amountIn;
        uint256 amountOut;
        bytes32 strategyHash;
        uint256 nonce;
        uint256 expiry;
    }
}

pub struct QuotePayload {
    pub maker: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub strategy_hash: B256,
    pub nonce: U256,
    pub expiry: u64,
}

pub struct SignedQuote {
    /// `0x`-prefixed hex-encoded 65-byte ECDSA signature.
    pub signature: String,
    /// The typed-data payload actually signed, suitable for embedding in the quote response.
    pub typed_data: serde_json::Value,
}

/// Per-chain signer cache. Each entry is built once, from the chain's configured signing key.
pub struct SignerCache {
    entries: Mutex<HashMap<u64, Arc<OnceCell<PrivateKeySigner>>>>,
}

impl SignerCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn get(&self, chain: &ChainConfig) -> Result<PrivateKeySigner, ApiError> {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(chain.chain_id)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_try_init(|| async {
            PrivateKeySigner::from_bytes(&(*chain.signing_key.as_bytes()).into())
                .map_err(|e| ApiError::Internal(format!("invalid signing key: {e}")))
        })
        .await
        .map(|signer| signer.clone())
    }
}

impl Default for SignerCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Signs `payload` for `chain`, returning the hex signature and the typed-data JSON that was
/// signed (for inclusion in the quote response).
pub async fn sign(
    cache: &SignerCache,
    chain: &ChainConfig,
    payload: QuotePayload,
) -> Result<SignedQuote, ApiError> {
    let signer = cache.get(chain).await?;

    let domain = eip712_domain! {
        name: "AquaQuoteExecutor",
        version: "1",
        chain_id: chain.chain_id,
        verifying_contract: chain.executor_address,
    };

    let quote = Quote {
        maker: payload.maker,
        tokenIn: payload.token_in,
        tokenOut: payload.token_out,
        amountIn: payload.amount_in,
        amountOut: payload.amount_out,
        strategyHash: payload.strategy_hash,
        nonce: payload.nonce,
        expiry: U256::from(payload.expiry),
    };

    let hash = quote.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| ApiError::Internal(format!("signing failed: {e}")))?;

    let typed_data = serde_json::json!({
        "domain": {
            "name": "AquaQuoteExecutor",
            "version": "1",
            "chainId": chain.chain_id,
            "verifyingContract": chain.executor_address,
        },
        "primaryType": "Quote",
        "types": {
            "Quote": [
                {"name": "maker", "type": "address"},
                {"name": "tokenIn", "type": "address"},
                {"name": "tokenOut", "type": "address"},
                {"name": "amountIn", "type": "uint256"},
                {"name": "amountOut", "type": "uint256"},
                {"name": "strategyHash", "type": "bytes32"},
                {"name": "nonce", "type": "uint256"},
                {"name": "expiry", "type": "uint256"},
            ],
        },
        "message": {
            "maker": payload.maker,
            "tokenIn": payload.token_in,
            "tokenOut": payload.token_out,
            "amountIn": payload.amount_in.to_string(),
            "amountOut": payload.amount_out.to_string(),
            "strategyHash": payload.strategy_hash,
            "nonce": payload.nonce.to_string(),
            "expiry": payload.expiry,
        },
    });

    Ok(SignedQuote {
        signature: format!("0x{}", hex::encode(signature.as_bytes())),
        typed_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn test_chain() -> ChainConfig {
        ChainConfig {
            chain_id: 31337,
            name: "anvil".to_string(),
            rpc_url: "http://localhost:8545".parse().unwrap(),
            aqua_address: Address::ZERO,
            executor_address: Address::repeat_byte(0x11),
            maker_address: Address::repeat_byte(0x22),
            // Anvil's well-known default account #0 key; never used outside local tests.
            signing_key: crate::config::EvmPrivateKey::from_str(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            )
            .unwrap(),
            executor_fee_bps: 25,
        }
    }

    fn payload() -> QuotePayload {
        QuotePayload {
            maker: Address::repeat_byte(0x22),
            token_in: Address::repeat_byte(0x33),
            token_out: Address::repeat_byte(0x44),
            amount_in: U256::from(1_000_000u64),
            amount_out: U256::from(350_877_193u64),
            strategy_hash: B256::repeat_byte(0xab),
            nonce: U256::from(7u64),
            expiry: 1_700_000_120,
        }
    }

    #[tokio::test]
    async fn sign_produces_a_65_byte_hex_signature() {
        let cache = SignerCache::new();
        let chain = test_chain();
        let signed = sign(&cache, &chain, payload()).await.expect("signing succeeds");
        let bytes = hex::decode(signed.signature.trim_start_matches("0x")).unwrap();
        assert_eq!(bytes.len(), 65);
    }

    #[tokio::test]
    async fn sign_is_deterministic_for_the_same_payload() {
        let cache = SignerCache::new();
        let chain = test_chain();
        let first = sign(&cache, &chain, payload()).await.unwrap();
        let second = sign(&cache, &chain, payload()).await.unwrap();
        assert_eq!(first.signature, second.signature);
    }

    #[tokio::test]
    async fn sign_differs_when_the_nonce_differs() {
        let cache = SignerCache::new();
        let chain = test_chain();
        let mut other = payload();
        other.nonce = U256::from(8u64);
        let first = sign(&cache, &chain, payload()).await.unwrap();
        let second = sign(&cache, &chain, other).await.unwrap();
        assert_ne!(first.signature, second.signature);
    }
}
