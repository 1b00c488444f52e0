//! Chains Registry (A): the in-memory, read-only topology of configured chains.

use crate::config::{ChainConfig, Config};
use crate::errors::ApiError;
use crate::types::ChainSummary;

/// Holds every chain's resolved configuration, keyed by `chainId`. Built once at startup from
/// [`Config`] and never mutated afterward.
#[derive(Debug, Clone)]
pub struct ChainsRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainsRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            chains: config.chains.clone(),
        }
    }

    /// Resolves a chain by id, failing `CHAIN_NOT_SUPPORTED` if unknown.
    pub fn get(&self, chain_id: u64) -> Result<&ChainConfig, ApiError> {
        self.chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .ok_or(ApiError::ChainNotSupported(chain_id))
    }

    /// Lists every configured chain with secrets stripped, for `GET /v1/chains`.
    pub fn list(&self) -> Vec<ChainSummary> {
        self.chains
            .iter()
            .map(|c| ChainSummary {
                chain_id: c.chain_id,
                name: c.name.clone(),
                maker: c.maker_address.into(),
                executor: c.executor_address.into(),
                executor_fee_bps: c.executor_fee_bps,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use std::str::FromStr;

    fn test_config(chain_ids: &[u64]) -> Config {
        let chains = chain_ids
            .iter()
            .map(|&chain_id| ChainConfig {
                chain_id,
                name: format!("chain-{chain_id}"),
                rpc_url: "http://localhost:8545".parse().unwrap(),
                aqua_address: Address::ZERO,
                executor_address: Address::repeat_byte(0x11),
                maker_address: Address::repeat_byte(0x22),
                signing_key: crate::config::EvmPrivateKey::from_str(
                    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
                )
                .unwrap(),
                executor_fee_bps: 25,
            })
            .collect();
        Config {
            port: 8080,
            host: "0.0.0.0".parse().unwrap(),
            chains,
            database_url: "postgres://localhost/aqua_rfq".to_string(),
            pricing_url: "http://localhost:8081".parse().unwrap(),
            strategy_url: "http://localhost:8082".parse().unwrap(),
            request_timeout_ms: 5000,
            global_timeout_ms: 8000,
            quote_expiry_seconds: 120,
        }
    }

    #[test]
    fn get_resolves_a_configured_chain() {
        let registry = ChainsRegistry::new(&test_config(&[8453, 1]));
        assert_eq!(registry.get(8453).unwrap().chain_id, 8453);
    }

    #[test]
    fn get_fails_chain_not_supported_for_unknown_chain() {
        let registry = ChainsRegistry::new(&test_config(&[8453]));
        assert!(matches!(
            registry.get(999),
            Err(ApiError::ChainNotSupported(999))
        ));
    }

    #[test]
    fn list_strips_the_signing_key() {
        let registry = ChainsRegistry::new(&test_config(&[8453, 1]));
        let summaries = registry.list();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].chain_id, 8453);
    }
}
