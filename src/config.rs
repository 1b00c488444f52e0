//! Process configuration: the chains topology file plus environment-derived settings.

use alloy_primitives::{Address, B256};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// CLI arguments for the quote issuance server.
#[derive(Parser, Debug)]
#[command(name = "aqua-rfq")]
#[command(about = "Aqua RFQ quote issuance server")]
struct CliArgs {
    /// Path to the JSON chains configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"http://localhost:8083"`
/// - Simple env var: `"$PRICING_URL"`
/// - Braced env var: `"${PRICING_URL}"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    fn parse_env_var_syntax(s: &str) -> Option<String> {
        if s.starts_with("${") && s.ends_with('}') {
            Some(s[2..s.len() - 1].to_string())
        } else if s.starts_with('$') && s.len() > 1 {
            let var_name = &s[1..];
            if var_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                Some(var_name.to_string())
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = if let Some(var_name) = Self::parse_env_var_syntax(&s) {
            std::env::var(&var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?
        } else {
            s
        };

        value
            .parse::<T>()
            .map(LiteralOrEnv)
            .map_err(|e| serde::de::Error::custom(format!("failed to parse value: {}", e)))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

// ============================================================================
// EVM Private Key
// ============================================================================

/// A validated EVM private key (32 bytes), resolved from `signingKeyEnv` at startup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EvmPrivateKey(B256);

impl EvmPrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }
}

impl PartialEq for EvmPrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl FromStr for EvmPrivateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s).map(Self).map_err(|e| format!("invalid signing key: {}", e))
    }
}

// ============================================================================
// Chain Config
// ============================================================================

/// One entry of the chains topology file: `chainId → {name, rpcUrl, aqua, executor,
/// signingKeyEnv, executorFeeBps?}`.
///
/// `signingKeyEnv` names an environment variable (conventionally `SIGNING_KEY_<chainId>`)
/// holding the maker's raw private key; it is resolved once at load time, never re-read.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfigEntry {
    pub name: String,
    #[serde(rename = "rpcUrl")]
    pub rpc_url: Url,
    pub aqua: Address,
    pub executor: Address,
    #[serde(rename = "signingKeyEnv")]
    pub signing_key_env: String,
    #[serde(rename = "executorFeeBps", default)]
    pub executor_fee_bps: u16,
}

/// The resolved, immutable configuration for a single chain: everything the Chains Registry
/// hands out via `get(chainId)`.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: Url,
    pub aqua_address: Address,
    pub executor_address: Address,
    pub maker_address: Address,
    pub signing_key: EvmPrivateKey,
    pub executor_fee_bps: u16,
}

/// Raw, untyped chains file: a JSON object keyed by decimal chain id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainsFile(pub HashMap<String, ChainConfigEntry>);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("chains config: invalid chain id key '{0}'")]
    InvalidChainId(String),
    #[error("chains config: signing key env var '{env_var}' not set for chain {chain_id}")]
    MissingSigningKey { chain_id: u64, env_var: String },
    #[error("chains config: invalid signing key for chain {chain_id}: {reason}")]
    InvalidSigningKey { chain_id: u64, reason: String },
    #[error("executorFeeBps for chain {chain_id} must be in 0..=9999, got {value}")]
    InvalidFeeBps { chain_id: u64, value: u16 },
}

impl ChainsFile {
    /// Resolves every entry's signing key from its environment variable and derives the
    /// maker address, producing the in-memory records the Chains Registry serves.
    pub fn resolve(self) -> Result<Vec<ChainConfig>, ConfigError> {
        let mut chains = Vec::with_capacity(self.0.len());
        for (chain_id_str, entry) in self.0 {
            let chain_id: u64 = chain_id_str
                .parse()
                .map_err(|_| ConfigError::InvalidChainId(chain_id_str.clone()))?;

            if entry.executor_fee_bps > 9999 {
                return Err(ConfigError::InvalidFeeBps {
                    chain_id,
                    value: entry.executor_fee_bps,
                });
            }

            let raw_key = std::env::var(&entry.signing_key_env).map_err(|_| {
                ConfigError::MissingSigningKey {
                    chain_id,
                    env_var: entry.signing_key_env.clone(),
                }
            })?;
            let signing_key = EvmPrivateKey::from_str(&raw_key).map_err(|reason| {
                ConfigError::InvalidSigningKey { chain_id, reason }
            })?;
            let maker_address = maker_address_of(&signing_key);

            chains.push(ChainConfig {
                chain_id,
                name: entry.name,
                rpc_url: entry.rpc_url,
                aqua_address: entry.aqua,
                executor_address: entry.executor,
                maker_address,
                signing_key,
                executor_fee_bps: entry.executor_fee_bps,
            });
        }
        chains.sort_by_key(|c| c.chain_id);
        Ok(chains)
    }
}

/// Derives the maker's public address from its signing key (the `makerAddress` field is
/// always derived, never configured directly).
fn maker_address_of(key: &EvmPrivateKey) -> Address {
    use alloy_signer_local::PrivateKeySigner;
    use alloy_signer::Signer;

    let signer = PrivateKeySigner::from_bytes(&(*key.as_bytes()).into())
        .expect("32-byte key is a valid secp256k1 scalar");
    signer.address()
}

// ============================================================================
// Global Settings
// ============================================================================

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080)
}

fn default_host() -> IpAddr {
    std::env::var("HOST")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)))
}

fn default_request_timeout_ms() -> u64 {
    std::env::var("REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000)
}

fn default_global_timeout_ms() -> u64 {
    std::env::var("GLOBAL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8000)
}

fn default_quote_expiry_seconds() -> u64 {
    std::env::var("QUOTE_EXPIRY_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(120)
}

fn required_url_env(var: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).map_err(|_| {
        ConfigError::JsonParse(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{var} is not set"),
        )))
    })?;
    Url::parse(&raw).map_err(|e| {
        ConfigError::JsonParse(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{var} is not a valid URL: {e}"),
        )))
    })
}

/// Process-wide configuration: the resolved chain topology plus the environment-derived
/// settings shared by every chain (listen address, database, upstream defaults, timeouts).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: IpAddr,
    pub chains: Vec<ChainConfig>,
    pub database_url: String,
    /// Default Pricing Client base URL, used when a chain's config doesn't override it.
    pub pricing_url: Url,
    /// Default Strategy Client base URL, used when a chain's config doesn't override it.
    pub strategy_url: Url,
    pub request_timeout_ms: u64,
    pub global_timeout_ms: u64,
    /// Fallback quote expiry window; only used if a strategy's pricing snapshot omits one.
    pub quote_expiry_seconds: u64,
}

impl Config {
    /// Loads the chains topology file (from `--config`/`CONFIG`, default `config.json`) and
    /// layers environment-derived settings on top.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config.clone(), e))?;
        Self::load_from_path(config_path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let chains_file: ChainsFile = serde_json::from_str(&content)?;
        let chains = chains_file.resolve()?;

        Ok(Config {
            port: default_port(),
            host: default_host(),
            chains,
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| {
                "postgres://localhost/aqua_rfq".to_string()
            }),
            pricing_url: required_url_env("PRICING_URL")?,
            strategy_url: required_url_env("STRATEGY_URL")?,
            request_timeout_ms: default_request_timeout_ms(),
            global_timeout_ms: default_global_timeout_ms(),
            quote_expiry_seconds: default_quote_expiry_seconds(),
        })
    }
}
