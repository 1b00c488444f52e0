//! Wire types for the quote issuance HTTP surface.
//!
//! Addresses are validated as EIP-55 checksummed hex on the way in and rendered the same
//! way on the way out (see [`crate::canonical`]); amounts travel as decimal-string
//! unsigned integers to avoid precision loss outside `u64`/`f64` range.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::canonical;
use crate::timestamp::UnixTimestamp;

/// A checksummed 20-byte EVM address, validated strictly (no case-folding) on input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChecksumAddress(pub Address);

impl From<Address> for ChecksumAddress {
    fn from(address: Address) -> Self {
        ChecksumAddress(address)
    }
}

impl From<ChecksumAddress> for Address {
    fn from(value: ChecksumAddress) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for ChecksumAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        canonical::parse_checksummed(&s)
            .map(ChecksumAddress)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for ChecksumAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&canonical::checksum(&self.0))
    }
}

/// A 32-byte value hex-encoded with a `0x` prefix (strategy hashes, typed-data hashes).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HexBytes32(pub B256);

impl<'de> Deserialize<'de> for HexBytes32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<B256>()
            .map(HexBytes32)
            .map_err(|e| serde::de::Error::custom(format!("invalid 32-byte hex value: {e}")))
    }
}

impl From<B256> for HexBytes32 {
    fn from(value: B256) -> Self {
        HexBytes32(value)
    }
}

impl Serialize for HexBytes32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// Request body for `POST /v1/price`, and the prefix shared by `POST /v1/quote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PriceRequest {
    pub chain_id: u64,
    pub sell_token: ChecksumAddress,
    pub buy_token: ChecksumAddress,
    pub sell_amount: String,
}

/// Request body for `POST /v1/quote`: a [`PriceRequest`] plus the taker identity.
///
/// No `deny_unknown_fields` here: it cannot coexist with `#[serde(flatten)]` on `price` below
/// (`serde_derive` rejects the combination at compile time). `PriceRequest` still rejects unknown
/// fields within its own portion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub price: PriceRequest,
    pub taker: ChecksumAddress,
    #[serde(default)]
    pub recipient: Option<ChecksumAddress>,
}

/// One liquidity venue's contribution to a depth point, as reported by the pricing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub venue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_tier: Option<String>,
}

/// One point on the pricing service's reported depth curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthPoint {
    pub amount_in_raw: String,
    pub amount_out_raw: String,
    pub price: String,
    #[serde(default)]
    pub impact_bps: f64,
    #[serde(default, deserialize_with = "deserialize_provenance")]
    pub provenance: Vec<Provenance>,
}

/// Normalizes `provenance`, which upstream may report as a single object, `null`, a missing
/// field, or a proper array — always surfacing it as an array to the rest of the system.
fn deserialize_provenance<'de, D>(deserializer: D) -> Result<Vec<Provenance>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    let provenance = match value {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)?,
        Some(single) => vec![serde_json::from_value(single).map_err(serde::de::Error::custom)?],
    };
    Ok(provenance)
}

/// The pricing service's full response to `POST {pricingUrl}/depth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub as_of_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub mid_price: String,
    #[serde(default)]
    pub depth_points: Vec<DepthPoint>,
    #[serde(default)]
    pub sources_used: Vec<String>,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub reason_codes: Vec<String>,
}

/// Response body for `POST /v1/price`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub chain_id: u64,
    pub sell_token: ChecksumAddress,
    pub buy_token: ChecksumAddress,
    pub sell_amount: String,
    pub buy_amount: String,
    pub pricing_snapshot: PricingSnapshot,
}

/// Identifies a strategy by its catalog id, version, and on-chain hash fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRef {
    pub id: String,
    pub version: i32,
    pub hash: HexBytes32,
}

/// Request body the Strategy Client POSTs to `{strategyUrl}/intent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyIntentRequest {
    pub chain_id: u64,
    pub maker: ChecksumAddress,
    pub executor: ChecksumAddress,
    pub taker: ChecksumAddress,
    pub sell_token: ChecksumAddress,
    pub buy_token: ChecksumAddress,
    pub sell_amount: String,
    pub recipient: ChecksumAddress,
    pub pricing_snapshot: PricingSnapshot,
    pub strategy: StrategyIntentStrategyParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyIntentStrategyParams {
    pub id: String,
    pub version: i32,
    pub hash: HexBytes32,
    pub params: JsonValue,
}

/// Summary of the pricing inputs the strategy used, echoed back on a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub as_of_ms: u64,
    pub confidence_score: f64,
    pub stale: bool,
    #[serde(default)]
    pub sources_used: Vec<String>,
}

/// The strategy service's response to an intent request: the fee/expiry terms for this fill.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyIntent {
    pub strategy: StrategyRef,
    pub buy_amount: String,
    pub fee_bps: u16,
    pub fee_amount: String,
    /// Either a JSON number or a numeric string; unit (seconds vs. milliseconds) is
    /// disambiguated by magnitude in the orchestrator, see `ApiError`-free
    /// `normalize_expiry`.
    pub expiry: JsonValue,
    pub pricing: PricingSummary,
}

/// The assembled `fill(...)` call the taker submits on-chain to redeem a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorCall {
    pub to: ChecksumAddress,
    pub data: String,
    pub value: String,
}

/// Response body for `POST /v1/quote` and `GET /v1/quotes/{quoteId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote_id: String,
    pub chain_id: u64,
    pub maker: ChecksumAddress,
    pub taker: ChecksumAddress,
    pub recipient: ChecksumAddress,
    pub executor: ChecksumAddress,
    pub strategy: StrategyRef,
    pub sell_token: ChecksumAddress,
    pub buy_token: ChecksumAddress,
    pub sell_amount: String,
    /// Net amount: what the taker receives after the executor's fee skim.
    pub buy_amount: String,
    pub fee_bps: u16,
    pub fee_amount: String,
    pub expiry: UnixTimestamp,
    pub nonce: String,
    pub typed_data: JsonValue,
    pub signature: String,
    pub tx: ExecutorCall,
    pub pricing: PricingSummary,
}

/// One entry of `GET /v1/chains`: chain topology with the signing key stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub chain_id: u64,
    pub name: String,
    pub maker: ChecksumAddress,
    pub executor: ChecksumAddress,
    pub executor_fee_bps: u16,
}

/// Response body for `GET /v1/metadata?chainId=`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    pub chain_id: u64,
    pub chain_name: String,
    pub maker: ChecksumAddress,
    pub executor: ChecksumAddress,
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_strategy: Option<StrategyRef>,
}

/// Response body for `GET /v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: UnixTimestamp,
}
