//! Quote Orchestrator (I): composes A–H into the two hot paths, `getPrice` and `createQuote`,
//! plus `getQuoteById`.

use alloy_primitives::{B256, U256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::amounts::{clamp_fee_bps, gross_up, normalize_uint};
use crate::calldata::{self, FillParams};
use crate::chain::ChainsRegistry;
use crate::db::{nonce, pairs, quotes, strategies};
use crate::errors::ApiError;
use crate::pricing_client::PricingClient;
use crate::rpc::{self, ProviderCache};
use crate::signer::{self, QuotePayload, SignerCache};
use crate::strategy_client::StrategyClient;
use crate::timestamp::UnixTimestamp;
use crate::types::{
    ExecutorCall, PriceRequest, PriceResponse, PricingSummary, QuoteRequest, QuoteResponse,
    StrategyIntentRequest, StrategyIntentStrategyParams, StrategyRef,
};

/// Everything the orchestrator needs to reach A–H; owned by the router state.
pub struct Orchestrator {
    pub pool: PgPool,
    pub chains: ChainsRegistry,
    pub providers: ProviderCache,
    pub signers: SignerCache,
    pub pricing: PricingClient,
    pub strategy: StrategyClient,
    pub quote_expiry_seconds: u64,
}

/// Intermediate result of the shared price sub-flow (§4.I steps 1–6), reused by `createQuote`.
struct PricedRequest {
    sell_token: alloy_primitives::Address,
    buy_token: alloy_primitives::Address,
    sell_amount_raw: String,
    buy_amount_raw: String,
    snapshot: crate::types::PricingSnapshot,
}

impl Orchestrator {
    async fn price(&self, req: &PriceRequest) -> Result<PricedRequest, ApiError> {
        let chain = self.chains.get(req.chain_id)?;

        let chain_state = strategies::get_chain_state(&self.pool, req.chain_id).await?;
        if chain_state.paused {
            return Err(ApiError::ChainPaused(req.chain_id));
        }

        let sell_token: alloy_primitives::Address = req.sell_token.into();
        let buy_token: alloy_primitives::Address = req.buy_token.into();
        pairs::ensure_enabled(&self.pool, req.chain_id, sell_token, buy_token).await?;

        let (_sell_meta, _buy_meta) = tokio::try_join!(
            rpc::ensure(&self.pool, &self.providers, chain, sell_token),
            rpc::ensure(&self.pool, &self.providers, chain, buy_token),
        )?;

        let snapshot = self.pricing.request_depth(req).await?;
        let buy_amount_raw = snapshot
            .depth_points
            .first()
            .map(|p| p.amount_out_raw.clone())
            .unwrap_or_else(|| "0".to_string());

        Ok(PricedRequest {
            sell_token,
            buy_token,
            sell_amount_raw: req.sell_amount.clone(),
            buy_amount_raw,
            snapshot,
        })
    }

    /// `getPrice` (§4.I): indicative pricing only, no signing, no nonce, no persistence.
    pub async fn get_price(&self, req: &PriceRequest) -> Result<PriceResponse, ApiError> {
        let priced = self.price(req).await?;
        Ok(PriceResponse {
            chain_id: req.chain_id,
            sell_token: priced.sell_token.into(),
            buy_token: priced.buy_token.into(),
            sell_amount: priced.sell_amount_raw,
            buy_amount: priced.buy_amount_raw,
            pricing_snapshot: priced.snapshot,
        })
    }

    /// `createQuote` (§4.I): the firm-quote flow. Steps 1–6 reuse `price`; 7–15 build,
    /// sign, persist, and return the executable quote.
    pub async fn create_quote(&self, req: &QuoteRequest) -> Result<QuoteResponse, ApiError> {
        let chain = self.chains.get(req.price.chain_id)?;
        let priced = self.price(&req.price).await?;

        let taker: alloy_primitives::Address = req.taker.into();
        let recipient: alloy_primitives::Address = req.recipient.map(Into::into).unwrap_or(taker);

        let strategy = strategies::get_active_strategy(&self.pool, req.price.chain_id).await?;
        let strategy_hash = B256::from_slice(&strategy.hash);

        let intent_request = StrategyIntentRequest {
            chain_id: req.price.chain_id,
            maker: chain.maker_address.into(),
            executor: chain.executor_address.into(),
            taker: taker.into(),
            sell_token: priced.sell_token.into(),
            buy_token: priced.buy_token.into(),
            sell_amount: priced.sell_amount_raw.clone(),
            recipient: recipient.into(),
            pricing_snapshot: priced.snapshot.clone(),
            strategy: StrategyIntentStrategyParams {
                id: strategy.id.to_string(),
                version: strategy.version,
                hash: strategy_hash.into(),
                params: strategy.params.clone(),
            },
        };
        let intent = self.strategy.request_intent(&intent_request).await?;

        let net_out = normalize_uint(&intent.buy_amount)?;
        let fee_bps = clamp_fee_bps(chain.executor_fee_bps);
        let (gross_out, min_net_out) = gross_up(net_out, fee_bps);

        let expiry = normalize_expiry(&intent.expiry, self.quote_expiry_seconds);
        let sell_amount = normalize_uint(&priced.sell_amount_raw)?;

        // Step 11: nonce allocation commits immediately; nothing after this point rolls it back.
        let allocated_nonce = nonce::allocate(&self.pool, req.price.chain_id, chain.maker_address).await?;

        let quote_id = Uuid::new_v4();

        let signed = signer::sign(
            &self.signers,
            chain,
            QuotePayload {
                maker: chain.maker_address,
                token_in: priced.sell_token,
                token_out: priced.buy_token,
                amount_in: sell_amount,
                amount_out: gross_out,
                strategy_hash,
                nonce: allocated_nonce,
                expiry,
            },
        )
        .await?;

        let fee_amount = normalize_uint(&intent.fee_amount)?;

        let fill_call = calldata::build_fill_call(
            chain.executor_address,
            FillParams {
                maker: chain.maker_address,
                token_in: priced.sell_token,
                token_out: priced.buy_token,
                amount_in: sell_amount,
                amount_out: gross_out,
                strategy_hash,
                nonce: allocated_nonce,
                expiry,
                signature: hex_decode_signature(&signed.signature)?,
                min_net_out,
            },
        );

        quotes::insert(
            &self.pool,
            quotes::NewQuote {
                quote_id,
                chain_id: req.price.chain_id,
                maker: chain.maker_address,
                taker,
                recipient,
                executor: chain.executor_address,
                strategy_id: strategy.id,
                strategy_version: strategy.version,
                strategy_hash: strategy_hash.0,
                sell_token: priced.sell_token,
                buy_token: priced.buy_token,
                sell_amount,
                buy_amount: net_out,
                fee_bps: intent.fee_bps,
                fee_amount,
                nonce: allocated_nonce,
                expiry,
                typed_data: signed.typed_data.clone(),
                signature: signed.signature.clone(),
                tx_to: fill_call.to,
                tx_data: fill_call.data.clone(),
                tx_value: fill_call.value.clone(),
                pricing_as_of_ms: intent.pricing.as_of_ms,
                pricing_confidence: intent.pricing.confidence_score,
                pricing_stale: intent.pricing.stale,
                pricing_sources: intent.pricing.sources_used.clone(),
            },
        )
        .await?;

        Ok(QuoteResponse {
            quote_id: quote_id.to_string(),
            chain_id: req.price.chain_id,
            maker: chain.maker_address.into(),
            taker: taker.into(),
            recipient: recipient.into(),
            executor: chain.executor_address.into(),
            strategy: StrategyRef {
                id: strategy.id.to_string(),
                version: strategy.version,
                hash: strategy_hash.into(),
            },
            sell_token: priced.sell_token.into(),
            buy_token: priced.buy_token.into(),
            sell_amount: sell_amount.to_string(),
            buy_amount: net_out.to_string(),
            fee_bps: intent.fee_bps,
            fee_amount: fee_amount.to_string(),
            expiry: UnixTimestamp(expiry),
            nonce: allocated_nonce.to_string(),
            typed_data: signed.typed_data,
            signature: signed.signature,
            tx: ExecutorCall {
                to: fill_call.to.into(),
                data: fill_call.data,
                value: fill_call.value,
            },
            pricing: PricingSummary {
                as_of_ms: intent.pricing.as_of_ms,
                confidence_score: intent.pricing.confidence_score,
                stale: intent.pricing.stale,
                sources_used: intent.pricing.sources_used,
            },
        })
    }

    /// `getQuoteById`: returns the persisted record verbatim.
    pub async fn get_quote_by_id(&self, quote_id: Uuid) -> Result<QuoteResponse, ApiError> {
        let record = quotes::find_by_id(&self.pool, quote_id)
            .await?
            .ok_or_else(|| ApiError::QuoteNotFound(quote_id.to_string()))?;
        record.try_into()
    }
}

/// Takes the strategy intent's `expiry` (a JSON number or numeric string, unit unspecified) and
/// normalizes it to seconds: values above 10^12 are treated as milliseconds, and anything
/// negative clamps to 0. Only input that fails to parse as a number at all falls back to
/// `now() + fallback_seconds`.
fn normalize_expiry(expiry: &serde_json::Value, fallback_seconds: u64) -> u64 {
    let raw: Option<f64> = match expiry {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    };
    match raw {
        Some(value) => {
            let value = if value >= 0.0 { value as u64 } else { 0 };
            if value > 1_000_000_000_000 {
                value / 1000
            } else {
                value
            }
        }
        None => UnixTimestamp::try_now()
            .map(|now| now.0)
            .unwrap_or(0)
            .saturating_add(fallback_seconds),
    }
}

fn hex_decode_signature(signature: &str) -> Result<Vec<u8>, ApiError> {
    let trimmed = signature.strip_prefix("0x").unwrap_or(signature);
    hex::decode(trimmed).map_err(|e| ApiError::Internal(format!("invalid signature hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_expiry_treats_small_numbers_as_seconds() {
        let expiry = serde_json::json!(1_700_000_120u64);
        assert_eq!(normalize_expiry(&expiry, 120), 1_700_000_120);
    }

    #[test]
    fn normalize_expiry_treats_large_numbers_as_milliseconds() {
        let expiry = serde_json::json!(1_700_000_120_000u64);
        assert_eq!(normalize_expiry(&expiry, 120), 1_700_000_120);
    }

    #[test]
    fn normalize_expiry_accepts_numeric_strings() {
        let expiry = serde_json::json!("1700000120");
        assert_eq!(normalize_expiry(&expiry, 120), 1_700_000_120);
    }

    #[test]
    fn normalize_expiry_falls_back_on_garbage() {
        let expiry = serde_json::json!("not-a-timestamp");
        let fallback = normalize_expiry(&expiry, 120);
        // Falls back to now() + 120; just assert it's in the future and not the parsed value.
        assert!(fallback > 0);
    }

    #[test]
    fn normalize_expiry_clamps_zero_to_zero() {
        let expiry = serde_json::json!(0);
        assert_eq!(normalize_expiry(&expiry, 120), 0);
    }

    #[test]
    fn normalize_expiry_clamps_negative_to_zero() {
        let expiry = serde_json::json!(-5);
        assert_eq!(normalize_expiry(&expiry, 120), 0);
    }

    #[test]
    fn hex_decode_signature_accepts_0x_prefix() {
        let decoded = hex_decode_signature("0xdeadbeef").unwrap();
        assert_eq!(decoded, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn hex_decode_signature_accepts_bare_hex() {
        let decoded = hex_decode_signature("deadbeef").unwrap();
        assert_eq!(decoded, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn hex_decode_signature_rejects_invalid_hex() {
        assert!(hex_decode_signature("not-hex").is_err());
    }
}
