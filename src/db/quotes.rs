//! Quote Record store (I): the immutable, persisted result of a `createQuote` call.

use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::canonical;
use crate::errors::ApiError;

pub struct NewQuote {
    pub quote_id: Uuid,
    pub chain_id: u64,
    pub maker: Address,
    pub taker: Address,
    pub recipient: Address,
    pub executor: Address,
    pub strategy_id: Uuid,
    pub strategy_version: i32,
    pub strategy_hash: [u8; 32],
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: U256,
    /// Net amount the taker receives, after the executor's fee skim.
    pub buy_amount: U256,
    pub fee_bps: u16,
    pub fee_amount: U256,
    pub nonce: U256,
    pub expiry: u64,
    pub typed_data: JsonValue,
    pub signature: String,
    pub tx_to: Address,
    pub tx_data: String,
    pub tx_value: String,
    pub pricing_as_of_ms: u64,
    pub pricing_confidence: f64,
    pub pricing_stale: bool,
    pub pricing_sources: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuoteRecord {
    pub quote_id: Uuid,
    pub chain_id: i64,
    pub maker: String,
    pub taker: String,
    pub recipient: String,
    pub executor: String,
    pub strategy_id: Uuid,
    pub strategy_version: i32,
    pub strategy_hash: Vec<u8>,
    pub sell_token: String,
    pub buy_token: String,
    pub sell_amount: BigDecimal,
    pub buy_amount: BigDecimal,
    pub fee_bps: i32,
    pub fee_amount: BigDecimal,
    pub nonce: BigDecimal,
    pub expiry: i64,
    pub typed_data: JsonValue,
    pub signature: String,
    pub tx_to: String,
    pub tx_data: String,
    pub tx_value: String,
    pub pricing_as_of_ms: i64,
    pub pricing_confidence: f64,
    pub pricing_stale: bool,
    pub pricing_sources: JsonValue,
}

fn u256_to_decimal(value: U256) -> Result<BigDecimal, ApiError> {
    BigDecimal::from_str(&value.to_string())
        .map_err(|e| ApiError::Internal(format!("amount does not fit in storage: {e}")))
}

/// Inserts the Quote Record. The orchestrator calls this only after signing and calldata
/// assembly succeed; there are no updates after insert in the core flow.
pub async fn insert(pool: &PgPool, quote: NewQuote) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO quotes (
            quote_id, chain_id, maker, taker, recipient, executor,
            strategy_id, strategy_version, strategy_hash,
            sell_token, buy_token, sell_amount, buy_amount, fee_bps, fee_amount,
            nonce, expiry, typed_data, signature, tx_to, tx_data, tx_value,
            status, pricing_as_of_ms, pricing_confidence, pricing_stale, pricing_sources
        ) VALUES (
            $1, $2, $3, $4, $5, $6,
            $7, $8, $9,
            $10, $11, $12, $13, $14, $15,
            $16, $17, $18, $19, $20, $21, $22,
            'ISSUED', $23, $24, $25, $26
        )",
    )
    .bind(quote.quote_id)
    .bind(quote.chain_id as i64)
    .bind(canonical::checksum(&quote.maker))
    .bind(canonical::checksum(&quote.taker))
    .bind(canonical::checksum(&quote.recipient))
    .bind(canonical::checksum(&quote.executor))
    .bind(quote.strategy_id)
    .bind(quote.strategy_version)
    .bind(quote.strategy_hash.as_slice())
    .bind(canonical::checksum(&quote.sell_token))
    .bind(canonical::checksum(&quote.buy_token))
    .bind(u256_to_decimal(quote.sell_amount)?)
    .bind(u256_to_decimal(quote.buy_amount)?)
    .bind(quote.fee_bps as i32)
    .bind(u256_to_decimal(quote.fee_amount)?)
    .bind(u256_to_decimal(quote.nonce)?)
    .bind(quote.expiry as i64)
    .bind(quote.typed_data)
    .bind(quote.signature)
    .bind(canonical::checksum(&quote.tx_to))
    .bind(quote.tx_data)
    .bind(quote.tx_value)
    .bind(quote.pricing_as_of_ms as i64)
    .bind(quote.pricing_confidence)
    .bind(quote.pricing_stale)
    .bind(JsonValue::from(quote.pricing_sources))
    .execute(pool)
    .await?;
    Ok(())
}

impl TryFrom<QuoteRecord> for crate::types::QuoteResponse {
    type Error = ApiError;

    fn try_from(record: QuoteRecord) -> Result<Self, ApiError> {
        use crate::types::{ExecutorCall, HexBytes32, PricingSummary, StrategyRef};

        let to_address = |s: &str| {
            canonical::parse_checksummed(s)
                .map_err(|e| ApiError::Internal(format!("corrupt stored address: {e}")))
        };
        let to_decimal_string = |d: &BigDecimal| d.to_string();

        let sources: Vec<String> = serde_json::from_value(record.pricing_sources)
            .map_err(|e| ApiError::Internal(format!("corrupt stored pricing sources: {e}")))?;

        Ok(Self {
            quote_id: record.quote_id.to_string(),
            chain_id: record.chain_id as u64,
            maker: to_address(&record.maker)?.into(),
            taker: to_address(&record.taker)?.into(),
            recipient: to_address(&record.recipient)?.into(),
            executor: to_address(&record.executor)?.into(),
            strategy: StrategyRef {
                id: record.strategy_id.to_string(),
                version: record.strategy_version,
                hash: HexBytes32(
                    alloy_primitives::B256::from_str(&format!(
                        "0x{}",
                        hex::encode(&record.strategy_hash)
                    ))
                    .map_err(|e| ApiError::Internal(format!("corrupt stored strategy hash: {e}")))?,
                ),
            },
            sell_token: to_address(&record.sell_token)?.into(),
            buy_token: to_address(&record.buy_token)?.into(),
            sell_amount: to_decimal_string(&record.sell_amount),
            buy_amount: to_decimal_string(&record.buy_amount),
            fee_bps: record.fee_bps as u16,
            fee_amount: to_decimal_string(&record.fee_amount),
            expiry: crate::timestamp::UnixTimestamp(record.expiry as u64),
            nonce: to_decimal_string(&record.nonce),
            typed_data: record.typed_data,
            signature: record.signature,
            tx: ExecutorCall {
                to: to_address(&record.tx_to)?.into(),
                data: record.tx_data,
                value: record.tx_value,
            },
            pricing: PricingSummary {
                as_of_ms: record.pricing_as_of_ms as u64,
                confidence_score: record.pricing_confidence,
                stale: record.pricing_stale,
                sources_used: sources,
            },
        })
    }
}

/// Returns the persisted record verbatim, or `None` if `quote_id` is unknown.
pub async fn find_by_id(pool: &PgPool, quote_id: Uuid) -> Result<Option<QuoteRecord>, ApiError> {
    let record = sqlx::query_as::<_, QuoteRecord>(
        "SELECT quote_id, chain_id, maker, taker, recipient, executor,
                strategy_id, strategy_version, strategy_hash,
                sell_token, buy_token, sell_amount, buy_amount, fee_bps, fee_amount,
                nonce, expiry, typed_data, signature, tx_to, tx_data, tx_value,
                pricing_as_of_ms, pricing_confidence, pricing_stale, pricing_sources
         FROM quotes WHERE quote_id = $1",
    )
    .bind(quote_id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}
