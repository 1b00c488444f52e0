//! ABI-encodes the executor `fill(...)` call (§4.I step 14).

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, sol};

sol! {
    struct FillOrder {
        address maker;
        address tokenIn;
        address tokenOut;
        uint256 amountIn;
        uint256 amountOut;
        bytes32 strategyHash;
        uint256 nonce;
        uint256 expiry;
    }

    function fill(FillOrder order, bytes signature, uint256 minNetOut) external;
}

pub struct FillParams {
    pub maker: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub strategy_hash: B256,
    pub nonce: U256,
    pub expiry: u64,
    pub signature: Vec<u8>,
    pub min_net_out: U256,
}

pub struct ExecutorCall {
    pub to: Address,
    /// `0x`-prefixed hex-encoded calldata.
    pub data: String,
    /// Decimal-string wei value; always `"0"` for `fill`.
    pub value: String,
}

/// Builds the `{to, data, value}` call the taker submits on-chain to execute the quote.
pub fn build_fill_call(executor: Address, params: FillParams) -> ExecutorCall {
    let call = fillCall {
        order: FillOrder {
            maker: params.maker,
            tokenIn: params.token_in,
            tokenOut: params.token_out,
            amountIn: params.amount_in,
            amountOut: params.amount_out,
            strategyHash: params.strategy_hash,
            nonce: params.nonce,
            expiry: U256::from(params.expiry),
        },
        signature: Bytes::from(params.signature),
        minNetOut: params.min_net_out,
    };

    ExecutorCall {
        to: executor,
        data: format!("0x{}", hex::encode(call.abi_encode())),
        value: "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tail: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = tail;
        Address::from(bytes)
    }

    fn params() -> FillParams {
        FillParams {
            maker: addr(1),
            token_in: addr(2),
            token_out: addr(3),
            amount_in: U256::from(1_000_000u64),
            amount_out: U256::from(350_877_193u64),
            strategy_hash: B256::repeat_byte(0xab),
            nonce: U256::from(7u64),
            expiry: 1_700_000_120,
            signature: vec![0xde, 0xad, 0xbe, 0xef],
            min_net_out: U256::from(350_000_000u64),
        }
    }

    #[test]
    fn build_fill_call_targets_the_executor_and_carries_no_value() {
        let executor = addr(9);
        let call = build_fill_call(executor, params());
        assert_eq!(call.to, executor);
        assert_eq!(call.value, "0");
    }

    #[test]
    fn build_fill_call_is_deterministic_and_starts_with_the_function_selector() {
        let first = build_fill_call(addr(9), params());
        let second = build_fill_call(addr(9), params());
        assert_eq!(first.data, second.data);
        let selector = format!("0x{}", hex::encode(fillCall::SELECTOR));
        assert!(first.data.starts_with(&selector));
    }

    #[test]
    fn build_fill_call_differs_when_the_nonce_differs() {
        let mut other = params();
        other.nonce = U256::from(8u64);
        let first = build_fill_call(addr(9), params());
        let second = build_fill_call(addr(9), other);
        assert_ne!(first.data, second.data);
    }
}
