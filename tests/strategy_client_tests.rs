//! Exercises the Strategy Client against a mocked intent endpoint.

use std::time::Duration;

use aqua_rfq::types::{
    ChecksumAddress, PricingSnapshot, StrategyIntentRequest, StrategyIntentStrategyParams,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn addr(tail: u8) -> ChecksumAddress {
    let mut bytes = [0u8; 20];
    bytes[19] = tail;
    alloy_primitives::Address::from(bytes).into()
}

fn intent_request() -> StrategyIntentRequest {
    StrategyIntentRequest {
        chain_id: 8453,
        maker: addr(1),
        executor: addr(2),
        taker: addr(3),
        sell_token: addr(4),
        buy_token: addr(5),
        sell_amount: "1000000".to_string(),
        recipient: addr(3),
        pricing_snapshot: PricingSnapshot {
            as_of_ms: 1_700_000_000_000,
            block_number: None,
            mid_price: "3500.12".to_string(),
            depth_points: Vec::new(),
            sources_used: vec!["uniswap-v3".to_string()],
            latency_ms: 40,
            confidence_score: 0.97,
            stale: false,
            reason_codes: Vec::new(),
        },
        strategy: StrategyIntentStrategyParams {
            id: uuid::Uuid::nil().to_string(),
            version: 1,
            hash: alloy_primitives::B256::ZERO.into(),
            params: serde_json::json!({}),
        },
    }
}

#[tokio::test]
async fn request_intent_returns_decision_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/intent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "strategy": {"id": uuid::Uuid::nil().to_string(), "version": 1, "hash": format!("0x{}", "00".repeat(32))},
            "buyAmount": "350000000",
            "feeBps": 25,
            "feeAmount": "877193",
            "expiry": 1_700_000_120u64,
            "pricing": {
                "asOfMs": 1_700_000_000_000u64,
                "confidenceScore": 0.97,
                "stale": false,
                "sourcesUsed": ["uniswap-v3"],
            },
        })))
        .mount(&server)
        .await;

    let client =
        aqua_rfq::strategy_client::StrategyClient::new(&server.uri(), Duration::from_secs(1))
            .expect("valid base url");
    let intent = client.request_intent(&intent_request()).await.expect("intent request succeeds");

    assert_eq!(intent.buy_amount, "350000000");
    assert_eq!(intent.fee_bps, 25);
}

#[tokio::test]
async fn request_intent_maps_non_200_to_strategy_upstream_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/intent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client =
        aqua_rfq::strategy_client::StrategyClient::new(&server.uri(), Duration::from_secs(1))
            .expect("valid base url");
    let error = client.request_intent(&intent_request()).await.unwrap_err();

    assert!(matches!(error, aqua_rfq::ApiError::StrategyUpstreamFailed(_)));
}
