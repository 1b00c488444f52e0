//! Exercises the Pricing Client against a mocked depth endpoint.

use std::time::Duration;

use aqua_rfq::types::{ChecksumAddress, PriceRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn addr(tail: u8) -> ChecksumAddress {
    let mut bytes = [0u8; 20];
    bytes[19] = tail;
    alloy_primitives::Address::from(bytes).into()
}

fn request() -> PriceRequest {
    PriceRequest {
        chain_id: 8453,
        sell_token: addr(1),
        buy_token: addr(2),
        sell_amount: "1000000".to_string(),
    }
}

#[tokio::test]
async fn request_depth_returns_snapshot_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/depth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "asOfMs": 1_700_000_000_000u64,
            "midPrice": "3500.12",
            "depthPoints": [{
                "amountInRaw": "1000000",
                "amountOutRaw": "350000000",
                "price": "3500.12",
                "impactBps": 2.5,
                "provenance": [{"venue": "uniswap-v3"}],
            }],
            "sourcesUsed": ["uniswap-v3"],
            "latencyMs": 40,
            "confidenceScore": 0.97,
            "stale": false,
            "reasonCodes": [],
        })))
        .mount(&server)
        .await;

    let client = aqua_rfq::pricing_client::PricingClient::new(&server.uri(), Duration::from_secs(1))
        .expect("valid base url");
    let snapshot = client.request_depth(&request()).await.expect("depth request succeeds");

    assert_eq!(snapshot.mid_price, "3500.12");
    assert_eq!(snapshot.depth_points.len(), 1);
    assert_eq!(snapshot.depth_points[0].amount_out_raw, "350000000");
    assert!(!snapshot.stale);
}

#[tokio::test]
async fn request_depth_maps_non_200_to_pricing_upstream_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/depth"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = aqua_rfq::pricing_client::PricingClient::new(&server.uri(), Duration::from_secs(1))
        .expect("valid base url");
    let error = client.request_depth(&request()).await.unwrap_err();

    assert!(matches!(error, aqua_rfq::ApiError::PricingUpstreamFailed(_)));
}

#[tokio::test]
async fn request_depth_maps_malformed_body_to_pricing_upstream_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/depth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = aqua_rfq::pricing_client::PricingClient::new(&server.uri(), Duration::from_secs(1))
        .expect("valid base url");
    let error = client.request_depth(&request()).await.unwrap_err();

    assert!(matches!(error, aqua_rfq::ApiError::PricingUpstreamFailed(_)));
}
