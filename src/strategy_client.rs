//! Strategy Client (F): POSTs intent requests to the strategy service under a timeout.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::errors::ApiError;
use crate::types::{StrategyIntent, StrategyIntentRequest};

#[derive(Clone, Debug)]
pub struct StrategyClient {
    intent_url: Url,
    client: Client,
    timeout: Duration,
}

impl StrategyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = normalize_base(base_url)?;
        let intent_url = base
            .join("intent")
            .map_err(|e| ApiError::Internal(format!("invalid strategy url: {e}")))?;
        Ok(Self {
            intent_url,
            client: Client::new(),
            timeout,
        })
    }

    /// Requests a strategy intent (fee/expiry decision) for a candidate quote.
    pub async fn request_intent(
        &self,
        request: &StrategyIntentRequest,
    ) -> Result<StrategyIntent, ApiError> {
        let response = self
            .client
            .post(self.intent_url.clone())
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::StrategyUpstreamFailed(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            return Err(ApiError::StrategyUpstreamFailed(format!(
                "strategy service returned {status}"
            )));
        }

        response
            .json::<StrategyIntent>()
            .await
            .map_err(|e| ApiError::StrategyUpstreamFailed(format!("invalid response body: {e}")))
    }
}

fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let mut normalized = base_url.trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized).map_err(|e| ApiError::Internal(format!("invalid strategy url: {e}")))
}
