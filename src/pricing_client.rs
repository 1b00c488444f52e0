//! Pricing Client (E): POSTs depth requests to the pricing service under a timeout.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::errors::ApiError;
use crate::types::{PriceRequest, PricingSnapshot};

#[derive(Clone, Debug)]
pub struct PricingClient {
    depth_url: Url,
    client: Client,
    timeout: Duration,
}

impl PricingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = normalize_base(base_url)?;
        let depth_url = base
            .join("depth")
            .map_err(|e| ApiError::Internal(format!("invalid pricing url: {e}")))?;
        Ok(Self {
            depth_url,
            client: Client::new(),
            timeout,
        })
    }

    /// Requests a depth snapshot for the given sell/buy pair and amount.
    pub async fn request_depth(&self, request: &PriceRequest) -> Result<PricingSnapshot, ApiError> {
        let response = self
            .client
            .post(self.depth_url.clone())
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::PricingUpstreamFailed(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            return Err(ApiError::PricingUpstreamFailed(format!(
                "pricing service returned {status}"
            )));
        }

        response
            .json::<PricingSnapshot>()
            .await
            .map_err(|e| ApiError::PricingUpstreamFailed(format!("invalid response body: {e}")))
    }
}

fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let mut normalized = base_url.trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized).map_err(|e| ApiError::Internal(format!("invalid pricing url: {e}")))
}
