//! HTTP seam between the resilience engine and the network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Performs one GET and returns the body of a 2xx response.
///
/// Implementations must not retry; that belongs to the resilience engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<String, TransportError>;
}

type DirectLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// reqwest-backed transport with a process-wide outbound rate limit.
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    rate_limiter: DirectLimiter,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration, requests_per_minute: u32) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to create HTTP client")?;

        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        Ok(Self {
            http_client,
            rate_limiter,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<String, TransportError> {
        // Wait for rate limit
        self.rate_limiter.until_ready().await;

        let mut request = self.http_client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(map_reqwest_error)?;

        // API-Sports reports quota usage in headers
        if let Some(remaining) = response.headers().get("x-ratelimit-requests-remaining") {
            debug!(
                host = url.host_str().unwrap_or("?"),
                "API requests remaining: {}",
                remaining.to_str().unwrap_or("?")
            );
        }

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}
