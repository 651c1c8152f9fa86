//! Retry, fallback and stale-cache degradation for upstream requests.
//!
//! A request is tried against its primary domain and then each configured
//! fallback domain in order, `max_retries + 1` times per domain with
//! exponential backoff. Every kind of failure (network, timeout, non-2xx,
//! unparseable body, provider-reported error) counts the same. When all
//! attempts fail the last cached payload for the key is served, however old.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::CacheStore;
use crate::error::{AttemptFailure, ResilienceError};
use crate::transport::Transport;

/// Alternate base URL for a provider domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCandidate {
    pub base_url: String,
    pub is_primary: bool,
}

impl EndpointCandidate {
    pub fn primary(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            is_primary: true,
        }
    }

    pub fn fallback(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            is_primary: false,
        }
    }
}

/// A fully built upstream request: primary URL, auth headers and the ordered
/// fallback bases to try when the primary is unreachable.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub fallbacks: Vec<EndpointCandidate>,
}

impl ProviderRequest {
    /// Primary first, then each fallback rewritten onto this request's path
    /// and query. Fallbacks that cannot be parsed are reported, not fatal.
    fn endpoints(&self) -> Vec<(String, Result<Url, String>)> {
        let mut out = vec![(endpoint_label(&self.url), Ok(self.url.clone()))];
        for candidate in &self.fallbacks {
            match rewrite_for_fallback(&self.url, &candidate.base_url) {
                Ok(url) => out.push((endpoint_label(&url), Ok(url))),
                Err(e) => out.push((candidate.base_url.clone(), Err(e.to_string()))),
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries per domain; total attempts per domain = `max_retries + 1`
    pub max_retries: u32,
    pub retry_delay_base: Duration,
    /// Window used when the caller does not pass one
    pub default_freshness: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_base: Duration::from_millis(1000),
            default_freshness: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_jitter(attempt, rand::random::<f64>())
    }

    /// `base * 2^attempt * (0.5 + unit * 0.5)` for `unit` in `[0, 1)`.
    pub fn delay_with_jitter(&self, attempt: u32, unit: f64) -> Duration {
        let scale = 2f64.powi(attempt.min(16) as i32);
        let jitter = 0.5 + unit.clamp(0.0, 1.0) * 0.5;
        Duration::from_secs_f64(self.retry_delay_base.as_secs_f64() * scale * jitter)
    }
}

/// Executes provider requests with caching, retries and domain fallback.
#[derive(Clone)]
pub struct ResilienceEngine {
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    policy: RetryPolicy,
}

impl ResilienceEngine {
    pub fn new(transport: Arc<dyn Transport>, cache: CacheStore, policy: RetryPolicy) -> Self {
        Self {
            transport,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `request`, caching the payload under `cache_key` (the primary URL
    /// when `None`). A successful entry younger than `freshness` is returned
    /// without touching the network.
    pub async fn execute(
        &self,
        request: &ProviderRequest,
        cache_key: Option<&str>,
        freshness: Option<Duration>,
    ) -> Result<Value, ResilienceError> {
        let key = cache_key
            .map(str::to_string)
            .unwrap_or_else(|| request.url.to_string());
        let window = freshness.unwrap_or(self.policy.default_freshness);

        if let Some(entry) = self.cache.get(&key).await {
            if entry.success && entry.is_fresh(window) {
                debug!(key = %key, "Cache hit");
                return Ok(entry.data);
            }
        }

        let mut attempts: Vec<AttemptFailure> = Vec::new();

        for (label, url) in request.endpoints() {
            let url = match url {
                Ok(url) => url,
                Err(reason) => {
                    warn!(endpoint = %label, "Skipping unusable fallback: {}", reason);
                    attempts.push(AttemptFailure {
                        endpoint: label,
                        attempt: 0,
                        message: reason,
                    });
                    continue;
                }
            };

            for attempt in 0..=self.policy.max_retries {
                match self.attempt(&url, &request.headers).await {
                    Ok(payload) => {
                        if !attempts.is_empty() {
                            info!(
                                key = %key,
                                endpoint = %label,
                                failed_attempts = attempts.len(),
                                "Request recovered"
                            );
                        }
                        self.cache.set(&key, payload.clone(), true).await;
                        return Ok(payload);
                    }
                    Err(message) => {
                        warn!(
                            endpoint = %label,
                            attempt = attempt + 1,
                            "Request failed: {}",
                            message
                        );
                        attempts.push(AttemptFailure {
                            endpoint: label.clone(),
                            attempt,
                            message,
                        });
                        if attempt < self.policy.max_retries {
                            tokio::time::sleep(self.policy.delay(attempt)).await;
                        }
                    }
                }
            }
        }

        if let Some(entry) = self.cache.get(&key).await {
            warn!(
                key = %key,
                age_secs = entry.age().as_secs(),
                failed_attempts = attempts.len(),
                "All endpoints failed, serving stale cached response"
            );
            return Ok(entry.data);
        }

        Err(ResilienceError::Exhausted { key, attempts })
    }

    async fn attempt(&self, url: &Url, headers: &[(String, String)]) -> Result<Value, String> {
        let body = self
            .transport
            .get(url, headers)
            .await
            .map_err(|e| e.to_string())?;

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| format!("invalid JSON body: {}", e))?;

        if let Some(reason) = provider_error(&payload) {
            return Err(format!("provider error: {}", reason));
        }

        Ok(payload)
    }
}

/// Errors reported inside a 2xx body (API-Sports puts quota and credential
/// problems in a top-level `errors` field).
pub fn provider_error(payload: &Value) -> Option<String> {
    match payload.get("errors")? {
        Value::Object(map) if !map.is_empty() => Some(
            map.iter()
                .map(|(k, v)| format!("{}: {}", k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Move `primary`'s path and query onto `base_url`.
///
/// A leading version segment on the primary path is dropped when the fallback
/// base already ends in one, so `https://v1.cricket.api-sports.io/fixtures`
/// onto `https://api-cricket.sportsdata.io/v1` keeps a single `/v1`.
pub fn rewrite_for_fallback(primary: &Url, base_url: &str) -> Result<Url, ResilienceError> {
    let with_scheme = if base_url.contains("://") {
        base_url.to_string()
    } else {
        format!("https://{}", base_url)
    };
    let mut url = Url::parse(&with_scheme).map_err(|e| ResilienceError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let base_segments: Vec<String> = segments(&url);
    let mut primary_segments: Vec<String> = segments(primary);

    let base_versioned = base_segments.last().map(|s| is_version_segment(s)).unwrap_or(false);
    let primary_versioned = primary_segments.first().map(|s| is_version_segment(s)).unwrap_or(false);
    if base_versioned && primary_versioned {
        primary_segments.remove(0);
    }

    let path = base_segments
        .into_iter()
        .chain(primary_segments)
        .collect::<Vec<_>>()
        .join("/");
    url.set_path(&format!("/{}", path));
    url.set_query(primary.query());
    Ok(url)
}

fn segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

fn is_version_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some('v') | Some('V'))
        && segment.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

fn endpoint_label(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => url.to_string(),
    }
}
