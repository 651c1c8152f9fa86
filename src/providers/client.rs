//! Per-sport request construction.
//!
//! This layer only assembles URL, query and auth header for a
//! `(sport, mode)` pair. Retrying and caching belong to the
//! [`ResilienceEngine`]; shaping the payload belongs to the normalizer.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::registry::{ProviderConfig, ProviderRegistry, RequestFamily, UpcomingStyle};
use crate::config::Credentials;
use crate::error::ResilienceError;
use crate::resilience::{ProviderRequest, ResilienceEngine};
use crate::sports::Sport;

/// Default `next=<n>` when the caller gives no limit
const DEFAULT_NEXT: usize = 20;
/// Upper bound most providers accept for `next`
const MAX_NEXT: usize = 99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    Live,
    Upcoming { limit: Option<usize> },
    ById(String),
    /// Bookmaker odds for one event
    Odds(String),
}

impl FetchMode {
    fn cache_tag(&self) -> String {
        match self {
            FetchMode::Live => "live".to_string(),
            FetchMode::Upcoming { limit: Some(n) } => format!("upcoming:{}", n),
            FetchMode::Upcoming { limit: None } => "upcoming".to_string(),
            FetchMode::ById(id) => format!("id:{}", id),
            FetchMode::Odds(id) => format!("odds:{}", id),
        }
    }
}

/// How long each kind of response may be served from cache.
#[derive(Debug, Clone)]
pub struct FreshnessWindows {
    pub live: Duration,
    pub upcoming: Duration,
    pub by_id: Duration,
    pub odds: Duration,
}

impl FreshnessWindows {
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            live: Duration::from_secs(30),
            upcoming: ttl,
            by_id: Duration::from_secs(60),
            odds: Duration::from_secs(120),
        }
    }

    fn for_mode(&self, mode: &FetchMode) -> Duration {
        match mode {
            FetchMode::Live => self.live,
            FetchMode::Upcoming { .. } => self.upcoming,
            FetchMode::ById(_) => self.by_id,
            FetchMode::Odds(_) => self.odds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub upcoming_window_days: u32,
    pub freshness: FreshnessWindows,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            upcoming_window_days: 7,
            freshness: FreshnessWindows::with_default_ttl(Duration::from_secs(300)),
        }
    }
}

#[derive(Clone)]
pub struct ProviderClient {
    registry: Arc<ProviderRegistry>,
    credentials: Arc<Credentials>,
    engine: ResilienceEngine,
    settings: ClientSettings,
}

impl ProviderClient {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<Credentials>,
        engine: ResilienceEngine,
        settings: ClientSettings,
    ) -> Self {
        Self {
            registry,
            credentials,
            engine,
            settings,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &ResilienceEngine {
        &self.engine
    }

    /// Cache key for a sport/mode pair
    pub fn cache_key(sport: &Sport, mode: &FetchMode) -> String {
        format!("{}:{}", sport.slug, mode.cache_tag())
    }

    /// Fetch the raw payload for `sport` in `mode`.
    ///
    /// Without a credential this returns an empty array and never touches the
    /// network; that is a configuration gap, not a transient failure.
    pub async fn fetch(&self, sport: &Sport, mode: &FetchMode) -> Result<Value, ResilienceError> {
        let Some(provider) = self.registry.get(sport.id) else {
            warn!(sport = sport.slug, "No provider configured");
            return Ok(Value::Array(Vec::new()));
        };

        let Some(api_key) = self.credentials.for_sport(sport.id) else {
            info!(
                sport = sport.slug,
                "No API key configured ({} or SPORTS_API_KEY), skipping fetch",
                provider.credential_env()
            );
            return Ok(Value::Array(Vec::new()));
        };

        let today = Utc::now().date_naive();
        let request = self.build_request(provider, mode, today, api_key)?;
        let key = Self::cache_key(sport, mode);

        self.engine
            .execute(&request, Some(&key), Some(self.settings.freshness.for_mode(mode)))
            .await
    }

    /// Assemble the upstream request. Pure: `today` anchors date windows.
    pub fn build_request(
        &self,
        provider: &ProviderConfig,
        mode: &FetchMode,
        today: NaiveDate,
        api_key: &str,
    ) -> Result<ProviderRequest, ResilienceError> {
        let resource = match mode {
            FetchMode::Odds(_) => "odds",
            _ => provider.resource.as_str(),
        };
        let params = query_params(provider, mode, today, self.settings.upcoming_window_days);
        let endpoint = format!("{}/{}", provider.base_url.trim_end_matches('/'), resource);

        let url = Url::parse_with_params(&endpoint, &params).map_err(|e| ResilienceError::InvalidUrl {
            url: endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(ProviderRequest {
            url,
            headers: vec![(provider.auth_header.clone(), api_key.to_string())],
            fallbacks: provider.fallbacks.clone(),
        })
    }
}

fn query_params(
    provider: &ProviderConfig,
    mode: &FetchMode,
    today: NaiveDate,
    window_days: u32,
) -> Vec<(String, String)> {
    let date = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
    let until = today + ChronoDuration::days(i64::from(window_days.clamp(7, 30)));
    let pair = |k: &str, v: String| (k.to_string(), v);

    match (mode, provider.family) {
        (FetchMode::ById(id), _) => vec![pair("id", id.clone())],
        (FetchMode::Odds(id), _) => vec![pair(&provider.odds_param, id.clone())],

        (FetchMode::Live, RequestFamily::Fixtures) => vec![pair("live", "all".into())],
        (FetchMode::Live, RequestFamily::Races | RequestFamily::Fights) => {
            vec![pair("status", "live".into())]
        }

        (FetchMode::Upcoming { .. }, RequestFamily::Fights) => {
            vec![pair("date", date(today)), pair("status", "NS".into())]
        }
        (FetchMode::Upcoming { limit }, family) => {
            let mut params = Vec::new();
            if family == RequestFamily::Races {
                params.push(pair("type", "race".into()));
            }
            match provider.upcoming {
                UpcomingStyle::Next => {
                    let n = limit.unwrap_or(DEFAULT_NEXT).clamp(1, MAX_NEXT);
                    params.push(pair("next", n.to_string()));
                }
                UpcomingStyle::DateRange => {
                    params.push(pair("from", date(today)));
                    params.push(pair("to", date(until)));
                }
            }
            params
        }
    }
}
