//! Downstream API: canonical events for one sport or all of them.
//!
//! All-sports queries run one fetch per sport concurrently. A sport that
//! fails contributes nothing (and a warning); callers never see provider
//! errors from this layer.

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::model::{Event, EventStatus, OddsData, OddsSource};
use crate::normalize::{self, odds::MarketContext, NormalizedEvent};
use crate::providers::{ClientSettings, FetchMode, FreshnessWindows, ProviderClient, ProviderRegistry};
use crate::resilience::{ResilienceEngine, RetryPolicy};
use crate::sports::{self, Sport};
use crate::transport::{ReqwestTransport, Transport};

/// Bookmaker label for odds taken from an event payload rather than an odds feed
const EVENT_BOOKMAKER: &str = "provider";
const SYNTHETIC_BOOKMAKER: &str = "synthetic";

#[derive(Clone)]
pub struct SportsDataService {
    client: ProviderClient,
}

impl SportsDataService {
    /// Production wiring: reqwest transport, standard registry.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout, config.rate_limit_per_minute)?;
        Ok(Self::with_transport(config, Arc::new(transport), ProviderRegistry::standard()))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>, registry: ProviderRegistry) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            retry_delay_base: config.retry_delay,
            default_freshness: config.cache_ttl,
        };
        let engine = ResilienceEngine::new(transport, CacheStore::new(config.cache_version), policy);
        let settings = ClientSettings {
            upcoming_window_days: config.upcoming_window_days,
            freshness: FreshnessWindows::with_default_ttl(config.cache_ttl),
        };
        let client = ProviderClient::new(
            Arc::new(registry),
            Arc::new(config.credentials.clone()),
            engine,
            settings,
        );
        Self { client }
    }

    pub fn from_client(client: ProviderClient) -> Self {
        Self { client }
    }

    /// Sports with a configured provider, in registry order.
    pub fn sports(&self) -> Vec<&'static Sport> {
        self.client.registry().iter().filter_map(|p| p.sport()).collect()
    }

    pub fn cache(&self) -> &CacheStore {
        self.client.engine().cache()
    }

    /// Drop one cache key (as built by [`ProviderClient::cache_key`]) or everything.
    pub async fn clear_cache(&self, key: Option<&str>) {
        self.cache().clear(key).await;
        info!(key = key.unwrap_or("*"), "Cache cleared");
    }

    pub async fn get_live_events(&self, sport_id: Option<u32>) -> Vec<Event> {
        let targets = self.targets(sport_id);
        let batches = join_all(
            targets
                .iter()
                .map(|sport| self.fetch_events(sport, FetchMode::Live, true)),
        )
        .await;

        let events: Vec<Event> = batches.into_iter().flatten().map(|n| n.event).collect();
        info!(sports = targets.len(), events = events.len(), "Fetched live events");
        events
    }

    /// Not-yet-finished events ordered by start time, at most `limit`.
    pub async fn get_upcoming_events(&self, sport_id: Option<u32>, limit: Option<usize>) -> Vec<Event> {
        let targets = self.targets(sport_id);
        let batches = join_all(
            targets
                .iter()
                .map(|sport| self.fetch_events(sport, FetchMode::Upcoming { limit }, false)),
        )
        .await;

        let mut events: Vec<Event> = batches
            .into_iter()
            .flatten()
            .map(|n| n.event)
            .filter(|e| e.status != EventStatus::Finished)
            .collect();
        events.sort_by(|a, b| a.start_time_iso.cmp(&b.start_time_iso));
        if let Some(limit) = limit {
            events.truncate(limit);
        }

        info!(sports = targets.len(), events = events.len(), "Fetched upcoming events");
        events
    }

    /// Looks the id up with every provider; the first sport (registry order)
    /// that returns an event with exactly this id wins.
    pub async fn get_event_by_id(&self, event_id: &str) -> Option<Event> {
        self.find_event(event_id).await.map(|n| n.event)
    }

    /// Bookmaker odds for an event.
    ///
    /// Prefers the sport's odds feed; falls back to the markets embedded in
    /// the event itself, which are synthetic when the provider has no prices.
    /// Empty when the sport is unknown or the event cannot be found.
    pub async fn get_odds(&self, event_id: &str, sport_slug: &str) -> Vec<OddsData> {
        let Some(sport) = sports::by_slug(sport_slug) else {
            warn!(sport = sport_slug, "Unknown sport slug for odds");
            return Vec::new();
        };

        let ctx = MarketContext { event_id, sport };
        let mut out: Vec<OddsData> = match self.client.fetch(sport, &FetchMode::Odds(event_id.to_string())).await {
            Ok(payload) => normalize::payload_items(&payload)
                .iter()
                .flat_map(|item| normalize::odds::bookmaker_odds(item, &ctx))
                .map(|b| OddsData {
                    event_id: event_id.to_string(),
                    bookmaker: b.bookmaker,
                    source: OddsSource::Provider,
                    markets: b.markets,
                })
                .collect(),
            Err(e) => {
                warn!(sport = sport.slug, event_id, error = %e, "Odds fetch failed");
                Vec::new()
            }
        };
        if !out.is_empty() {
            debug!(sport = sport.slug, event_id, bookmakers = out.len(), "Provider odds");
            return out;
        }

        let by_id = self
            .fetch_events(sport, FetchMode::ById(event_id.to_string()), false)
            .await;
        if let Some(found) = by_id.into_iter().find(|n| n.event.id == event_id) {
            let bookmaker = match found.odds_source {
                OddsSource::Provider => EVENT_BOOKMAKER,
                OddsSource::Synthetic => SYNTHETIC_BOOKMAKER,
            };
            out.push(OddsData {
                event_id: event_id.to_string(),
                bookmaker: bookmaker.to_string(),
                source: found.odds_source,
                markets: found.event.markets,
            });
        }
        out
    }

    async fn find_event(&self, event_id: &str) -> Option<NormalizedEvent> {
        let targets = self.targets(None);
        let batches = join_all(
            targets
                .iter()
                .map(|sport| self.fetch_events(sport, FetchMode::ById(event_id.to_string()), false)),
        )
        .await;

        let found = batches.into_iter().flatten().find(|n| n.event.id == event_id);
        if found.is_none() {
            debug!(event_id, "Event not found with any provider");
        }
        found
    }

    fn targets(&self, sport_id: Option<u32>) -> Vec<&'static Sport> {
        match sport_id {
            None => self.sports(),
            Some(id) => match self.client.registry().get(id).and_then(|p| p.sport()) {
                Some(sport) => vec![sport],
                None => {
                    warn!(sport_id = id, "Unknown sport id");
                    Vec::new()
                }
            },
        }
    }

    async fn fetch_events(&self, sport: &Sport, mode: FetchMode, is_live: bool) -> Vec<NormalizedEvent> {
        match self.client.fetch(sport, &mode).await {
            Ok(payload) => {
                let items = normalize::payload_items(&payload);
                normalize::normalize_detailed(&items, sport.slug, is_live)
            }
            Err(e) => {
                warn!(sport = sport.slug, mode = ?mode, error = %e, "Fetch failed, sport omitted");
                Vec::new()
            }
        }
    }
}
