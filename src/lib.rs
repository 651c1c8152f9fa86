//! Multi-provider sports data aggregation.
//!
//! Upstream sports APIs are queried through a [`ResilienceEngine`] (retries,
//! fallback domains, stale-cache degradation) and their heterogeneous
//! payloads are normalized into one [`Event`] model with betting markets.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod resilience;
pub mod service;
pub mod sports;
pub mod synthetic;
pub mod transport;

pub use cache::{CacheEntry, CacheStore};
pub use config::{Config, Credentials};
pub use error::{AttemptFailure, ResilienceError, TransportError};
pub use model::{Event, EventStatus, Market, OddsData, OddsSource, Outcome};
pub use normalize::normalize;
pub use providers::{FetchMode, ProviderClient, ProviderRegistry};
pub use resilience::{EndpointCandidate, ProviderRequest, ResilienceEngine, RetryPolicy};
pub use service::SportsDataService;
pub use sports::Sport;
pub use transport::{ReqwestTransport, Transport};
