//! Sports Data Aggregator
//!
//! Polls every configured sports provider for live and upcoming events,
//! keeps the normalized results warm in the cache and reports freshness on
//! a `/health` endpoint.

use anyhow::{anyhow, Context, Result};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use sports_aggregator::{Config, SportsDataService};

/// Entries kept by the hourly cache cleanup
const MAX_CACHE_ENTRIES: usize = 10_000;

/// Service health state
#[derive(Clone)]
pub struct HealthState {
    pub last_poll_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub last_live_count: Arc<RwLock<usize>>,
    pub last_upcoming_count: Arc<RwLock<usize>>,
    pub error_count: Arc<RwLock<usize>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            last_poll_time: Arc::new(RwLock::new(None)),
            last_live_count: Arc::new(RwLock::new(0)),
            last_upcoming_count: Arc::new(RwLock::new(0)),
            error_count: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn record_success(&self, live: usize, upcoming: usize) {
        *self.last_poll_time.write().await = Some(Utc::now());
        *self.last_live_count.write().await = live;
        *self.last_upcoming_count.write().await = upcoming;
        *self.error_count.write().await = 0;
    }

    pub async fn record_error(&self) {
        *self.error_count.write().await += 1;
    }
}

#[derive(Clone)]
struct AppState {
    health: HealthState,
    service: SportsDataService,
}

/// Polling driver around the data service
struct Poller {
    config: Config,
    service: SportsDataService,
    health: HealthState,
}

impl Poller {
    /// Main polling loop
    async fn run(&self) -> Result<()> {
        info!(
            "Starting poll loop (interval: {}s, sports: {})",
            self.config.poll_interval_seconds,
            self.service.sports().len()
        );

        // Periodic cache cleanup
        let service = self.service.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                let removed = service.cache().purge_other_versions().await;
                service.cache().cleanup(MAX_CACHE_ENTRIES).await;
                if removed > 0 {
                    info!("Purged {} cache entries from older versions", removed);
                }
            }
        });

        loop {
            let start = std::time::Instant::now();

            match self.poll_once().await {
                Ok((live, upcoming)) => {
                    self.health.record_success(live, upcoming).await;
                    info!(
                        "Poll completed: {} live, {} upcoming in {:?}",
                        live,
                        upcoming,
                        start.elapsed()
                    );
                }
                Err(e) => {
                    self.health.record_error().await;
                    error!("Poll failed: {:?}", e);
                }
            }

            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
        }
    }

    /// Single poll iteration: live and upcoming for every sport, concurrently.
    async fn poll_once(&self) -> Result<(usize, usize)> {
        // a poll that outlives two intervals is stuck on upstream retries
        let budget = Duration::from_secs(self.config.poll_interval_seconds.max(30) * 2);

        let (live, upcoming) = tokio::time::timeout(
            budget,
            async {
                tokio::join!(
                    self.service.get_live_events(None),
                    self.service.get_upcoming_events(None, None)
                )
            },
        )
        .await
        .map_err(|_| anyhow!("poll exceeded {:?}", budget))?;

        if live.is_empty() && upcoming.is_empty() {
            warn!("Poll returned no events from any provider");
        }

        Ok((live.len(), upcoming.len()))
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let health = &state.health;
    let last_poll = *health.last_poll_time.read().await;
    let live = *health.last_live_count.read().await;
    let upcoming = *health.last_upcoming_count.read().await;
    let errors = *health.error_count.read().await;

    let status = if errors > 5 { "degraded" } else { "ok" };

    let http_status = if errors > 10 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": "sports-aggregator",
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
            "last_poll": last_poll.map(|t| t.to_rfc3339()),
            "live_events": live,
            "upcoming_events": upcoming,
            "cache_entries": state.service.cache().len().await,
            "consecutive_errors": errors
        })),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments use the environment or secret files
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sports_aggregator=info")),
        )
        .init();

    info!("Sports Data Aggregator v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let health_port = config.health_port;
    let run_once = config.run_once;

    let service = SportsDataService::new(&config).context("Failed to build data service")?;
    let health = HealthState::new();
    let poller = Poller {
        config,
        service: service.clone(),
        health: health.clone(),
    };

    // Start health check server
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(AppState { health, service });

    let health_addr = format!("0.0.0.0:{}", health_port);
    info!("Health endpoint listening on {}", health_addr);

    let listener = tokio::net::TcpListener::bind(&health_addr)
        .await
        .with_context(|| format!("Failed to bind {}", health_addr))?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Health server stopped: {:?}", e);
        }
    });

    if run_once {
        info!("Running in one-shot mode (RUN_ONCE=true)");
        match poller.poll_once().await {
            Ok((live, upcoming)) => {
                info!("One-shot poll completed: {} live, {} upcoming", live, upcoming);
            }
            Err(e) => {
                error!("One-shot poll failed: {:?}", e);
                return Err(e);
            }
        }
        return Ok(());
    }

    // Handle shutdown gracefully (continuous mode)
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        result = poller.run() => {
            if let Err(e) = result {
                error!("Service error: {:?}", e);
            }
        }
        _ = ctrl_c => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
