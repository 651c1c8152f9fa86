mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{ok, server_error, ScriptedTransport};
use sports_aggregator::{sports, Config, Credentials, EventStatus, ProviderRegistry, SportsDataService};

const FOOTBALL_HOST: &str = "v3.football.api-sports.io";
const BASKETBALL_HOST: &str = "v1.basketball.api-sports.io";

fn config() -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.credentials = Credentials::new(Some("test-key".into()));
    config.max_retries = 1;
    config.retry_delay = Duration::from_millis(1);
    config
}

fn football_fixtures() -> serde_json::Value {
    json!({"errors": [], "response": [
        {
            "fixture": {"id": 11, "date": "2025-05-02T18:00:00Z", "status": {"short": "NS"}},
            "league": {"name": "Premier League"},
            "teams": {"home": {"name": "Arsenal"}, "away": {"name": "Chelsea"}}
        },
        {
            "fixture": {"id": 10, "date": "2025-05-01T18:00:00Z", "status": {"short": "TBD"}},
            "league": {"name": "Premier League"},
            "teams": {"home": {"name": "Everton"}, "away": {"name": "Fulham"}}
        },
        {
            "fixture": {"id": 9, "date": "2025-04-01T18:00:00Z", "status": {"short": "FT"}},
            "league": {"name": "Premier League"},
            "teams": {"home": {"name": "Leeds"}, "away": {"name": "Wolves"}}
        }
    ]})
}

fn service(transport: Arc<ScriptedTransport>) -> SportsDataService {
    SportsDataService::with_transport(&config(), transport, ProviderRegistry::standard())
}

#[tokio::test]
async fn failing_sport_is_omitted_from_fan_out() {
    // Hosts without a script fail with a network error, so every sport but
    // football is down; basketball additionally answers 500.
    let transport = Arc::new(
        ScriptedTransport::new()
            .always(FOOTBALL_HOST, ok(football_fixtures()))
            .always(BASKETBALL_HOST, server_error()),
    );
    let service = service(transport.clone());

    let events = service.get_live_events(None).await;

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.sport_id == sports::FOOTBALL));
    assert_eq!(events.iter().filter(|e| e.status == EventStatus::Finished).count(), 1);
    assert!(transport.calls_to(BASKETBALL_HOST) >= 2);
}

#[tokio::test]
async fn live_query_for_one_sport_marks_events_live() {
    let transport = Arc::new(ScriptedTransport::new().always(FOOTBALL_HOST, ok(football_fixtures())));
    let events = service(transport.clone()).get_live_events(Some(sports::FOOTBALL)).await;

    let live: Vec<_> = events.iter().filter(|e| e.is_live).collect();
    assert_eq!(live.len(), 2);
    assert!(live.iter().all(|e| e.status == EventStatus::Live));
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(transport.calls()[0].query(), Some("live=all"));
}

#[tokio::test]
async fn upcoming_events_are_sorted_and_limited() {
    let transport = Arc::new(ScriptedTransport::new().always(FOOTBALL_HOST, ok(football_fixtures())));
    let service = service(transport.clone());

    let events = service.get_upcoming_events(Some(sports::FOOTBALL), None).await;
    let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["10", "11"]);
    assert_eq!(events[0].status, EventStatus::Upcoming);

    let limited = service.get_upcoming_events(Some(sports::FOOTBALL), Some(1)).await;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, "10");
}

#[tokio::test]
async fn exhausted_sport_still_serves_its_stale_cache() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .once(FOOTBALL_HOST, ok(football_fixtures()))
            .always(FOOTBALL_HOST, server_error()),
    );
    let service = service(transport.clone());

    let first = service.get_live_events(Some(sports::FOOTBALL)).await;
    // age the entry past the live freshness window
    let mut entry = service.cache().get("football:live").await.unwrap();
    entry.timestamp_ms -= 3_600_000;
    service.cache().insert_entry(entry).await;

    let second = service.get_live_events(Some(sports::FOOTBALL)).await;

    assert_eq!(first, second);
    assert!(transport.calls_to(FOOTBALL_HOST) > 1);
}

#[tokio::test]
async fn clearing_the_cache_forces_a_refetch() {
    let transport = Arc::new(ScriptedTransport::new().always(FOOTBALL_HOST, ok(football_fixtures())));
    let service = service(transport.clone());

    service.get_live_events(Some(sports::FOOTBALL)).await;
    service.get_live_events(Some(sports::FOOTBALL)).await;
    assert_eq!(transport.calls().len(), 1);

    service.clear_cache(Some("football:live")).await;
    service.get_live_events(Some(sports::FOOTBALL)).await;
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn missing_credentials_mean_no_requests() {
    let transport = Arc::new(ScriptedTransport::new().always(FOOTBALL_HOST, ok(football_fixtures())));
    let mut config = config();
    config.credentials = Credentials::default();
    let service = SportsDataService::with_transport(&config, transport.clone(), ProviderRegistry::standard());

    assert!(service.get_live_events(None).await.is_empty());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn every_registered_sport_is_listed() {
    let service = service(Arc::new(ScriptedTransport::new()));
    let slugs: Vec<_> = service.sports().iter().map(|s| s.slug).collect();
    assert_eq!(slugs.len(), sports::all().len());
    assert!(slugs.contains(&"cricket"));
}
