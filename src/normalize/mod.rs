//! Provider payload → canonical [`Event`]s.
//!
//! Each raw item is first classified into a [`PayloadShape`]; the shape picks
//! which ordered field paths are tried before the shared fallbacks. Nothing in
//! here fails: missing data becomes a placeholder, unusable items still
//! produce an event, and absent prices are filled by the synthetic generator.

pub mod extract;
pub mod odds;

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Event, EventStatus, Market, OddsSource};
use crate::sports::{self, Sport};
use crate::synthetic::{self, GenerateOptions};
use extract::{as_iso_datetime, first_text, first_value, score_component};
use odds::MarketContext;

pub const PLACEHOLDER_HOME: &str = "Home Team";
pub const PLACEHOLDER_AWAY: &str = "Away Team";
pub const PLACEHOLDER_START: &str = "1970-01-01T00:00:00Z";

/// Tournaments whose men's draw is played best-of-five sets
const BEST_OF_FIVE: &[&str] = &["australian open", "roland garros", "french open", "wimbledon", "us open"];
const TENNIS_GAMES_BEST_OF_THREE: f64 = 22.5;
const TENNIS_GAMES_BEST_OF_FIVE: f64 = 36.5;

/// Response shape of one raw item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{fixture: {id, date, status}, league, teams, goals}` (football, cricket)
    Fixture,
    /// `{id, date, status, league, teams, scores}` (basketball, hockey, ...)
    Game,
    /// `{id, competition, circuit, date, status}` (formula 1, cycling)
    Race,
    /// `{id, slug, category, fighters: {first, second}}` (MMA, boxing)
    Fight,
    /// Flat keys such as `home_team`/`commence_time` (The Odds API, misc.)
    Flat,
}

struct FieldPaths {
    id: &'static [&'static str],
    home: &'static [&'static str],
    away: &'static [&'static str],
    league: &'static [&'static str],
    start: &'static [&'static str],
    status: &'static [&'static str],
    home_score: &'static [&'static str],
    away_score: &'static [&'static str],
}

const FIXTURE_PATHS: FieldPaths = FieldPaths {
    id: &["/fixture/id"],
    home: &["/teams/home/name"],
    away: &["/teams/away/name"],
    league: &["/league/name"],
    start: &["/fixture/date", "/fixture/timestamp"],
    status: &["/fixture/status/short", "/fixture/status/long"],
    home_score: &["/goals/home", "/scores/home/total", "/score/fulltime/home"],
    away_score: &["/goals/away", "/scores/away/total", "/score/fulltime/away"],
};

const GAME_PATHS: FieldPaths = FieldPaths {
    id: &["/id", "/game/id"],
    home: &["/teams/home/name", "/players/home/name"],
    away: &["/teams/away/name", "/players/away/name"],
    league: &["/league/name", "/tournament/name"],
    start: &["/date", "/timestamp"],
    status: &["/status/short", "/status/long"],
    home_score: &["/scores/home/total", "/scores/home"],
    away_score: &["/scores/away/total", "/scores/away"],
};

const RACE_PATHS: FieldPaths = FieldPaths {
    id: &["/id", "/race/id"],
    home: &["/competition/name", "/race/name"],
    away: &["/circuit/name", "/competition/location/city"],
    league: &["/league/name", "/type"],
    start: &["/date", "/timestamp"],
    status: &["/status"],
    home_score: &[],
    away_score: &[],
};

const FIGHT_PATHS: FieldPaths = FieldPaths {
    id: &["/id", "/fight/id"],
    home: &["/fighters/first/name", "/fighters/home/name", "/fighters/0/name"],
    away: &["/fighters/second/name", "/fighters/away/name", "/fighters/1/name"],
    league: &["/slug", "/league/name", "/category"],
    start: &["/date", "/timestamp"],
    status: &["/status/short", "/status/long"],
    home_score: &[],
    away_score: &[],
};

const FLAT_PATHS: FieldPaths = FieldPaths {
    id: &["/id", "/event_id", "/eventId"],
    home: &["/home_team", "/homeTeam"],
    away: &["/away_team", "/awayTeam"],
    league: &["/sport_title", "/league"],
    start: &["/commence_time", "/commenceTime"],
    status: &["/status"],
    home_score: &["/home_score", "/homeScore"],
    away_score: &["/away_score", "/awayScore"],
};

/// Tried after the shape's own paths, for payloads that mix conventions.
const COMMON_PATHS: FieldPaths = FieldPaths {
    id: &["/id", "/event_id", "/eventId", "/match_id", "/matchId", "/key"],
    home: &[
        "/teams/home/name",
        "/home/name",
        "/homeTeam/name",
        "/home_team/name",
        "/home_team",
        "/homeTeam",
        "/home",
        "/participants/0/name",
        "/players/home/name",
        "/player1/name",
        "/player1",
    ],
    away: &[
        "/teams/away/name",
        "/away/name",
        "/awayTeam/name",
        "/away_team/name",
        "/away_team",
        "/awayTeam",
        "/away",
        "/participants/1/name",
        "/players/away/name",
        "/player2/name",
        "/player2",
    ],
    league: &[
        "/league/name",
        "/competition/name",
        "/tournament/name",
        "/series/name",
        "/league",
        "/tournament",
        "/competition",
        "/sport_title",
    ],
    start: &[
        "/fixture/date",
        "/date",
        "/start_time",
        "/startTime",
        "/commence_time",
        "/commenceTime",
        "/scheduled",
        "/fixture/timestamp",
        "/timestamp",
    ],
    status: &[
        "/fixture/status/short",
        "/status/short",
        "/status/long",
        "/fixture/status/long",
        "/status",
        "/state",
    ],
    home_score: &["/goals/home", "/scores/home/total", "/scores/home", "/score/home", "/home_score", "/homeScore"],
    away_score: &["/goals/away", "/scores/away/total", "/scores/away", "/score/away", "/away_score", "/awayScore"],
};

impl PayloadShape {
    pub fn detect(item: &Value) -> Self {
        let has = |key: &str| item.get(key).map(|v| !v.is_null()).unwrap_or(false);
        if item.get("fixture").map(Value::is_object).unwrap_or(false) {
            PayloadShape::Fixture
        } else if has("fighters") {
            PayloadShape::Fight
        } else if has("circuit") || has("competition") {
            PayloadShape::Race
        } else if has("teams") || has("players") {
            PayloadShape::Game
        } else {
            PayloadShape::Flat
        }
    }

    fn paths(self) -> &'static FieldPaths {
        match self {
            PayloadShape::Fixture => &FIXTURE_PATHS,
            PayloadShape::Game => &GAME_PATHS,
            PayloadShape::Race => &RACE_PATHS,
            PayloadShape::Fight => &FIGHT_PATHS,
            PayloadShape::Flat => &FLAT_PATHS,
        }
    }
}

const STATUS_TABLE: &[(&str, EventStatus)] = &[
    ("ns", EventStatus::Scheduled),
    ("not started", EventStatus::Scheduled),
    ("scheduled", EventStatus::Scheduled),
    ("pst", EventStatus::Scheduled),
    ("postponed", EventStatus::Scheduled),
    ("delayed", EventStatus::Scheduled),
    ("tbd", EventStatus::Upcoming),
    ("time to be defined", EventStatus::Upcoming),
    ("upcoming", EventStatus::Upcoming),
    ("pre", EventStatus::Upcoming),
    ("live", EventStatus::Live),
    ("in play", EventStatus::Live),
    ("inplay", EventStatus::Live),
    ("in progress", EventStatus::Live),
    ("1h", EventStatus::Live),
    ("ht", EventStatus::Live),
    ("2h", EventStatus::Live),
    ("et", EventStatus::Live),
    ("bt", EventStatus::Live),
    ("p", EventStatus::Live),
    ("int", EventStatus::Live),
    ("susp", EventStatus::Live),
    ("q1", EventStatus::Live),
    ("q2", EventStatus::Live),
    ("q3", EventStatus::Live),
    ("q4", EventStatus::Live),
    ("ot", EventStatus::Live),
    ("halftime", EventStatus::Live),
    ("first half", EventStatus::Live),
    ("second half", EventStatus::Live),
    ("in1", EventStatus::Live),
    ("in2", EventStatus::Live),
    ("ft", EventStatus::Finished),
    ("aet", EventStatus::Finished),
    ("pen", EventStatus::Finished),
    ("aot", EventStatus::Finished),
    ("finished", EventStatus::Finished),
    ("match finished", EventStatus::Finished),
    ("game finished", EventStatus::Finished),
    ("ended", EventStatus::Finished),
    ("completed", EventStatus::Finished),
    ("final", EventStatus::Finished),
    ("canc", EventStatus::Finished),
    ("cancelled", EventStatus::Finished),
    ("abd", EventStatus::Finished),
    ("awd", EventStatus::Finished),
    ("wo", EventStatus::Finished),
];

/// Unrecognized or missing statuses are `scheduled`.
pub fn map_status(raw: Option<&str>) -> EventStatus {
    let Some(raw) = raw else {
        return EventStatus::Scheduled;
    };
    let wanted = raw.trim().to_ascii_lowercase();
    STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == wanted)
        .map(|(_, s)| *s)
        .unwrap_or(EventStatus::Scheduled)
}

/// Totals threshold for a tennis event, from its tournament name.
pub fn tennis_games_threshold(tournament: &str) -> f64 {
    let lower = tournament.to_ascii_lowercase();
    if BEST_OF_FIVE.iter().any(|t| lower.contains(t)) {
        TENNIS_GAMES_BEST_OF_FIVE
    } else {
        TENNIS_GAMES_BEST_OF_THREE
    }
}

/// The list of raw items inside a provider response envelope.
pub fn payload_items(payload: &Value) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }
    for key in ["response", "data", "results", "events"] {
        match payload.get(key) {
            Some(Value::Array(items)) => return items.clone(),
            Some(single @ Value::Object(_)) => return vec![single.clone()],
            _ => {}
        }
    }
    Vec::new()
}

/// A canonical event plus where its prices came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub event: Event,
    pub odds_source: OddsSource,
}

/// Normalize a batch of raw items for `sport_slug`.
///
/// `sport_id` always comes from the registry entry for the slug; sport ids
/// carried in the payload are ignored, several upstream feeds reuse them.
/// Event ids are unique within the batch.
pub fn normalize(raw_items: &[Value], sport_slug: &str, is_live: bool) -> Vec<Event> {
    normalize_detailed(raw_items, sport_slug, is_live)
        .into_iter()
        .map(|n| n.event)
        .collect()
}

pub fn normalize_detailed(raw_items: &[Value], sport_slug: &str, is_live: bool) -> Vec<NormalizedEvent> {
    let Some(sport) = sports::by_slug(sport_slug) else {
        warn!(sport = sport_slug, items = raw_items.len(), "Unknown sport slug, dropping payload");
        return Vec::new();
    };

    // every id handed out so far, original or suffixed
    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw_items.len());

    for (index, item) in raw_items.iter().enumerate() {
        let mut normalized = normalize_item(item, sport, is_live, index);

        if emitted.contains(&normalized.event.id) {
            let mut n = 2;
            let unique = loop {
                let candidate = format!("{}-{}", normalized.event.id, n);
                if !emitted.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            reassign_id(&mut normalized.event, unique);
        }
        emitted.insert(normalized.event.id.clone());
        out.push(normalized);
    }

    debug!(sport = sport.slug, events = out.len(), "Normalized payload");
    out
}

fn normalize_item(item: &Value, sport: &Sport, is_live: bool, index: usize) -> NormalizedEvent {
    let shape = PayloadShape::detect(item);
    let paths = shape.paths();

    let text = |own: &[&str], common: &[&str]| first_text(item, own).or_else(|| first_text(item, common));

    let home_team = text(paths.home, COMMON_PATHS.home).unwrap_or_else(|| PLACEHOLDER_HOME.to_string());
    let away_team = text(paths.away, COMMON_PATHS.away).unwrap_or_else(|| PLACEHOLDER_AWAY.to_string());
    let league_name = text(paths.league, COMMON_PATHS.league).unwrap_or_else(|| sport.display_name.to_string());

    let start_time_iso = first_value(item, paths.start)
        .and_then(as_iso_datetime)
        .or_else(|| first_value(item, COMMON_PATHS.start).and_then(as_iso_datetime))
        .unwrap_or_else(|| PLACEHOLDER_START.to_string());

    let mut status = map_status(text(paths.status, COMMON_PATHS.status).as_deref());
    if is_live && status != EventStatus::Finished {
        status = EventStatus::Live;
    }

    let id = text(paths.id, COMMON_PATHS.id)
        .unwrap_or_else(|| generated_id(item, sport, index));

    let score = score(item, paths);

    let ctx = MarketContext {
        event_id: &id,
        sport,
    };
    let provider_markets = odds::extract_markets(item, &ctx);
    let (markets, odds_source) = if provider_markets.is_empty() {
        (synthetic_markets(&id, sport, &home_team, &away_team, &league_name), OddsSource::Synthetic)
    } else {
        (provider_markets, OddsSource::Provider)
    };

    NormalizedEvent {
        event: Event {
            id,
            sport_id: sport.id,
            league_name,
            home_team,
            away_team,
            start_time_iso,
            is_live: status == EventStatus::Live,
            status,
            score,
            markets,
        },
        odds_source,
    }
}

fn synthetic_markets(event_id: &str, sport: &Sport, home: &str, away: &str, league: &str) -> Vec<Market> {
    let totals_threshold = (sport.id == sports::TENNIS).then(|| tennis_games_threshold(league));
    synthetic::generate_with(
        sport.id,
        home,
        away,
        &GenerateOptions {
            id_prefix: Some(event_id),
            totals_threshold,
        },
    )
}

fn score(item: &Value, paths: &FieldPaths) -> Option<String> {
    let component = |own: &[&str], common: &[&str]| {
        first_value(item, own)
            .and_then(score_component)
            .or_else(|| first_value(item, common).and_then(score_component))
    };
    match (
        component(paths.home_score, COMMON_PATHS.home_score),
        component(paths.away_score, COMMON_PATHS.away_score),
    ) {
        (Some(h), Some(a)) => Some(format!("{}-{}", h, a)),
        _ => first_text(item, &["/score", "/result"]),
    }
}

/// Deterministic id for items that carry none.
fn generated_id(item: &Value, sport: &Sport, index: usize) -> String {
    let name = format!("{}|{}|{}", sport.slug, index, item);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

/// Rename an event and every market/outcome id derived from it.
fn reassign_id(event: &mut Event, new_id: String) {
    let old_prefix = event.id.clone();
    for market in &mut event.markets {
        market.id = rebase(&market.id, &old_prefix, &new_id);
        for outcome in &mut market.outcomes {
            outcome.id = rebase(&outcome.id, &old_prefix, &new_id);
        }
    }
    event.id = new_id;
}

fn rebase(id: &str, old_prefix: &str, new_prefix: &str) -> String {
    match id.strip_prefix(old_prefix) {
        Some(rest) => format!("{}{}", new_prefix, rest),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shape_detection() {
        assert_eq!(PayloadShape::detect(&json!({"fixture": {"id": 1}})), PayloadShape::Fixture);
        assert_eq!(PayloadShape::detect(&json!({"fighters": {}})), PayloadShape::Fight);
        assert_eq!(PayloadShape::detect(&json!({"circuit": {"name": "Monza"}})), PayloadShape::Race);
        assert_eq!(PayloadShape::detect(&json!({"teams": {}})), PayloadShape::Game);
        assert_eq!(PayloadShape::detect(&json!({"home_team": "A"})), PayloadShape::Flat);
        assert_eq!(PayloadShape::detect(&json!("garbage")), PayloadShape::Flat);
    }

    #[test]
    fn status_table() {
        assert_eq!(map_status(Some("NS")), EventStatus::Scheduled);
        assert_eq!(map_status(Some("2H")), EventStatus::Live);
        assert_eq!(map_status(Some("Match Finished")), EventStatus::Finished);
        assert_eq!(map_status(Some("TBD")), EventStatus::Upcoming);
        assert_eq!(map_status(Some("weird")), EventStatus::Scheduled);
        assert_eq!(map_status(None), EventStatus::Scheduled);
    }

    #[test]
    fn tennis_threshold_from_tournament() {
        assert_eq!(tennis_games_threshold("Wimbledon - Men's Singles"), 36.5);
        assert_eq!(tennis_games_threshold("ATP Rotterdam"), 22.5);
    }

    #[test]
    fn envelope_unwrapping() {
        assert_eq!(payload_items(&json!({"response": [1, 2]})).len(), 2);
        assert_eq!(payload_items(&json!({"data": {"id": 1}})).len(), 1);
        assert_eq!(payload_items(&json!([1])).len(), 1);
        assert!(payload_items(&json!({"errors": []})).is_empty());
        assert!(payload_items(&json!(null)).is_empty());
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let item = json!({"id": 5, "home_team": "A", "away_team": "B"});
        let events = normalize(&[item.clone(), item], "basketball", false);
        assert_eq!(events[0].id, "5");
        assert_eq!(events[1].id, "5-2");
        assert!(events[1].markets[0].id.starts_with("5-2-"));
    }

    #[test]
    fn suffixed_ids_never_collide_with_payload_ids() {
        let item = json!({"id": 5, "home_team": "A", "away_team": "B"});
        let clash = json!({"id": "5-2", "home_team": "C", "away_team": "D"});
        let events = normalize(&[item.clone(), item, clash], "basketball", false);

        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["5", "5-2", "5-2-2"]);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn unknown_slug_yields_nothing() {
        assert!(normalize(&[json!({"id": 1})], "curling", false).is_empty());
    }

    #[test]
    fn football_fixture_without_odds() {
        let raw = json!({
            "teams": {"home": {"name": "A"}, "away": {"name": "B"}},
            "fixture": {"id": 7, "date": "2025-01-01T10:00:00Z", "status": {"short": "NS"}}
        });
        let events = normalize(&[raw], "football", false);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id, "7");
        assert_eq!(event.sport_id, sports::FOOTBALL);
        assert_eq!(event.home_team, "A");
        assert_eq!(event.away_team, "B");
        assert_eq!(event.status, EventStatus::Scheduled);
        assert!(!event.is_live);
        assert_eq!(event.start_time_iso, "2025-01-01T10:00:00Z");
        assert_eq!(event.league_name, "Football");

        let winner = event.markets.iter().find(|m| m.name == "Match Result").unwrap();
        let names: Vec<_> = winner.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Home", "Draw", "Away"]);
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = vec![
            json!({"fixture": {"id": 1}, "teams": {"home": {"name": "A"}, "away": {"name": "B"}}}),
            json!({"weird": true}),
        ];
        assert_eq!(normalize(&raw, "football", false), normalize(&raw, "football", false));
    }

    #[test]
    fn provider_odds_are_preferred() {
        let raw = json!({
            "fixture": {"id": 9, "status": {"short": "1H"}},
            "teams": {"home": {"name": "A"}, "away": {"name": "B"}},
            "goals": {"home": 1, "away": 0},
            "bookmakers": [{"name": "Bet365", "bets": [{"name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.50"}, {"value": "Draw", "odd": "4.00"}, {"value": "Away", "odd": "6.50"}
            ]}]}]
        });
        let out = normalize_detailed(&[raw], "soccer", false);
        assert_eq!(out[0].odds_source, OddsSource::Provider);
        let event = &out[0].event;
        assert_eq!(event.status, EventStatus::Live);
        assert!(event.is_live);
        assert_eq!(event.score.as_deref(), Some("1-0"));
        assert_eq!(event.markets[0].outcomes[0].odds, 1.5);
    }

    #[test]
    fn live_flag_promotes_unless_finished() {
        let scheduled = json!({"id": 1, "status": {"short": "NS"}, "teams": {}});
        let finished = json!({"id": 2, "status": {"short": "FT"}, "teams": {}});
        let events = normalize(&[scheduled, finished], "basketball", true);
        assert_eq!(events[0].status, EventStatus::Live);
        assert!(events[0].is_live);
        assert_eq!(events[1].status, EventStatus::Finished);
        assert!(!events[1].is_live);
    }

    #[test]
    fn draw_rule_holds_for_every_sport() {
        for sport in sports::all() {
            let events = normalize(&[json!({"id": 1, "home_team": "A", "away_team": "B"})], sport.slug, false);
            let winner = &events[0].markets[0];
            assert_eq!(winner.has_draw(), sport.profile.draw_allowed, "{}", sport.slug);
            for market in &events[0].markets {
                assert!(market.outcomes.len() >= 2);
            }
        }
    }

    #[test]
    fn tennis_totals_follow_tournament_format() {
        let slam = json!({"id": 1, "league": {"name": "Wimbledon"}, "players": {"home": {"name": "A"}, "away": {"name": "B"}}});
        let tour = json!({"id": 2, "league": {"name": "ATP Basel"}, "players": {"home": {"name": "C"}, "away": {"name": "D"}}});
        let events = normalize(&[slam, tour], "tennis", false);
        let totals = |e: &Event| e.markets.iter().find(|m| m.name == "Total Games").unwrap().outcomes[0].name.clone();
        assert_eq!(totals(&events[0]), "Over 36.5");
        assert_eq!(totals(&events[1]), "Over 22.5");
        assert_eq!(events[0].home_team, "A");
    }

    #[test]
    fn sport_id_comes_from_slug_not_payload() {
        let raw = json!({"fixture": {"id": 3}, "league": {"id": 1, "name": "IPL"}, "sport_id": 1});
        let events = normalize(&[raw], "cricket", false);
        assert_eq!(events[0].sport_id, sports::CRICKET);

        let race = json!({"id": 44, "competition": {"name": "Monaco Grand Prix"}, "circuit": {"name": "Monaco"}, "sportId": 1});
        let events = normalize(&[race], "f1", false);
        assert_eq!(events[0].sport_id, sports::FORMULA_1);
        assert_eq!(events[0].home_team, "Monaco Grand Prix");
        assert_eq!(events[0].away_team, "Monaco");
    }

    #[test]
    fn fights_use_fighter_names() {
        let raw = json!({"id": 100, "slug": "UFC 300", "fighters": {"first": {"name": "Pereira"}, "second": {"name": "Hill"}}});
        let events = normalize(&[raw], "mma", false);
        assert_eq!(events[0].home_team, "Pereira");
        assert_eq!(events[0].away_team, "Hill");
        assert_eq!(events[0].league_name, "UFC 300");
        assert!(!events[0].markets[0].has_draw());
    }

    #[test]
    fn malformed_items_get_placeholders() {
        let raw = vec![json!(null), json!(42), json!({"teams": "nope", "fixture": {"date": 5}})];
        let events = normalize(&raw, "hockey", false);
        assert_eq!(events.len(), 3);
        for event in &events {
            assert_eq!(event.sport_id, sports::HOCKEY);
            assert!(!event.id.is_empty());
            assert!(!event.markets.is_empty());
        }
        assert_eq!(events[0].home_team, PLACEHOLDER_HOME);
        assert_eq!(events[0].away_team, PLACEHOLDER_AWAY);
        assert_eq!(events[0].start_time_iso, PLACEHOLDER_START);
        assert_eq!(events[0].status, EventStatus::Scheduled);
        assert_ne!(events[0].id, events[1].id);
    }
}
