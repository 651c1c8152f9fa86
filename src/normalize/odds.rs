//! Bookmaker odds embedded in provider payloads.
//!
//! Known shapes, tried in order:
//! - `bookmakers[].bets[].values[] {value, odd}` (API-Sports)
//! - `bookmakers[].markets[].outcomes[] {name, price, point}` (The Odds API)
//! - `odds[].bookmakers[]` (API-Sports odds endpoint rows) or `odds[].values[]`
//! - tennis `odds {home, away}`, cricket `odds {home_win, draw, away_win}`,
//!   formula 1 `odds.winner[] {driver, odds}`

use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::extract::{as_f64, as_probability, first_number, first_text, first_value, slugify};
use crate::model::{implied_probability, is_draw_label, round2, Market, Outcome};
use crate::sports::{self, Sport, SportProfile};

const WINNER_NAMES: &[&str] = &[
    "match winner",
    "match result",
    "winner",
    "h2h",
    "1x2",
    "moneyline",
    "money line",
    "fight winner",
    "race winner",
    "to win",
    "match odds",
    "full time result",
    "fulltime result",
    "3way result",
];

/// Where market ids come from and which sport rules apply.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub event_id: &'a str,
    pub sport: &'a Sport,
}

/// One bookmaker's canonical markets for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmakerOdds {
    pub bookmaker: String,
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone)]
struct RawOutcome {
    name: String,
    odds: f64,
    probability: Option<f64>,
}

#[derive(Debug, Clone)]
struct RawMarket {
    name: String,
    outcomes: Vec<RawOutcome>,
}

/// Markets of the first bookmaker (in payload order) that yields any.
pub fn extract_markets(item: &Value, ctx: &MarketContext<'_>) -> Vec<Market> {
    bookmaker_odds(item, ctx)
        .into_iter()
        .next()
        .map(|b| b.markets)
        .unwrap_or_default()
}

/// Every bookmaker with at least one usable market.
pub fn bookmaker_odds(item: &Value, ctx: &MarketContext<'_>) -> Vec<BookmakerOdds> {
    let mut out = Vec::new();
    for (bookmaker, raw) in raw_bookmakers(item, ctx.sport) {
        let markets = finish(raw, ctx);
        if !markets.is_empty() {
            out.push(BookmakerOdds { bookmaker, markets });
        }
    }
    out
}

fn raw_bookmakers(item: &Value, sport: &Sport) -> Vec<(String, Vec<RawMarket>)> {
    let mut out = Vec::new();

    if let Some(books) = item.get("bookmakers").and_then(Value::as_array) {
        out.extend(books.iter().filter_map(bookmaker_entry));
    }

    if let Some(rows) = item.get("odds").and_then(Value::as_array) {
        let mut loose = Vec::new();
        for row in rows {
            if let Some(books) = row.get("bookmakers").and_then(Value::as_array) {
                out.extend(books.iter().filter_map(bookmaker_entry));
            } else if let Some(market) = raw_market(row) {
                loose.push(market);
            }
        }
        if !loose.is_empty() {
            out.push(("provider".to_string(), loose));
        }
    }

    if let Some(odds) = item.get("odds").filter(|v| v.is_object()) {
        let market = match sport.id {
            sports::TENNIS => tennis_market(odds, &sport.profile),
            sports::CRICKET => cricket_market(odds, &sport.profile),
            sports::FORMULA_1 => formula_one_market(odds, &sport.profile),
            _ => None,
        };
        if let Some(market) = market {
            out.push(("provider".to_string(), vec![market]));
        }
    }

    out
}

fn bookmaker_entry(book: &Value) -> Option<(String, Vec<RawMarket>)> {
    let name = first_text(book, &["/name", "/title", "/key"]).unwrap_or_else(|| "provider".to_string());
    let bets = first_value(book, &["/bets", "/markets"])?.as_array()?;
    let markets: Vec<RawMarket> = bets.iter().filter_map(raw_market).collect();
    (!markets.is_empty()).then_some((name, markets))
}

fn raw_market(bet: &Value) -> Option<RawMarket> {
    let name = first_text(bet, &["/name", "/label", "/key"])?;
    let values = first_value(bet, &["/values", "/outcomes"])?.as_array()?;
    let priced: Vec<RawOutcome> = values.iter().filter_map(raw_outcome).collect();

    // a market quoted entirely in |price| >= 100 is American (+150 / -110)
    let american = priced.iter().all(|o| o.odds.abs() >= AMERICAN_MIN);
    let outcomes: Vec<RawOutcome> = priced
        .into_iter()
        .filter_map(|mut o| {
            o.odds = decimal_odds(o.odds, american)?;
            Some(o)
        })
        .collect();
    (!outcomes.is_empty()).then_some(RawMarket { name, outcomes })
}

/// Outcome with its price as quoted; see [`decimal_odds`].
fn raw_outcome(value: &Value) -> Option<RawOutcome> {
    let mut name = first_text(value, &["/value", "/name", "/label"])?;
    let odds = as_f64(first_value(value, &["/odd", "/odds", "/price"])?)?;

    if let Some(point) = first_number(value, &["/point", "/handicap"]) {
        let lower = name.to_ascii_lowercase();
        name = if lower == "over" || lower == "under" {
            format!("{} {}", name, point)
        } else {
            format!("{} {:+}", name, point)
        };
    }

    let probability = first_value(value, &["/probability", "/prob", "/percentage"]).and_then(as_probability);
    Some(RawOutcome {
        name,
        odds,
        probability,
    })
}

const AMERICAN_MIN: f64 = 100.0;

/// Decimal odds from a quoted price.
///
/// `<= -100` is always an American price. Positive prices of 100 or more are
/// only American when the whole market is (`american_market`); decimal long
/// shots such as 151.0 stay as they are.
fn decimal_odds(price: f64, american_market: bool) -> Option<f64> {
    let decimal = if price <= -AMERICAN_MIN {
        1.0 + AMERICAN_MIN / price.abs()
    } else if american_market && price >= AMERICAN_MIN {
        1.0 + price / AMERICAN_MIN
    } else {
        price
    };
    (decimal >= 1.0).then_some(decimal)
}

fn priced(name: &str, odds: Option<f64>) -> Option<RawOutcome> {
    let odds = odds.filter(|o| *o >= 1.0)?;
    Some(RawOutcome {
        name: name.to_string(),
        odds,
        probability: None,
    })
}

fn tennis_market(odds: &Value, profile: &SportProfile) -> Option<RawMarket> {
    let outcomes: Vec<RawOutcome> = [
        priced("Home", first_number(odds, &["/home", "/player1", "/home_win"])),
        priced("Away", first_number(odds, &["/away", "/player2", "/away_win"])),
    ]
    .into_iter()
    .flatten()
    .collect();
    Some(RawMarket {
        name: profile.winner_market.to_string(),
        outcomes,
    })
}

fn cricket_market(odds: &Value, profile: &SportProfile) -> Option<RawMarket> {
    let outcomes: Vec<RawOutcome> = [
        priced("Home", first_number(odds, &["/home_win", "/home"])),
        priced("Draw", first_number(odds, &["/draw", "/tie"])),
        priced("Away", first_number(odds, &["/away_win", "/away"])),
    ]
    .into_iter()
    .flatten()
    .collect();
    Some(RawMarket {
        name: profile.winner_market.to_string(),
        outcomes,
    })
}

fn formula_one_market(odds: &Value, profile: &SportProfile) -> Option<RawMarket> {
    let drivers = first_value(odds, &["/winner", "/drivers", "/race_winner"])?.as_array()?;
    let outcomes: Vec<RawOutcome> = drivers
        .iter()
        .filter_map(|d| {
            let name = first_text(d, &["/driver", "/driver/name", "/name"])?;
            priced(&name, first_number(d, &["/odds", "/odd", "/price"]))
        })
        .collect();
    Some(RawMarket {
        name: profile.winner_market.to_string(),
        outcomes,
    })
}

fn is_winner_market(name: &str, profile: &SportProfile) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    WINNER_NAMES.contains(&lower.as_str()) || lower == profile.winner_market.to_ascii_lowercase()
}

fn canonical_market_name(name: &str, profile: &SportProfile) -> String {
    if is_winner_market(name, profile) {
        return profile.winner_market.to_string();
    }
    match name.trim().to_ascii_lowercase().as_str() {
        "spreads" => profile.handicap_market.to_string(),
        "totals" => format!("Total {}", profile.totals_unit),
        _ => name.trim().to_string(),
    }
}

/// Canonical ids/names, draw rule, and the two-outcome minimum.
fn finish(raw: Vec<RawMarket>, ctx: &MarketContext<'_>) -> Vec<Market> {
    let profile = &ctx.sport.profile;
    let mut market_ids = HashSet::new();
    let mut markets = Vec::new();

    for market in raw {
        let winner = is_winner_market(&market.name, profile);
        let mut outcomes = market.outcomes;

        if winner {
            let has_draw = outcomes.iter().any(|o| is_draw_label(&o.name));
            if !profile.draw_allowed {
                outcomes.retain(|o| !is_draw_label(&o.name));
            } else if !has_draw {
                // two-way prices can't stand in for a three-way result; the
                // event's other markets are kept
                debug!(
                    event_id = ctx.event_id,
                    sport = ctx.sport.slug,
                    market = %market.name,
                    "Dropping winner market without a draw outcome"
                );
                continue;
            }
        }
        if outcomes.len() < 2 {
            continue;
        }

        let name = canonical_market_name(&market.name, profile);
        let id = unique_id(format!("{}-{}", ctx.event_id, slugify(&name)), &mut market_ids);
        let mut outcome_ids = HashSet::new();
        let outcomes = outcomes
            .into_iter()
            .map(|o| Outcome {
                id: unique_id(format!("{}-{}", id, slugify(&o.name)), &mut outcome_ids),
                probability: o.probability.map(round2).unwrap_or_else(|| implied_probability(o.odds)),
                odds: o.odds,
                name: o.name,
            })
            .collect();

        markets.push(Market { id, name, outcomes });
    }

    markets
}

fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(sport_id: u32) -> MarketContext<'static> {
        MarketContext {
            event_id: "e1",
            sport: sports::by_id(sport_id).unwrap(),
        }
    }

    #[test]
    fn api_sports_bets_are_used_verbatim() {
        let item = json!({"bookmakers": [{
            "id": 8, "name": "Bet365",
            "bets": [{"id": 1, "name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.85"},
                {"value": "Draw", "odd": "3.40"},
                {"value": "Away", "odd": "4.20"}
            ]}]
        }]});
        let markets = extract_markets(&item, &ctx(sports::FOOTBALL));
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].name, "Match Result");
        assert_eq!(markets[0].id, "e1-match-result");
        assert_eq!(markets[0].outcomes[0].odds, 1.85);
        assert_eq!(markets[0].outcomes[0].probability, 0.54);
        assert_eq!(markets[0].outcomes[1].id, "e1-match-result-draw");
    }

    #[test]
    fn odds_api_markets_with_points() {
        let item = json!({"bookmakers": [{
            "key": "pinnacle", "title": "Pinnacle",
            "markets": [
                {"key": "h2h", "outcomes": [{"name": "Lakers", "price": 1.9}, {"name": "Celtics", "price": 1.95}]},
                {"key": "totals", "outcomes": [
                    {"name": "Over", "price": 1.91, "point": 221.5},
                    {"name": "Under", "price": 1.91, "point": 221.5}
                ]}
            ]
        }]});
        let books = bookmaker_odds(&item, &ctx(sports::BASKETBALL));
        assert_eq!(books[0].bookmaker, "Pinnacle");
        assert_eq!(books[0].markets[0].name, "Match Winner");
        assert_eq!(books[0].markets[1].name, "Total Points");
        assert_eq!(books[0].markets[1].outcomes[0].name, "Over 221.5");
    }

    #[test]
    fn draws_are_removed_for_individual_sports() {
        let item = json!({"odds": [{"name": "Match Winner", "values": [
            {"value": "Home", "odd": 1.5}, {"value": "Draw", "odd": 15.0}, {"value": "Away", "odd": 2.6}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::MMA));
        assert_eq!(markets[0].name, "Fight Winner");
        assert_eq!(markets[0].outcomes.len(), 2);
        assert!(!markets[0].has_draw());
    }

    #[test]
    fn winner_market_without_draw_is_dropped_for_draw_sports() {
        let item = json!({"odds": [{"name": "Match Winner", "values": [
            {"value": "Home", "odd": 1.5}, {"value": "Away", "odd": 2.6}
        ]}]});
        assert!(extract_markets(&item, &ctx(sports::HOCKEY)).is_empty());
    }

    #[test]
    fn provider_probability_wins_over_implied() {
        let item = json!({"odds": [{"name": "Winner", "values": [
            {"value": "Home", "odd": "2.00", "probability": "40%"},
            {"value": "Away", "odd": "1.80"}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::TENNIS));
        assert_eq!(markets[0].outcomes[0].probability, 0.4);
        assert_eq!(markets[0].outcomes[1].probability, 0.56);
    }

    #[test]
    fn sport_specific_shapes() {
        let tennis = extract_markets(&json!({"odds": {"home": 1.4, "away": 2.9}}), &ctx(sports::TENNIS));
        assert_eq!(tennis[0].outcomes.len(), 2);

        let cricket = extract_markets(
            &json!({"odds": {"home_win": "2.10", "draw": "5.5", "away_win": 1.9}}),
            &ctx(sports::CRICKET),
        );
        assert!(cricket[0].has_draw());

        let f1 = extract_markets(
            &json!({"odds": {"winner": [
                {"driver": "Max Verstappen", "odds": 2.1},
                {"driver": "Lando Norris", "odds": 3.4},
                {"driver": "Nobody", "odds": "x"}
            ]}}),
            &ctx(sports::FORMULA_1),
        );
        assert_eq!(f1[0].name, "Race Winner");
        assert_eq!(f1[0].outcomes.len(), 2);
        assert_eq!(f1[0].outcomes[0].id, "e1-race-winner-max-verstappen");
    }

    #[test]
    fn american_prices_convert() {
        let item = json!({"odds": [{"name": "Moneyline", "values": [
            {"value": "Home", "odd": -200}, {"value": "Away", "odd": 2.5}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::BASEBALL));
        assert_eq!(markets[0].outcomes[0].odds, 1.5);
    }

    #[test]
    fn draw_sport_keeps_other_markets_when_winner_lacks_draw() {
        let item = json!({"bookmakers": [{"name": "Bet365", "bets": [
            {"name": "Match Winner", "values": [{"value": "Home", "odd": 1.8}, {"value": "Away", "odd": 2.0}]},
            {"name": "Goals Over/Under", "values": [{"value": "Over 2.5", "odd": 1.9}, {"value": "Under 2.5", "odd": 1.9}]}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::FOOTBALL));
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].name, "Goals Over/Under");
    }

    #[test]
    fn positive_american_prices_convert_when_market_is_american() {
        let item = json!({"bookmakers": [{"key": "draftkings", "title": "DraftKings", "markets": [
            {"key": "h2h", "outcomes": [{"name": "Yankees", "price": 150}, {"name": "Red Sox", "price": -110}]}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::BASEBALL));
        assert_eq!(markets[0].outcomes[0].odds, 2.5);
        assert_eq!(markets[0].outcomes[0].probability, 0.4);
        assert_eq!(markets[0].outcomes[1].odds, 1.0 + 100.0 / 110.0);
    }

    #[test]
    fn decimal_long_shots_are_not_read_as_american() {
        let item = json!({"odds": [{"name": "Winner", "values": [
            {"value": "Favourite", "odd": 1.2}, {"value": "Outsider", "odd": 151.0}
        ]}]});
        let markets = extract_markets(&item, &ctx(sports::TENNIS));
        assert_eq!(markets[0].outcomes[1].odds, 151.0);
    }

    #[test]
    fn garbage_yields_no_markets() {
        for item in [json!(null), json!({"odds": "none"}), json!({"bookmakers": [{"bets": 3}]}), json!([1])] {
            assert!(extract_markets(&item, &ctx(sports::FOOTBALL)).is_empty());
        }
    }
}
