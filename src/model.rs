//! Canonical event/market/outcome model shared by every sport and provider.

use serde::{Deserialize, Serialize};

/// Canonical lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Live,
    Finished,
    Upcoming,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Live => "live",
            EventStatus::Finished => "finished",
            EventStatus::Upcoming => "upcoming",
        }
    }
}

/// Provider-agnostic event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub sport_id: u32,
    pub league_name: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time_iso: String,
    pub status: EventStatus,
    pub is_live: bool,
    pub score: Option<String>,
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    pub outcomes: Vec<Outcome>,
}

impl Market {
    /// Whether any outcome is a draw/tie selection.
    pub fn has_draw(&self) -> bool {
        self.outcomes.iter().any(|o| is_draw_label(&o.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub name: String,
    pub odds: f64,
    pub probability: f64,
}

impl Outcome {
    /// Build an outcome whose probability is the implied `1/odds`.
    pub fn priced(id: String, name: String, odds: f64) -> Self {
        let odds = round2(odds);
        Self {
            id,
            name,
            odds,
            probability: implied_probability(odds),
        }
    }
}

/// Where a set of odds came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsSource {
    Provider,
    Synthetic,
}

/// Odds for one event as offered by one bookmaker (or generated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsData {
    pub event_id: String,
    pub bookmaker: String,
    pub source: OddsSource,
    pub markets: Vec<Market>,
}

/// `1/odds` rounded to two decimals, clamped into `[0, 1]`.
pub fn implied_probability(odds: f64) -> f64 {
    if !odds.is_finite() || odds < 1.0 {
        return 0.0;
    }
    round2(1.0 / odds).clamp(0.0, 1.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn is_draw_label(name: &str) -> bool {
    matches!(
        name.trim().to_ascii_lowercase().as_str(),
        "draw" | "x" | "tie" | "the draw"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_probability_rounds_to_two_decimals() {
        assert_eq!(implied_probability(2.0), 0.5);
        assert_eq!(implied_probability(3.0), 0.33);
        assert_eq!(implied_probability(1.0), 1.0);
        assert_eq!(implied_probability(0.5), 0.0);
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = Event {
            id: "1".into(),
            sport_id: 1,
            league_name: "Premier League".into(),
            home_team: "A".into(),
            away_team: "B".into(),
            start_time_iso: "2025-01-01T10:00:00Z".into(),
            status: EventStatus::Scheduled,
            is_live: false,
            score: None,
            markets: vec![],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["sportId"], 1);
        assert_eq!(json["startTimeIso"], "2025-01-01T10:00:00Z");
        assert_eq!(json["status"], "scheduled");
    }
}
