//! Which upstream serves which sport, and how it wants to be asked.

use serde::Serialize;

use crate::resilience::EndpointCandidate;
use crate::sports::{self, Sport};

/// Request shape shared by a group of upstream APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestFamily {
    /// `fixtures`/`games` endpoints, `live=all`
    Fixtures,
    /// `races` endpoints, `status=live`
    Races,
    /// `fights` endpoints, `date=<today>&status=NS` for upcoming cards
    Fights,
}

/// How an upstream expresses "upcoming".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpcomingStyle {
    DateRange,
    /// Relative `next=<n>` parameter
    Next,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfig {
    pub sport_id: u32,
    pub family: RequestFamily,
    pub base_url: String,
    /// Resource path under the base, e.g. `fixtures`
    pub resource: String,
    /// Query parameter naming the event on the `odds` resource
    pub odds_param: String,
    pub auth_header: String,
    pub upcoming: UpcomingStyle,
    pub fallbacks: Vec<EndpointCandidate>,
}

impl ProviderConfig {
    pub fn sport(&self) -> Option<&'static Sport> {
        sports::by_id(self.sport_id)
    }

    /// Primary followed by fallbacks, in the order they are tried.
    pub fn candidates(&self) -> Vec<EndpointCandidate> {
        std::iter::once(EndpointCandidate::primary(self.base_url.clone()))
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }

    /// Environment variable holding this sport's own credential.
    pub fn credential_env(&self) -> String {
        let slug = self.sport().map(|s| s.slug).unwrap_or("sports");
        format!("{}_API_KEY", slug.to_ascii_uppercase().replace('-', "_"))
    }
}

/// Immutable sport → provider table, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

const API_SPORTS_HEADER: &str = "x-apisports-key";

struct Row {
    sport_id: u32,
    family: RequestFamily,
    base_url: &'static str,
    resource: &'static str,
    odds_param: &'static str,
    upcoming: UpcomingStyle,
    fallbacks: &'static [&'static str],
}

const STANDARD: &[Row] = &[
    Row {
        sport_id: sports::FOOTBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v3.football.api-sports.io",
        resource: "fixtures",
        odds_param: "fixture",
        upcoming: UpcomingStyle::Next,
        fallbacks: &["https://api-football-v1.p.rapidapi.com/v3"],
    },
    Row {
        sport_id: sports::BASKETBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.basketball.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-basketball.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::AMERICAN_FOOTBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.american-football.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-american-football.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::BASEBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.baseball.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-baseball.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::HOCKEY,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.hockey.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-hockey.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::RUGBY,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.rugby.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-rugby.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::TENNIS,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.tennis.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://tennis-live-data.p.rapidapi.com/v1"],
    },
    Row {
        sport_id: sports::CRICKET,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.cricket.api-sports.io",
        resource: "fixtures",
        odds_param: "fixture",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &[
            "https://api-cricket.sportsdata.io/v1",
            "https://cricket-live-data.p.rapidapi.com",
        ],
    },
    Row {
        sport_id: sports::FORMULA_1,
        family: RequestFamily::Races,
        base_url: "https://v1.formula-1.api-sports.io",
        resource: "races",
        odds_param: "race",
        upcoming: UpcomingStyle::Next,
        fallbacks: &["https://api-formula-1.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::MMA,
        family: RequestFamily::Fights,
        base_url: "https://v1.mma.api-sports.io",
        resource: "fights",
        odds_param: "fight",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-mma.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::BOXING,
        family: RequestFamily::Fights,
        base_url: "https://v1.boxing.api-sports.io",
        resource: "fights",
        odds_param: "fight",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-boxing.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::CYCLING,
        family: RequestFamily::Races,
        base_url: "https://v1.cycling.api-sports.io",
        resource: "races",
        odds_param: "race",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &[],
    },
    Row {
        sport_id: sports::VOLLEYBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.volleyball.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-volleyball.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::HANDBALL,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.handball.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-handball.p.rapidapi.com"],
    },
    Row {
        sport_id: sports::AUSSIE_RULES,
        family: RequestFamily::Fixtures,
        base_url: "https://v1.afl.api-sports.io",
        resource: "games",
        odds_param: "game",
        upcoming: UpcomingStyle::DateRange,
        fallbacks: &["https://api-afl.p.rapidapi.com"],
    },
];

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    /// The production table (API-Sports primaries with their fallbacks).
    pub fn standard() -> Self {
        let providers = STANDARD
            .iter()
            .map(|row| ProviderConfig {
                sport_id: row.sport_id,
                family: row.family,
                base_url: row.base_url.to_string(),
                resource: row.resource.to_string(),
                odds_param: row.odds_param.to_string(),
                auth_header: API_SPORTS_HEADER.to_string(),
                upcoming: row.upcoming,
                fallbacks: row
                    .fallbacks
                    .iter()
                    .map(|base| EndpointCandidate::fallback(*base))
                    .collect(),
            })
            .collect();
        Self { providers }
    }

    pub fn get(&self, sport_id: u32) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.sport_id == sport_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
