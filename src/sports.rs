//! Static sport registry and per-sport market behaviour.
//!
//! `Sport::id` is the join key used throughout the canonical model. Market
//! shape differences between sports live in [`SportProfile`] so that adding a
//! sport is a table entry rather than another branch.

use serde::Serialize;

/// Market parameters for one sport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SportProfile {
    /// Whether a match-winner market carries a Draw outcome
    pub draw_allowed: bool,
    pub winner_market: &'static str,
    pub handicap_market: &'static str,
    pub handicap_line: f64,
    /// Unit used in the totals market name ("Goals", "Games", ...)
    pub totals_unit: &'static str,
    pub totals_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sport {
    pub id: u32,
    pub slug: &'static str,
    pub display_name: &'static str,
    #[serde(skip)]
    pub profile: SportProfile,
}

pub const FOOTBALL: u32 = 1;
pub const BASKETBALL: u32 = 2;
pub const AMERICAN_FOOTBALL: u32 = 3;
pub const BASEBALL: u32 = 4;
pub const HOCKEY: u32 = 5;
pub const RUGBY: u32 = 6;
pub const TENNIS: u32 = 7;
pub const CRICKET: u32 = 8;
pub const FORMULA_1: u32 = 9;
pub const MMA: u32 = 10;
pub const BOXING: u32 = 11;
pub const CYCLING: u32 = 12;
pub const VOLLEYBALL: u32 = 13;
pub const HANDBALL: u32 = 14;
pub const AUSSIE_RULES: u32 = 15;

const fn profile(
    draw_allowed: bool,
    winner_market: &'static str,
    handicap_market: &'static str,
    handicap_line: f64,
    totals_unit: &'static str,
    totals_threshold: f64,
) -> SportProfile {
    SportProfile {
        draw_allowed,
        winner_market,
        handicap_market,
        handicap_line,
        totals_unit,
        totals_threshold,
    }
}

const SPORTS: &[Sport] = &[
    Sport {
        id: FOOTBALL,
        slug: "football",
        display_name: "Football",
        profile: profile(true, "Match Result", "Asian Handicap", 0.5, "Goals", 2.5),
    },
    Sport {
        id: BASKETBALL,
        slug: "basketball",
        display_name: "Basketball",
        profile: profile(false, "Match Winner", "Point Spread", 5.5, "Points", 215.5),
    },
    Sport {
        id: AMERICAN_FOOTBALL,
        slug: "american-football",
        display_name: "American Football",
        profile: profile(false, "Moneyline", "Point Spread", 3.5, "Points", 44.5),
    },
    Sport {
        id: BASEBALL,
        slug: "baseball",
        display_name: "Baseball",
        profile: profile(false, "Moneyline", "Run Line", 1.5, "Runs", 8.5),
    },
    Sport {
        id: HOCKEY,
        slug: "hockey",
        display_name: "Ice Hockey",
        profile: profile(true, "Match Result", "Puck Line", 1.5, "Goals", 5.5),
    },
    Sport {
        id: RUGBY,
        slug: "rugby",
        display_name: "Rugby",
        profile: profile(true, "Match Result", "Handicap", 7.5, "Points", 45.5),
    },
    Sport {
        id: TENNIS,
        slug: "tennis",
        display_name: "Tennis",
        profile: profile(false, "Match Winner", "Game Handicap", 3.5, "Games", 22.5),
    },
    Sport {
        id: CRICKET,
        slug: "cricket",
        display_name: "Cricket",
        profile: profile(true, "Match Result", "Run Handicap", 10.5, "Runs", 320.5),
    },
    Sport {
        id: FORMULA_1,
        slug: "formula-1",
        display_name: "Formula 1",
        profile: profile(false, "Race Winner", "Position Handicap", 2.5, "Classified Finishers", 16.5),
    },
    Sport {
        id: MMA,
        slug: "mma",
        display_name: "MMA",
        profile: profile(false, "Fight Winner", "Round Handicap", 1.5, "Rounds", 2.5),
    },
    Sport {
        id: BOXING,
        slug: "boxing",
        display_name: "Boxing",
        profile: profile(false, "Fight Winner", "Round Handicap", 1.5, "Rounds", 8.5),
    },
    Sport {
        id: CYCLING,
        slug: "cycling",
        display_name: "Cycling",
        profile: profile(false, "Stage Winner", "Time Handicap", 0.5, "Finishers", 150.5),
    },
    Sport {
        id: VOLLEYBALL,
        slug: "volleyball",
        display_name: "Volleyball",
        profile: profile(false, "Match Winner", "Set Handicap", 1.5, "Points", 180.5),
    },
    Sport {
        id: HANDBALL,
        slug: "handball",
        display_name: "Handball",
        profile: profile(true, "Match Result", "Handicap", 4.5, "Goals", 55.5),
    },
    Sport {
        id: AUSSIE_RULES,
        slug: "afl",
        display_name: "Aussie Rules",
        profile: profile(true, "Match Result", "Line", 15.5, "Points", 165.5),
    },
];

const ALIASES: &[(&str, &str)] = &[
    ("soccer", "football"),
    ("f1", "formula-1"),
    ("formula1", "formula-1"),
    ("formula_1", "formula-1"),
    ("nfl", "american-football"),
    ("american_football", "american-football"),
    ("ice-hockey", "hockey"),
    ("ice_hockey", "hockey"),
    ("ufc", "mma"),
    ("aussie-rules", "afl"),
];

/// All registered sports in id order.
pub fn all() -> &'static [Sport] {
    SPORTS
}

pub fn by_id(id: u32) -> Option<&'static Sport> {
    SPORTS.iter().find(|s| s.id == id)
}

/// Resolve a slug (or a known alias), case-insensitively.
pub fn by_slug(slug: &str) -> Option<&'static Sport> {
    let wanted = slug.trim().to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .map(|(_, target)| *target)
        .unwrap_or(wanted.as_str());
    SPORTS.iter().find(|s| s.slug == canonical)
}
