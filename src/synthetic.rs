//! Placeholder markets for events whose provider carries no prices.
//!
//! Odds are drawn from fixed plausible ranges so the canonical model is
//! display-ready. This is not a pricing model. The generator is seeded from
//! the sport and team names, so the same event always gets the same numbers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::model::{Market, Outcome};
use crate::sports::{self, SportProfile};

const FAVOURITE: (f64, f64) = (1.5, 2.5);
const UNDERDOG: (f64, f64) = (1.8, 4.0);
const DRAW: (f64, f64) = (3.0, 4.0);
const LINE: (f64, f64) = (1.8, 2.1);

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions<'a> {
    /// Prefix for market ids, usually the event id
    pub id_prefix: Option<&'a str>,
    /// Replaces the sport's default totals threshold
    pub totals_threshold: Option<f64>,
}

/// Match-winner, handicap and totals markets for `sport_id`.
pub fn generate(sport_id: u32, home: &str, away: &str) -> Vec<Market> {
    generate_with(sport_id, home, away, &GenerateOptions::default())
}

pub fn generate_with(sport_id: u32, home: &str, away: &str, options: &GenerateOptions<'_>) -> Vec<Market> {
    let Some(sport) = sports::by_id(sport_id) else {
        return Vec::new();
    };
    let profile = sport.profile;
    let prefix = options.id_prefix.unwrap_or("synthetic");
    let mut rng = seeded_rng(sport_id, home, away);

    vec![
        winner_market(&profile, prefix, &mut rng),
        handicap_market(&profile, prefix, home, away, &mut rng),
        totals_market(
            &profile,
            prefix,
            options.totals_threshold.unwrap_or(profile.totals_threshold),
            &mut rng,
        ),
    ]
}

fn winner_market(profile: &SportProfile, prefix: &str, rng: &mut StdRng) -> Market {
    let id = format!("{}-match-winner", prefix);
    let mut outcomes = vec![Outcome::priced(format!("{}-home", id), "Home".into(), draw(rng, FAVOURITE))];
    if profile.draw_allowed {
        outcomes.push(Outcome::priced(format!("{}-draw", id), "Draw".into(), draw(rng, DRAW)));
    }
    outcomes.push(Outcome::priced(format!("{}-away", id), "Away".into(), draw(rng, UNDERDOG)));

    Market {
        id,
        name: profile.winner_market.to_string(),
        outcomes,
    }
}

fn handicap_market(profile: &SportProfile, prefix: &str, home: &str, away: &str, rng: &mut StdRng) -> Market {
    let id = format!("{}-handicap", prefix);
    let line = profile.handicap_line;
    Market {
        outcomes: vec![
            Outcome::priced(format!("{}-home", id), format!("{} -{}", home, line), draw(rng, LINE)),
            Outcome::priced(format!("{}-away", id), format!("{} +{}", away, line), draw(rng, LINE)),
        ],
        id,
        name: profile.handicap_market.to_string(),
    }
}

fn totals_market(profile: &SportProfile, prefix: &str, threshold: f64, rng: &mut StdRng) -> Market {
    let id = format!("{}-totals", prefix);
    Market {
        outcomes: vec![
            Outcome::priced(format!("{}-over", id), format!("Over {}", threshold), draw(rng, LINE)),
            Outcome::priced(format!("{}-under", id), format!("Under {}", threshold), draw(rng, LINE)),
        ],
        id,
        name: format!("Total {}", profile.totals_unit),
    }
}

fn draw(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    rng.random_range(low..high)
}

fn seeded_rng(sport_id: u32, home: &str, away: &str) -> StdRng {
    let name = format!("{}|{}|{}", sport_id, home, away);
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest.as_bytes()[..8]);
    StdRng::seed_from_u64(u64::from_le_bytes(seed))
}
