use rand::Rng;
use serde::{Deserialize, Serialize};

/// A 100-rated side converts to ~3.2 expected goals, which is about where
/// realistic top-flight scoring tops out.
pub const MAX_GOALS_RATE: f64 = 3.2;

const FORM_NOISE_LOW: f64 = 0.9;
const FORM_NOISE_HIGH: f64 = 1.1;

/// Per-match contextual modifiers. Constructed once by the caller and read
/// only; absent context means neutral, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationContext {
    pub fatigue_score: f64,
    pub lineup_strength: f64,
    pub style_matchup: f64,
    pub home_distraction: f64,
    pub away_distraction: f64,
    pub home_fitness: f64,
    pub away_fitness: f64,
    pub reasoning: Option<String>,
}

impl SimulationContext {
    /// Canonical no-information context: nothing dampens or boosts scoring.
    pub fn neutral() -> Self {
        Self {
            fatigue_score: 0.0,
            lineup_strength: 100.0,
            style_matchup: 1.0,
            home_distraction: 0.0,
            away_distraction: 0.0,
            home_fitness: 100.0,
            away_fitness: 100.0,
            reasoning: None,
        }
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Linear map from a 0-100 power score to an expected-goals rate:
/// 0 -> 0.0, 50 -> 1.6, 100 -> 3.2.
pub fn lambda_for_power(power: i32) -> f64 {
    (f64::from(power) / 100.0) * MAX_GOALS_RATE
}

/// Applies fatigue, lineup strength, style matchup and fresh form noise to a
/// base rate, in that order. Call once per side per trial so the noise draws
/// stay independent.
pub fn effective_lambda(base_lambda: f64, ctx: &SimulationContext, rng: &mut impl Rng) -> f64 {
    let fatigue = 1.0 - ctx.fatigue_score / 200.0;
    let lineup = ctx.lineup_strength / 100.0;
    let noise = rng.gen_range(FORM_NOISE_LOW..FORM_NOISE_HIGH);
    (base_lambda * fatigue * lineup * ctx.style_matchup * noise).max(0.0)
}
