use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimulateError, ValidationError};
use crate::power::{SimulationContext, effective_lambda, lambda_for_power};
use crate::score::{Outcome, classify_outcome};

pub const DEFAULT_TRIALS: u32 = 10_000;

const CANCEL_CHECK_EVERY: u32 = 256;
const TOP_SCORES: usize = 3;

/// Aggregated result of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    pub home_win_probability: f64,
    pub draw_probability: f64,
    pub away_win_probability: f64,
    pub btts_probability: f64,
    pub over_2_5_probability: f64,
    pub most_likely_score: String,
    /// Up to three highest-frequency scorelines, descending. Ties resolve by
    /// ascending scoreline so repeated runs rank identically.
    pub top_score_distribution: Vec<(String, u32)>,
    pub simulation_count: u32,
}

impl OutcomeDistribution {
    /// Highest-probability outcome; ties resolve home, then away, then draw.
    pub fn favored_outcome(&self) -> Outcome {
        if self.home_win_probability >= self.draw_probability
            && self.home_win_probability >= self.away_win_probability
        {
            Outcome::Home
        } else if self.away_win_probability >= self.draw_probability {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn favored_probability(&self) -> f64 {
        match self.favored_outcome() {
            Outcome::Home => self.home_win_probability,
            Outcome::Draw => self.draw_probability,
            Outcome::Away => self.away_win_probability,
        }
    }

    pub fn under_2_5_probability(&self) -> f64 {
        1.0 - self.over_2_5_probability
    }
}

/// One fixture in a batch simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRequest {
    pub home_power: i32,
    pub away_power: i32,
    pub context: SimulationContext,
    pub trials: u32,
}

/// Division that treats an empty bucket as a 0 rate instead of NaN.
pub fn rate(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(count) / f64::from(total)
    }
}

/// Poisson draw via Knuth's product-of-uniforms algorithm. A non-positive
/// rate short-circuits to zero goals.
pub fn poisson_draw(lambda: f64, rng: &mut impl Rng) -> u32 {
    if lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0f64;
    loop {
        k += 1;
        p *= rng.gen_range(0.0..1.0);
        if p <= limit {
            return k - 1;
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tally {
    home_wins: u32,
    draws: u32,
    away_wins: u32,
    btts: u32,
    over_2_5: u32,
    // BTreeMap keeps scoreline iteration stable, which makes tie-breaking
    // in the frequency ranking deterministic.
    scores: BTreeMap<(u8, u8), u32>,
}

impl Tally {
    pub(crate) fn record(&mut self, home_goals: u32, away_goals: u32) {
        match classify_outcome(home_goals, away_goals) {
            Outcome::Home => self.home_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Away => self.away_wins += 1,
        }
        if home_goals > 0 && away_goals > 0 {
            self.btts += 1;
        }
        if home_goals + away_goals > 2 {
            self.over_2_5 += 1;
        }
        let key = (home_goals.min(99) as u8, away_goals.min(99) as u8);
        *self.scores.entry(key).or_insert(0) += 1;
    }

    pub(crate) fn finish(self, trials: u32) -> OutcomeDistribution {
        let mut ranked: Vec<((u8, u8), u32)> = self.scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let most_likely_score = ranked
            .first()
            .map(|((h, a), _)| format!("{h}-{a}"))
            .unwrap_or_else(|| "0-0".to_string());
        let top_score_distribution = ranked
            .into_iter()
            .take(TOP_SCORES)
            .map(|((h, a), count)| (format!("{h}-{a}"), count))
            .collect();

        OutcomeDistribution {
            home_win_probability: rate(self.home_wins, trials),
            draw_probability: rate(self.draws, trials),
            away_win_probability: rate(self.away_wins, trials),
            btts_probability: rate(self.btts, trials),
            over_2_5_probability: rate(self.over_2_5, trials),
            most_likely_score,
            top_score_distribution,
            simulation_count: trials,
        }
    }
}

pub(crate) fn validate_power(side: &'static str, value: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PowerOutOfRange { side, value })
    }
}

pub(crate) fn validate_request(
    home_power: i32,
    away_power: i32,
    trials: u32,
) -> Result<(), ValidationError> {
    validate_power("home", home_power)?;
    validate_power("away", away_power)?;
    if trials == 0 {
        return Err(ValidationError::InvalidTrialCount);
    }
    Ok(())
}

fn trial_goals(
    base_home: f64,
    base_away: f64,
    ctx: &SimulationContext,
    rng: &mut impl Rng,
) -> (u32, u32) {
    let lambda_home = effective_lambda(base_home, ctx, rng);
    let lambda_away = effective_lambda(base_away, ctx, rng);
    (poisson_draw(lambda_home, rng), poisson_draw(lambda_away, rng))
}

/// Runs `trials` independent goal draws for one fixture and aggregates the
/// outcome distribution. Invalid powers or a zero trial count are rejected
/// before any trial runs.
pub fn simulate(
    home_power: i32,
    away_power: i32,
    context: &SimulationContext,
    trials: u32,
    rng: &mut impl Rng,
) -> Result<OutcomeDistribution, ValidationError> {
    validate_request(home_power, away_power, trials)?;

    let base_home = lambda_for_power(home_power);
    let base_away = lambda_for_power(away_power);
    debug!(home_power, away_power, base_home, base_away, trials, "simulating fixture");

    let mut tally = Tally::default();
    for _ in 0..trials {
        let (h, a) = trial_goals(base_home, base_away, context, rng);
        tally.record(h, a);
    }
    Ok(tally.finish(trials))
}

/// Like [`simulate`] but polls `cancel` at a coarse granularity. A cancelled
/// run yields no distribution at all, never a partial one.
pub fn simulate_cancellable(
    home_power: i32,
    away_power: i32,
    context: &SimulationContext,
    trials: u32,
    rng: &mut impl Rng,
    cancel: &AtomicBool,
) -> Result<OutcomeDistribution, SimulateError> {
    validate_request(home_power, away_power, trials)?;

    let base_home = lambda_for_power(home_power);
    let base_away = lambda_for_power(away_power);

    let mut tally = Tally::default();
    for done in 0..trials {
        if done % CANCEL_CHECK_EVERY == 0 && cancel.load(Ordering::Relaxed) {
            return Err(SimulateError::Cancelled);
        }
        let (h, a) = trial_goals(base_home, base_away, context, rng);
        tally.record(h, a);
    }
    Ok(tally.finish(trials))
}

/// Simulates many fixtures in parallel. Each fixture gets its own generator,
/// so concurrent runs never share random state.
pub fn simulate_batch(
    fixtures: &[FixtureRequest],
) -> Vec<Result<OutcomeDistribution, ValidationError>> {
    fixtures
        .par_iter()
        .map(|fixture| {
            let mut rng = StdRng::from_entropy();
            simulate(
                fixture.home_power,
                fixture.away_power,
                &fixture.context,
                fixture.trials,
                &mut rng,
            )
        })
        .collect()
}
