use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::oracle::OracleAnalysis;
use crate::power::{SimulationContext, effective_lambda, lambda_for_power};
use crate::tesseract::{OutcomeDistribution, Tally, poisson_draw, validate_request};

/// Converts a per-match scoring probability into a per-trial chance, so the
/// player events do not double-count against the team lambda.
const PER_TRIAL_FACTOR: f64 = 0.3;
/// Above this adjusted probability a scorer gets an independent shot at a
/// second goal.
const HAT_TRICK_THRESHOLD: f64 = 70.0;
const HAT_TRICK_CHANCE: f64 = 0.10;

const BASE_LAMBDA_WEIGHT: f64 = 0.6;
const PLAYER_CONTRIBUTION_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScoringProbability {
    pub player: String,
    /// Season-long scoring probability, 0-100.
    pub base_probability: f64,
    /// Context-adjusted probability for this fixture, 0-100.
    pub adjusted_probability: f64,
    pub is_playing: bool,
}

/// Team-level simulation refined with per-player scoring events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedResult {
    /// Recomputed from the player-augmented trials; its BTTS and over-2.5
    /// figures supersede the base simulation's.
    pub distribution: OutcomeDistribution,
    pub home_scorer_probabilities: HashMap<String, f64>,
    pub away_scorer_probabilities: HashMap<String, f64>,
    pub most_likely_home_scorer: Option<String>,
    pub most_likely_away_scorer: Option<String>,
    pub home_expected_goals: f64,
    pub away_expected_goals: f64,
}

/// Re-runs the goal simulation with per-player Bernoulli scoring overlaid on
/// the team Poisson draws.
pub fn run_enhanced(
    oracle: &OracleAnalysis,
    home_scorers: &[PlayerScoringProbability],
    away_scorers: &[PlayerScoringProbability],
    trials: u32,
    rng: &mut impl Rng,
) -> Result<EnhancedResult, ValidationError> {
    validate_request(oracle.home_power_score, oracle.away_power_score, trials)?;

    let neutral = SimulationContext::neutral();
    let ctx = oracle.simulation_context.as_ref().unwrap_or(&neutral);
    let base_home = lambda_for_power(oracle.home_power_score);
    let base_away = lambda_for_power(oracle.away_power_score);
    debug!(
        home_scorers = home_scorers.len(),
        away_scorers = away_scorers.len(),
        trials,
        "running player-enhanced simulation"
    );

    let mut tally = Tally::default();
    for _ in 0..trials {
        let lambda_home = effective_lambda(base_home, ctx, rng);
        let lambda_away = effective_lambda(base_away, ctx, rng);
        let home_goals = poisson_draw(lambda_home, rng) + bonus_goals(home_scorers, rng);
        let away_goals = poisson_draw(lambda_away, rng) + bonus_goals(away_scorers, rng);
        tally.record(home_goals, away_goals);
    }

    Ok(EnhancedResult {
        distribution: tally.finish(trials),
        home_scorer_probabilities: scorer_probabilities(home_scorers),
        away_scorer_probabilities: scorer_probabilities(away_scorers),
        most_likely_home_scorer: most_likely_scorer(home_scorers),
        most_likely_away_scorer: most_likely_scorer(away_scorers),
        home_expected_goals: expected_goals(base_home, home_scorers),
        away_expected_goals: expected_goals(base_away, away_scorers),
    })
}

fn bonus_goals(scorers: &[PlayerScoringProbability], rng: &mut impl Rng) -> u32 {
    let mut goals = 0;
    for scorer in scorers.iter().filter(|s| s.is_playing) {
        let chance = (scorer.adjusted_probability / 100.0 * PER_TRIAL_FACTOR).clamp(0.0, 1.0);
        if rng.gen_bool(chance) {
            goals += 1;
            if scorer.adjusted_probability > HAT_TRICK_THRESHOLD && rng.gen_bool(HAT_TRICK_CHANCE) {
                goals += 1;
            }
        }
    }
    goals
}

fn player_contribution(scorer: &PlayerScoringProbability) -> f64 {
    let per_trial = (scorer.adjusted_probability / 100.0 * PER_TRIAL_FACTOR).clamp(0.0, 1.0);
    if scorer.adjusted_probability > HAT_TRICK_THRESHOLD {
        per_trial * (1.0 + HAT_TRICK_CHANCE)
    } else {
        per_trial
    }
}

/// Weighted blend of the team rate and the summed player contributions.
fn expected_goals(base_lambda: f64, scorers: &[PlayerScoringProbability]) -> f64 {
    let players: f64 = scorers
        .iter()
        .filter(|s| s.is_playing)
        .map(player_contribution)
        .sum();
    BASE_LAMBDA_WEIGHT * base_lambda + PLAYER_CONTRIBUTION_WEIGHT * players
}

fn scorer_probabilities(scorers: &[PlayerScoringProbability]) -> HashMap<String, f64> {
    scorers
        .iter()
        .map(|s| (s.player.clone(), s.adjusted_probability))
        .collect()
}

fn most_likely_scorer(scorers: &[PlayerScoringProbability]) -> Option<String> {
    scorers
        .iter()
        .filter(|s| s.is_playing)
        .max_by(|a, b| a.adjusted_probability.total_cmp(&b.adjusted_probability))
        .map(|s| s.player.clone())
}
