use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{
    ContextFactor, FactorKind, NEGATIVE_SCORE_CEILING, OutlierScenario, POSITIVE_SCORE_FLOOR,
};
use crate::error::ValidationError;
use crate::power::SimulationContext;
use crate::score::{Outcome, Scoreline};
use crate::tesseract::{OutcomeDistribution, validate_power};

/// Hard cap on either side of a serialized prediction.
pub const MAX_SCORELINE_GOALS: u8 = 5;

const INJURY_CONFIDENCE_PENALTY: f64 = 5.0;
const DISAGREEMENT_PENALTY: f64 = 12.0;
const MORALE_CONFIDENCE_STEP: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormLabel {
    Good,
    Average,
    Poor,
}

/// Qualitative payload attached to an analysis when a context provider has
/// something to say about the fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextBundle {
    pub factors: Vec<ContextFactor>,
    pub outliers: Vec<OutlierScenario>,
}

/// The headline rating-based prediction for one fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleAnalysis {
    pub prediction: String,
    pub confidence: f64,
    pub reasoning: String,
    pub home_power_score: i32,
    pub away_power_score: i32,
    pub power_delta: i32,
    pub tesseract: Option<OutcomeDistribution>,
    pub simulation_context: Option<SimulationContext>,
    pub enhancement: Option<ContextBundle>,
}

impl OracleAnalysis {
    /// Baseline prediction from two power scores alone: the scoreline comes
    /// from delta bands, confidence grows with the gap.
    pub fn from_power_scores(home_power: i32, away_power: i32) -> Result<Self, ValidationError> {
        validate_power("home", home_power)?;
        validate_power("away", away_power)?;

        let power_delta = home_power - away_power;
        let score = baseline_scoreline(power_delta);
        let confidence = (45.0 + f64::from(power_delta.abs())).clamp(30.0, 95.0);
        let reasoning = format!(
            "power delta {power_delta:+} ({home_power} vs {away_power}) points to {}",
            score.outcome().label(),
        );

        Ok(Self {
            prediction: score.to_string(),
            confidence,
            reasoning,
            home_power_score: home_power,
            away_power_score: away_power,
            power_delta,
            tesseract: None,
            simulation_context: None,
            enhancement: None,
        })
    }

    pub fn implied_outcome(&self) -> Result<Outcome, ValidationError> {
        Scoreline::parse(&self.prediction).map(Scoreline::outcome)
    }
}

fn baseline_scoreline(delta: i32) -> Scoreline {
    let (lead, trail) = match delta.abs() {
        d if d >= 35 => (3, 0),
        d if d >= 20 => (2, 0),
        d if d >= 10 => (2, 1),
        _ => (1, 1),
    };
    if delta >= 0 {
        Scoreline::new(lead, trail)
    } else {
        Scoreline::new(trail, lead)
    }
}

/// Tunable thresholds for the blow-out damping heuristic. Defaults reproduce
/// the calibrated behavior; they are parameters because the general formula
/// is extrapolated from a handful of known cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickFixParams {
    /// Home-goal count from which a to-nil prediction reads as a blow-out.
    pub blowout_margin: u8,
    /// Power gap wide enough to keep a two-goal cushion after damping.
    pub dominant_power_diff: i32,
    /// Combined injury count that outweighs a poor-form concession.
    pub heavy_injury_count: u32,
}

impl Default for QuickFixParams {
    fn default() -> Self {
        Self {
            blowout_margin: 3,
            dominant_power_diff: 50,
            heavy_injury_count: 6,
        }
    }
}

/// Dampens statistically over-confident home blow-out predictions. Anything
/// that is not a mitigated blow-out passes through unchanged.
pub fn adjust_quick_fix(
    base_score: &str,
    power_diff: i32,
    total_injuries: u32,
    home_form: FormLabel,
) -> Result<String, ValidationError> {
    adjust_quick_fix_with(
        QuickFixParams::default(),
        base_score,
        power_diff,
        total_injuries,
        home_form,
    )
}

pub fn adjust_quick_fix_with(
    params: QuickFixParams,
    base_score: &str,
    power_diff: i32,
    total_injuries: u32,
    home_form: FormLabel,
) -> Result<String, ValidationError> {
    let base = Scoreline::parse(base_score)?;

    let is_blowout = base.home >= params.blowout_margin && base.away == 0;
    let mitigated = total_injuries > 0 || home_form != FormLabel::Good;
    if !is_blowout || !mitigated {
        return Ok(base.capped(MAX_SCORELINE_GOALS).to_string());
    }

    let adjusted = if power_diff >= params.dominant_power_diff {
        // The gap still supports a win, just not a rout. A side on a poor
        // run tends to concede; a heavily depleted opponent does not punish.
        if home_form == FormLabel::Poor && total_injuries < params.heavy_injury_count {
            Scoreline::new(base.home - 1, 1)
        } else {
            Scoreline::new(base.home - 1, 0)
        }
    } else {
        // The gap alone never justified a blow-out.
        Scoreline::new(1, 0)
    };

    debug!(
        base = %base,
        adjusted = %adjusted,
        power_diff,
        total_injuries,
        "blow-out prediction damped"
    );
    Ok(adjusted.capped(MAX_SCORELINE_GOALS).to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPrediction {
    pub score: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// Blends the oracle baseline with qualitative factors and (optionally) the
/// simulator's view. With neither input present this is a pure passthrough.
pub fn calculate_adjusted_prediction(
    base: &OracleAnalysis,
    factors: &[ContextFactor],
    sim: Option<&OutcomeDistribution>,
) -> Result<AdjustedPrediction, ValidationError> {
    let baseline = Scoreline::parse(&base.prediction)?;
    let mut score = baseline;
    let mut confidence = base.confidence;
    let mut notes: Vec<String> = vec![base.reasoning.clone()];

    let injury_count = factors
        .iter()
        .filter(|f| f.kind == FactorKind::Injuries)
        .count();
    if injury_count > 0 {
        score = strip_goals_from_favorite(score, injury_count as u8);
        confidence -= INJURY_CONFIDENCE_PENALTY * injury_count as f64;
        notes.push(format!("{injury_count} injury factor(s) applied"));
    }

    if let Some(sim) = sim {
        let simulated = Scoreline::parse(&sim.most_likely_score)?;
        if simulated.outcome() != baseline.outcome() {
            confidence -= DISAGREEMENT_PENALTY;
            notes.push(format!(
                "simulation disagrees: most likely {} ({})",
                simulated,
                simulated.outcome().label(),
            ));
        }
    }

    for factor in factors
        .iter()
        .filter(|f| matches!(f.kind, FactorKind::Morale | FactorKind::Motivation))
    {
        if factor.score >= POSITIVE_SCORE_FLOOR {
            let lift = (factor.score - POSITIVE_SCORE_FLOOR + 1.0)
                * factor.weight
                * MORALE_CONFIDENCE_STEP;
            confidence += lift;
            notes.push(format!("{} lifts confidence {lift:+.1}", factor.kind.label()));
        } else if factor.score <= NEGATIVE_SCORE_CEILING {
            let drop = (NEGATIVE_SCORE_CEILING - factor.score + 1.0)
                * factor.weight
                * MORALE_CONFIDENCE_STEP;
            confidence -= drop;
            notes.push(format!("{} cuts confidence -{drop:.1}", factor.kind.label()));
        }
    }

    Ok(AdjustedPrediction {
        score: score.capped(MAX_SCORELINE_GOALS).to_string(),
        confidence: confidence.clamp(0.0, 100.0),
        reasoning: notes.join("; "),
    })
}

// Injuries take goals off the predicted winner; for a drawn baseline the
// home side absorbs the cut.
fn strip_goals_from_favorite(score: Scoreline, injuries: u8) -> Scoreline {
    let cut = injuries.min(2);
    match score.outcome() {
        Outcome::Home | Outcome::Draw => Scoreline::new(score.home.saturating_sub(cut), score.away),
        Outcome::Away => Scoreline::new(score.home, score.away.saturating_sub(cut)),
    }
}
