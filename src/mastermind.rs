use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ValidationError;
use crate::oracle::OracleAnalysis;
use crate::power::SimulationContext;
use crate::score::Outcome;
use crate::tesseract::OutcomeDistribution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioType {
    Banker,
    HighRisk,
    GoalsFestival,
    TacticalDuel,
    DefensiveBattle,
    ValueBet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

/// The final arbitrated recommendation for one fixture. Built fresh per
/// request; the context enhancer transforms it into a new signal rather
/// than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MastermindSignal {
    pub title: String,
    pub description: String,
    pub color: SignalColor,
    pub confidence: f64,
    pub recommendation: String,
    pub scenario_type: ScenarioType,
}

/// Decision-tree thresholds, injected rather than hard-coded so tuning does
/// not mean recompiling the branch logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MastermindThresholds {
    pub banker_confidence: f64,
    pub low_confidence: f64,
    pub fatigue_limit: f64,
    pub lineup_floor: f64,
    pub festival_over: f64,
    pub festival_btts: f64,
    pub duel_power_band: i32,
    pub duel_confidence_low: f64,
    pub duel_confidence_high: f64,
    pub battle_under: f64,
    pub battle_btts: f64,
    pub value_pick: f64,
    pub solo_banker_confidence: f64,
    pub high_risk_confidence: f64,
    pub festival_confidence: f64,
    pub duel_confidence: f64,
    pub battle_confidence: f64,
}

impl Default for MastermindThresholds {
    fn default() -> Self {
        Self {
            banker_confidence: 70.0,
            low_confidence: 50.0,
            fatigue_limit: 80.0,
            lineup_floor: 70.0,
            festival_over: 0.65,
            festival_btts: 0.60,
            duel_power_band: 20,
            duel_confidence_low: 50.0,
            duel_confidence_high: 70.0,
            battle_under: 0.70,
            battle_btts: 0.40,
            value_pick: 0.5,
            solo_banker_confidence: 75.0,
            high_risk_confidence: 60.0,
            festival_confidence: 75.0,
            duel_confidence: 65.0,
            battle_confidence: 70.0,
        }
    }
}

/// Classifies a fixture into one narrative scenario. The predicates are
/// evaluated in priority order and the first match wins; they are not
/// mutually exclusive.
pub fn analyze(
    oracle: &OracleAnalysis,
    sim: Option<&OutcomeDistribution>,
) -> Result<MastermindSignal, ValidationError> {
    analyze_with(&MastermindThresholds::default(), oracle, sim)
}

pub fn analyze_with(
    t: &MastermindThresholds,
    oracle: &OracleAnalysis,
    sim: Option<&OutcomeDistribution>,
) -> Result<MastermindSignal, ValidationError> {
    let signal = match sim {
        Some(sim) => analyze_against_simulation(t, oracle, sim)?,
        None => analyze_oracle_only(t, oracle),
    };
    info!(
        scenario = ?signal.scenario_type,
        color = ?signal.color,
        confidence = signal.confidence,
        "arbitration complete"
    );
    Ok(signal)
}

fn analyze_oracle_only(t: &MastermindThresholds, oracle: &OracleAnalysis) -> MastermindSignal {
    let base = format!(
        "oracle {} at {:.0}% confidence, power delta {:+}, no simulation available",
        oracle.prediction, oracle.confidence, oracle.power_delta,
    );
    if oracle.confidence >= t.solo_banker_confidence {
        MastermindSignal {
            title: "Certainty call".to_string(),
            description: base,
            color: SignalColor::Green,
            confidence: oracle.confidence,
            recommendation: format!("back {}", oracle.prediction),
            scenario_type: ScenarioType::Banker,
        }
    } else if oracle.confidence >= t.low_confidence {
        MastermindSignal {
            title: "Moderate call".to_string(),
            description: base,
            color: SignalColor::Yellow,
            confidence: oracle.confidence,
            recommendation: "stake lightly".to_string(),
            scenario_type: ScenarioType::TacticalDuel,
        }
    } else {
        MastermindSignal {
            title: "Low certainty".to_string(),
            description: base,
            color: SignalColor::Red,
            confidence: oracle.confidence,
            recommendation: "avoid".to_string(),
            scenario_type: ScenarioType::HighRisk,
        }
    }
}

fn analyze_against_simulation(
    t: &MastermindThresholds,
    oracle: &OracleAnalysis,
    sim: &OutcomeDistribution,
) -> Result<MastermindSignal, ValidationError> {
    let implied = oracle.implied_outcome()?;
    let favored = sim.favored_outcome();
    let agree = implied == favored;
    let predicts_win = implied != Outcome::Draw;

    let ctx = oracle.simulation_context.as_ref();
    // Missing context reads as acceptable, not as a failure.
    let fatigue_ok = ctx.is_none_or(|c| c.fatigue_score <= t.fatigue_limit);
    let lineup_ok = ctx.is_none_or(|c| c.lineup_strength >= t.lineup_floor);

    let probs = probability_readout(sim);
    let trinity = trinity_readout(ctx);

    if oracle.confidence >= t.banker_confidence && agree && fatigue_ok && lineup_ok {
        let confidence = (oracle.confidence + sim.favored_probability() * 100.0) / 2.0;
        return Ok(MastermindSignal {
            title: "Banker".to_string(),
            description: format!(
                "oracle {} ({:.0}%) and simulation both favor {} | {probs} | {trinity}",
                oracle.prediction,
                oracle.confidence,
                favored.label(),
            ),
            color: SignalColor::Green,
            confidence,
            recommendation: format!("back {}", favored.label()),
            scenario_type: ScenarioType::Banker,
        });
    }

    let trinity_risk = (!lineup_ok || !fatigue_ok) && predicts_win;
    if !agree || oracle.confidence < t.low_confidence || trinity_risk {
        let cause = if !agree {
            format!(
                "oracle says {} but simulation favors {}",
                implied.label(),
                favored.label(),
            )
        } else if oracle.confidence < t.low_confidence {
            format!("oracle confidence only {:.0}%", oracle.confidence)
        } else if !lineup_ok {
            "weakened lineup undercuts the predicted win".to_string()
        } else {
            "heavy fatigue undercuts the predicted win".to_string()
        };
        return Ok(MastermindSignal {
            title: "High risk".to_string(),
            description: format!("{cause} | {probs} | {trinity}"),
            color: SignalColor::Yellow,
            confidence: t.high_risk_confidence,
            recommendation: "reduce stake or skip".to_string(),
            scenario_type: ScenarioType::HighRisk,
        });
    }

    if sim.over_2_5_probability > t.festival_over && sim.btts_probability > t.festival_btts {
        return Ok(MastermindSignal {
            title: "Goals festival".to_string(),
            description: format!(
                "over 2.5 at {:.0}%, both teams scoring at {:.0}% | {probs}",
                sim.over_2_5_probability * 100.0,
                sim.btts_probability * 100.0,
            ),
            color: SignalColor::Green,
            confidence: t.festival_confidence,
            recommendation: "back over 2.5 goals / BTTS".to_string(),
            scenario_type: ScenarioType::GoalsFestival,
        });
    }

    if oracle.power_delta.abs() <= t.duel_power_band
        && oracle.confidence >= t.duel_confidence_low
        && oracle.confidence <= t.duel_confidence_high
    {
        return Ok(MastermindSignal {
            title: "Tactical duel".to_string(),
            description: format!(
                "power delta {:+} inside the even band, oracle at {:.0}% | {probs} | {trinity}",
                oracle.power_delta, oracle.confidence,
            ),
            color: SignalColor::Yellow,
            confidence: t.duel_confidence,
            recommendation: "consider the draw or double chance".to_string(),
            scenario_type: ScenarioType::TacticalDuel,
        });
    }

    if sim.under_2_5_probability() > t.battle_under && sim.btts_probability < t.battle_btts {
        return Ok(MastermindSignal {
            title: "Defensive battle".to_string(),
            description: format!(
                "under 2.5 at {:.0}%, both teams scoring only {:.0}% | {probs}",
                sim.under_2_5_probability() * 100.0,
                sim.btts_probability * 100.0,
            ),
            color: SignalColor::Yellow,
            confidence: t.battle_confidence,
            recommendation: "back under 2.5 goals".to_string(),
            scenario_type: ScenarioType::DefensiveBattle,
        });
    }

    let recommendation = if sim.favored_probability() > t.value_pick {
        format!(
            "value on {} at {:.0}%",
            favored.label(),
            sim.favored_probability() * 100.0,
        )
    } else {
        format!("no side clears {:.0}%, price the spread: {probs}", t.value_pick * 100.0)
    };
    Ok(MastermindSignal {
        title: "Value bet".to_string(),
        description: format!("most likely score {} | {probs} | {trinity}", sim.most_likely_score),
        color: SignalColor::Green,
        confidence: oracle.confidence,
        recommendation,
        scenario_type: ScenarioType::ValueBet,
    })
}

fn probability_readout(sim: &OutcomeDistribution) -> String {
    format!(
        "H {:.0}% / D {:.0}% / A {:.0}%",
        sim.home_win_probability * 100.0,
        sim.draw_probability * 100.0,
        sim.away_win_probability * 100.0,
    )
}

fn trinity_readout(ctx: Option<&SimulationContext>) -> String {
    match ctx {
        Some(c) => format!(
            "trinity: fatigue {:.0}, lineup {:.0}, style {:.2}, fitness {:.0}/{:.0}, distraction {:.0}/{:.0}",
            c.fatigue_score,
            c.lineup_strength,
            c.style_matchup,
            c.home_fitness,
            c.away_fitness,
            c.home_distraction,
            c.away_distraction,
        ),
        None => "trinity: no contextual metrics".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(home: f64, draw: f64, away: f64) -> OutcomeDistribution {
        OutcomeDistribution {
            home_win_probability: home,
            draw_probability: draw,
            away_win_probability: away,
            btts_probability: 0.50,
            over_2_5_probability: 0.50,
            most_likely_score: "1-1".to_string(),
            top_score_distribution: vec![("1-1".to_string(), 1_000)],
            simulation_count: 10_000,
        }
    }

    fn oracle(prediction: &str, confidence: f64, delta: i32) -> OracleAnalysis {
        OracleAnalysis {
            prediction: prediction.to_string(),
            confidence,
            reasoning: "test".to_string(),
            home_power_score: 60 + delta / 2,
            away_power_score: 60 - delta / 2,
            power_delta: delta,
            tesseract: None,
            simulation_context: None,
            enhancement: None,
        }
    }

    #[test]
    fn agreement_with_confidence_is_a_banker() {
        let signal = analyze(&oracle("2-0", 80.0, 30), Some(&sim(0.70, 0.20, 0.10))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::Banker);
        assert_eq!(signal.color, SignalColor::Green);
        assert_eq!(signal.confidence, 75.0);
    }

    #[test]
    fn disagreement_is_high_risk_regardless_of_confidence() {
        let signal = analyze(&oracle("2-0", 92.0, 30), Some(&sim(0.15, 0.25, 0.60))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::HighRisk);
        assert_eq!(signal.color, SignalColor::Yellow);
        assert_eq!(signal.confidence, 60.0);
    }

    #[test]
    fn weak_lineup_undercuts_a_predicted_win() {
        let mut o = oracle("2-0", 80.0, 30);
        o.simulation_context = Some(SimulationContext {
            lineup_strength: 55.0,
            ..SimulationContext::neutral()
        });
        let signal = analyze(&o, Some(&sim(0.70, 0.20, 0.10))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::HighRisk);
        assert!(signal.description.contains("lineup"));
    }

    #[test]
    fn heavy_fatigue_undercuts_a_predicted_win() {
        let mut o = oracle("2-0", 80.0, 30);
        o.simulation_context = Some(SimulationContext {
            fatigue_score: 90.0,
            ..SimulationContext::neutral()
        });
        let signal = analyze(&o, Some(&sim(0.70, 0.20, 0.10))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::HighRisk);
    }

    #[test]
    fn open_game_is_a_goals_festival() {
        let mut s = sim(0.48, 0.27, 0.25);
        s.over_2_5_probability = 0.70;
        s.btts_probability = 0.65;
        let signal = analyze(&oracle("2-1", 60.0, 25), Some(&s)).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::GoalsFestival);
        assert_eq!(signal.color, SignalColor::Green);
        assert_eq!(signal.confidence, 75.0);
    }

    #[test]
    fn even_sides_make_a_tactical_duel() {
        let signal = analyze(&oracle("1-0", 60.0, 10), Some(&sim(0.45, 0.30, 0.25))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::TacticalDuel);
        assert_eq!(signal.color, SignalColor::Yellow);
        assert_eq!(signal.confidence, 65.0);
    }

    #[test]
    fn closed_game_is_a_defensive_battle() {
        let mut s = sim(0.50, 0.30, 0.20);
        s.over_2_5_probability = 0.20;
        s.btts_probability = 0.30;
        let signal = analyze(&oracle("1-0", 65.0, 30), Some(&s)).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::DefensiveBattle);
        assert_eq!(signal.confidence, 70.0);
    }

    #[test]
    fn fallthrough_is_a_value_bet() {
        let signal = analyze(&oracle("2-1", 65.0, 30), Some(&sim(0.55, 0.25, 0.20))).unwrap();
        assert_eq!(signal.scenario_type, ScenarioType::ValueBet);
        assert_eq!(signal.color, SignalColor::Green);
        assert_eq!(signal.confidence, 65.0);
        assert!(signal.recommendation.contains("home win"));
    }

    #[test]
    fn oracle_only_ladder() {
        let high = analyze(&oracle("2-0", 80.0, 30), None).unwrap();
        assert_eq!(high.scenario_type, ScenarioType::Banker);
        assert_eq!(high.color, SignalColor::Green);

        let mid = analyze(&oracle("1-0", 60.0, 10), None).unwrap();
        assert_eq!(mid.scenario_type, ScenarioType::TacticalDuel);
        assert_eq!(mid.color, SignalColor::Yellow);

        let low = analyze(&oracle("1-1", 40.0, 0), None).unwrap();
        assert_eq!(low.scenario_type, ScenarioType::HighRisk);
        assert_eq!(low.color, SignalColor::Red);
    }

    #[test]
    fn malformed_prediction_is_rejected() {
        let signal = analyze(&oracle("two-nil", 80.0, 30), Some(&sim(0.70, 0.20, 0.10)));
        assert!(signal.is_err());
    }

    #[test]
    fn thresholds_are_injectable() {
        let t = MastermindThresholds {
            banker_confidence: 95.0,
            ..MastermindThresholds::default()
        };
        let signal = analyze_with(&t, &oracle("2-0", 80.0, 30), Some(&sim(0.70, 0.20, 0.10))).unwrap();
        // 80% no longer clears the raised banker bar; agreement holds, so the
        // tree falls through to the later branches.
        assert_ne!(signal.scenario_type, ScenarioType::Banker);
    }
}
