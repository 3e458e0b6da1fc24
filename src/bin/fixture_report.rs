use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use matchmind::{
    ContextFactor, DEFAULT_TRIALS, FactorKind, OracleAnalysis, OutlierScenario,
    PlayerScoringProbability, RiskLevel, SimulationContext, analyze,
    calculate_adjusted_prediction, enhance, run_enhanced, simulate,
};

// Runs the whole pipeline on one hard-coded fixture and prints the result as
// JSON. Handy for eyeballing signal output while tuning thresholds.
fn main() -> Result<()> {
    let home_power = 82;
    let away_power = 55;

    let context = SimulationContext {
        fatigue_score: 35.0,
        lineup_strength: 88.0,
        style_matchup: 1.05,
        home_distraction: 10.0,
        away_distraction: 25.0,
        home_fitness: 92.0,
        away_fitness: 78.0,
        reasoning: Some("midweek cup run for the visitors".to_string()),
    };

    let mut rng = StdRng::from_entropy();
    let distribution = simulate(home_power, away_power, &context, DEFAULT_TRIALS, &mut rng)?;

    let mut oracle = OracleAnalysis::from_power_scores(home_power, away_power)?;
    oracle.simulation_context = Some(context);
    oracle.tesseract = Some(distribution.clone());

    let home_scorers = vec![
        PlayerScoringProbability {
            player: "N. Okafor".to_string(),
            base_probability: 62.0,
            adjusted_probability: 74.0,
            is_playing: true,
        },
        PlayerScoringProbability {
            player: "J. Brandt".to_string(),
            base_probability: 41.0,
            adjusted_probability: 38.0,
            is_playing: true,
        },
    ];
    let away_scorers = vec![PlayerScoringProbability {
        player: "R. Kolo".to_string(),
        base_probability: 33.0,
        adjusted_probability: 29.0,
        is_playing: true,
    }];
    let enhanced = run_enhanced(&oracle, &home_scorers, &away_scorers, DEFAULT_TRIALS, &mut rng)?;

    let factors = vec![ContextFactor {
        kind: FactorKind::Injuries,
        score: 6.0,
        weight: 1.2,
        description: "away side missing both first-choice centre-backs".to_string(),
    }];
    let outliers = vec![OutlierScenario {
        description: "home keeper carrying a knock from training".to_string(),
        probability: 25.0,
        risk_level: RiskLevel::Medium,
        supporting_factors: vec!["reduced sessions this week".to_string()],
    }];

    let adjusted = calculate_adjusted_prediction(&oracle, &factors, Some(&distribution))?;
    let signal = analyze(&oracle, Some(&distribution))?;
    let final_signal = enhance(&signal, &factors, &outliers);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "oracle": oracle,
            "distribution": distribution,
            "enhanced": enhanced,
            "adjusted_prediction": adjusted,
            "signal": final_signal,
        }))?
    );
    Ok(())
}
