use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mastermind::{MastermindSignal, ScenarioType, SignalColor};

/// Factor scores at or above this read as a positive signal for kinds that
/// can cut both ways (morale, tactics).
pub const POSITIVE_SCORE_FLOOR: f64 = 8.0;
/// Factor scores at or below this read as a negative signal.
pub const NEGATIVE_SCORE_CEILING: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorKind {
    Injuries,
    Weather,
    Tactical,
    Morale,
    Motivation,
}

impl FactorKind {
    pub fn label(self) -> &'static str {
        match self {
            FactorKind::Injuries => "injuries",
            FactorKind::Weather => "weather",
            FactorKind::Tactical => "tactical change",
            FactorKind::Morale => "morale",
            FactorKind::Motivation => "motivation",
        }
    }
}

/// A weighted qualitative input. `score` is impact magnitude on a 0-10 scale,
/// `weight` a 0.5-2.0 multiplier for how much the source is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFactor {
    pub kind: FactorKind,
    pub score: f64,
    pub weight: f64,
    pub description: String,
}

impl ContextFactor {
    pub fn impact(&self) -> f64 {
        self.score * self.weight
    }

    /// -1 for factors that argue against the current signal, +1 for ones
    /// that back it, 0 for noise. Injuries and bad weather only ever hurt;
    /// morale-like kinds swing on their score.
    pub fn direction(&self) -> f64 {
        match self.kind {
            FactorKind::Injuries | FactorKind::Weather => -1.0,
            FactorKind::Tactical | FactorKind::Morale | FactorKind::Motivation => {
                if self.score >= POSITIVE_SCORE_FLOOR {
                    1.0
                } else if self.score <= NEGATIVE_SCORE_CEILING {
                    -1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

/// A low-probability, high-impact narrative candidate that can override the
/// arbitrated signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierScenario {
    pub description: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub supporting_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancerParams {
    /// Outlier probability (0-100) above which a HIGH-risk outlier takes over
    /// the signal.
    pub outlier_probability_floor: f64,
    /// Confidence points added per unit of signed factor impact.
    pub confidence_step: f64,
    /// `score * weight` at or above this counts as a high-impact factor.
    pub high_impact_floor: f64,
    /// Character budget for a recommendation built from an outlier
    /// description.
    pub recommendation_limit: usize,
}

impl Default for EnhancerParams {
    fn default() -> Self {
        Self {
            outlier_probability_floor: 60.0,
            confidence_step: 1.0,
            high_impact_floor: 8.0,
            recommendation_limit: 120,
        }
    }
}

/// Post-processes an arbitrated signal with weighted qualitative context.
/// With no factors and no outliers this is a no-op.
pub fn enhance(
    signal: &MastermindSignal,
    factors: &[ContextFactor],
    outliers: &[OutlierScenario],
) -> MastermindSignal {
    enhance_with(EnhancerParams::default(), signal, factors, outliers)
}

pub fn enhance_with(
    params: EnhancerParams,
    signal: &MastermindSignal,
    factors: &[ContextFactor],
    outliers: &[OutlierScenario],
) -> MastermindSignal {
    if factors.is_empty() && outliers.is_empty() {
        return signal.clone();
    }

    let raw_delta: f64 = factors
        .iter()
        .map(|f| f.direction() * f.impact() * params.confidence_step)
        .sum();
    let confidence = (signal.confidence + raw_delta).clamp(0.0, 100.0);
    let applied_delta = confidence - signal.confidence;

    let top_outlier = outliers
        .iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability));
    let override_outlier = top_outlier.filter(|o| {
        o.probability > params.outlier_probability_floor && o.risk_level >= RiskLevel::High
    });

    let negative = factors.iter().filter(|f| f.direction() < 0.0).count();
    let escalate = negative * 2 > factors.len();

    let (scenario_type, color, title, recommendation) = match override_outlier {
        Some(outlier) => (
            ScenarioType::HighRisk,
            SignalColor::Red,
            format!("⚠ {}", signal.title),
            truncated(&outlier.description, params.recommendation_limit),
        ),
        None => {
            let scenario = if escalate {
                escalated(signal.scenario_type)
            } else {
                signal.scenario_type
            };
            let color = blended_color(signal.color, aggregate_risk(factors));
            (
                scenario,
                color,
                signal.title.clone(),
                signal.recommendation.clone(),
            )
        }
    };

    let mut description = signal.description.clone();
    if let Some(dominant) = factors.iter().max_by(|a, b| a.impact().total_cmp(&b.impact())) {
        description.push_str(&format!(
            " | dominant factor: {} (impact {:.1}) - {}",
            dominant.kind.label(),
            dominant.impact(),
            dominant.description,
        ));
    }
    let high_impact = factors
        .iter()
        .filter(|f| f.impact() >= params.high_impact_floor)
        .count();
    description.push_str(&format!(" | high-impact factors: {high_impact}"));
    match (override_outlier, top_outlier) {
        (Some(outlier), _) => description.push_str(&format!(
            " | OVERRIDE: {} ({:.0}% probability, {} risk)",
            outlier.description,
            outlier.probability,
            outlier.risk_level.label(),
        )),
        (None, Some(outlier)) => description.push_str(&format!(
            " | top outlier: {} ({:.0}%, {} risk)",
            outlier.description,
            outlier.probability,
            outlier.risk_level.label(),
        )),
        (None, None) => description.push_str(" | no outlier scenarios"),
    }
    description.push_str(&format!(" | confidence delta {applied_delta:+.1}"));

    debug!(
        scenario = ?scenario_type,
        confidence,
        delta = applied_delta,
        overridden = override_outlier.is_some(),
        "context enhancement applied"
    );

    MastermindSignal {
        title,
        description,
        color,
        confidence,
        recommendation,
        scenario_type,
    }
}

fn escalated(scenario: ScenarioType) -> ScenarioType {
    match scenario {
        ScenarioType::Banker => ScenarioType::TacticalDuel,
        ScenarioType::TacticalDuel => ScenarioType::HighRisk,
        other => other,
    }
}

fn aggregate_risk(factors: &[ContextFactor]) -> Option<RiskLevel> {
    if factors.is_empty() {
        return None;
    }
    let avg = factors.iter().map(ContextFactor::impact).sum::<f64>() / factors.len() as f64;
    Some(if avg >= 12.0 {
        RiskLevel::VeryHigh
    } else if avg >= 8.0 {
        RiskLevel::High
    } else if avg >= 4.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    })
}

fn blended_color(current: SignalColor, risk: Option<RiskLevel>) -> SignalColor {
    match risk {
        None => current,
        Some(RiskLevel::VeryHigh | RiskLevel::High) => SignalColor::Red,
        Some(RiskLevel::Medium) => SignalColor::Yellow,
        // A calm factor set may soften an existing red flag, nothing more.
        Some(RiskLevel::Low) => {
            if current == SignalColor::Red {
                SignalColor::Yellow
            } else {
                current
            }
        }
    }
}

fn truncated(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(limit).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_signal() -> MastermindSignal {
        MastermindSignal {
            title: "Banker call".to_string(),
            description: "H 70% / D 20% / A 10%".to_string(),
            color: SignalColor::Green,
            confidence: 75.0,
            recommendation: "back home win".to_string(),
            scenario_type: ScenarioType::Banker,
        }
    }

    fn factor(kind: FactorKind, score: f64, weight: f64) -> ContextFactor {
        ContextFactor {
            kind,
            score,
            weight,
            description: format!("{} note", kind.label()),
        }
    }

    #[test]
    fn empty_payload_is_a_no_op() {
        let signal = base_signal();
        assert_eq!(enhance(&signal, &[], &[]), signal);
    }

    #[test]
    fn high_probability_high_risk_outlier_overrides() {
        let outlier = OutlierScenario {
            description: "star striker doubtful after late fitness test".to_string(),
            probability: 72.0,
            risk_level: RiskLevel::High,
            supporting_factors: vec!["training absence".to_string()],
        };
        let out = enhance(&base_signal(), &[], &[outlier]);
        assert_eq!(out.scenario_type, ScenarioType::HighRisk);
        assert_eq!(out.color, SignalColor::Red);
        assert!(out.title.starts_with('⚠'));
        assert!(out.recommendation.contains("star striker"));
        assert!(out.description.contains("OVERRIDE"));
    }

    #[test]
    fn low_probability_outlier_does_not_override() {
        let outlier = OutlierScenario {
            description: "freak storm".to_string(),
            probability: 20.0,
            risk_level: RiskLevel::VeryHigh,
            supporting_factors: Vec::new(),
        };
        let out = enhance(&base_signal(), &[], &[outlier]);
        assert_eq!(out.scenario_type, ScenarioType::Banker);
        assert!(out.description.contains("top outlier"));
    }

    #[test]
    fn majority_negative_factors_escalate_one_step() {
        let factors = vec![
            factor(FactorKind::Injuries, 6.0, 1.0),
            factor(FactorKind::Weather, 5.0, 1.0),
            factor(FactorKind::Morale, 9.0, 1.0),
        ];
        let out = enhance(&base_signal(), &factors, &[]);
        assert_eq!(out.scenario_type, ScenarioType::TacticalDuel);

        let duel = MastermindSignal {
            scenario_type: ScenarioType::TacticalDuel,
            ..base_signal()
        };
        let out = enhance(&duel, &factors, &[]);
        assert_eq!(out.scenario_type, ScenarioType::HighRisk);
    }

    #[test]
    fn positive_factors_raise_confidence_and_negative_lower_it() {
        let signal = base_signal();
        let up = enhance(&signal, &[factor(FactorKind::Morale, 9.0, 1.0)], &[]);
        let down = enhance(&signal, &[factor(FactorKind::Injuries, 9.0, 1.0)], &[]);
        assert!(up.confidence > signal.confidence);
        assert!(down.confidence < signal.confidence);
    }

    #[test]
    fn confidence_stays_clamped() {
        let signal = MastermindSignal {
            confidence: 95.0,
            ..base_signal()
        };
        let out = enhance(&signal, &[factor(FactorKind::Morale, 10.0, 2.0)], &[]);
        assert!(out.confidence <= 100.0);
        assert!(out.description.contains("confidence delta +5.0"));
    }

    #[test]
    fn calm_factors_soften_red_to_yellow_only() {
        let red = MastermindSignal {
            color: SignalColor::Red,
            ..base_signal()
        };
        let calm = vec![factor(FactorKind::Morale, 5.0, 0.5)];
        assert_eq!(enhance(&red, &calm, &[]).color, SignalColor::Yellow);

        let green = base_signal();
        assert_eq!(enhance(&green, &calm, &[]).color, SignalColor::Green);
    }

    #[test]
    fn heavy_factor_set_turns_red() {
        let heavy = vec![
            factor(FactorKind::Injuries, 9.0, 1.5),
            factor(FactorKind::Weather, 8.0, 1.2),
        ];
        let out = enhance(&base_signal(), &heavy, &[]);
        assert_eq!(out.color, SignalColor::Red);
    }
}
