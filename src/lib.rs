//! Match-outcome simulation and decision arbitration.
//!
//! The pipeline runs power ratings through a Monte Carlo goal simulator
//! (`tesseract`), optionally refines team goals with per-player scoring
//! events (`scorers`), dampens implausible headline predictions (`oracle`),
//! arbitrates the signals into one scenario (`mastermind`) and finally folds
//! in weighted qualitative context (`context`). Every step is a pure
//! function over its inputs; callers own the random generator.

pub mod context;
pub mod error;
pub mod mastermind;
pub mod oracle;
pub mod power;
pub mod score;
pub mod scorers;
pub mod tesseract;

pub use context::{ContextFactor, EnhancerParams, FactorKind, OutlierScenario, RiskLevel, enhance};
pub use error::{SimulateError, ValidationError};
pub use mastermind::{
    MastermindSignal, MastermindThresholds, ScenarioType, SignalColor, analyze,
};
pub use oracle::{
    AdjustedPrediction, ContextBundle, FormLabel, OracleAnalysis, QuickFixParams,
    adjust_quick_fix, calculate_adjusted_prediction,
};
pub use power::SimulationContext;
pub use score::{Outcome, Scoreline};
pub use scorers::{EnhancedResult, PlayerScoringProbability, run_enhanced};
pub use tesseract::{DEFAULT_TRIALS, FixtureRequest, OutcomeDistribution, simulate};
