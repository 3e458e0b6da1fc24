use thiserror::Error;

/// Input rejection: the request never reaches the simulation loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{side} power score {value} is outside 0-100")]
    PowerOutOfRange { side: &'static str, value: i32 },
    #[error("trial count must be positive")]
    InvalidTrialCount,
    #[error("malformed scoreline {0:?}, expected \"h-a\"")]
    MalformedScore(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The caller abandoned the request. No partial distribution is produced.
    #[error("simulation cancelled before completion")]
    Cancelled,
}
