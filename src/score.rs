use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Home => "home win",
            Outcome::Draw => "draw",
            Outcome::Away => "away win",
        }
    }
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

/// A concrete scoreline, serialized as `"h-a"` everywhere it crosses the
/// crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home: u8,
    pub away: u8,
}

impl Scoreline {
    pub fn new(home: u8, away: u8) -> Self {
        Self { home, away }
    }

    /// Accepts only `\d+-\d+`. Anything else is a validation failure, not a
    /// best-effort guess.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedScore(raw.to_string());
        let trimmed = raw.trim();
        let (h, a) = trimmed.split_once('-').ok_or_else(malformed)?;
        if h.is_empty()
            || a.is_empty()
            || !h.chars().all(|c| c.is_ascii_digit())
            || !a.chars().all(|c| c.is_ascii_digit())
        {
            return Err(malformed());
        }
        let home = h.parse::<u8>().map_err(|_| malformed())?;
        let away = a.parse::<u8>().map_err(|_| malformed())?;
        Ok(Self { home, away })
    }

    pub fn outcome(self) -> Outcome {
        classify_outcome(u32::from(self.home), u32::from(self.away))
    }

    pub fn margin(self) -> i32 {
        i32::from(self.home) - i32::from(self.away)
    }

    /// Caps both sides at `max` goals. Extreme predictions are re-serialized
    /// through this before leaving the crate.
    pub fn capped(self, max: u8) -> Self {
        Self {
            home: self.home.min(max),
            away: self.away.min(max),
        }
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}
