//! Trade signals — immutable entry/stop/target intents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;
use crate::session::Session;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short. Multiplies distances into price space.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directional signal with fixed risk levels.
///
/// Built only through [`Signal::new`], which guarantees `risk > 0` and a target
/// placed `risk * target_rr` beyond the entry in the trade direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub risk: f64,
    pub time: DateTime<Utc>,
    pub session: Session,
    /// ATR at the bar that produced the signal.
    pub atr: f64,
    /// Bar index the signal fired on.
    pub bar_index: usize,
}

impl Signal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        entry: f64,
        stop: f64,
        target_rr: f64,
        time: DateTime<Utc>,
        session: Session,
        atr: f64,
        bar_index: usize,
    ) -> Result<Self, EngineError> {
        let risk = (entry - stop).abs();
        if !(risk > 0.0) || !risk.is_finite() {
            return Err(EngineError::DegenerateSignal { entry, stop });
        }
        Ok(Self {
            direction,
            entry,
            stop,
            target: entry + direction.sign() * risk * target_rr,
            risk,
            time,
            session,
            atr,
            bar_index,
        })
    }

    /// Price at which the favorable excursion equals `rr` risk units.
    pub fn level_at_rr(&self, rr: f64) -> f64 {
        self.entry + self.direction.sign() * self.risk * rr
    }
}
