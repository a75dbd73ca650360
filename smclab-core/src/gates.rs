//! Candidate qualification pipeline.
//!
//! A bar becomes a displacement candidate only after passing every gate in
//! [`GATES`], in order. The first failing gate names the rejection, so callers
//! can tally why bars were skipped instead of seeing a bare "no gap".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Bar, FairValueGap, GapKind};
use crate::features::FeatureSet;
use crate::params::StrategyParams;

/// Why a bar did not produce a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// Fewer than two prior bars to compare against.
    InsufficientHistory,
    /// Bar opened outside every killzone.
    OutsideSession,
    /// Trend or ATR still in warm-up.
    FeaturesUndefined,
    /// Body did not exceed `momentum_multiplier * atr`.
    WeakMomentum,
    /// Trend-aligned wicks overlap (or close sits on the trend).
    NoDisplacement,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::OutsideSession => "outside_session",
            Self::FeaturesUndefined => "features_undefined",
            Self::WeakMomentum => "weak_momentum",
            Self::NoDisplacement => "no_displacement",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bar under evaluation plus everything the gates may read.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub bars: &'a [Bar],
    pub features: &'a FeatureSet,
    pub index: usize,
    pub params: &'a StrategyParams,
}

impl Candidate<'_> {
    fn bar(&self) -> &Bar {
        &self.bars[self.index]
    }
}

/// A named predicate in the qualification pipeline.
pub struct Gate {
    pub name: &'static str,
    pub check: fn(&Candidate<'_>) -> Result<(), Rejection>,
}

/// Gates in evaluation order.
pub const GATES: [Gate; 4] = [
    Gate {
        name: "history",
        check: history_gate,
    },
    Gate {
        name: "session",
        check: session_gate,
    },
    Gate {
        name: "features",
        check: features_gate,
    },
    Gate {
        name: "momentum",
        check: momentum_gate,
    },
];

fn history_gate(c: &Candidate<'_>) -> Result<(), Rejection> {
    if c.index < 2 || c.index >= c.bars.len() {
        return Err(Rejection::InsufficientHistory);
    }
    Ok(())
}

fn session_gate(c: &Candidate<'_>) -> Result<(), Rejection> {
    c.params
        .sessions
        .classify(c.bar().timestamp)
        .map(|_| ())
        .ok_or(Rejection::OutsideSession)
}

fn features_gate(c: &Candidate<'_>) -> Result<(), Rejection> {
    match (c.features.trend_at(c.index), c.features.atr_at(c.index)) {
        (Some(_), Some(_)) => Ok(()),
        _ => Err(Rejection::FeaturesUndefined),
    }
}

fn momentum_gate(c: &Candidate<'_>) -> Result<(), Rejection> {
    let atr = c.features.atr_at(c.index).ok_or(Rejection::FeaturesUndefined)?;
    let body = c.features.body_size[c.index];
    if body > c.params.momentum_multiplier * atr {
        Ok(())
    } else {
        Err(Rejection::WeakMomentum)
    }
}

/// Trend-aligned three-bar displacement test. Runs after every gate passed.
fn displacement(c: &Candidate<'_>) -> Result<FairValueGap, Rejection> {
    let bar = c.bar();
    let two_back = &c.bars[c.index - 2];
    let trend = c.features.trend_at(c.index).ok_or(Rejection::FeaturesUndefined)?;
    let session = c
        .params
        .sessions
        .classify(bar.timestamp)
        .ok_or(Rejection::OutsideSession)?;

    let (kind, top, bottom) = if bar.close > trend && bar.low > two_back.high {
        (GapKind::Bullish, bar.low, two_back.high)
    } else if bar.close < trend && bar.high < two_back.low {
        (GapKind::Bearish, two_back.low, bar.high)
    } else {
        return Err(Rejection::NoDisplacement);
    };

    Ok(FairValueGap {
        kind,
        top,
        bottom,
        created_at: c.index,
        created_time: bar.timestamp,
        session,
        mitigated: false,
    })
}

/// Run the full pipeline on one bar.
pub fn qualify(candidate: &Candidate<'_>) -> Result<FairValueGap, Rejection> {
    for gate in &GATES {
        (gate.check)(candidate)?;
    }
    displacement(candidate)
}
