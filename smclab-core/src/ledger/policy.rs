//! Adaptive risk tier and daily circuit breaker.
//!
//! Everything here is a pure function of a ledger snapshot and the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entry::{EntryResult, LedgerEntry};

/// Daily losses at which new signals stop being accepted.
pub const DAILY_LOSS_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Closed losses whose entry time is on or after today's UTC midnight.
    pub daily_loss_count: usize,
    /// Losses at the newest end of the ledger, up to the first win or open entry.
    pub consecutive_loss_count: usize,
}

/// Compute loss statistics as of `now`.
///
/// The streak walks entries newest-first and stops at the first one that is
/// not a loss, so a win or a still-pending entry ends it.
pub fn stats(entries: &[LedgerEntry], now: DateTime<Utc>) -> LedgerStats {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now);

    let daily_loss_count = entries
        .iter()
        .filter(|e| e.is_closed_with(EntryResult::Loss) && e.time >= day_start)
        .count();

    let consecutive_loss_count = entries
        .iter()
        .rev()
        .take_while(|e| e.is_closed_with(EntryResult::Loss))
        .count();

    LedgerStats {
        daily_loss_count,
        consecutive_loss_count,
    }
}

/// Fraction of capital risked on the next signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Circuit breaker tripped: 0%.
    Halted,
    /// 1%, ten or more losses in a row.
    Minimal,
    /// 2%, five or more.
    Low,
    /// 3%, two or more.
    Reduced,
    /// 5%.
    Full,
}

impl RiskTier {
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Halted => 0.0,
            Self::Minimal => 0.01,
            Self::Low => 0.02,
            Self::Reduced => 0.03,
            Self::Full => 0.05,
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            Self::Halted => 0,
            Self::Minimal => 1,
            Self::Low => 2,
            Self::Reduced => 3,
            Self::Full => 5,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Tier from loss statistics. The daily breaker overrides the streak tier.
pub fn risk_tier(stats: &LedgerStats) -> RiskTier {
    if stats.daily_loss_count >= DAILY_LOSS_LIMIT {
        return RiskTier::Halted;
    }
    match stats.consecutive_loss_count {
        n if n >= 10 => RiskTier::Minimal,
        n if n >= 5 => RiskTier::Low,
        n if n >= 2 => RiskTier::Reduced,
        _ => RiskTier::Full,
    }
}
