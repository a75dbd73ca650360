//! Backtest trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// Terminal or running state of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Running,
    Win,
    Loss,
    BreakEven,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One simulated trade: a signal plus its settlement against the balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Time of the bar that triggered the entry.
    pub time: DateTime<Utc>,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    /// Capital at risk, fixed at entry.
    pub risk_amount: f64,
    pub outcome: Outcome,
    pub pnl: f64,
    pub balance_after: f64,
    pub entry_index: usize,
    /// Bar index where the trade settled; `None` while running.
    pub exit_index: Option<usize>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl Trade {
    /// Profit in risk units.
    pub fn r_multiple(&self) -> f64 {
        if self.risk_amount == 0.0 {
            return 0.0;
        }
        self.pnl / self.risk_amount
    }

    pub fn bars_held(&self) -> Option<usize> {
        self.exit_index.map(|j| j - self.entry_index)
    }
}
