//! Open trade — the break-even-aware outcome state machine.
//!
//! Per bar, in fixed order:
//! 1. Stop test against the current stop (entry once break-even is armed):
//!    Loss, or BreakEven when armed.
//! 2. Target test: Win.
//! 3. Break-even arming once the favorable side reaches `be_trigger_rr` R.
//!
//! A bar touching both stop and target settles as the stop. Arming is never
//! evaluated on a bar that already settled.

use chrono::{DateTime, Utc};

use crate::domain::{Bar, Direction, Outcome, Signal, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub be_trigger: f64,
    pub be_armed: bool,
    pub risk_amount: f64,
    pub target_rr: f64,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
}

impl OpenTrade {
    /// Open a trade from a signal, risking `risk_amount` of capital.
    pub fn open(signal: &Signal, risk_amount: f64, target_rr: f64, be_trigger_rr: f64) -> Self {
        Self {
            direction: signal.direction,
            entry: signal.entry,
            stop: signal.stop,
            target: signal.target,
            be_trigger: signal.level_at_rr(be_trigger_rr),
            be_armed: false,
            risk_amount,
            target_rr,
            entry_index: signal.bar_index,
            entry_time: signal.time,
        }
    }

    /// Stop in force for the next bar.
    pub fn current_stop(&self) -> f64 {
        if self.be_armed {
            self.entry
        } else {
            self.stop
        }
    }

    /// Advance one bar. Returns `Running` until a terminal outcome is reached.
    pub fn on_bar(&mut self, bar: &Bar) -> Outcome {
        let stop = self.current_stop();
        let (stop_hit, target_hit, trigger_hit) = match self.direction {
            Direction::Long => (
                bar.low <= stop,
                bar.high >= self.target,
                bar.high >= self.be_trigger,
            ),
            Direction::Short => (
                bar.high >= stop,
                bar.low <= self.target,
                bar.low <= self.be_trigger,
            ),
        };

        if stop_hit {
            return if self.be_armed {
                Outcome::BreakEven
            } else {
                Outcome::Loss
            };
        }
        if target_hit {
            return Outcome::Win;
        }
        if !self.be_armed && trigger_hit {
            self.be_armed = true;
        }
        Outcome::Running
    }

    /// Realized pnl for an outcome.
    pub fn pnl(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win => self.risk_amount * self.target_rr,
            Outcome::Loss => -self.risk_amount,
            Outcome::BreakEven | Outcome::Running => 0.0,
        }
    }

    /// Freeze into a trade record.
    pub fn into_trade(
        self,
        outcome: Outcome,
        balance_after: f64,
        exit: Option<(usize, DateTime<Utc>)>,
    ) -> Trade {
        Trade {
            time: self.entry_time,
            direction: self.direction,
            entry: self.entry,
            stop: self.stop,
            target: self.target,
            risk_amount: self.risk_amount,
            outcome,
            pnl: self.pnl(outcome),
            balance_after,
            entry_index: self.entry_index,
            exit_index: exit.map(|(i, _)| i),
            exit_time: exit.map(|(_, t)| t),
        }
    }
}
