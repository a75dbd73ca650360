//! Strategy and backtest parameters.
//!
//! Every field carries the production default so a partial TOML table
//! deserializes into a complete parameter set.

use serde::{Deserialize, Serialize};

use crate::session::SessionWindows;

/// Detection and signal parameters shared by the backtest and live paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// SMA window of the trend filter.
    pub trend_window: usize,
    /// SMA window of the true range.
    pub atr_window: usize,
    /// Displacement bar body must exceed this many ATRs.
    pub momentum_multiplier: f64,
    /// Stop sits this many ATRs beyond the gap's far edge.
    pub sl_padding_atr: f64,
    /// Target distance in risk units.
    pub target_rr: f64,
    /// Favorable excursion in risk units that arms break-even.
    pub be_trigger_rr: f64,
    /// Gaps older than this many bars are never matched.
    pub gap_max_age: usize,
    pub sessions: SessionWindows,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            trend_window: 200,
            atr_window: 14,
            momentum_multiplier: 1.0,
            sl_padding_atr: 0.5,
            target_rr: 2.0,
            be_trigger_rr: 1.0,
            gap_max_age: 200,
            sessions: SessionWindows::default(),
        }
    }
}

impl StrategyParams {
    /// Minimum series length the feature computer accepts.
    pub fn required_bars(&self) -> usize {
        self.trend_window.max(self.atr_window) + 1
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trend_window == 0 || self.atr_window == 0 {
            return Err("trend_window and atr_window must be >= 1".into());
        }
        if !(self.momentum_multiplier >= 0.0) {
            return Err(format!(
                "momentum_multiplier must be >= 0, got {}",
                self.momentum_multiplier
            ));
        }
        if !(self.sl_padding_atr >= 0.0) {
            return Err(format!(
                "sl_padding_atr must be >= 0, got {}",
                self.sl_padding_atr
            ));
        }
        if !(self.target_rr > 0.0) {
            return Err(format!("target_rr must be > 0, got {}", self.target_rr));
        }
        if !(self.be_trigger_rr > 0.0) {
            return Err(format!(
                "be_trigger_rr must be > 0, got {}",
                self.be_trigger_rr
            ));
        }
        self.sessions.validate()
    }
}

/// Capital and scan-range parameters of the offline simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    pub initial_capital: f64,
    /// Fraction of the balance risked per trade (0.01 = 1%).
    pub risk_per_trade: f64,
    /// Candidates need this many bars after them so gaps can still be mitigated.
    pub detect_tail_bars: usize,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            risk_per_trade: 0.01,
            detect_tail_bars: 50,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_capital > 0.0) {
            return Err(format!(
                "initial_capital must be > 0, got {}",
                self.initial_capital
            ));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(format!(
                "risk_per_trade must be in (0, 1), got {}",
                self.risk_per_trade
            ));
        }
        Ok(())
    }
}
