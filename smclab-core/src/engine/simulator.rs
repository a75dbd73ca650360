//! Backtest simulator — one trade at a time against a single balance.
//!
//! The outer scan starts once every feature is defined and asks the gap book for
//! a signal on each bar. A signal opens a trade that is stepped forward bar by
//! bar; when it settles at bar `j` the scan resumes at `j`. A trade still open
//! when the data ends is reported as unsettled and leaves the balance untouched.

use serde::{Deserialize, Serialize};

use super::accounting::Balance;
use super::position::OpenTrade;
use crate::detector::{detect_gaps, DetectionReport};
use crate::domain::{Bar, FairValueGap, Outcome, Trade};
use crate::error::EngineError;
use crate::features::{compute_features, FeatureSet};
use crate::params::{BacktestParams, StrategyParams};
use crate::resolver::GapBook;

/// Everything a backtest produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    /// Trade still running when the series ended.
    pub unsettled: Option<Trade>,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub max_drawdown: f64,
    pub gaps: Vec<FairValueGap>,
    /// Matches dropped because entry equalled stop.
    pub discarded_signals: usize,
}

/// Headline statistics of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub total_trades: usize,
    pub wins: usize,
    pub break_evens: usize,
    pub losses: usize,
    /// Wins over settled trades, in percent.
    pub win_rate_pct: f64,
    pub final_balance: f64,
    pub roi_pct: f64,
}

impl BacktestReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.trades.iter().filter(|t| t.outcome == outcome).count()
    }

    pub fn summary(&self) -> BacktestSummary {
        let total = self.trades.len();
        let wins = self.count(Outcome::Win);
        BacktestSummary {
            total_trades: total,
            wins,
            break_evens: self.count(Outcome::BreakEven),
            losses: self.count(Outcome::Loss),
            win_rate_pct: if total == 0 {
                0.0
            } else {
                wins as f64 / total as f64 * 100.0
            },
            final_balance: self.final_balance,
            roi_pct: (self.final_balance - self.initial_balance) / self.initial_balance * 100.0,
        }
    }
}

/// Simulate trades over precomputed features and detected gaps.
pub fn simulate(
    bars: &[Bar],
    features: &FeatureSet,
    gaps: Vec<FairValueGap>,
    strategy: &StrategyParams,
    backtest: &BacktestParams,
) -> BacktestReport {
    let mut book = GapBook::new(gaps, strategy.gap_max_age);
    let mut balance = Balance::new(backtest.initial_capital);
    let mut trades = Vec::new();
    let mut unsettled = None;
    let mut discarded_signals = 0;

    let n = bars.len().min(features.len());
    let mut i = strategy.required_bars() - 1;

    while i + 1 < n {
        let signal = match book.resolve(bars, features, i, strategy) {
            None => {
                i += 1;
                continue;
            }
            Some(Err(err)) => {
                tracing::debug!(bar = i, %err, "signal discarded");
                discarded_signals += 1;
                i += 1;
                continue;
            }
            Some(Ok(signal)) => signal,
        };

        let mut trade = OpenTrade::open(
            &signal,
            balance.risk_amount(backtest.risk_per_trade),
            strategy.target_rr,
            strategy.be_trigger_rr,
        );

        let settled = (i + 1..n).find_map(|j| {
            let outcome = trade.on_bar(&bars[j]);
            outcome.is_terminal().then_some((j, outcome))
        });

        match settled {
            Some((j, outcome)) => {
                let balance_after = balance.settle(trade.pnl(outcome));
                tracing::debug!(entry = i, exit = j, ?outcome, balance = balance_after, "trade settled");
                trades.push(trade.into_trade(outcome, balance_after, Some((j, bars[j].timestamp))));
                i = j;
            }
            None => {
                unsettled = Some(trade.into_trade(Outcome::Running, balance.current(), None));
                break;
            }
        }
    }

    BacktestReport {
        trades,
        unsettled,
        initial_balance: balance.initial(),
        final_balance: balance.current(),
        max_drawdown: balance.max_drawdown(),
        gaps: book.into_gaps(),
        discarded_signals,
    }
}

/// Compute features, detect gaps and simulate in one call.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &StrategyParams,
    backtest: &BacktestParams,
) -> Result<(BacktestReport, DetectionReport), EngineError> {
    let features = compute_features(bars, strategy)?;
    let detection = detect_gaps(bars, &features, strategy, backtest.detect_tail_bars);
    let report = simulate(bars, &features, detection.gaps.clone(), strategy, backtest);
    Ok((report, detection))
}
