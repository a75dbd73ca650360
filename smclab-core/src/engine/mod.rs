//! Backtest engine: balance accounting, the open-trade state machine and the
//! bar-by-bar simulator.

pub mod accounting;
pub mod position;
pub mod simulator;

pub use accounting::Balance;
pub use position::OpenTrade;
pub use simulator::{run_backtest, simulate, BacktestReport, BacktestSummary};
