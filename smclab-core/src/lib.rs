//! SMC Lab core: fair value gap detection, signal resolution, backtest
//! simulation and the live risk ledger.
//!
//! Pipeline, per bar series:
//! - [`features`] computes trend, true range, ATR and body size
//! - [`gates`] qualifies displacement candidates and names each rejection
//! - [`detector`] scans the series into fair value gaps
//! - [`resolver`] turns gap re-entries (backtest) or fresh gaps (live) into signals
//! - [`engine`] simulates trades with break-even management against one balance
//! - [`ledger`] tracks live outcomes and sizes the next signal
//!
//! Nothing here performs network I/O; the ledger's file store is the only
//! filesystem access.

pub mod detector;
pub mod domain;
pub mod engine;
pub mod error;
pub mod features;
pub mod gates;
pub mod indicators;
pub mod ledger;
pub mod params;
pub mod resolver;
pub mod session;

pub use error::EngineError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the runner boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::FairValueGap>();
        require_sync::<domain::FairValueGap>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();

        require_send::<features::FeatureSet>();
        require_sync::<features::FeatureSet>();
        require_send::<detector::DetectionReport>();
        require_sync::<detector::DetectionReport>();
        require_send::<resolver::GapBook>();
        require_sync::<resolver::GapBook>();
        require_send::<engine::BacktestReport>();
        require_sync::<engine::BacktestReport>();

        require_send::<ledger::RiskLedger>();
        require_sync::<ledger::RiskLedger>();
        require_send::<ledger::LedgerStore>();
        require_sync::<ledger::LedgerStore>();

        require_send::<params::StrategyParams>();
        require_sync::<params::StrategyParams>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
    }
}
