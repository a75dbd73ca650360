//! SMC Lab Runner — configuration, bar loading, backtest artifacts and the
//! live evaluation cycle.
//!
//! This crate builds on `smclab-core` to provide:
//! - TOML configuration with production defaults
//! - CSV bar import and seeded synthetic bars
//! - Backtest runs with hashed, versioned JSON results
//! - Bar source / notifier collaborators and the per-bar live cycle
//! - Plain-text notification formatting

pub mod backtest;
pub mod config;
pub mod data_loader;
pub mod live;
pub mod report;
pub mod source;

pub use backtest::{run_backtest_on, BacktestResult, RunError, SCHEMA_VERSION};
pub use config::{AppConfig, ConfigError, LiveConfig};
pub use data_loader::{generate_synthetic_bars, load_csv, read_csv, LoadError, LoadedBars};
pub use live::{
    next_cycle_time, next_heartbeat_time, CycleOutcome, CycleReport, CycleState, LiveEngine,
};
pub use report::{format_summary, MessageFormatter};
pub use source::{BarSource, CsvBarSource, LogNotifier, Notifier, Retrying};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AppConfig>();
        assert_sync::<AppConfig>();
        assert_send::<LiveConfig>();
        assert_sync::<LiveConfig>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn live_engine_is_send_sync() {
        assert_send::<LiveEngine<CsvBarSource, LogNotifier>>();
        assert_sync::<LiveEngine<CsvBarSource, LogNotifier>>();
        assert_send::<CycleReport>();
        assert_sync::<CycleReport>();
    }
}
