//! Backtest runner — wires bar loading, the core simulator and artifacts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use smclab_core::domain::{FairValueGap, Trade};
use smclab_core::engine::{run_backtest, BacktestSummary};
use smclab_core::error::EngineError;
use smclab_core::gates::Rejection;

use crate::config::{AppConfig, ConfigError};
use crate::data_loader::{LoadError, LoadedBars};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("i/o error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_hash: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub config: AppConfig,
    pub bar_count: usize,
    pub first_bar: Option<DateTime<Utc>>,
    pub last_bar: Option<DateTime<Utc>>,
    pub summary: BacktestSummary,
    pub max_drawdown: f64,
    pub trades: Vec<Trade>,
    pub unsettled: Option<Trade>,
    pub gaps: Vec<FairValueGap>,
    /// Why scanned bars did not become gaps.
    pub rejections: BTreeMap<Rejection, usize>,
    pub discarded_signals: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest on pre-loaded bars — no I/O.
pub fn run_backtest_on(config: &AppConfig, data: &LoadedBars) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = &data.bars;

    let (report, detection) = run_backtest(bars, &config.strategy, &config.backtest)?;
    let summary = report.summary();

    tracing::info!(
        bars = bars.len(),
        gaps = detection.gaps.len(),
        trades = summary.total_trades,
        final_balance = summary.final_balance,
        "backtest complete"
    );
    if report.discarded_signals > 0 {
        tracing::warn!(count = report.discarded_signals, "degenerate signals discarded");
    }

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        config_hash: config.config_hash(),
        dataset_hash: data.dataset_hash.clone(),
        synthetic: data.synthetic,
        config: config.clone(),
        bar_count: bars.len(),
        first_bar: bars.first().map(|b| b.timestamp),
        last_bar: bars.last().map(|b| b.timestamp),
        summary,
        max_drawdown: report.max_drawdown,
        trades: report.trades,
        unsettled: report.unsettled,
        gaps: report.gaps,
        rejections: detection.rejections,
        discarded_signals: report.discarded_signals,
    })
}

impl BacktestResult {
    pub fn save_json(&self, path: &Path) -> Result<(), RunError> {
        let io = |e: &dyn std::fmt::Display| RunError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io(&e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| io(&e))?;
        std::fs::write(path, json).map_err(|e| io(&e))
    }

    pub fn load_json(path: &Path) -> Result<Self, RunError> {
        let io = |e: &dyn std::fmt::Display| RunError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let text = std::fs::read_to_string(path).map_err(|e| io(&e))?;
        serde_json::from_str(&text).map_err(|e| io(&e))
    }

    /// Trade log as CSV: time, direction, outcome, pnl, balance after.
    pub fn write_trades_csv(&self, path: &Path) -> Result<(), RunError> {
        let io = |e: &dyn std::fmt::Display| RunError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let mut writer = csv::Writer::from_path(path).map_err(|e| io(&e))?;
        writer
            .write_record([
                "time", "direction", "entry", "stop", "target", "outcome", "pnl", "balance_after",
            ])
            .map_err(|e| io(&e))?;
        for t in &self.trades {
            writer
                .write_record([
                    t.time.to_rfc3339(),
                    t.direction.to_string(),
                    format!("{:.4}", t.entry),
                    format!("{:.4}", t.stop),
                    format!("{:.4}", t.target),
                    format!("{:?}", t.outcome),
                    format!("{:.4}", t.pnl),
                    format!("{:.4}", t.balance_after),
                ])
                .map_err(|e| io(&e))?;
        }
        writer.flush().map_err(|e| io(&e))
    }
}
