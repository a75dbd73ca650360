//! TOML application configuration.
//!
//! Every table and field is optional; an empty file yields the production
//! defaults. Paths given on the command line override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smclab_core::params::{BacktestParams, StrategyParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Live evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub symbol: String,
    pub timeframe: String,
    /// Bars requested from the source each cycle.
    pub lookback_bars: usize,
    /// CSV file read by the local bar source.
    pub bars_file: PathBuf,
    pub ledger_path: PathBuf,
    /// The source's last bar is still forming and must be dropped.
    pub drop_forming_bar: bool,
    /// Offset from UTC used in notification timestamps.
    pub display_offset_hours: i32,
    pub cycle_interval_minutes: u32,
    /// Seconds after each bar close before the cycle runs.
    pub cycle_delay_seconds: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            symbol: "ETH/USDT".into(),
            timeframe: "15m".into(),
            lookback_bars: 300,
            bars_file: PathBuf::from("data/live_bars.csv"),
            ledger_path: PathBuf::from("trade_history.json"),
            drop_forming_bar: true,
            display_offset_hours: 8,
            cycle_interval_minutes: 15,
            cycle_delay_seconds: 5,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub strategy: StrategyParams,
    pub backtest: BacktestParams,
    pub live: LiveConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate().map_err(ConfigError::Invalid)?;
        self.backtest.validate().map_err(ConfigError::Invalid)?;

        let live = &self.live;
        if live.lookback_bars < self.strategy.required_bars() + 1 {
            return Err(ConfigError::Invalid(format!(
                "live.lookback_bars ({}) must exceed the warm-up of {} bars",
                live.lookback_bars,
                self.strategy.required_bars()
            )));
        }
        if live.cycle_interval_minutes == 0 || 60 % live.cycle_interval_minutes != 0 {
            return Err(ConfigError::Invalid(format!(
                "live.cycle_interval_minutes must divide 60, got {}",
                live.cycle_interval_minutes
            )));
        }
        if !(-12..=14).contains(&live.display_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "live.display_offset_hours out of range: {}",
                live.display_offset_hours
            )));
        }
        Ok(())
    }

    /// Content hash of the parameters that affect results.
    pub fn config_hash(&self) -> String {
        // Serializing plain structs of numbers, strings and vectors cannot fail.
        let json = serde_json::to_string(&(&self.strategy, &self.backtest)).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
