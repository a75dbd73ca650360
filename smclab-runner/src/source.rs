//! Collaborators consumed by the live cycle: where bars come from and where
//! messages go.

use std::path::PathBuf;
use std::time::Duration;

use smclab_core::domain::Bar;
use smclab_core::error::EngineError;

use crate::data_loader::load_csv;

/// Provider of recent bars, sorted ascending by time.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Up to `limit` most recent bars. The last one may still be forming.
    fn fetch(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, EngineError>;
}

/// Fire-and-forget message sink.
pub trait Notifier: Send + Sync {
    fn send(&self, text: &str);
}

/// Reads the tail of a CSV file that an external collector keeps appending to.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, _symbol: &str, _timeframe: &str, limit: usize) -> Result<Vec<Bar>, EngineError> {
        let loaded = load_csv(&self.path).map_err(|e| {
            EngineError::UpstreamUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        let mut bars = loaded.bars;
        let skip = bars.len().saturating_sub(limit);
        bars.drain(..skip);
        Ok(bars)
    }
}

/// Retries a failing source with linear backoff (`delay`, `2 * delay`, ...).
pub struct Retrying<S> {
    inner: S,
    attempts: u32,
    delay: Duration,
}

impl<S: BarSource> Retrying<S> {
    pub fn new(inner: S, attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl<S: BarSource> BarSource for Retrying<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, EngineError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(symbol, timeframe, limit) {
                Ok(bars) => return Ok(bars),
                Err(err) if attempt < self.attempts => {
                    tracing::warn!(source = self.inner.name(), attempt, %err, "fetch failed, retrying");
                    std::thread::sleep(self.delay * attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Writes every message to the log under the `notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, text: &str) {
        tracing::info!(target: "notify", "\n{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl BarSource for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(&self, _: &str, _: &str, _: usize) -> Result<Vec<Bar>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(EngineError::UpstreamUnavailable("timeout".into()));
            }
            Ok(Vec::new())
        }
    }

    fn flaky(failures: u32) -> Flaky {
        Flaky {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    #[test]
    fn retry_recovers_within_budget() {
        let source = Retrying::new(flaky(2), 3, Duration::ZERO);
        assert!(source.fetch("ETH/USDT", "15m", 10).is_ok());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_gives_up() {
        let source = Retrying::new(flaky(5), 3, Duration::ZERO);
        assert!(matches!(
            source.fetch("ETH/USDT", "15m", 10),
            Err(EngineError::UpstreamUnavailable(_))
        ));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn csv_source_returns_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        let mut text = String::from("open_time,open,high,low,close,volume\n");
        for i in 0..10i64 {
            text.push_str(&format!("{},1,2,0.5,1.5,1\n", 1_704_182_400_000 + i * 900_000));
        }
        std::fs::write(&path, text).unwrap();

        let bars = CsvBarSource::new(&path).fetch("ETH/USDT", "15m", 4).unwrap();
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].timestamp.timestamp_millis(), 1_704_182_400_000 + 6 * 900_000);
    }

    #[test]
    fn missing_csv_is_upstream_unavailable() {
        let err = CsvBarSource::new("/nonexistent/bars.csv")
            .fetch("ETH/USDT", "15m", 4)
            .unwrap_err();
        assert!(err.skips_cycle());
    }
}
