//! Live evaluation cycle.
//!
//! One cycle per closed bar:
//! 1. fetch recent bars (no state touched if this fails)
//! 2. drop the still-forming bar
//! 3. load the ledger once and settle open entries against the newest closed bar
//! 4. compute features and qualify that bar
//! 5. dedupe against the last signal time carried in [`CycleState`] and the
//!    signals already in the ledger, so a restarted process stays idempotent
//! 6. record the signal unless the circuit breaker has tripped
//! 7. save the ledger once, if anything changed
//!
//! Nothing in a cycle panics or propagates: every failure becomes a
//! [`CycleOutcome`] and the next scheduled cycle runs as normal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smclab_core::domain::{Bar, Signal};
use smclab_core::error::EngineError;
use smclab_core::features::compute_features;
use smclab_core::gates::Rejection;
use smclab_core::ledger::{LedgerStats, LedgerStore, Resolution, RiskLedger, RiskTier};
use smclab_core::resolver::{resolve_latest, LiveEvaluation};

use crate::config::AppConfig;
use crate::report::MessageFormatter;
use crate::source::{BarSource, Notifier};

/// State threaded from one cycle to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    /// Time of the last signal announced, recorded or halted.
    pub last_signal_time: Option<DateTime<Utc>>,
}

/// What a cycle decided.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Bars unavailable or too few for the warm-up.
    Skipped(EngineError),
    /// The newest closed bar did not qualify.
    NoSignal(Rejection),
    /// Entry equalled stop.
    Discarded(EngineError),
    /// Same signal as a previous cycle or an existing ledger entry.
    Duplicate,
    /// Valid signal refused by the circuit breaker.
    Halted(Signal),
    /// Signal appended to the ledger.
    Recorded(Signal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Entries settled by this cycle's bar.
    pub resolved: Vec<Resolution>,
    pub stats: LedgerStats,
    pub tier: RiskTier,
    /// Pass to the next cycle.
    pub state: CycleState,
}

pub struct LiveEngine<S, N> {
    config: AppConfig,
    store: LedgerStore,
    source: S,
    notifier: N,
    formatter: MessageFormatter,
}

impl<S: BarSource, N: Notifier> LiveEngine<S, N> {
    pub fn new(config: AppConfig, source: S, notifier: N) -> Self {
        let store = LedgerStore::new(&config.live.ledger_path);
        let formatter = MessageFormatter::new(
            &config.live.symbol,
            &config.live.timeframe,
            config.live.display_offset_hours,
        );
        Self {
            config,
            store,
            source,
            notifier,
            formatter,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    pub fn notify(&self, text: &str) {
        self.notifier.send(text);
    }

    /// Evaluate the newest closed bar.
    pub fn run_cycle(&self, state: CycleState, now: DateTime<Utc>) -> CycleReport {
        let live = &self.config.live;
        let params = &self.config.strategy;

        let mut bars = match self
            .source
            .fetch(&live.symbol, &live.timeframe, live.lookback_bars)
        {
            Ok(bars) => bars,
            Err(err) => return self.skipped(err, state, now),
        };
        if live.drop_forming_bar {
            bars.pop();
        }
        let Some(last) = bars.last().cloned() else {
            let err = EngineError::InsufficientData {
                have: 0,
                need: params.required_bars(),
            };
            return self.skipped(err, state, now);
        };

        let mut ledger = RiskLedger::new(self.store.load());
        let resolved = ledger.resolve_open(&last);
        for r in &resolved {
            tracing::info!(index = r.index, result = ?r.result, price = r.close_price, "ledger entry closed");
            self.notifier.send(&self.formatter.resolution(r));
        }
        let mut dirty = !resolved.is_empty();

        let stats = ledger.stats(now);
        let tier = ledger.risk_tier(now);
        let mut next = state;

        let outcome = match self.evaluate(&bars, &last) {
            Err(err) => {
                tracing::info!(%err, "cycle skipped");
                CycleOutcome::Skipped(err)
            }
            Ok(LiveEvaluation::Rejected(reason)) => {
                tracing::info!(%reason, bar = %last.timestamp, "no signal");
                CycleOutcome::NoSignal(reason)
            }
            Ok(LiveEvaluation::Discarded(err)) => {
                tracing::warn!(%err, "signal discarded");
                CycleOutcome::Discarded(err)
            }
            Ok(LiveEvaluation::Signal(signal)) => {
                if state.last_signal_time == Some(signal.time) || ledger.has_signal_at(signal.time) {
                    tracing::info!(time = %signal.time, "duplicate signal ignored");
                    next.last_signal_time = Some(signal.time);
                    CycleOutcome::Duplicate
                } else if tier.is_halted() {
                    tracing::warn!(daily_losses = stats.daily_loss_count, "circuit breaker: signal refused");
                    self.notifier.send(&self.formatter.halted(&signal, &stats));
                    next.last_signal_time = Some(signal.time);
                    CycleOutcome::Halted(signal)
                } else {
                    tracing::info!(direction = %signal.direction, entry = signal.entry, %tier, "signal recorded");
                    ledger.accept_signal(&signal);
                    dirty = true;
                    self.notifier.send(&self.formatter.signal(&signal, tier));
                    next.last_signal_time = Some(signal.time);
                    CycleOutcome::Recorded(signal)
                }
            }
        };

        if dirty {
            if let Err(err) = self.store.save(ledger.entries()) {
                tracing::error!(%err, "ledger save failed");
            }
        }

        CycleReport {
            outcome,
            resolved,
            stats,
            tier,
            state: next,
        }
    }

    fn evaluate(&self, closed: &[Bar], last: &Bar) -> Result<LiveEvaluation, EngineError> {
        let features = compute_features(closed, &self.config.strategy)?;
        tracing::debug!(
            bar = %last.timestamp,
            trend = ?features.trend_at(closed.len() - 1),
            atr = ?features.atr_at(closed.len() - 1),
            "features"
        );
        Ok(resolve_latest(closed, &features, &self.config.strategy))
    }

    fn skipped(&self, err: EngineError, state: CycleState, now: DateTime<Utc>) -> CycleReport {
        tracing::warn!(%err, "cycle skipped");
        let ledger = RiskLedger::new(self.store.load());
        CycleReport {
            outcome: CycleOutcome::Skipped(err),
            resolved: Vec::new(),
            stats: ledger.stats(now),
            tier: ledger.risk_tier(now),
            state,
        }
    }

    /// Status message: time, symbol, timeframe, open trades, losses today, tier.
    pub fn heartbeat(&self, now: DateTime<Utc>) -> String {
        let ledger = RiskLedger::new(self.store.load());
        let stats = ledger.stats(now);
        let text = self
            .formatter
            .heartbeat(now, ledger.open_count(), &stats, ledger.risk_tier(now));
        self.notifier.send(&text);
        text
    }
}

/// Next cycle time strictly after `now`: the next multiple of `interval_minutes`
/// past the hour, plus `delay_seconds`. With 15 and 5: :00:05, :15:05, :30:05, :45:05.
pub fn next_cycle_time(now: DateTime<Utc>, interval_minutes: u32, delay_seconds: u32) -> DateTime<Utc> {
    let interval = i64::from(interval_minutes.max(1)) * 60;
    let delay = i64::from(delay_seconds);
    let secs = now.timestamp();
    let boundary = secs - secs.rem_euclid(interval);
    let mut next = boundary + delay;
    if next <= secs {
        next += interval;
    }
    DateTime::from_timestamp(next, 0).unwrap_or(now)
}

/// Start of the next whole hour after `now`.
pub fn next_heartbeat_time(now: DateTime<Utc>) -> DateTime<Utc> {
    next_cycle_time(now, 60, 0)
}
