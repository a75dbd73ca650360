//! Live cycle behaviour with in-memory collaborators.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use smclab_core::domain::{Bar, Direction};
use smclab_core::error::EngineError;
use smclab_core::gates::Rejection;
use smclab_core::ledger::{EntryResult, EntryStatus, LedgerEntry, LedgerStore, RiskTier};
use smclab_runner::{AppConfig, BarSource, CycleOutcome, CycleState, LiveEngine, Notifier};

// ── Collaborators ────────────────────────────────────────────────────

struct VecSource {
    bars: Option<Vec<Bar>>,
}

impl BarSource for VecSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, _: &str, _: &str, limit: usize) -> Result<Vec<Bar>, EngineError> {
        let bars = self
            .bars
            .clone()
            .ok_or_else(|| EngineError::UpstreamUnavailable("exchange down".into()))?;
        let skip = bars.len().saturating_sub(limit);
        Ok(bars[skip..].to_vec())
    }
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

impl Notifier for Inbox {
    fn send(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

impl Inbox {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap()
}

fn flat(i: usize) -> Bar {
    Bar {
        timestamp: base() + Duration::minutes(15 * i as i64),
        open: 100.0,
        high: 100.5,
        low: 99.5,
        close: 100.0,
        volume: 1.0,
    }
}

/// 20 closed bars (last at 10:45, London) plus one forming bar.
/// With `displacement`, the last closed bar is a bullish gap bar.
fn series(displacement: bool) -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..21).map(flat).collect();
    if displacement {
        let b = &mut bars[19];
        b.open = 101.0;
        b.high = 106.0;
        b.low = 101.0;
        b.close = 105.5;
    }
    bars
}

fn last_closed_time() -> DateTime<Utc> {
    base() + Duration::minutes(15 * 19)
}

fn now() -> DateTime<Utc> {
    last_closed_time() + Duration::minutes(15) + Duration::seconds(5)
}

fn config(ledger: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.strategy.trend_window = 5;
    config.strategy.atr_window = 3;
    config.live.lookback_bars = 50;
    config.live.ledger_path = ledger.to_path_buf();
    config
}

fn engine(ledger: &Path, bars: Option<Vec<Bar>>) -> (LiveEngine<VecSource, Inbox>, Inbox) {
    let inbox = Inbox::default();
    let engine = LiveEngine::new(config(ledger), VecSource { bars }, inbox.clone());
    (engine, inbox)
}

fn closed_loss(time: DateTime<Utc>) -> LedgerEntry {
    LedgerEntry {
        time,
        direction: Direction::Short,
        entry: 100.0,
        stop: 101.0,
        target: 98.0,
        status: EntryStatus::Closed,
        result: EntryResult::Loss,
        close_price: Some(101.0),
        close_time: Some(time + Duration::minutes(30)),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn qualifying_bar_is_recorded_and_announced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let (engine, inbox) = engine(&path, Some(series(true)));

    let report = engine.run_cycle(CycleState::default(), now());

    let CycleOutcome::Recorded(signal) = &report.outcome else {
        panic!("expected a recorded signal, got {:?}", report.outcome);
    };
    assert_eq!(signal.direction, Direction::Long);
    assert_eq!(signal.entry, 101.0);
    assert_eq!(signal.time, last_closed_time());
    assert_eq!(report.tier, RiskTier::Full);
    assert_eq!(report.state.last_signal_time, Some(last_closed_time()));

    let entries = LedgerStore::new(&path).try_load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Open);
    assert_eq!(entries[0].result, EntryResult::Pending);

    let messages = inbox.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("FVG SIGNAL"));
    assert!(messages[0].contains("5% of capital"));
}

#[test]
fn same_signal_twice_is_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let (engine, inbox) = engine(&path, Some(series(true)));

    let first = engine.run_cycle(CycleState::default(), now());
    let second = engine.run_cycle(first.state, now() + Duration::seconds(30));

    assert_eq!(second.outcome, CycleOutcome::Duplicate);
    assert_eq!(second.state, first.state);
    assert_eq!(LedgerStore::new(&path).try_load().unwrap().len(), 1);
    assert_eq!(inbox.messages().len(), 1);
}

#[test]
fn restarted_process_does_not_record_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let (first_run, _) = engine(&path, Some(series(true)));
    let first = first_run.run_cycle(CycleState::default(), now());
    assert!(matches!(first.outcome, CycleOutcome::Recorded(_)));

    // Fresh engine and empty state, as after `live --once` is invoked again.
    let (second_run, inbox) = engine(&path, Some(series(true)));
    let second = second_run.run_cycle(CycleState::default(), now() + Duration::seconds(30));

    assert_eq!(second.outcome, CycleOutcome::Duplicate);
    assert_eq!(second.state.last_signal_time, Some(last_closed_time()));
    assert_eq!(LedgerStore::new(&path).try_load().unwrap().len(), 1);
    assert!(inbox.messages().is_empty());
}

#[test]
fn three_losses_today_halt_new_signals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let losses: Vec<LedgerEntry> = (0..3)
        .map(|i| closed_loss(base() + Duration::minutes(30 * i)))
        .collect();
    LedgerStore::new(&path).save(&losses).unwrap();
    let (engine, inbox) = engine(&path, Some(series(true)));

    let report = engine.run_cycle(CycleState::default(), now());

    assert!(matches!(report.outcome, CycleOutcome::Halted(_)));
    assert_eq!(report.tier, RiskTier::Halted);
    assert_eq!(report.stats.daily_loss_count, 3);
    assert_eq!(LedgerStore::new(&path).try_load().unwrap(), losses);
    assert!(inbox.messages()[0].contains("CIRCUIT BREAKER"));
}

#[test]
fn open_entry_settles_against_closed_bar() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let open = LedgerEntry {
        time: base(),
        direction: Direction::Long,
        entry: 100.0,
        stop: 99.0,
        target: 102.0,
        status: EntryStatus::Open,
        result: EntryResult::Pending,
        close_price: None,
        close_time: None,
    };
    LedgerStore::new(&path).save(&[open]).unwrap();
    let (engine, inbox) = engine(&path, Some(series(true)));

    let report = engine.run_cycle(CycleState::default(), now());

    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].result, EntryResult::Win);
    assert!(matches!(report.outcome, CycleOutcome::Recorded(_)));

    let entries = LedgerStore::new(&path).try_load().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].status, EntryStatus::Closed);
    assert_eq!(entries[0].result, EntryResult::Win);
    assert_eq!(entries[0].close_price, Some(102.0));
    assert_eq!(entries[0].close_time, Some(last_closed_time()));
    assert!(inbox.messages()[0].contains("TARGET HIT"));
}

#[test]
fn upstream_failure_skips_without_touching_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let (engine, inbox) = engine(&path, None);

    let state = CycleState {
        last_signal_time: Some(base()),
    };
    let report = engine.run_cycle(state, now());

    assert!(matches!(
        report.outcome,
        CycleOutcome::Skipped(EngineError::UpstreamUnavailable(_))
    ));
    assert_eq!(report.state, state);
    assert!(!path.exists());
    assert!(inbox.messages().is_empty());
}

#[test]
fn short_history_is_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let (engine, _) = engine(&path, Some(series(true)[15..].to_vec()));

    let report = engine.run_cycle(CycleState::default(), now());
    assert!(matches!(
        report.outcome,
        CycleOutcome::Skipped(EngineError::InsufficientData { have: 5, need: 6 })
    ));
}

#[test]
fn quiet_bar_reports_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let (engine, inbox) = engine(&path, Some(series(false)));

    let report = engine.run_cycle(CycleState::default(), now());
    assert_eq!(report.outcome, CycleOutcome::NoSignal(Rejection::WeakMomentum));
    assert!(inbox.messages().is_empty());
    assert!(!path.exists());
}

#[test]
fn corrupt_ledger_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(&path, "[{\"time\": oops").unwrap();
    let (engine, _) = engine(&path, Some(series(true)));

    let report = engine.run_cycle(CycleState::default(), now());
    assert!(matches!(report.outcome, CycleOutcome::Recorded(_)));
    assert_eq!(LedgerStore::new(&path).try_load().unwrap().len(), 1);
}

#[test]
fn heartbeat_reports_ledger_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let losses: Vec<LedgerEntry> = (0..2).map(|i| closed_loss(base() + Duration::hours(i))).collect();
    LedgerStore::new(&path).save(&losses).unwrap();
    let (engine, inbox) = engine(&path, Some(series(false)));

    let text = engine.heartbeat(now());
    assert!(text.contains("ETH/USDT"));
    assert!(text.contains("15m"));
    assert!(text.contains("Open trades: 0"));
    assert!(text.contains("Losses today: 2"));
    assert!(text.contains("Risk tier: 3%"));
    assert!(text.contains("[UTC+8]"));
    assert_eq!(inbox.messages(), vec![text]);
}
