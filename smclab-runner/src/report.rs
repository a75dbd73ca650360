//! Plain-text notification messages.
//!
//! Timestamps are shown in a fixed display offset (UTC+8 by default) with the
//! offset spelled out, so readers never confuse them with UTC.

use chrono::{DateTime, FixedOffset, Utc};

use smclab_core::domain::{Direction, Signal};
use smclab_core::engine::BacktestSummary;
use smclab_core::ledger::{EntryResult, LedgerStats, Resolution, RiskTier};

/// Formats messages for one symbol/timeframe pair.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    pub symbol: String,
    pub timeframe: String,
    pub offset_hours: i32,
}

impl MessageFormatter {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>, offset_hours: i32) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            offset_hours,
        }
    }

    /// `2024-01-02 16:00:00 [UTC+8]`
    pub fn local_time(&self, t: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        match FixedOffset::east_opt(self.offset_hours * 3600) {
            Some(offset) => format!(
                "{} [UTC{:+}]",
                t.with_timezone(&offset).format(FORMAT),
                self.offset_hours
            ),
            None => format!("{} [UTC]", t.format(FORMAT)),
        }
    }

    pub fn signal(&self, signal: &Signal, tier: RiskTier) -> String {
        let side = match signal.direction {
            Direction::Long => "LONG (bullish trend)",
            Direction::Short => "SHORT (bearish trend)",
        };
        format!(
            "FVG SIGNAL {side}\n\
             Session: {session}\n\
             Symbol: {symbol} {tf}\n\
             Time: {time}\n\
             Entry: {entry:.2}\n\
             Stop: {stop:.2}\n\
             Target: {target:.2}\n\
             Risk: {risk:.2}  ATR: {atr:.2}\n\
             Size: {tier} of capital",
            session = signal.session,
            symbol = self.symbol,
            tf = self.timeframe,
            time = self.local_time(signal.time),
            entry = signal.entry,
            stop = signal.stop,
            target = signal.target,
            risk = signal.risk,
            atr = signal.atr,
        )
    }

    pub fn resolution(&self, r: &Resolution) -> String {
        let verdict = match r.result {
            EntryResult::Win => "TARGET HIT",
            EntryResult::Loss => "STOPPED OUT",
            EntryResult::Pending => "PENDING",
        };
        format!(
            "TRADE CLOSED: {verdict}\n\
             Symbol: {symbol}\n\
             {dir} from {entry:.2} closed at {close:.2}\n\
             Opened: {opened}\n\
             Closed: {closed}",
            symbol = self.symbol,
            dir = r.direction,
            entry = r.entry,
            close = r.close_price,
            opened = self.local_time(r.opened_at),
            closed = self.local_time(r.closed_at),
        )
    }

    pub fn halted(&self, signal: &Signal, stats: &LedgerStats) -> String {
        format!(
            "CIRCUIT BREAKER: signal not taken\n\
             Symbol: {symbol}\n\
             {dir} at {entry:.2}, {time}\n\
             Losses today: {daily}. Trading resumes at the next UTC day.",
            symbol = self.symbol,
            dir = signal.direction,
            entry = signal.entry,
            time = self.local_time(signal.time),
            daily = stats.daily_loss_count,
        )
    }

    pub fn heartbeat(
        &self,
        now: DateTime<Utc>,
        open_trades: usize,
        stats: &LedgerStats,
        tier: RiskTier,
    ) -> String {
        format!(
            "HEARTBEAT\n\
             Time: {time}\n\
             Symbol: {symbol}\n\
             Timeframe: {tf}\n\
             Open trades: {open_trades}\n\
             Losses today: {daily}  Loss streak: {streak}\n\
             Risk tier: {tier}",
            time = self.local_time(now),
            symbol = self.symbol,
            tf = self.timeframe,
            daily = stats.daily_loss_count,
            streak = stats.consecutive_loss_count,
        )
    }

    pub fn started(&self, now: DateTime<Utc>) -> String {
        format!(
            "MONITOR STARTED\nSymbol: {} {}\nTime: {}",
            self.symbol,
            self.timeframe,
            self.local_time(now)
        )
    }

    pub fn stopped(&self, now: DateTime<Utc>) -> String {
        format!("MONITOR STOPPED\nTime: {}", self.local_time(now))
    }
}

/// Multi-line backtest summary for the terminal.
pub fn format_summary(summary: &BacktestSummary, initial_capital: f64) -> String {
    format!(
        "Trades: {}\n  Wins: {}\n  Break-even: {}\n  Losses: {}\n\
         Win rate: {:.2}%\n\
         Balance: {:.2} -> {:.2} ({:+.2}%)",
        summary.total_trades,
        summary.wins,
        summary.break_evens,
        summary.losses,
        summary.win_rate_pct,
        initial_capital,
        summary.final_balance,
        summary.roi_pct,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use smclab_core::session::Session;

    fn fmt() -> MessageFormatter {
        MessageFormatter::new("ETH/USDT", "15m", 8)
    }

    #[test]
    fn local_time_applies_offset() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        assert_eq!(fmt().local_time(t), "2024-01-02 16:00:00 [UTC+8]");
        let west = MessageFormatter::new("X", "1h", -5);
        assert_eq!(west.local_time(t), "2024-01-02 03:00:00 [UTC-5]");
    }

    #[test]
    fn signal_message_has_levels() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let s = Signal::new(Direction::Long, 106.0, 103.5, 2.0, t, Session::London, 1.0, 0).unwrap();
        let text = fmt().signal(&s, RiskTier::Reduced);
        assert!(text.contains("LONG"));
        assert!(text.contains("Entry: 106.00"));
        assert!(text.contains("Stop: 103.50"));
        assert!(text.contains("Target: 111.00"));
        assert!(text.contains("3% of capital"));
        assert!(text.contains("[UTC+8]"));
    }

    #[test]
    fn heartbeat_lists_state() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let stats = LedgerStats {
            daily_loss_count: 1,
            consecutive_loss_count: 2,
        };
        let text = fmt().heartbeat(t, 2, &stats, RiskTier::Reduced);
        assert!(text.contains("17:00:00"));
        assert!(text.contains("ETH/USDT"));
        assert!(text.contains("15m"));
        assert!(text.contains("Open trades: 2"));
        assert!(text.contains("Losses today: 1"));
        assert!(text.contains("Risk tier: 3%"));
    }
}
