//! Single running balance, updated only when a trade settles.

#[derive(Debug, Clone)]
pub struct Balance {
    initial: f64,
    current: f64,
    history: Vec<f64>,
}

impl Balance {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            current: initial,
            history: vec![initial],
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Capital at risk for a new trade, fixed for that trade's lifetime.
    pub fn risk_amount(&self, risk_per_trade: f64) -> f64 {
        self.current * risk_per_trade
    }

    /// Book a settled trade's pnl. Returns the new balance.
    pub fn settle(&mut self, pnl: f64) -> f64 {
        self.current += pnl;
        self.history.push(self.current);
        self.current
    }

    /// Balance after each settlement, starting with the initial capital.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Largest peak-to-trough decline of the balance, as a fraction of the peak.
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = f64::MIN;
        let mut worst = 0.0_f64;
        for &b in &self.history {
            peak = peak.max(b);
            if peak > 0.0 {
                worst = worst.max((peak - b) / peak);
            }
        }
        worst
    }
}
