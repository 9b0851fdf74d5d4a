use crate::{absent, run, Indicator, Series};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple moving average, the MA lines drawn over the K-line chart.
///
/// The window total is updated as values enter and leave. Decimal addition
/// is exact, so this equals summing the window each time.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<Decimal>,
    total: Decimal,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            period,
            window: VecDeque::with_capacity(period),
            total: Decimal::ZERO,
        }
    }

    /// Mean of the current window, once it is full.
    pub fn value(&self) -> Option<Decimal> {
        self.is_ready()
            .then(|| self.total / Decimal::from(self.period))
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        if self.window.len() == self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.total -= oldest;
            }
        }
        self.window.push_back(value);
        self.total += value;
        self.value()
    }

    fn reset(&mut self) {
        self.window.clear();
        self.total = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.period
    }

    fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }
}

/// Moving average over a whole price history. Index `i` holds the mean of
/// `values[i + 1 - period ..= i]` and is `None` while `i < period - 1`.
pub fn sma(values: &[Decimal], period: usize) -> Series {
    match period {
        0 => absent(values.len()),
        _ => run(&mut Sma::new(period), values),
    }
}
