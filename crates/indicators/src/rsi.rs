use crate::{absent, run, Indicator, Series};
use rust_decimal::Decimal;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Relative Strength Index (RSI).
///
/// The first average gain/loss is the simple mean of the first `period`
/// changes; after that both are Wilder-smoothed:
/// `avg = (avg * (period - 1) + current) / period`.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<Decimal>,
    seed_gain: Decimal,
    seed_loss: Decimal,
    changes: usize,
    avg_gain: Option<Decimal>,
    avg_loss: Option<Decimal>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RSI period must be > 0");
        Self {
            len: period,
            prev_value: None,
            seed_gain: Decimal::ZERO,
            seed_loss: Decimal::ZERO,
            changes: 0,
            avg_gain: None,
            avg_loss: None,
        }
    }

    /// `100 - 100 / (1 + ag / al)`, computed as `ag / (ag + al) * 100` so a
    /// vanishing `avg_loss` cannot overflow the division.
    pub fn value(&self) -> Option<Decimal> {
        match (self.avg_gain, self.avg_loss) {
            (Some(_), Some(al)) if al.is_zero() => Some(Decimal::ONE_HUNDRED),
            (Some(ag), Some(al)) => Some(ag / (ag + al) * Decimal::ONE_HUNDRED),
            _ => None,
        }
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        if let Some(prev) = self.prev_value {
            let change = value - prev;
            let gain = change.max(Decimal::ZERO);
            let loss = (-change).max(Decimal::ZERO);
            let period_dec = Decimal::from(self.len);

            self.changes += 1;

            match (self.avg_gain, self.avg_loss) {
                (Some(ag), Some(al)) => {
                    // Wilder's smoothing
                    let keep = period_dec - Decimal::ONE;
                    self.avg_gain = Some((ag * keep + gain) / period_dec);
                    self.avg_loss = Some((al * keep + loss) / period_dec);
                }
                _ => {
                    self.seed_gain += gain;
                    self.seed_loss += loss;
                    if self.changes >= self.len {
                        self.avg_gain = Some(self.seed_gain / period_dec);
                        self.avg_loss = Some(self.seed_loss / period_dec);
                    }
                }
            }
        }

        self.prev_value = Some(value);
        self.value()
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.seed_gain = Decimal::ZERO;
        self.seed_loss = Decimal::ZERO;
        self.changes = 0;
        self.avg_gain = None;
        self.avg_loss = None;
    }

    fn period(&self) -> usize {
        self.len + 1 // need one extra data point for the first change
    }

    fn is_ready(&self) -> bool {
        self.avg_gain.is_some()
    }
}

/// RSI over a slice of closes. The first value appears at index `period`;
/// fewer than `period + 1` closes yields an all-absent series.
pub fn rsi(closes: &[Decimal], period: usize) -> Series {
    if period == 0 {
        return absent(closes.len());
    }
    run(&mut Rsi::new(period), closes)
}
