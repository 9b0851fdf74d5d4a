use crate::{absent, run, Indicator, Series};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
enum State {
    /// Collecting the first `period` values for the SMA seed.
    Seeding { count: usize, sum: Decimal },
    Smoothing(Decimal),
}

/// Exponential moving average, the building block of MACD.
///
/// Seeded with the SMA of the first `period` values, then
/// `ema = (value - prev) * k + prev` with `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: Decimal,
    state: State,
}

const EMPTY: State = State::Seeding {
    count: 0,
    sum: Decimal::ZERO,
};

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        Self {
            period,
            k: Decimal::TWO / Decimal::from(period + 1),
            state: EMPTY,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self.state {
            State::Smoothing(current) => Some(current),
            State::Seeding { .. } => None,
        }
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.state = match self.state {
            State::Seeding { count, sum } if count + 1 == self.period => {
                State::Smoothing((sum + value) / Decimal::from(self.period))
            }
            State::Seeding { count, sum } => State::Seeding {
                count: count + 1,
                sum: sum + value,
            },
            State::Smoothing(prev) => State::Smoothing((value - prev) * self.k + prev),
        };
        self.value()
    }

    fn reset(&mut self) {
        self.state = EMPTY;
    }

    fn period(&self) -> usize {
        self.period
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, State::Smoothing(_))
    }
}

/// EMA over a dense slice. The seed lands at index `period - 1`.
pub fn ema(values: &[Decimal], period: usize) -> Series {
    match period {
        0 => absent(values.len()),
        _ => run(&mut Ema::new(period), values),
    }
}
