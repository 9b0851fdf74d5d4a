use crate::sma::Sma;
use crate::{Indicator, Series};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;

/// Streaming Bollinger Bands.
///
/// Middle band is the SMA; the bands sit `num_std` population standard
/// deviations (divide by `period`) above and below it.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: Decimal,
    sma: Sma,
    buffer: VecDeque<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: Decimal) -> Self {
        Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period),
            buffer: VecDeque::with_capacity(period),
        }
    }

    /// Population standard deviation of the window around `mean`.
    fn std_dev(&self, mean: Decimal) -> Decimal {
        if self.buffer.len() < 2 {
            return Decimal::ZERO;
        }
        let variance: Decimal = self
            .buffer
            .iter()
            .map(|v| {
                let diff = *v - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / Decimal::from(self.buffer.len());

        decimal_sqrt(variance)
    }

    pub fn next_output(&mut self, value: Decimal) -> Option<BollingerOutput> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }

        let mid = self.sma.next(value)?;
        let width = self.num_std * self.std_dev(mid);
        Some(BollingerOutput {
            upper: mid + width,
            middle: mid,
            lower: mid - width,
        })
    }
}

/// Stop once a Newton step moves the root by less than this fraction of it.
const SQRT_RELATIVE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 24);

/// Square root of a non-negative Decimal; zero for zero or negative input.
///
/// Seeded from the f64 root, then refined with Newton steps until the change
/// is within [`SQRT_RELATIVE_TOLERANCE`] of the root, so tiny variances keep
/// their precision.
pub fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut root = value
        .to_f64()
        .and_then(|f| Decimal::from_f64(f.sqrt()))
        .filter(|r| !r.is_zero())
        .unwrap_or(value);

    for _ in 0..64 {
        let next = (root + value / root) / Decimal::TWO;
        let step = (next - root).abs();
        root = next;
        if step <= root * SQRT_RELATIVE_TOLERANCE {
            break;
        }
    }
    root
}

/// Index-aligned upper, middle and lower bands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

impl BollingerSeries {
    pub fn at(&self, index: usize) -> Option<BollingerOutput> {
        Some(BollingerOutput {
            upper: (*self.upper.get(index)?)?,
            middle: (*self.middle.get(index)?)?,
            lower: (*self.lower.get(index)?)?,
        })
    }
}

/// Bollinger Bands over a slice of closes; absent before `period - 1`.
pub fn bollinger(closes: &[Decimal], period: usize, mult: Decimal) -> BollingerSeries {
    let n = closes.len();
    let mut out = BollingerSeries {
        upper: vec![None; n],
        middle: vec![None; n],
        lower: vec![None; n],
    };
    if period == 0 {
        return out;
    }

    let mut bands = BollingerBands::new(period, mult);
    for (i, close) in closes.iter().enumerate() {
        if let Some(o) = bands.next_output(*close) {
            out.upper[i] = Some(o.upper);
            out.middle[i] = Some(o.middle);
            out.lower[i] = Some(o.lower);
        }
    }
    out
}
