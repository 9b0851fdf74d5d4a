use crate::ema::ema;
use crate::Series;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// MACD periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    /// Standard MACD (12, 26, 9).
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// MACD output at a single index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub dif: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Index-aligned MACD components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    /// Fast EMA minus slow EMA.
    pub dif: Series,
    /// EMA of the defined `dif` values.
    pub signal: Series,
    /// `dif - signal`.
    pub histogram: Series,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.dif.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dif.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<MacdOutput> {
        Some(MacdOutput {
            dif: (*self.dif.get(index)?)?,
            signal: (*self.signal.get(index)?)?,
            histogram: (*self.histogram.get(index)?)?,
        })
    }
}

/// MACD (Moving Average Convergence Divergence) over a slice of closes.
///
/// The signal line is an EMA of `dif`, but `dif` is absent until the slow EMA
/// seeds. The defined values are compacted into a dense slice, run through
/// [`ema`], and scattered back to their original indices, so the signal EMA
/// seeds from real values only.
pub fn macd(closes: &[Decimal], params: MacdParams) -> MacdSeries {
    let n = closes.len();
    let fast = ema(closes, params.fast);
    let slow = ema(closes, params.slow);

    let dif: Series = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // Compact
    let (indices, dense): (Vec<usize>, Vec<Decimal>) = dif
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .unzip();

    // Compute + scatter
    let mut signal: Series = vec![None; n];
    for (value, &index) in ema(&dense, params.signal).into_iter().zip(&indices) {
        signal[index] = value;
    }

    let histogram: Series = dif
        .iter()
        .zip(&signal)
        .map(|(d, s)| Some((*d)? - (*s)?))
        .collect();

    MacdSeries {
        dif,
        signal,
        histogram,
    }
}
