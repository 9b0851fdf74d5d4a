//! Technical indicators over daily price history.
//!
//! Every indicator exists in two forms: a streaming kernel that implements
//! [`Indicator`] and is fed one value at a time, and a batch function that
//! walks a whole slice and returns one output per input index. Batch output is
//! always the same length as the input; indices before the warm-up point are
//! `None`.

pub mod bollinger;
pub mod chart;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use bollinger::{bollinger, BollingerOutput, BollingerSeries};
pub use chart::{align, IndicatorConfig, IndicatorSet, Point};
pub use ema::ema;
pub use macd::{macd, MacdOutput, MacdParams, MacdSeries};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use sma::sma;
pub use stochastic::{kd, KdOutput, KdSeries, DEFAULT_KD_PERIOD};

use rust_decimal::Decimal;

/// Index-aligned indicator values; `None` marks an index with no value yet.
pub type Series = Vec<Option<Decimal>>;

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: Decimal) -> Option<Decimal>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

/// Feed every value through `indicator`, collecting one output per input.
pub fn run<I: Indicator + ?Sized>(indicator: &mut I, values: &[Decimal]) -> Series {
    values.iter().map(|v| indicator.next(*v)).collect()
}

/// A series of `len` absent values.
pub(crate) fn absent(len: usize) -> Series {
    vec![None; len]
}
