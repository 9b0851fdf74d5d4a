//! The indicator bundle behind the K-line chart.

use crate::bollinger::{bollinger, BollingerOutput, DEFAULT_BOLLINGER_PERIOD};
use crate::macd::{macd, MacdOutput, MacdParams};
use crate::rsi::{rsi, DEFAULT_RSI_PERIOD};
use crate::sma::sma;
use crate::stochastic::{kd, KdOutput, DEFAULT_KD_PERIOD};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use twstock_core::{Bar, BarColumns};

/// Which indicators to compute and with what parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Moving-average periods drawn over the price chart.
    pub ma_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd: MacdParams,
    pub kd_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: Decimal,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_periods: vec![5, 10, 20, 60, 120, 240],
            rsi_period: DEFAULT_RSI_PERIOD,
            macd: MacdParams::default(),
            kd_period: DEFAULT_KD_PERIOD,
            bollinger_period: DEFAULT_BOLLINGER_PERIOD,
            bollinger_mult: Decimal::TWO,
        }
    }
}

/// One dated entry of an indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<T> {
    pub date: NaiveDate,
    pub value: Option<T>,
}

impl<T> Point<T> {
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Pair each value with the date at the same index.
pub fn align<T: Copy>(dates: &[NaiveDate], values: &[Option<T>]) -> Vec<Point<T>> {
    debug_assert_eq!(dates.len(), values.len());
    dates
        .iter()
        .zip(values)
        .map(|(date, value)| Point {
            date: *date,
            value: *value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub period: usize,
    pub points: Vec<Point<Decimal>>,
}

/// Every chart indicator for one stock, each aligned to the bar dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub moving_averages: Vec<MovingAverage>,
    pub rsi: Vec<Point<Decimal>>,
    pub macd: Vec<Point<MacdOutput>>,
    pub kd: Vec<Point<KdOutput>>,
    pub bollinger: Vec<Point<BollingerOutput>>,
}

impl IndicatorSet {
    /// Compute over the whole history. Bars must be ascending by date.
    pub fn compute(bars: &[Bar], config: &IndicatorConfig) -> Self {
        let cols = BarColumns::from_bars(bars);
        let n = cols.len();

        let moving_averages = config
            .ma_periods
            .iter()
            .map(|&period| MovingAverage {
                period,
                points: align(&cols.dates, &sma(&cols.closes, period)),
            })
            .collect();

        let macd_series = macd(&cols.closes, config.macd);
        let kd_series = kd(&cols.highs, &cols.lows, &cols.closes, config.kd_period);
        let bands = bollinger(&cols.closes, config.bollinger_period, config.bollinger_mult);

        let macd_values: Vec<Option<MacdOutput>> = (0..n).map(|i| macd_series.at(i)).collect();
        let kd_values: Vec<Option<KdOutput>> = (0..n).map(|i| kd_series.at(i)).collect();
        let band_values: Vec<Option<BollingerOutput>> = (0..n).map(|i| bands.at(i)).collect();

        Self {
            moving_averages,
            rsi: align(&cols.dates, &rsi(&cols.closes, config.rsi_period)),
            macd: align(&cols.dates, &macd_values),
            kd: align(&cols.dates, &kd_values),
            bollinger: align(&cols.dates, &band_values),
        }
    }

    /// Keep the most recent `days` points of every series.
    pub fn tail(mut self, days: usize) -> Self {
        fn keep_last<T>(points: &mut Vec<T>, days: usize) {
            let skip = points.len().saturating_sub(days);
            points.drain(..skip);
        }

        for ma in &mut self.moving_averages {
            keep_last(&mut ma.points, days);
        }
        keep_last(&mut self.rsi, days);
        keep_last(&mut self.macd, days);
        keep_last(&mut self.kd, days);
        keep_last(&mut self.bollinger, days);
        self
    }

    /// Drop absent points. The result is for display only and no longer
    /// index-aligned with the bars.
    pub fn present_only(mut self) -> Self {
        for ma in &mut self.moving_averages {
            ma.points.retain(Point::is_present);
        }
        self.rsi.retain(Point::is_present);
        self.macd.retain(Point::is_present);
        self.kd.retain(Point::is_present);
        self.bollinger.retain(Point::is_present);
        self
    }
}
