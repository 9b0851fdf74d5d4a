use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// One trading day's OHLCV record for a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub stock_id: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Close minus the previous close.
    pub spread: Decimal,
}

impl Bar {
    /// Day-over-day change in percent, derived from `spread`.
    pub fn change_percent(&self) -> Decimal {
        let previous_close = self.close - self.spread;
        if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            self.spread / previous_close * Decimal::ONE_HUNDRED
        }
    }
}

/// Fill in `spread` from consecutive closes. The first bar has no
/// predecessor and gets zero.
pub fn derive_spreads(bars: &mut [Bar]) {
    let mut prev_close: Option<Decimal> = None;
    for bar in bars.iter_mut() {
        bar.spread = match prev_close {
            Some(prev) => (bar.close - prev).round_dp(2),
            None => Decimal::ZERO,
        };
        prev_close = Some(bar.close);
    }
}

/// Column-oriented view of a bar history, index-aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarColumns {
    pub dates: Vec<NaiveDate>,
    pub opens: Vec<Decimal>,
    pub highs: Vec<Decimal>,
    pub lows: Vec<Decimal>,
    pub closes: Vec<Decimal>,
    pub volumes: Vec<Decimal>,
}

impl BarColumns {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut cols = Self {
            dates: Vec::with_capacity(bars.len()),
            opens: Vec::with_capacity(bars.len()),
            highs: Vec::with_capacity(bars.len()),
            lows: Vec::with_capacity(bars.len()),
            closes: Vec::with_capacity(bars.len()),
            volumes: Vec::with_capacity(bars.len()),
        };
        for bar in bars {
            cols.dates.push(bar.date);
            cols.opens.push(bar.open);
            cols.highs.push(bar.high);
            cols.lows.push(bar.low);
            cols.closes.push(bar.close);
            cols.volumes.push(bar.volume);
        }
        cols
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// The condition an alert watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PriceAbove,
    PriceBelow,
    RsiAbove,
    RsiBelow,
    MaCrossAbove,
    MaCrossBelow,
}

impl AlertType {
    pub const ALL: [AlertType; 6] = [
        AlertType::PriceAbove,
        AlertType::PriceBelow,
        AlertType::RsiAbove,
        AlertType::RsiBelow,
        AlertType::MaCrossAbove,
        AlertType::MaCrossBelow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PriceAbove => "price_above",
            AlertType::PriceBelow => "price_below",
            AlertType::RsiAbove => "rsi_above",
            AlertType::RsiBelow => "rsi_below",
            AlertType::MaCrossAbove => "ma_cross_above",
            AlertType::MaCrossBelow => "ma_cross_below",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined alert on one stock.
///
/// `is_triggered` is sticky: once set, the alert is not evaluated again until
/// something outside the engine calls [`AlertDefinition::reset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDefinition {
    pub id: Uuid,
    pub stock_id: String,
    pub alert_type: AlertType,
    /// Threshold for price/RSI alerts. Unused by MA-cross alerts.
    #[serde(default)]
    pub condition_value: Option<Decimal>,
    /// Free-form parameters, e.g. `{"ma_period": 20}`.
    #[serde(default)]
    pub condition_params: Option<serde_json::Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_triggered: bool,
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl AlertDefinition {
    pub fn new(stock_id: &str, alert_type: AlertType, condition_value: Option<Decimal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stock_id: stock_id.to_string(),
            alert_type,
            condition_value,
            condition_params: None,
            is_active: true,
            is_triggered: false,
            triggered_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.condition_params = Some(params);
        self
    }

    /// Active and not yet triggered: the only state the engine evaluates.
    pub fn is_pending(&self) -> bool {
        self.is_active && !self.is_triggered
    }

    pub fn mark_triggered(&mut self, at: DateTime<Utc>) {
        self.is_triggered = true;
        self.triggered_at = Some(at);
    }

    /// Re-arm a triggered alert.
    pub fn reset(&mut self) {
        self.is_triggered = false;
        self.triggered_at = None;
    }
}

/// One entry in an alert's trigger history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertHistoryRecord {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub stock_id: String,
    pub triggered_at: DateTime<Utc>,
    pub trigger_price: Decimal,
    pub message: String,
}
