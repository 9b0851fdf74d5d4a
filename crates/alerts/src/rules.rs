use crate::params::ma_period;
use rust_decimal::Decimal;
use twstock_core::{AlertDefinition, AlertType, Bar, DataError};
use twstock_indicators::{rsi, sma, DEFAULT_RSI_PERIOD};

/// Why a single alert could not be evaluated.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("No price data for {0}")]
    NoPriceData(String),
    #[error("Alert type {alert_type} requires a condition value")]
    MissingThreshold { alert_type: AlertType },
    #[error("Malformed parameter `{name}`: {reason}")]
    MalformedParameter { name: String, reason: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Details of a fired alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Latest close at evaluation time.
    pub trigger_price: Decimal,
    /// The value the condition looked at: close, RSI or today's MA.
    pub observed: Decimal,
    pub message: String,
}

/// Result of evaluating one alert against its price history.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Fired(Trigger),
    NotFired,
    /// The indicator the rule needs has no value yet for the latest bar.
    InsufficientData { required: usize, available: usize },
}

impl Evaluation {
    pub fn fired(&self) -> bool {
        matches!(self, Evaluation::Fired(_))
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        match self {
            Evaluation::Fired(t) => Some(t),
            _ => None,
        }
    }
}

/// Decide whether `definition` fires on `bars` (ascending by date).
///
/// Pure: the caller filters out inactive or already-triggered alerts and
/// records the trigger.
pub fn evaluate(definition: &AlertDefinition, bars: &[Bar]) -> Result<Evaluation, AlertError> {
    let latest = bars
        .last()
        .ok_or_else(|| AlertError::NoPriceData(definition.stock_id.clone()))?;

    match definition.alert_type {
        AlertType::PriceAbove | AlertType::PriceBelow => check_price(definition, latest),
        AlertType::RsiAbove | AlertType::RsiBelow => check_rsi(definition, bars, latest),
        AlertType::MaCrossAbove | AlertType::MaCrossBelow => check_ma_cross(definition, bars, latest),
    }
}

fn threshold(definition: &AlertDefinition) -> Result<Decimal, AlertError> {
    definition.condition_value.ok_or(AlertError::MissingThreshold {
        alert_type: definition.alert_type,
    })
}

fn check_price(definition: &AlertDefinition, latest: &Bar) -> Result<Evaluation, AlertError> {
    let limit = threshold(definition)?;
    let close = latest.close;
    let stock = &definition.stock_id;

    let message = match definition.alert_type {
        AlertType::PriceAbove if close > limit => format!("{stock} 股價 {close} 突破 {limit}"),
        AlertType::PriceBelow if close < limit => format!("{stock} 股價 {close} 跌破 {limit}"),
        _ => return Ok(Evaluation::NotFired),
    };

    Ok(Evaluation::Fired(Trigger {
        trigger_price: close,
        observed: close,
        message,
    }))
}

fn check_rsi(definition: &AlertDefinition, bars: &[Bar], latest: &Bar) -> Result<Evaluation, AlertError> {
    let limit = threshold(definition)?;
    let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();

    let Some(value) = rsi(&closes, DEFAULT_RSI_PERIOD).last().copied().flatten() else {
        return Ok(Evaluation::InsufficientData {
            required: DEFAULT_RSI_PERIOD + 1,
            available: bars.len(),
        });
    };

    let stock = &definition.stock_id;
    let message = match definition.alert_type {
        AlertType::RsiAbove if value > limit => {
            format!("{stock} RSI({DEFAULT_RSI_PERIOD}) = {value:.1} 超過 {limit}")
        }
        AlertType::RsiBelow if value < limit => {
            format!("{stock} RSI({DEFAULT_RSI_PERIOD}) = {value:.1} 低於 {limit}")
        }
        _ => return Ok(Evaluation::NotFired),
    };

    Ok(Evaluation::Fired(Trigger {
        trigger_price: latest.close,
        observed: value,
        message,
    }))
}

/// Fires only on the bar where the close crosses the MA, not while it stays
/// on the far side.
fn check_ma_cross(definition: &AlertDefinition, bars: &[Bar], latest: &Bar) -> Result<Evaluation, AlertError> {
    let period = ma_period(definition.condition_params.as_ref())?;
    let insufficient = Evaluation::InsufficientData {
        required: period + 1,
        available: bars.len(),
    };
    if bars.len() < period + 1 {
        return Ok(insufficient);
    }

    let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
    let ma = sma(&closes, period);
    let n = closes.len();

    let (Some(ma_today), Some(ma_yesterday)) = (ma[n - 1], ma[n - 2]) else {
        return Ok(insufficient);
    };
    let today = closes[n - 1];
    let yesterday = closes[n - 2];

    let stock = &definition.stock_id;
    let message = match definition.alert_type {
        AlertType::MaCrossAbove if today > ma_today && yesterday <= ma_yesterday => {
            format!("{stock} 股價突破 MA{period} ({ma_today:.2})")
        }
        AlertType::MaCrossBelow if today < ma_today && yesterday >= ma_yesterday => {
            format!("{stock} 股價跌破 MA{period} ({ma_today:.2})")
        }
        _ => return Ok(Evaluation::NotFired),
    };

    Ok(Evaluation::Fired(Trigger {
        trigger_price: latest.close,
        observed: ma_today,
        message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn history(closes: &[Decimal]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar {
                stock_id: "2330".to_string(),
                date: start + chrono::Days::new(i as u64),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: dec!(1000),
                spread: Decimal::ZERO,
            })
            .collect()
    }

    fn alert(alert_type: AlertType, value: Option<Decimal>) -> AlertDefinition {
        AlertDefinition::new("2330", alert_type, value)
    }

    #[test]
    fn test_price_above_is_strict() {
        let def = alert(AlertType::PriceAbove, Some(dec!(600)));
        assert_eq!(evaluate(&def, &history(&[dec!(600)])).unwrap(), Evaluation::NotFired);

        let result = evaluate(&def, &history(&[dec!(590), dec!(600.5)])).unwrap();
        let trigger = result.trigger().unwrap();
        assert_eq!(trigger.trigger_price, dec!(600.5));
        assert!(trigger.message.contains("2330"));
        assert!(trigger.message.contains("600.5"));
        assert!(trigger.message.contains("600"));
    }

    #[test]
    fn test_price_below_is_strict() {
        let def = alert(AlertType::PriceBelow, Some(dec!(500)));
        assert!(!evaluate(&def, &history(&[dec!(500)])).unwrap().fired());
        assert!(evaluate(&def, &history(&[dec!(499.5)])).unwrap().fired());
    }

    #[test]
    fn test_missing_threshold() {
        let def = alert(AlertType::PriceAbove, None);
        assert!(matches!(
            evaluate(&def, &history(&[dec!(1)])),
            Err(AlertError::MissingThreshold { alert_type: AlertType::PriceAbove })
        ));
    }

    #[test]
    fn test_no_price_data() {
        let def = alert(AlertType::PriceAbove, Some(dec!(1)));
        assert!(matches!(evaluate(&def, &[]), Err(AlertError::NoPriceData(id)) if id == "2330"));
    }

    #[test]
    fn test_rsi_needs_fifteen_bars() {
        let def = alert(AlertType::RsiAbove, Some(dec!(70)));
        let closes: Vec<Decimal> = (0..14).map(|i| dec!(100) + Decimal::from(i)).collect();
        assert_eq!(
            evaluate(&def, &history(&closes)).unwrap(),
            Evaluation::InsufficientData { required: 15, available: 14 }
        );
    }

    #[test]
    fn test_rsi_above_uses_last_value() {
        let closes: Vec<Decimal> = (0..30).map(|i| dec!(100) + Decimal::from(i)).collect();
        let bars = history(&closes);

        let above = evaluate(&alert(AlertType::RsiAbove, Some(dec!(70))), &bars).unwrap();
        let trigger = above.trigger().unwrap();
        assert_eq!(trigger.observed, dec!(100));
        assert_eq!(trigger.trigger_price, dec!(129));
        assert!(trigger.message.contains("RSI(14)"));
        assert!(trigger.message.contains("100.0"));

        let below = evaluate(&alert(AlertType::RsiBelow, Some(dec!(30))), &bars).unwrap();
        assert_eq!(below, Evaluation::NotFired);
    }

    #[test]
    fn test_rsi_below_fires_on_falling_prices() {
        let closes: Vec<Decimal> = (0..20).map(|i| dec!(100) - Decimal::from(i)).collect();
        let result = evaluate(&alert(AlertType::RsiBelow, Some(dec!(30))), &history(&closes)).unwrap();
        assert_eq!(result.trigger().unwrap().observed, Decimal::ZERO);
    }

    /// 20 flat bars, 5 bars under the MA, one bar crossing above, then
    /// bars that stay above.
    fn crossing_closes() -> Vec<Decimal> {
        let mut closes = vec![dec!(100); 20];
        closes.extend([dec!(95); 5]);
        closes.extend([dec!(110), dec!(112), dec!(115), dec!(118)]);
        closes
    }

    #[test]
    fn test_ma_cross_above_fires_once() {
        let def = alert(AlertType::MaCrossAbove, None).with_params(json!({"ma_period": 20}));
        let closes = crossing_closes();
        let bars = history(&closes);
        let cross_index = 25;

        for end in 21..=bars.len() {
            let result = evaluate(&def, &bars[..end]).unwrap();
            assert_eq!(result.fired(), end - 1 == cross_index, "bar {}", end - 1);
        }

        let trigger = evaluate(&def, &bars[..=cross_index]).unwrap();
        let trigger = trigger.trigger().unwrap();
        // window: 14 x 100, 5 x 95, 110
        assert_eq!(trigger.observed, dec!(99.25));
        assert_eq!(trigger.trigger_price, dec!(110));
        assert!(trigger.message.contains("MA20"));
        assert!(trigger.message.contains("99.25"));
    }

    #[test]
    fn test_ma_cross_below_fires_once() {
        let def = alert(AlertType::MaCrossBelow, None);
        let closes: Vec<Decimal> = crossing_closes().iter().map(|c| dec!(200) - *c).collect();
        let bars = history(&closes);

        let fired: Vec<usize> = (21..=bars.len())
            .filter(|&end| evaluate(&def, &bars[..end]).unwrap().fired())
            .map(|end| end - 1)
            .collect();
        assert_eq!(fired, vec![25]);
    }

    #[test]
    fn test_ma_cross_needs_period_plus_one() {
        let def = alert(AlertType::MaCrossAbove, None).with_params(json!({"ma_period": 5}));
        let bars = history(&[dec!(1); 5]);
        assert_eq!(
            evaluate(&def, &bars).unwrap(),
            Evaluation::InsufficientData { required: 6, available: 5 }
        );
    }

    #[test]
    fn test_ma_cross_malformed_period() {
        let def = alert(AlertType::MaCrossAbove, None).with_params(json!({"ma_period": "twenty"}));
        assert!(matches!(
            evaluate(&def, &history(&[dec!(1); 30])),
            Err(AlertError::MalformedParameter { .. })
        ));
    }

    #[test]
    fn test_ma_cross_huge_period_is_malformed() {
        let def = alert(AlertType::MaCrossAbove, None).with_params(json!({"ma_period": u64::MAX}));
        assert!(matches!(
            evaluate(&def, &history(&[dec!(1); 30])),
            Err(AlertError::MalformedParameter { .. })
        ));
    }
}
