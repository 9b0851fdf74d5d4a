use crate::rules::AlertError;
use serde_json::Value;

pub const DEFAULT_MA_PERIOD: usize = 20;

/// Longest accepted MA period, about four years of trading days.
pub const MAX_MA_PERIOD: usize = 1000;

/// Read `ma_period` from an alert's `condition_params`.
///
/// Missing params or a missing key fall back to [`DEFAULT_MA_PERIOD`]. The
/// value must be a whole number in `1..=MAX_MA_PERIOD`; JSON `20` and `20.0`
/// are both accepted.
pub fn ma_period(params: Option<&Value>) -> Result<usize, AlertError> {
    let map = match params {
        None | Some(Value::Null) => return Ok(DEFAULT_MA_PERIOD),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(AlertError::MalformedParameter {
                name: "condition_params".to_string(),
                reason: format!("expected an object, got {other}"),
            })
        }
    };

    let raw = match map.get("ma_period") {
        None | Some(Value::Null) => return Ok(DEFAULT_MA_PERIOD),
        Some(raw) => raw,
    };

    let period = raw.as_u64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64)
    });

    period
        .and_then(|p| usize::try_from(p).ok())
        .filter(|p| (1..=MAX_MA_PERIOD).contains(p))
        .ok_or_else(|| malformed_period(raw))
}

fn malformed_period(raw: &Value) -> AlertError {
    AlertError::MalformedParameter {
        name: "ma_period".to_string(),
        reason: format!("expected a whole number from 1 to {MAX_MA_PERIOD}, got {raw}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        assert_eq!(ma_period(None).unwrap(), 20);
        assert_eq!(ma_period(Some(&Value::Null)).unwrap(), 20);
        assert_eq!(ma_period(Some(&json!({}))).unwrap(), 20);
        assert_eq!(ma_period(Some(&json!({"ma_period": null}))).unwrap(), 20);
    }

    #[test]
    fn test_explicit_period() {
        assert_eq!(ma_period(Some(&json!({"ma_period": 60}))).unwrap(), 60);
        assert_eq!(ma_period(Some(&json!({"ma_period": 10.0}))).unwrap(), 10);
        assert_eq!(ma_period(Some(&json!({"ma_period": 1000}))).unwrap(), MAX_MA_PERIOD);
    }

    #[test]
    fn test_malformed_period() {
        for bad in [
            json!({"ma_period": "20"}),
            json!({"ma_period": 0}),
            json!({"ma_period": -5}),
            json!({"ma_period": 2.5}),
            json!({"ma_period": 1001}),
            json!({"ma_period": u64::MAX}),
        ] {
            match ma_period(Some(&bad)) {
                Err(AlertError::MalformedParameter { name, .. }) => assert_eq!(name, "ma_period"),
                other => panic!("expected malformed parameter for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_params_must_be_object() {
        assert!(matches!(
            ma_period(Some(&json!([20]))),
            Err(AlertError::MalformedParameter { .. })
        ));
    }
}
