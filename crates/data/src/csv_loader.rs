use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use twstock_core::{derive_spreads, Bar, DataError};

/// Offset between the ROC (Minguo) calendar year and the Gregorian year.
const ROC_YEAR_OFFSET: i32 = 1911;

/// Load daily bars from a CSV file. The stock id is the file stem.
///
/// See [`read_bars`] for the accepted layout.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let stock_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| DataError::NotFound(format!("Not a file: {}", path.display())))?;

    let file = std::fs::File::open(path)?;
    read_bars(file, &stock_id)
}

/// Read daily bars for `stock_id` from CSV.
///
/// Expected columns (case-insensitive, any order):
/// `date` (or `timestamp`), `open`, `high`, `low`, `close`, and optionally
/// `volume` and `spread`. Numbers may carry thousands separators. Rows whose
/// close is `-` or `--` (no trades that day) are skipped.
///
/// The result is sorted by date. Spreads are derived from consecutive closes
/// when the file has no `spread` column.
pub fn read_bars<R: Read>(reader: R, stock_id: &str) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        if is_no_trade(field(col_map.close)) {
            debug!(stock_id, date = field(col_map.date), "Skipping row without trades");
            continue;
        }

        let date = parse_date(field(col_map.date))?;
        let volume = match col_map.volume {
            Some(idx) => parse_number(field(idx), "volume")?,
            None => Decimal::ZERO,
        };
        let spread = match col_map.spread {
            Some(idx) => parse_number(field(idx), "spread")?,
            None => Decimal::ZERO,
        };

        bars.push(Bar {
            stock_id: stock_id.to_string(),
            date,
            open: parse_number(field(col_map.open), "open")?,
            high: parse_number(field(col_map.high), "high")?,
            low: parse_number(field(col_map.low), "low")?,
            close: parse_number(field(col_map.close), "close")?,
            volume,
            spread,
        });
    }

    bars.sort_by_key(|b| b.date);
    if col_map.spread.is_none() {
        derive_spreads(&mut bars);
    }
    Ok(bars)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    spread: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let date = find_column(headers, &["date", "timestamp", "datetime", "trade_date"])
        .ok_or_else(|| DataError::ParseError("No date column found".into()))?;
    let open = find_column(headers, &["open", "o"])
        .ok_or_else(|| DataError::ParseError("No open column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;

    Ok(BarColumnMap {
        date,
        open,
        high,
        low,
        close,
        volume: find_column(headers, &["volume", "vol", "v"]),
        spread: find_column(headers, &["spread", "change"]),
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header.trim().to_lowercase().as_str()))
}

fn is_no_trade(s: &str) -> bool {
    matches!(s.trim(), "" | "-" | "--")
}

fn parse_number(s: &str, field: &str) -> Result<Decimal, DataError> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    Decimal::from_str(cleaned)
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();
    let invalid = || DataError::ParseError(format!("Unable to parse date: '{}'", s));

    // ROC calendar, e.g. 113/01/02
    if let Some((year, rest)) = s.split_once('/') {
        if (1..=3).contains(&year.len()) {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let gregorian = format!("{}/{}", year + ROC_YEAR_OFFSET, rest);
            return NaiveDate::parse_from_str(&gregorian, "%Y/%m/%d").map_err(|_| invalid());
        }
    }

    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-02").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date("2024/01/02").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date("20240102").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date("113/01/02").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date(" 99/12/31 ").unwrap(), ymd(2010, 12, 31));
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_number_with_separators() {
        assert_eq!(parse_number("1,234,567", "volume").unwrap(), dec!(1234567));
        assert_eq!(parse_number("+1.50", "spread").unwrap(), dec!(1.50));
        assert_eq!(parse_number("-0.5", "spread").unwrap(), dec!(-0.5));
        assert!(parse_number("abc", "close").is_err());
    }

    #[test]
    fn test_read_bars_sorts_and_derives_spread() {
        let data = "\
Date,Open,High,Low,Close,Volume
2024-01-03,101,103,100,102.5,\"12,000\"
2024-01-02,99,101,98,100,\"10,000\"
2024-01-04,102,104,101,101,\"9,500\"
";
        let bars = read_bars(data.as_bytes(), "2330").unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, ymd(2024, 1, 2));
        assert_eq!(bars[0].spread, Decimal::ZERO);
        assert_eq!(bars[1].spread, dec!(2.5));
        assert_eq!(bars[2].spread, dec!(-1.5));
        assert_eq!(bars[1].volume, dec!(12000));
        assert!(bars.iter().all(|b| b.stock_id == "2330"));
    }

    #[test]
    fn test_read_bars_keeps_spread_column() {
        let data = "\
timestamp,close,open,high,low,spread
113/05/02,600,590,605,588,+10
113/05/03,598,600,602,595,-2
";
        let bars = read_bars(data.as_bytes(), "2330").unwrap();

        assert_eq!(bars[0].date, ymd(2024, 5, 2));
        assert_eq!(bars[0].spread, dec!(10));
        assert_eq!(bars[1].spread, dec!(-2));
        assert_eq!(bars[1].volume, Decimal::ZERO);
    }

    #[test]
    fn test_read_bars_skips_no_trade_rows() {
        let data = "\
date,open,high,low,close
20240102,10,11,9,10
20240103,--,--,--,--
20240104,10,12,10,11
";
        let bars = read_bars(data.as_bytes(), "6488").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].spread, dec!(1));
    }

    #[test]
    fn test_read_bars_requires_columns() {
        let data = "date,open,high,low\n2024-01-02,1,1,1\n";
        let err = read_bars(data.as_bytes(), "2330").unwrap_err();
        assert!(matches!(err, DataError::ParseError(msg) if msg.contains("close")));
    }
}
