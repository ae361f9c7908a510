use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::path::PathBuf;

/// Get candle data directory from environment variable or use default
pub fn get_candle_data_dir() -> PathBuf {
    std::env::var("CANDLE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("candle_data"))
}

/// Relative spread between two prices, in percent of the lower one
///
/// Symmetric in its arguments: `percentage_difference(100, 110)` and
/// `percentage_difference(110, 100)` are both `10.0`. A non-positive lower
/// price yields a non-finite or negative result; callers must check first.
pub fn percentage_difference(a: f64, b: f64) -> f64 {
    let lower = a.min(b);
    let upper = a.max(b);
    (upper - lower) / lower * 100.0
}

/// Parse a candle timestamp
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` (midnight UTC) and
/// unix seconds.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = s.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_opt(secs, 0).single() {
            return Ok(dt);
        }
    }

    Err(AppError::Parse(format!("Invalid timestamp: '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_difference() {
        assert_eq!(percentage_difference(100.0, 110.0), 10.0);
        assert_eq!(percentage_difference(110.0, 100.0), 10.0);
        assert_eq!(percentage_difference(50.0, 50.0), 0.0);
        assert!((percentage_difference(0.25, 0.3) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_difference_zero_lower() {
        assert!(!percentage_difference(0.0, 10.0).is_finite());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-02 03:04:05").unwrap(), expected);
        assert_eq!(
            parse_timestamp(&expected.timestamp().to_string()).unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp("2024-01-02").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(matches!(parse_timestamp("yesterday"), Err(AppError::Parse(_))));
    }
}
