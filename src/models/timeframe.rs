use crate::error::AppError;
use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Bar duration of a candle series
///
/// Variants are declared from shortest to longest, so the derived ordering
/// sorts timeframes by duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timeframe {
    /// 1-minute candles
    Minute1,
    /// 3-minute candles
    Minute3,
    /// 5-minute candles
    Minute5,
    /// 15-minute candles
    Minute15,
    /// 30-minute candles
    Minute30,
    /// 1-hour candles
    Hour1,
    /// 2-hour candles
    Hour2,
    /// 4-hour candles
    Hour4,
    /// 6-hour candles
    Hour6,
    /// 8-hour candles
    Hour8,
    /// 12-hour candles
    Hour12,
    /// Daily candles
    Day1,
    /// 3-day candles
    Day3,
    /// Weekly candles
    Week1,
    /// Monthly candles
    Month1,
}

impl Timeframe {
    /// Canonical string form ("1m", "1h", "1d", "1M", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute3 => "3m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour2 => "2h",
            Timeframe::Hour4 => "4h",
            Timeframe::Hour6 => "6h",
            Timeframe::Hour8 => "8h",
            Timeframe::Hour12 => "12h",
            Timeframe::Day1 => "1d",
            Timeframe::Day3 => "3d",
            Timeframe::Week1 => "1w",
            Timeframe::Month1 => "1M",
        }
    }

    /// Nominal duration of one candle. A month counts as 30 days.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Minute1 => Duration::minutes(1),
            Timeframe::Minute3 => Duration::minutes(3),
            Timeframe::Minute5 => Duration::minutes(5),
            Timeframe::Minute15 => Duration::minutes(15),
            Timeframe::Minute30 => Duration::minutes(30),
            Timeframe::Hour1 => Duration::hours(1),
            Timeframe::Hour2 => Duration::hours(2),
            Timeframe::Hour4 => Duration::hours(4),
            Timeframe::Hour6 => Duration::hours(6),
            Timeframe::Hour8 => Duration::hours(8),
            Timeframe::Hour12 => Duration::hours(12),
            Timeframe::Day1 => Duration::days(1),
            Timeframe::Day3 => Duration::days(3),
            Timeframe::Week1 => Duration::weeks(1),
            Timeframe::Month1 => Duration::days(30),
        }
    }

    /// Parse from a human-readable string
    ///
    /// `1M` is a month and `1m` a minute; everything else is matched
    /// case-insensitively, with a few long-form aliases ("hourly", "daily").
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let trimmed = s.trim();
        match trimmed {
            "1M" => return Ok(Timeframe::Month1),
            "1m" => return Ok(Timeframe::Minute1),
            _ => {}
        }

        match trimmed.to_lowercase().as_str() {
            "3m" => Ok(Timeframe::Minute3),
            "5m" => Ok(Timeframe::Minute5),
            "15m" => Ok(Timeframe::Minute15),
            "30m" => Ok(Timeframe::Minute30),
            "1h" | "hourly" => Ok(Timeframe::Hour1),
            "2h" => Ok(Timeframe::Hour2),
            "4h" => Ok(Timeframe::Hour4),
            "6h" => Ok(Timeframe::Hour6),
            "8h" => Ok(Timeframe::Hour8),
            "12h" => Ok(Timeframe::Hour12),
            "1d" | "daily" => Ok(Timeframe::Day1),
            "3d" => Ok(Timeframe::Day3),
            "1w" | "weekly" => Ok(Timeframe::Week1),
            "monthly" => Ok(Timeframe::Month1),
            _ => Err(AppError::Config(format!(
                "Invalid timeframe: '{}'. Valid options: {}",
                s,
                Timeframe::all()
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Get all available timeframes, shortest first
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::Minute1,
            Timeframe::Minute3,
            Timeframe::Minute5,
            Timeframe::Minute15,
            Timeframe::Minute30,
            Timeframe::Hour1,
            Timeframe::Hour2,
            Timeframe::Hour4,
            Timeframe::Hour6,
            Timeframe::Hour8,
            Timeframe::Hour12,
            Timeframe::Day1,
            Timeframe::Day3,
            Timeframe::Week1,
            Timeframe::Month1,
        ]
    }
}

impl FromStr for Timeframe {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::parse(s)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timeframe::parse(&s).map_err(serde::de::Error::custom)
    }
}
