use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC price bar for a symbol at a given timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Close time of the bar
    #[serde(with = "chrono::serde::ts_seconds")]
    pub close_time: DateTime<Utc>,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Traded volume in base units
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Create a new candle
    pub fn new(
        close_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            close_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Price range covered by a window of candles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRange {
    /// Lowest low over the window
    pub low: f64,
    /// Highest high over the window
    pub high: f64,
    /// Latest close time in the window
    pub last_close_time: DateTime<Utc>,
}

impl WindowRange {
    /// Lowest low, highest high and latest close time over `candles`.
    ///
    /// Returns `None` for an empty window.
    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        let first = candles.first()?;
        let init = WindowRange {
            low: first.low,
            high: first.high,
            last_close_time: first.close_time,
        };

        Some(candles.iter().skip(1).fold(init, |acc, c| WindowRange {
            low: acc.low.min(c.low),
            high: acc.high.max(c.high),
            last_close_time: acc.last_close_time.max(c.close_time),
        }))
    }
}
