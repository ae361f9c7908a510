//! Candle CSV Format Constants
//!
//! Each symbol has one directory under the data root, with one file per
//! timeframe named after the timeframe (e.g. `BTCUSDT/1h.csv`).
//!
//! ## Columns
//!
//! `time,open,high,low,close,volume` with a header row. `time` is the close
//! time of the candle.

/// Number of columns in a candle CSV file
pub const CSV_CANDLE_COLUMNS: usize = 6;

/// File extension for candle files
pub const CSV_EXTENSION: &str = "csv";

/// Column indices for candle CSV format (0-indexed)
pub mod csv_column {
    pub const TIME: usize = 0;
    pub const OPEN: usize = 1;
    pub const HIGH: usize = 2;
    pub const LOW: usize = 3;
    pub const CLOSE: usize = 4;
    pub const VOLUME: usize = 5;
}

/// Header row written and expected for candle CSV files
pub const CSV_CANDLE_HEADER: [&str; CSV_CANDLE_COLUMNS] =
    ["time", "open", "high", "low", "close", "volume"];
