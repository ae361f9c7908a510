use crate::constants::{csv_column, CSV_CANDLE_HEADER, CSV_EXTENSION};
use crate::error::{AppError, Result};
use crate::models::{Candle, Timeframe};
use crate::services::candle_source::{last_n, sort_and_dedup_by_time, CandleSource};
use crate::utils::parse_timestamp;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Candle source backed by a directory of CSV files
///
/// Layout: `<root>/<SYMBOL>/<timeframe>.csv`, e.g. `candle_data/BTCUSDT/1h.csv`.
#[derive(Debug, Clone)]
pub struct CsvCandleStore {
    root: PathBuf,
}

impl CsvCandleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the CSV file holding `symbol` candles at `timeframe`
    ///
    /// The symbol must be a single plain path component, so every series
    /// stays inside the root.
    pub fn series_path(&self, symbol: &str, timeframe: Timeframe) -> Result<PathBuf> {
        validate_symbol(symbol)?;
        Ok(self
            .root
            .join(symbol)
            .join(format!("{}.{}", timeframe.as_str(), CSV_EXTENSION)))
    }

    /// Symbols with a directory under the root, sorted
    pub fn list_symbols(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Err(AppError::NotFound(format!(
                "Candle data directory {} does not exist",
                self.root.display()
            )));
        }

        let mut symbols: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Write a full series, replacing any existing file
    pub fn write_candles(&self, symbol: &str, timeframe: Timeframe, candles: &[Candle]) -> Result<()> {
        let path = self.series_path(symbol, timeframe)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CSV_CANDLE_HEADER)?;
        for candle in candles {
            writer.write_record(&[
                candle.close_time.to_rfc3339(),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
                candle.volume.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read the complete series, sorted by close time and deduplicated
    fn read_series(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let path = self.series_path(symbol, timeframe)?;
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "No {} candles for {} ({})",
                timeframe,
                symbol,
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)?;

        let mut candles = Vec::with_capacity(1000);
        let mut skipped = 0usize;
        for result in reader.records() {
            let record = result?;
            match parse_candle_record(&record) {
                Ok(candle) => candles.push(candle),
                Err(e) => {
                    skipped += 1;
                    debug!(path = ?path, error = %e, "Skipping malformed candle row");
                }
            }
        }

        let duplicates_removed = sort_and_dedup_by_time(&mut candles);
        debug!(
            symbol,
            timeframe = %timeframe,
            rows_read = candles.len(),
            skipped,
            duplicates_removed,
            "CSV read completed"
        );

        Ok(candles)
    }
}

impl CandleSource for CsvCandleStore {
    fn get_last_candles(&self, symbol: &str, timeframe: Timeframe, amount: usize) -> Result<Vec<Candle>> {
        let candles = self.read_series(symbol, timeframe)?;
        Ok(last_n(&candles, amount))
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    let plain = !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.contains(['/', '\\', '\0'])
        && !Path::new(symbol).is_absolute();
    if plain {
        Ok(())
    } else {
        Err(AppError::InvalidSymbol(symbol.to_string()))
    }
}

fn parse_price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64> {
    let raw = record
        .get(index)
        .ok_or_else(|| AppError::Parse(format!("Missing {} field", name)))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| AppError::Parse(format!("Invalid {} '{}': {}", name, raw, e)))
}

/// Parse one CSV row into a candle
fn parse_candle_record(record: &csv::StringRecord) -> Result<Candle> {
    let time_str = record
        .get(csv_column::TIME)
        .ok_or_else(|| AppError::Parse("Missing time field".to_string()))?;
    let close_time = parse_timestamp(time_str)?;

    // Volume is optional in hand-written files
    let volume = match record.get(csv_column::VOLUME) {
        Some(v) if !v.trim().is_empty() => parse_price(record, csv_column::VOLUME, "volume")?,
        _ => 0.0,
    };

    Ok(Candle {
        close_time,
        open: parse_price(record, csv_column::OPEN, "open")?,
        high: parse_price(record, csv_column::HIGH, "high")?,
        low: parse_price(record, csv_column::LOW, "low")?,
        close: parse_price(record, csv_column::CLOSE, "close")?,
        volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;
    use tempfile::TempDir;

    fn daily(n: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let p = 10.0 + i as f64;
                Candle::new(start + Duration::days(i as i64), p, p + 0.5, p - 0.5, p + 0.25, 1000.0)
            })
            .collect()
    }

    #[test]
    fn test_series_path() {
        let store = CsvCandleStore::new("/data");
        assert_eq!(
            store.series_path("BTCUSDT", Timeframe::Hour4).unwrap(),
            PathBuf::from("/data/BTCUSDT/4h.csv")
        );
    }

    #[test]
    fn test_write_then_read_last_candles() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvCandleStore::new(temp_dir.path());
        let candles = daily(6);
        store.write_candles("SOLUSDT", Timeframe::Day1, &candles).unwrap();

        let last = store.get_last_candles("SOLUSDT", Timeframe::Day1, 2).unwrap();
        assert_eq!(last, candles[4..].to_vec());
    }

    #[test]
    fn test_symbols_escaping_root_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        let outside = CsvCandleStore::new(temp_dir.path());
        outside.write_candles("SECRET", Timeframe::Day1, &daily(1)).unwrap();

        let store = CsvCandleStore::new(&root);
        store.write_candles("BTCUSDT", Timeframe::Day1, &daily(1)).unwrap();

        for symbol in ["../SECRET", "..", ".", "", "a/b", "a\\b", "/etc"] {
            assert!(
                matches!(
                    store.get_last_candles(symbol, Timeframe::Day1, 1),
                    Err(AppError::InvalidSymbol(_))
                ),
                "expected {:?} to be rejected",
                symbol
            );
        }
        assert!(matches!(
            store.write_candles("../SECRET", Timeframe::Day1, &daily(1)),
            Err(AppError::InvalidSymbol(_))
        ));
        assert_eq!(store.get_last_candles("BTCUSDT", Timeframe::Day1, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_series_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvCandleStore::new(temp_dir.path());
        assert!(matches!(
            store.get_last_candles("NOPE", Timeframe::Day1, 3),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_rows_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvCandleStore::new(temp_dir.path());
        let path = store.series_path("ADAUSDT", Timeframe::Hour1).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-02-01 02:00:00,0.5,0.6,0.4,0.55,100").unwrap();
        writeln!(file, "not-a-time,0.5,0.6,0.4,0.55,100").unwrap();
        writeln!(file, "2024-02-01 01:00:00,0.5,abc,0.4,0.55,100").unwrap();
        writeln!(file, "2024-02-01 00:00:00,0.5,0.7,0.3,0.55").unwrap();

        let candles = store.get_last_candles("ADAUSDT", Timeframe::Hour1, 10).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].high, 0.7);
        assert_eq!(candles[0].volume, 0.0);
        assert_eq!(candles[1].high, 0.6);
    }

    #[test]
    fn test_list_symbols() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvCandleStore::new(temp_dir.path());
        store.write_candles("XRPUSDT", Timeframe::Day1, &daily(1)).unwrap();
        store.write_candles("BNBUSDT", Timeframe::Day1, &daily(1)).unwrap();

        assert_eq!(
            store.list_symbols().unwrap(),
            vec!["BNBUSDT".to_string(), "XRPUSDT".to_string()]
        );
        assert!(CsvCandleStore::new(temp_dir.path().join("missing"))
            .list_symbols()
            .is_err());
    }
}
