use crate::error::{AppError, Result};
use crate::models::{Candle, Timeframe};
use std::collections::HashMap;
use tracing::debug;

/// Read-only access to the most recent candles of a symbol
///
/// Implementations return at most `amount` candles, oldest first (the most
/// recent candle is last). Fewer candles than requested is not an error;
/// callers decide whether a short window is usable. A series that does not
/// exist at all is reported as [`AppError::NotFound`].
pub trait CandleSource: Send + Sync {
    fn get_last_candles(&self, symbol: &str, timeframe: Timeframe, amount: usize) -> Result<Vec<Candle>>;
}

/// Sort candles by close time and drop duplicates, keeping the last one
/// written for a given close time. Returns the number of duplicates removed.
pub(crate) fn sort_and_dedup_by_time(candles: &mut Vec<Candle>) -> usize {
    candles.sort_by_key(|c| c.close_time);

    let before = candles.len();
    let mut deduped: Vec<Candle> = Vec::with_capacity(before);
    for candle in candles.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.close_time == candle.close_time => *last = candle,
            _ => deduped.push(candle),
        }
    }
    *candles = deduped;
    before - candles.len()
}

/// Tail of a time-ordered series
pub(crate) fn last_n(candles: &[Candle], amount: usize) -> Vec<Candle> {
    let start = candles.len().saturating_sub(amount);
    candles[start..].to_vec()
}

/// In-memory candle store: (symbol, timeframe) -> candles ordered by close time
#[derive(Debug, Default, Clone)]
pub struct InMemoryCandleStore {
    series: HashMap<(String, Timeframe), Vec<Candle>>,
}

impl InMemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge candles into the series for `symbol`/`timeframe`.
    pub fn insert(&mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) {
        let series = self
            .series
            .entry((symbol.to_string(), timeframe))
            .or_default();
        series.extend(candles);

        let duplicates_removed = sort_and_dedup_by_time(series);
        if duplicates_removed > 0 {
            debug!(
                symbol,
                timeframe = %timeframe,
                duplicates_removed,
                "Deduplicated candles on insert"
            );
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_candles(mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.insert(symbol, timeframe, candles);
        self
    }

    /// All symbols with at least one series, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

impl CandleSource for InMemoryCandleStore {
    fn get_last_candles(&self, symbol: &str, timeframe: Timeframe, amount: usize) -> Result<Vec<Candle>> {
        let series = self
            .series
            .get(&(symbol.to_string(), timeframe))
            .ok_or_else(|| AppError::NotFound(format!("No {} candles for {}", timeframe, symbol)))?;

        Ok(last_n(series, amount))
    }
}
