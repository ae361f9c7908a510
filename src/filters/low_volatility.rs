//! Low volatility filter stage
//!
//! Ranks symbols by the spread between the lowest low and the highest high of
//! their most recent candles, drops symbols above a volatility ceiling, and
//! optionally keeps only the top N.

use crate::error::{AppError, Result};
use crate::filters::SymbolFilter;
use crate::models::{Annotation, FilterResult, SortDirection, Timeframe, WindowRange};
use crate::services::CandleSource;
use crate::utils::percentage_difference;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name the stage reports in logs and pipeline configuration
pub const STAGE_NAME: &str = "LowVolatilityFilter";

const KEY_REFERENCE_TIMEFRAME: &str = "reference_timeframe";
const KEY_REFERENCE_CANDLE_NR: &str = "reference_candle_nr";
const KEY_MAX_THRESHOLD: &str = "max_threshold";
const KEY_TOP: &str = "top";
const KEY_SORT: &str = "sort";

const KNOWN_KEYS: [&str; 5] = [
    KEY_REFERENCE_TIMEFRAME,
    KEY_REFERENCE_CANDLE_NR,
    KEY_MAX_THRESHOLD,
    KEY_TOP,
    KEY_SORT,
];

/// Validated configuration of a [`VolatilityFilterStage`]
///
/// Only constructible through [`StageConfig::from_value`], which checks every
/// parameter in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    reference_timeframe: Timeframe,
    reference_candle_nr: usize,
    max_threshold: Option<f64>,
    top: Option<usize>,
    sort: SortDirection,
}

impl StageConfig {
    /// Build from a JSON configuration object
    ///
    /// Recognised keys: `reference_timeframe` (required), `reference_candle_nr`
    /// (required, > 0), `max_threshold` (> 0), `top`, `sort`
    /// (`ascending`/`descending`). A `null` value counts as absent.
    pub fn from_value(config: &Value) -> Result<Self> {
        let map = config.as_object().ok_or_else(|| {
            AppError::Config(format!(
                "{} configuration must be an object, got {}",
                STAGE_NAME, config
            ))
        })?;

        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                debug!(key = %key, "Ignoring unknown {} parameter", STAGE_NAME);
            }
        }

        let sort = match get_present(map, KEY_SORT) {
            Some(Value::String(s)) => SortDirection::from_str(s).map_err(|_| {
                AppError::Config(format!(
                    "If specified, the parameter '{}' needs to be either 'ascending' or 'descending' for the {}, got '{}'",
                    KEY_SORT, STAGE_NAME, s
                ))
            })?,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "The parameter '{}' must be a string, got {}",
                    KEY_SORT, other
                )))
            }
            None => SortDirection::default(),
        };

        let top = match get_present(map, KEY_TOP) {
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        AppError::Config(format!(
                            "The parameter '{}' must be a non-negative integer, got {}",
                            KEY_TOP, value
                        ))
                    })?,
            ),
            None => None,
        };

        let max_threshold = match get_present(map, KEY_MAX_THRESHOLD) {
            Some(value) => {
                let threshold = coerce_float(value).ok_or_else(|| {
                    AppError::Config(format!(
                        "The parameter '{}' must be a number, got {}",
                        KEY_MAX_THRESHOLD, value
                    ))
                })?;
                if !(threshold > 0.0) || !threshold.is_finite() {
                    return Err(AppError::Config(format!(
                        "The parameter '{}' contains a value of {} which is not supported. \
                         If specified, the value must be greater than 0.",
                        KEY_MAX_THRESHOLD, threshold
                    )));
                }
                Some(threshold)
            }
            None => None,
        };

        let reference_timeframe = match get_present(map, KEY_REFERENCE_TIMEFRAME) {
            Some(Value::String(s)) => Timeframe::parse(s)?,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "The parameter '{}' must be a string, got {}",
                    KEY_REFERENCE_TIMEFRAME, other
                )))
            }
            None => {
                return Err(AppError::Config(format!(
                    "{} configuration is missing the mandatory parameter '{}'",
                    STAGE_NAME, KEY_REFERENCE_TIMEFRAME
                )))
            }
        };

        let reference_candle_nr = match get_present(map, KEY_REFERENCE_CANDLE_NR) {
            Some(value) => coerce_integer(value).ok_or_else(|| {
                AppError::Config(format!(
                    "The parameter '{}' must be an integer, got {}",
                    KEY_REFERENCE_CANDLE_NR, value
                ))
            })?,
            None => {
                return Err(AppError::Config(format!(
                    "{} configuration is missing the mandatory parameter '{}'",
                    STAGE_NAME, KEY_REFERENCE_CANDLE_NR
                )))
            }
        };
        if reference_candle_nr <= 0 {
            return Err(AppError::Config(format!(
                "The parameter '{}' for the {} needs to be greater than 0",
                KEY_REFERENCE_CANDLE_NR, STAGE_NAME
            )));
        }
        let reference_candle_nr = usize::try_from(reference_candle_nr).map_err(|_| {
            AppError::Config(format!(
                "The parameter '{}' is too large: {}",
                KEY_REFERENCE_CANDLE_NR, reference_candle_nr
            ))
        })?;

        Ok(Self {
            reference_timeframe,
            reference_candle_nr,
            max_threshold,
            top,
            sort,
        })
    }

    pub fn reference_timeframe(&self) -> Timeframe {
        self.reference_timeframe
    }

    pub fn reference_candle_nr(&self) -> usize {
        self.reference_candle_nr
    }

    pub fn max_threshold(&self) -> Option<f64> {
        self.max_threshold
    }

    pub fn top(&self) -> Option<usize> {
        self.top
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }
}

impl fmt::Display for StageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} threshold={} top={} sort={}",
            self.reference_candle_nr,
            self.reference_timeframe,
            self.max_threshold
                .map_or_else(|| "none".to_string(), |t| t.to_string()),
            self.top.map_or_else(|| "none".to_string(), |t| t.to_string()),
            self.sort.as_str()
        )
    }
}

/// Value for `key`, treating JSON `null` as absent
fn get_present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Integer from a JSON number or numeric string; floats are truncated
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Float from a JSON number or numeric string
fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Volatility of one symbol over the reference window
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMetric {
    pub symbol: String,
    /// Spread between `window_low` and `window_high`, in percent of `window_low`
    pub volatility_ratio: f64,
    pub window_low: f64,
    pub window_high: f64,
    pub last_close_time: DateTime<Utc>,
}

/// Filter stage keeping the least (or most) volatile symbols
pub struct VolatilityFilterStage {
    config: StageConfig,
    candles: Arc<dyn CandleSource>,
}

impl VolatilityFilterStage {
    /// Validate `config` and build the stage. Fails without side effects on
    /// any invalid parameter.
    pub fn new(config: &Value, candles: Arc<dyn CandleSource>) -> Result<Self> {
        let config = StageConfig::from_value(config)?;
        Ok(Self::with_config(config, candles))
    }

    pub fn with_config(config: StageConfig, candles: Arc<dyn CandleSource>) -> Self {
        debug!(stage = STAGE_NAME, config = %config, "Filter stage configured");
        Self { config, candles }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Volatility of `symbol` over the most recent `reference_candle_nr`
    /// candles at `reference_timeframe`.
    ///
    /// Returns [`AppError::DataUnavailable`] when the window is shorter than
    /// configured or its low is not a positive price, and passes through the
    /// source's own errors.
    pub fn measure(&self, symbol: &str) -> Result<SymbolMetric> {
        let timeframe = self.config.reference_timeframe;
        let wanted = self.config.reference_candle_nr;

        let mut candles = self.candles.get_last_candles(symbol, timeframe, wanted)?;
        if candles.len() < wanted {
            return Err(AppError::DataUnavailable(format!(
                "{} has {} of {} required {} candles",
                symbol,
                candles.len(),
                wanted,
                timeframe
            )));
        }

        // Window is exactly the `wanted` most recent candles, whatever the
        // source returned.
        if candles.len() > wanted {
            candles.sort_by_key(|c| c.close_time);
            let excess = candles.len() - wanted;
            candles = candles.split_off(excess);
        }

        let range = WindowRange::from_candles(&candles).ok_or_else(|| {
            AppError::DataUnavailable(format!("{} has no {} candles", symbol, timeframe))
        })?;

        if !(range.low > 0.0) || !range.high.is_finite() {
            return Err(AppError::DataUnavailable(format!(
                "{} has an unusable price range (low {}, high {})",
                symbol, range.low, range.high
            )));
        }

        // A high below the low only comes from corrupt bars; keep it negative
        // so the window is never a candidate.
        let spread = percentage_difference(range.low, range.high);
        let volatility_ratio = if range.high < range.low { -spread } else { spread };

        Ok(SymbolMetric {
            symbol: symbol.to_string(),
            volatility_ratio,
            window_low: range.low,
            window_high: range.high,
            last_close_time: range.last_close_time,
        })
    }

    /// Whether a measured symbol is a candidate: it must have moved at all,
    /// and by no more than `max_threshold` when one is configured.
    fn accepts(&self, metric: &SymbolMetric) -> bool {
        let timeframe = self.config.reference_timeframe;
        let candle_nr = self.config.reference_candle_nr;

        if !(metric.volatility_ratio > 0.0) {
            debug!(
                symbol = %metric.symbol,
                window_low = metric.window_low,
                window_high = metric.window_high,
                candles = candle_nr,
                timeframe = %timeframe,
                last_close = %metric.last_close_time,
                "Not adding symbol: price did not change over the window"
            );
            return false;
        }

        match self.config.max_threshold {
            Some(threshold) if metric.volatility_ratio > threshold => {
                debug!(
                    symbol = %metric.symbol,
                    volatility_ratio = metric.volatility_ratio,
                    max_threshold = threshold,
                    window_low = metric.window_low,
                    window_high = metric.window_high,
                    candles = candle_nr,
                    timeframe = %timeframe,
                    last_close = %metric.last_close_time,
                    "Not adding symbol: volatility threshold exceeded"
                );
                false
            }
            _ => {
                debug!(
                    symbol = %metric.symbol,
                    volatility_ratio = metric.volatility_ratio,
                    window_low = metric.window_low,
                    window_high = metric.window_high,
                    candles = candle_nr,
                    timeframe = %timeframe,
                    last_close = %metric.last_close_time,
                    "Adding symbol as candidate"
                );
                true
            }
        }
    }

    /// Measure, threshold, sort and truncate `symbols`.
    ///
    /// Symbols whose window cannot be measured are skipped with a warning.
    /// Duplicate symbols are evaluated once. Ties keep evaluation order.
    pub fn rank(&self, symbols: &[String]) -> Vec<SymbolMetric> {
        let mut seen = HashSet::with_capacity(symbols.len());
        let mut candidates = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                continue;
            }

            let metric = match self.measure(symbol) {
                Ok(metric) => metric,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Skipping symbol: volatility window unavailable");
                    continue;
                }
            };

            if self.accepts(&metric) {
                candidates.push(metric);
            }
        }

        let sort = self.config.sort;
        candidates.sort_by(|a, b| sort.compare(a.volatility_ratio, b.volatility_ratio));

        if let Some(top) = self.config.top {
            candidates.truncate(top);
        }

        debug!(
            stage = STAGE_NAME,
            ranked = candidates.len(),
            sort = sort.as_str(),
            "Ranked symbols by volatility"
        );
        candidates
    }
}

impl SymbolFilter for VolatilityFilterStage {
    fn name(&self) -> &str {
        STAGE_NAME
    }

    fn filter_symbols(
        &self,
        starting_list: &[String],
        first_filter: bool,
        previous_filter_results: &[FilterResult],
    ) -> FilterResult {
        debug!(
            stage = STAGE_NAME,
            initial = starting_list.len(),
            first_filter,
            previous_stages = previous_filter_results.len(),
            "Filtering symbols"
        );

        let allowed: HashSet<&str> = starting_list.iter().map(String::as_str).collect();
        let mut filtered = FilterResult::new();

        for metric in self.rank(starting_list) {
            if allowed.contains(metric.symbol.as_str()) {
                debug!(
                    symbol = %metric.symbol,
                    volatility_ratio = metric.volatility_ratio,
                    "Allowing symbol based on volatility"
                );
                filtered.insert(metric.symbol, Annotation::new());
            } else {
                debug!(symbol = %metric.symbol, "Discarding symbol not in starting list");
            }
        }

        info!(
            stage = STAGE_NAME,
            initial = starting_list.len(),
            selected = filtered.len(),
            symbols = ?filtered.symbols(),
            "Low volatility filter applied"
        );
        filtered
    }
}
