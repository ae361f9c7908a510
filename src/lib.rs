//! Volatility-based symbol filter stage
//!
//! One stage of a symbol-selection pipeline: for each candidate symbol it
//! measures the spread between the lowest low and highest high of its most
//! recent candles, drops symbols above a configured ceiling, ranks the rest
//! and optionally keeps the top N.
//!
//! ```no_run
//! use std::sync::Arc;
//! use volfilter::filters::{SymbolFilter, VolatilityFilterStage};
//! use volfilter::services::CsvCandleStore;
//!
//! let config = serde_json::json!({
//!     "reference_timeframe": "1h",
//!     "reference_candle_nr": 24,
//!     "max_threshold": 5.0,
//!     "top": 10
//! });
//! let stage = VolatilityFilterStage::new(&config, Arc::new(CsvCandleStore::new("candle_data")))?;
//! let selected = stage.filter_symbols(&["BTCUSDT".to_string()], true, &[]);
//! # Ok::<(), volfilter::error::AppError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod filters;
pub mod models;
pub mod services;
pub mod utils;
