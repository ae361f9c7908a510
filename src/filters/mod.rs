//! Symbol filter stages
//!
//! A filter stage receives the symbols that survived the previous stage (or
//! the initial universe) and returns a further-narrowed, ranked subset. Stages
//! never add symbols, so the final intersection of a pipeline does not depend
//! on the order in which stages run.

pub mod low_volatility;

use crate::error::{AppError, Result};
use crate::models::FilterResult;
use crate::services::CandleSource;
use serde_json::Value;
use std::sync::Arc;

pub use low_volatility::{StageConfig, SymbolMetric, VolatilityFilterStage, STAGE_NAME};

/// Names accepted by [`build`]
pub fn available() -> Vec<&'static str> {
    vec![low_volatility::STAGE_NAME]
}

/// Contract shared by every chainable filter stage
pub trait SymbolFilter: Send + Sync {
    /// Stage name used in logs and pipeline configuration
    fn name(&self) -> &str;

    /// Narrow `starting_list` down to the symbols this stage accepts.
    ///
    /// `first_filter` is set when this stage runs first in its pipeline, and
    /// `previous_filter_results` holds the outputs of the stages already run.
    /// Every key of the returned result is an element of `starting_list`.
    fn filter_symbols(
        &self,
        starting_list: &[String],
        first_filter: bool,
        previous_filter_results: &[FilterResult],
    ) -> FilterResult;
}

/// Build the stage registered under `name` from its configuration
///
/// Unknown names fail with [`AppError::Config`], as do invalid configs.
pub fn build(name: &str, config: &Value, candles: Arc<dyn CandleSource>) -> Result<Box<dyn SymbolFilter>> {
    match name {
        low_volatility::STAGE_NAME => Ok(Box::new(VolatilityFilterStage::new(config, candles)?)),
        _ => Err(AppError::Config(format!(
            "Unknown filter '{}'. Available filters: {}",
            name,
            available().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryCandleStore;
    use serde_json::json;

    #[test]
    fn test_build_by_name() {
        let config = json!({"reference_timeframe": "1h", "reference_candle_nr": 4});
        let stage = build("LowVolatilityFilter", &config, Arc::new(InMemoryCandleStore::new())).unwrap();
        assert_eq!(stage.name(), "LowVolatilityFilter");
    }

    #[test]
    fn test_build_unknown_name() {
        let config = json!({"reference_timeframe": "1h", "reference_candle_nr": 4});
        let result = build("Last24hPriceChangePctFilter", &config, Arc::new(InMemoryCandleStore::new()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_build_invalid_config() {
        let result = build("LowVolatilityFilter", &json!({}), Arc::new(InMemoryCandleStore::new()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
