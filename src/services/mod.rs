mod candle_source;
mod csv_candle_store;

pub use candle_source::{CandleSource, InMemoryCandleStore};
pub use csv_candle_store::CsvCandleStore;
