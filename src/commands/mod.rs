pub mod filter;
pub mod timeframes;
