use crate::error::Result;
use crate::filters;
use crate::models::FilterResult;
use crate::services::CsvCandleStore;
use crate::utils::get_candle_data_dir;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn run(filter: String, config_path: PathBuf, data_dir: Option<PathBuf>, symbols: Vec<String>) {
    let data_dir = data_dir.unwrap_or_else(get_candle_data_dir);

    match run_filter(&filter, &config_path, &data_dir, symbols) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load the stage config, open the candle directory and run one filter pass
///
/// The stage is built before the data directory is touched, so a bad config
/// is reported as such even when the directory is missing.
pub fn run_filter(filter: &str, config_path: &Path, data_dir: &Path, symbols: Vec<String>) -> Result<FilterResult> {
    let raw = std::fs::read_to_string(config_path)?;
    let config: serde_json::Value = serde_json::from_str(&raw)?;

    let store = Arc::new(CsvCandleStore::new(data_dir));
    let stage = filters::build(filter, &config, store.clone())?;

    let symbols = if symbols.is_empty() {
        store.list_symbols()?
    } else {
        symbols
    };
    tracing::info!(
        filter = stage.name(),
        data_dir = %store.root().display(),
        symbols = symbols.len(),
        "Running symbol filter"
    );

    Ok(stage.filter_symbols(&symbols, true, &[]))
}
