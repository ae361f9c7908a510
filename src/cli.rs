use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "volfilter")]
#[command(about = "Volatility-based symbol filter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the low volatility filter over a candle directory
    Filter {
        /// Name of the filter stage to run
        #[arg(short, long, default_value = crate::filters::STAGE_NAME)]
        filter: String,

        /// Path to the stage configuration (JSON object)
        #[arg(short, long)]
        config: PathBuf,

        /// Candle data directory (default: $CANDLE_DATA_DIR or ./candle_data)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Comma-separated symbols to evaluate (default: every symbol in the data directory)
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// List supported timeframes
    Timeframes,
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            filter,
            config,
            data_dir,
            symbols,
        } => {
            commands::filter::run(filter, config, data_dir, symbols);
        }
        Commands::Timeframes => {
            commands::timeframes::run();
        }
    }
}
