//! Cryptocurrency price forecasting service.
//!
//! Trains a univariate price model from historical data and serves
//! forecasts over HTTP, persisting them to the database on a best-effort
//! basis.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod model_store;
mod server;

/// Cryptocurrency price forecasting service
#[derive(Parser)]
#[command(name = "crypto-forecast")]
#[command(about = "Trains and serves cryptocurrency price forecasts")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the forecast model from historical price data
    Train {
        /// Path to the input CSV
        /// (default: `data/cryptocurrency.csv` under the base path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Name of the coin to fit the model to
        #[arg(short, long, default_value = "Bitcoin")]
        coin: String,

        /// Days to forecast into the training output file
        #[arg(long, default_value = "30")]
        horizon: u32,
    },

    /// Run the forecast HTTP service
    Serve {
        /// Address to bind the HTTP server to
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Train {
            data,
            coin,
            horizon,
        } => {
            let base = config::get_base_path();
            commands::train::run(&base, data.as_deref(), &coin, horizon)?;
        }
        Commands::Serve { bind } => {
            commands::serve::run(&bind).await?;
        }
    }

    Ok(())
}
