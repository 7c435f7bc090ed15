//! Train command - fits the forecast model from historical price data.
//!
//! Reads the raw price CSV, filters it to one coin, cleans the price
//! column, fits the model, and writes both the artifact and a forecast
//! CSV with uncertainty bounds.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use forecast_model::{ModelConfig, PricePoint, fit, save_artifact};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model_store;

/// Columns the input CSV must carry.
const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "price_usd", "name"];

/// Raw row of the input CSV. The price arrives as text that may carry
/// currency symbols and thousands separators.
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    price_usd: String,
    name: String,
}

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if the data file is missing, required columns are
/// absent, no rows match the requested coin, fitting fails, or the
/// outputs cannot be written.
pub fn run(base: &Path, data: Option<&Path>, coin: &str, horizon: u32) -> Result<()> {
    let data_path = data.map_or_else(|| default_data_path(base), Path::to_path_buf);

    if !data_path.exists() {
        bail!("Data file not found at {}", data_path.display());
    }

    info!(data = %data_path.display(), coin, "Loading historical prices");
    let mut points = load_series(&data_path, coin)?;
    points.sort_by_key(|p| p.ds);

    info!(points = points.len(), "Fitting forecast model");
    let model = fit(&points, &ModelConfig::default())?;

    let artifact_path = model_store::training_output_path(base);
    save_artifact(&model, &artifact_path)?;
    info!(path = %artifact_path.display(), "Model trained successfully and saved");

    let forecast_path = base.join("data").join("forecast_output.csv");
    write_forecast_csv(&model.forecast_with_bounds(horizon), &forecast_path)?;
    info!(path = %forecast_path.display(), horizon, "Forecast saved");

    Ok(())
}

fn default_data_path(base: &Path) -> PathBuf {
    base.join("data").join("cryptocurrency.csv")
}

/// Loads and cleans the price series for one coin.
fn load_series(path: &Path, coin: &str) -> Result<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader.headers().context("Failed to read CSV header")?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!(
                "Expected columns {:?} in the CSV; found {:?}",
                REQUIRED_COLUMNS,
                headers.iter().collect::<Vec<_>>()
            );
        }
    }

    let mut points = Vec::new();
    let mut dropped = 0_usize;
    let mut available: BTreeSet<String> = BTreeSet::new();

    for record in reader.deserialize::<RawRecord>() {
        let record = record.context("Failed to parse CSV record")?;

        if record.name != coin {
            if available.len() < 20 {
                available.insert(record.name);
            }
            continue;
        }

        match (parse_timestamp(&record.timestamp), clean_price(&record.price_usd)) {
            (Some(ds), Some(y)) => points.push(PricePoint { ds, y }),
            _ => dropped += 1,
        }
    }

    if points.is_empty() {
        let sample: Vec<String> = available.into_iter().collect();
        bail!(
            "No rows found for coin '{coin}'. Available sample coins: {}",
            sample.join(", ")
        );
    }

    if dropped > 0 {
        warn!(dropped, coin, "Dropped rows with unparseable values");
    }

    Ok(points)
}

/// Parses a timestamp cell as a datetime or a bare date.
fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Converts a price cell to a float, tolerating thousands separators and
/// a currency symbol.
fn clean_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Writes the forecast rows with uncertainty bounds as
/// `ds,yhat,yhat_lower,yhat_upper`.
fn write_forecast_csv(rows: &[forecast_model::Prediction], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        writer.serialize(row).context("Failed to write forecast row")?;
    }

    writer.flush().context("Failed to flush forecast output")?;
    Ok(())
}
