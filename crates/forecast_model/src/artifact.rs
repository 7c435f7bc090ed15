//! Artifact (de)serialization for fitted models.
//!
//! The artifact is a serde_json document written once by the training job
//! and loaded read-only by the serving process.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ForecastModel;

/// Saves a fitted model to disk, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directories cannot be created or the file
/// cannot be written.
pub fn save_artifact(model: &ForecastModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create model directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(model).context("Failed to serialize model")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write model artifact to {}", path.display()))
}

/// Loads a fitted model from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not contain a
/// valid model.
pub fn load_artifact(path: &Path) -> Result<ForecastModel> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact at {}", path.display()))?;

    serde_json::from_str(&data)
        .with_context(|| format!("Invalid model artifact at {}", path.display()))
}
