//! Model store - locates and loads the trained forecast artifact.
//!
//! Loading happens exactly once, at service startup. A missing or corrupt
//! artifact degrades to "no model"; it never brings the process down.

use std::path::{Path, PathBuf};

use forecast_model::{ForecastModel, load_artifact};
use tracing::{info, warn};

/// Candidate artifact locations, tried in order: the canonical model
/// directory, then the legacy path the training job writes to.
fn candidate_paths(base: &Path) -> [PathBuf; 2] {
    [
        base.join("model").join("model.json"),
        base.join("backend").join("model").join("model.json"),
    ]
}

/// Where the training job writes the artifact (the legacy serving path,
/// kept for backward compatibility with existing deployments).
pub fn training_output_path(base: &Path) -> PathBuf {
    base.join("backend").join("model").join("model.json")
}

/// Loads the forecast artifact from the first candidate path that exists.
///
/// Returns `None` when no artifact is present or the file cannot be
/// deserialized; both cases are logged and the service stays up with
/// prediction permanently unavailable until restart.
pub fn load(base: &Path) -> Option<ForecastModel> {
    let candidates = candidate_paths(base);

    let Some(path) = candidates.iter().find(|p| p.exists()) else {
        warn!(
            searched = %candidates[0].display(),
            fallback = %candidates[1].display(),
            "Model file not found; /predict will return an error until a model is available"
        );
        return None;
    };

    match load_artifact(path) {
        Ok(model) => {
            info!(
                path = %path.display(),
                trained_through = %model.end_ds,
                "Loaded forecast model"
            );
            Some(model)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load model");
            None
        }
    }
}
