//! Persisted estimator state.
//!
//! The forest and both scalers live in one JSON document,
//! `<model_dir>/estimator.json`, so they can never be swapped independently.
//! Writes go through `atomic-write-file`: readers see the old file or the new
//! one, never a partial write.

use std::fs::File;
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;
use tracing::info;

use crate::error::{AppError, ScoreError};
use crate::models::{Estimator, TrainedEstimatorState};

pub const STATE_FILE_NAME: &str = "estimator.json";

pub fn state_path(model_dir: &Path) -> PathBuf {
    model_dir.join(STATE_FILE_NAME)
}

/// Save the trained state atomically. Creates `model_dir` if needed.
pub fn save_state(model_dir: &Path, state: &TrainedEstimatorState) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(model_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create model directory '{}': {e}", model_dir.display()),
        )
    })?;

    let path = state_path(model_dir);
    let mut file = AtomicWriteFile::open(&path)
        .map_err(|e| AppError::new(4, format!("Failed to open '{}' for writing: {e}", path.display())))?;

    serde_json::to_writer_pretty(&mut file, state)
        .map_err(|e| AppError::new(4, format!("Failed to serialize estimator state: {e}")))?;

    file.commit()
        .map_err(|e| AppError::new(4, format!("Failed to save estimator state: {e}")))?;

    info!(path = %path.display(), trees = state.forest.n_trees(), "saved estimator state");
    Ok(path)
}

/// Load the state from `model_dir` and check that its parts belong together.
pub fn load_estimator(model_dir: &Path) -> Result<Estimator, AppError> {
    let path = state_path(model_dir);
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!(
                "No trained estimator at '{}'. Run `uscore train` first.",
                path.display()
            ),
        ));
    }

    let file = File::open(&path)
        .map_err(|e| AppError::new(2, format!("Failed to open estimator state '{}': {e}", path.display())))?;
    let state: TrainedEstimatorState = serde_json::from_reader(file)
        .map_err(|e| ScoreError::ModelStateMismatch(format!("Unreadable estimator state: {e}")))?;

    let estimator = Estimator::new(state)?;
    info!(path = %path.display(), "loaded estimator state");
    Ok(estimator)
}
