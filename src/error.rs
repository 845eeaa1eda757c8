//! Error types.
//!
//! - `ScoreError` is the typed failure of the scoring core (normalizer,
//!   aggregator, estimator). Callers can match on the kind.
//! - `AppError` is what the binary reports: an exit code plus a message.
//!
//! Exit codes: 2 = bad input / usage, 3 = not enough data, 4 = internal or
//! model state problems.

use crate::domain::Bureau;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Insufficient data: no bureau scores supplied, cannot impute.")]
    InsufficientData,

    #[error("{bureau} score {value} is outside its native range [{min}, {max}].")]
    OutOfRangeInput {
        bureau: Bureau,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Expected {expected} scores (equifax, transunion, experian), got {got}.")]
    InvalidArity { expected: usize, got: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model state mismatch: {0}")]
    ModelStateMismatch(String),

    #[error("Training data invalid: {0}")]
    TrainingDataInvalid(String),
}

impl ScoreError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ScoreError::OutOfRangeInput { .. }
            | ScoreError::InvalidArity { .. }
            | ScoreError::InvalidInput(_) => 2,
            ScoreError::InsufficientData | ScoreError::TrainingDataInvalid(_) => 3,
            ScoreError::ModelStateMismatch(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ScoreError> for AppError {
    fn from(err: ScoreError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
