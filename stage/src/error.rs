use std::path::PathBuf;

use thiserror::Error;
use voxid_audio::AudioError;
use voxid_features::FeatureError;

/// Errors returned by stage models, training and sessions.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("stage: schema mismatch: expected {expected} columns, got {got}")]
    SchemaMismatch { expected: usize, got: usize },

    #[error("stage: invalid position {position}, must be in 1..={stages}")]
    InvalidPosition { position: usize, stages: usize },

    #[error("stage: probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("stage: session incomplete: {completed} of {required} stages scored")]
    IncompleteSession { completed: usize, required: usize },

    #[error("stage: expected prompt {expected}, got {got}")]
    StageOutOfOrder { expected: usize, got: usize },

    #[error("stage: session already holds all {0} stages")]
    SessionComplete(usize),

    #[error("stage: load artifact for position {position} from {}: {reason}", path.display())]
    ArtifactLoad {
        position: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("stage: invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("stage: invalid model: {0}")]
    InvalidModel(String),

    #[error("stage: numerical failure: {0}")]
    Numerical(String),

    #[error("stage: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("stage: json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StageError {
    /// Reports whether the error rejects a single submission.
    ///
    /// The caller can re-prompt for a new recording; session state is
    /// unchanged.
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            Self::Audio(_)
                | Self::SchemaMismatch { .. }
                | Self::Feature(FeatureError::TooShort { .. } | FeatureError::SampleRateTooLow(_))
        )
    }
}
