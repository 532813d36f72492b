use thiserror::Error;

/// Errors returned by feature extraction.
///
/// Prosodic analysis never fails with an error; it degrades to a zero row
/// instead (see [`crate::ProsodyOutcome`]).
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("features: signal too short: need at least {needed} samples, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("features: sample rate {0} Hz is too low for the analysis window")]
    SampleRateTooLow(u32),

    #[error("features: invalid config: {0}")]
    InvalidConfig(String),
}
