//! Acoustic feature extraction for per-prompt voice classification.
//!
//! # Pipeline
//!
//! ```text
//! Waveform ─┬─ ShortTermExtractor ── 34 descriptors/frame → mean, std (68)
//!           └─ ProsodicExtractor ─── F0, intensity, HNR, jitter, shimmer (14)
//!                                        │
//!                       FeatureVectorBuilder → FeatureVector (82)
//! ```
//!
//! The short-term extractor rejects signals shorter than one window
//! ([`FeatureError::TooShort`]). The prosodic extractor never fails: when
//! pitch or periodicity analysis cannot converge it reports
//! [`ProsodyOutcome::Degraded`] and contributes a zero row.

mod error;
mod fft;
pub mod prosody;
pub mod spectral;
mod vector;

pub use error::FeatureError;
pub use prosody::{
    Degradation, FrequencyUnit, PerturbationParams, ProsodicExtractor, ProsodicFeatures,
    ProsodyConfig, ProsodyOutcome, PROSODIC_COLUMNS,
};
pub use spectral::{ShortTermConfig, ShortTermExtractor, DESCRIPTORS};
pub use vector::{FeatureRow, FeatureSchema, FeatureVector, FeatureVectorBuilder};
