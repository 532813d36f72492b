//! Prosodic voice-quality features.
//!
//! Fourteen measures in fixed order (see [`PROSODIC_COLUMNS`]): pitch mean
//! and deviation, intensity mean and deviation, harmonics-to-noise ratio,
//! four jitter and five shimmer estimators.
//!
//! Analysis that cannot converge does not fail. It yields
//! [`ProsodyOutcome::Degraded`], whose row is all zeros under the same
//! schema, so downstream scoring always receives a complete vector.

mod harmonicity;
mod intensity;
pub mod perturbation;
pub mod pitch;
mod pulses;

use std::fmt;

use serde::{Deserialize, Serialize};
use voxid_audio::Waveform;

use crate::FeatureError;
pub use perturbation::PerturbationParams;

/// Column names of the prosodic row, in order.
pub const PROSODIC_COLUMNS: [&str; 14] = [
    "F0_mean",
    "F0_std",
    "I_mean",
    "I_std",
    "hnr",
    "localJitter",
    "localabsoluteJitter",
    "rapJitter",
    "ppq5Jitter",
    "localShimmer",
    "localdbShimmer",
    "apq3Shimmer",
    "apq5Shimmer",
    "apq11Shimmer",
];

/// Minimum pitch used by the intensity and harmonicity analyses.
const ANALYSIS_MIN_PITCH: f64 = 75.0;

/// Unit in which pitch statistics are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    #[default]
    Hertz,
    Mel,
    /// Semitones relative to 100 Hz.
    Semitones,
    Erb,
}

impl FrequencyUnit {
    pub fn from_hertz(self, hz: f64) -> f64 {
        match self {
            Self::Hertz => hz,
            Self::Mel => 550.0 * (1.0 + hz / 550.0).ln(),
            Self::Semitones => 12.0 * (hz / 100.0).log2(),
            Self::Erb => 11.17 * ((hz + 312.0) / (hz + 14680.0)).ln() + 43.0,
        }
    }
}

/// Prosodic analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsodyConfig {
    /// Lowest expected F0 in Hz (default: 75).
    pub f0_min: f64,
    /// Highest expected F0 in Hz (default: 500).
    pub f0_max: f64,
    /// Unit of `F0_mean` / `F0_std` (default: hertz).
    pub unit: FrequencyUnit,
    #[serde(skip)]
    pub perturbation: PerturbationParams,
}

impl Default for ProsodyConfig {
    fn default() -> Self {
        Self {
            f0_min: 75.0,
            f0_max: 500.0,
            unit: FrequencyUnit::Hertz,
            perturbation: PerturbationParams::default(),
        }
    }
}

impl ProsodyConfig {
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !(self.f0_min > 0.0 && self.f0_min < self.f0_max) {
            return Err(FeatureError::InvalidConfig(format!(
                "f0 range [{}, {}] must satisfy 0 < f0_min < f0_max",
                self.f0_min, self.f0_max
            )));
        }
        Ok(())
    }
}

/// Why prosodic analysis fell back to the zero row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Shorter than one pitch analysis window.
    TooShort,
    /// No non-zero sample.
    Silent,
    /// Fewer than two voiced pitch frames.
    InsufficientVoicing,
    /// Not enough regular glottal periods for jitter/shimmer.
    TooFewPulses,
    /// A measure came out NaN or infinite.
    NonFinite,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "too short"),
            Self::Silent => write!(f, "silent"),
            Self::InsufficientVoicing => write!(f, "insufficient voicing"),
            Self::TooFewPulses => write!(f, "too few pulses"),
            Self::NonFinite => write!(f, "non-finite measure"),
        }
    }
}

/// The fourteen measured values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProsodicFeatures {
    pub f0_mean: f64,
    pub f0_std: f64,
    pub intensity_mean: f64,
    pub intensity_std: f64,
    pub hnr: f64,
    pub jitter: perturbation::Jitter,
    pub shimmer: perturbation::Shimmer,
}

impl ProsodicFeatures {
    /// Values in [`PROSODIC_COLUMNS`] order.
    pub fn to_row(&self) -> [f64; 14] {
        [
            self.f0_mean,
            self.f0_std,
            self.intensity_mean,
            self.intensity_std,
            self.hnr,
            self.jitter.local,
            self.jitter.local_absolute,
            self.jitter.rap,
            self.jitter.ppq5,
            self.shimmer.local,
            self.shimmer.local_db,
            self.shimmer.apq3,
            self.shimmer.apq5,
            self.shimmer.apq11,
        ]
    }
}

/// Result of prosodic analysis: measured values or the zero fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ProsodyOutcome {
    Measured(ProsodicFeatures),
    Degraded(Degradation),
}

impl ProsodyOutcome {
    /// The fourteen-column row; all zeros when degraded.
    pub fn row(&self) -> [f64; 14] {
        match self {
            Self::Measured(f) => f.to_row(),
            Self::Degraded(_) => [0.0; 14],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn degradation(&self) -> Option<Degradation> {
        match self {
            Self::Measured(_) => None,
            Self::Degraded(d) => Some(*d),
        }
    }
}

/// Computes prosodic features from a mono waveform.
#[derive(Debug, Clone)]
pub struct ProsodicExtractor {
    cfg: ProsodyConfig,
}

impl ProsodicExtractor {
    pub fn new(cfg: ProsodyConfig) -> Result<Self, FeatureError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &ProsodyConfig {
        &self.cfg
    }

    pub fn analyze(&self, waveform: &Waveform) -> ProsodyOutcome {
        match self.measure(waveform.samples(), waveform.sample_rate() as f64) {
            Ok(f) => ProsodyOutcome::Measured(f),
            Err(d) => ProsodyOutcome::Degraded(d),
        }
    }

    fn measure(&self, x: &[f64], rate: f64) -> Result<ProsodicFeatures, Degradation> {
        let cfg = &self.cfg;
        if x.iter().all(|&s| s == 0.0) {
            return Err(Degradation::Silent);
        }

        let contour =
            pitch::track(x, rate, cfg.f0_min, cfg.f0_max).ok_or(Degradation::TooShort)?;
        let f0: Vec<f64> = contour.voiced().map(|hz| cfg.unit.from_hertz(hz)).collect();
        if f0.len() < 2 {
            return Err(Degradation::InsufficientVoicing);
        }
        let (f0_mean, f0_std) = mean_and_std(&f0);

        let db = intensity::contour(x, rate, ANALYSIS_MIN_PITCH).ok_or(Degradation::TooShort)?;
        let intensity_mean = intensity::energy_mean(&db);
        let (_, intensity_std) = mean_and_std(&db);

        let hnr = harmonicity::mean_hnr(x, rate, ANALYSIS_MIN_PITCH)
            .ok_or(Degradation::InsufficientVoicing)?;

        let pulses = pulses::periodic_pulses(x, rate, &contour);
        let jitter =
            perturbation::jitter(&pulses.times, &cfg.perturbation).ok_or(Degradation::TooFewPulses)?;
        let shimmer = perturbation::shimmer(&pulses.times, x, rate, &cfg.perturbation)
            .ok_or(Degradation::TooFewPulses)?;

        let features = ProsodicFeatures {
            f0_mean,
            f0_std,
            intensity_mean,
            intensity_std,
            hnr,
            jitter,
            shimmer,
        };
        if features.to_row().iter().any(|v| !v.is_finite()) {
            return Err(Degradation::NonFinite);
        }
        Ok(features)
    }
}

/// Mean and sample standard deviation (`n - 1`; 0 for fewer than two values).
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (mean, (ss / (n - 1) as f64).sqrt())
}
