//! Short-term spectral features.
//!
//! The signal is cut into overlapping frames (50 ms window, 25 ms hop by
//! default). Each frame yields the 34 descriptors listed in [`DESCRIPTORS`];
//! each descriptor column is then summarized by its mean and sample
//! standard deviation across frames, giving 68 output columns.
//!
//! Preprocessing per signal: DC removal, then division by the peak
//! absolute value. Per frame the magnitude spectrum is taken from a
//! zero-padded radix-2 FFT.

mod chroma;
mod mfcc;

use serde::{Deserialize, Serialize};

use crate::fft::RealSpectrum;
use crate::FeatureError;
use chroma::{ChromaMap, NUM_CHROMA};
use mfcc::{MfccBank, NUM_CEPS};

/// Number of frame-level descriptors.
pub const NUM_DESCRIPTORS: usize = 34;

/// Frame-level descriptor names, in column order.
pub const DESCRIPTORS: [&str; NUM_DESCRIPTORS] = [
    "zcr",
    "energy",
    "energy_entropy",
    "spectral_centroid",
    "spectral_spread",
    "spectral_entropy",
    "spectral_flux",
    "spectral_rolloff",
    "mfcc_1",
    "mfcc_2",
    "mfcc_3",
    "mfcc_4",
    "mfcc_5",
    "mfcc_6",
    "mfcc_7",
    "mfcc_8",
    "mfcc_9",
    "mfcc_10",
    "mfcc_11",
    "mfcc_12",
    "mfcc_13",
    "chroma_1",
    "chroma_2",
    "chroma_3",
    "chroma_4",
    "chroma_5",
    "chroma_6",
    "chroma_7",
    "chroma_8",
    "chroma_9",
    "chroma_10",
    "chroma_11",
    "chroma_12",
    "chroma_std",
];

const EPS: f64 = 1e-8;
const ENTROPY_BLOCKS: usize = 10;
const ROLLOFF: f64 = 0.90;

/// Framing configuration, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortTermConfig {
    /// Window length (default: 0.050).
    pub window: f64,
    /// Hop between consecutive windows (default: 0.025).
    pub step: f64,
}

impl Default for ShortTermConfig {
    fn default() -> Self {
        Self {
            window: 0.050,
            step: 0.025,
        }
    }
}

impl ShortTermConfig {
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !(self.step > 0.0 && self.window >= self.step) {
            return Err(FeatureError::InvalidConfig(format!(
                "short-term window {} s must be >= step {} s > 0",
                self.window, self.step
            )));
        }
        Ok(())
    }
}

/// Computes the short-term feature matrix and its per-column summary.
#[derive(Debug, Clone)]
pub struct ShortTermExtractor {
    cfg: ShortTermConfig,
}

impl ShortTermExtractor {
    pub fn new(cfg: ShortTermConfig) -> Result<Self, FeatureError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &ShortTermConfig {
        &self.cfg
    }

    /// Output column names: `<descriptor>_mean`, `<descriptor>_std`.
    pub fn column_names() -> Vec<String> {
        DESCRIPTORS
            .iter()
            .flat_map(|d| [format!("{d}_mean"), format!("{d}_std")])
            .collect()
    }

    /// Number of output columns.
    pub fn num_columns() -> usize {
        2 * NUM_DESCRIPTORS
    }

    /// Returns the window and hop in samples for `sample_rate`.
    pub fn frame_geometry(&self, sample_rate: u32) -> Result<(usize, usize), FeatureError> {
        let window = (self.cfg.window * sample_rate as f64).floor() as usize;
        let step = (self.cfg.step * sample_rate as f64).floor() as usize;
        if window < 2 || step == 0 {
            return Err(FeatureError::SampleRateTooLow(sample_rate));
        }
        Ok((window, step))
    }

    /// Computes one row of [`DESCRIPTORS`] per frame.
    ///
    /// Fails with [`FeatureError::TooShort`] when the signal cannot hold a
    /// single window, including the empty signal.
    pub fn frame_matrix(
        &self,
        samples: &[f64],
        sample_rate: u32,
    ) -> Result<Vec<[f64; NUM_DESCRIPTORS]>, FeatureError> {
        let (window, step) = self.frame_geometry(sample_rate)?;
        if samples.len() < window {
            return Err(FeatureError::TooShort {
                needed: window,
                got: samples.len(),
            });
        }

        let signal = normalize(samples);
        let spectrum = RealSpectrum::new(window);
        let num_bins = spectrum.bins();
        let bin_hz = sample_rate as f64 / spectrum.size() as f64;
        let mfcc_bank = MfccBank::new(num_bins, bin_hz);
        let chroma_map = ChromaMap::new(num_bins, bin_hz);

        let num_frames = (signal.len() - window) / step + 1;
        let mut rows = Vec::with_capacity(num_frames);
        let mut prev_mag: Option<Vec<f64>> = None;

        for f in 0..num_frames {
            let frame = &signal[f * step..f * step + window];
            let mag = spectrum.magnitudes(frame);

            let mut row = [0.0; NUM_DESCRIPTORS];
            row[0] = zero_crossing_rate(frame);
            row[1] = frame.iter().map(|x| x * x).sum::<f64>() / window as f64;
            row[2] = block_entropy(frame);
            let (centroid, spread) = centroid_and_spread(&mag, sample_rate as f64);
            row[3] = centroid;
            row[4] = spread;
            row[5] = block_entropy(&mag);
            row[6] = spectral_flux(&mag, prev_mag.as_deref().unwrap_or(mag.as_slice()));
            row[7] = spectral_rolloff(&mag);

            let ceps = mfcc_bank.coefficients(&mag);
            row[8..8 + NUM_CEPS].copy_from_slice(&ceps);

            let (chroma, chroma_std) = chroma_map.chroma(&mag);
            let c0 = 8 + NUM_CEPS;
            row[c0..c0 + NUM_CHROMA].copy_from_slice(&chroma);
            row[c0 + NUM_CHROMA] = chroma_std;

            rows.push(row);
            prev_mag = Some(mag);
        }

        Ok(rows)
    }

    /// Computes the summary vector: mean and sample std for each descriptor.
    pub fn extract(&self, samples: &[f64], sample_rate: u32) -> Result<Vec<f64>, FeatureError> {
        let rows = self.frame_matrix(samples, sample_rate)?;
        Ok(summarize(&rows))
    }
}

/// Reduces a frame matrix to `[mean_0, std_0, mean_1, std_1, ...]`.
///
/// Standard deviation uses `n - 1`; a single frame yields 0.
pub fn summarize<const N: usize>(rows: &[[f64; N]]) -> Vec<f64> {
    let n = rows.len();
    let mut out = Vec::with_capacity(2 * N);
    for c in 0..N {
        let mean = if n == 0 {
            0.0
        } else {
            rows.iter().map(|r| r[c]).sum::<f64>() / n as f64
        };
        let std = if n < 2 {
            0.0
        } else {
            let ss: f64 = rows.iter().map(|r| (r[c] - mean) * (r[c] - mean)).sum();
            (ss / (n - 1) as f64).sqrt()
        };
        out.push(mean);
        out.push(std);
    }
    out
}

fn normalize(samples: &[f64]) -> Vec<f64> {
    let dc = samples.iter().sum::<f64>() / samples.len() as f64;
    let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    let scale = 1.0 / (peak + 1e-10);
    samples.iter().map(|s| (s - dc) * scale).collect()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn zero_crossing_rate(frame: &[f64]) -> f64 {
    let count: f64 = frame
        .windows(2)
        .map(|w| (sign(w[1]) - sign(w[0])).abs())
        .sum::<f64>()
        / 2.0;
    count / (frame.len() - 1) as f64
}

/// Entropy of the energy distribution over ten equal sub-blocks.
fn block_entropy(x: &[f64]) -> f64 {
    let total: f64 = x.iter().map(|v| v * v).sum();
    let block_len = x.len() / ENTROPY_BLOCKS;
    if block_len == 0 {
        return 0.0;
    }
    x[..block_len * ENTROPY_BLOCKS]
        .chunks(block_len)
        .map(|block| {
            let s = block.iter().map(|v| v * v).sum::<f64>() / (total + EPS);
            -s * (s + EPS).log2()
        })
        .sum()
}

/// Centroid and spread, both normalized by the Nyquist frequency.
fn centroid_and_spread(mag: &[f64], sample_rate: f64) -> (f64, f64) {
    let n = mag.len() as f64;
    let nyquist = sample_rate / 2.0;
    let max = mag.iter().fold(0.0f64, |m, v| m.max(*v));
    let norm = if max == 0.0 { EPS } else { max };

    let mut num = 0.0;
    let mut den = EPS;
    for (k, m) in mag.iter().enumerate() {
        let freq = (k + 1) as f64 * sample_rate / (2.0 * n);
        let w = m / norm;
        num += freq * w;
        den += w;
    }
    let centroid = num / den;

    let var: f64 = mag
        .iter()
        .enumerate()
        .map(|(k, m)| {
            let freq = (k + 1) as f64 * sample_rate / (2.0 * n);
            (freq - centroid) * (freq - centroid) * (m / norm)
        })
        .sum::<f64>()
        / den;

    (centroid / nyquist, var.sqrt() / nyquist)
}

fn spectral_flux(mag: &[f64], prev: &[f64]) -> f64 {
    let sum: f64 = mag.iter().map(|m| m + EPS).sum();
    let prev_sum: f64 = prev.iter().map(|m| m + EPS).sum();
    mag.iter()
        .zip(prev)
        .map(|(m, p)| {
            let d = m / sum - p / prev_sum;
            d * d
        })
        .sum()
}

fn spectral_rolloff(mag: &[f64]) -> f64 {
    let energy: f64 = mag.iter().map(|m| m * m).sum();
    let threshold = ROLLOFF * energy;
    let mut cumulative = 0.0;
    for (k, m) in mag.iter().enumerate() {
        cumulative += m * m;
        if cumulative + EPS > threshold {
            return k as f64 / mag.len() as f64;
        }
    }
    0.0
}
