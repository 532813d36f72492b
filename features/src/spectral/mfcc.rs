//! Mel-frequency cepstral coefficients.
//!
//! Filterbank layout: 13 linearly spaced bands starting at 133.33 Hz
//! (66.67 Hz apart) followed by 27 log-spaced bands (ratio 1.0711703).
//! Each triangle has unit area.

use std::f64::consts::PI;

const LOW_FREQ: f64 = 133.33;
const LINEAR_SPACING: f64 = 200.0 / 3.0;
const LOG_SPACING: f64 = 1.0711703;
const NUM_LINEAR: usize = 13;
const NUM_LOG: usize = 27;

/// Number of cepstral coefficients kept per frame.
pub const NUM_CEPS: usize = 13;

const EPS: f64 = 1e-8;

/// Precomputed filterbank for one (sample rate, spectrum length) pair.
#[derive(Debug, Clone)]
pub struct MfccBank {
    filters: Vec<Vec<f64>>, // [bands][bins]
}

impl MfccBank {
    /// Builds the filterbank for magnitude spectra of `num_bins` bins
    /// whose bin `k` sits at `k * bin_hz` Hz.
    pub fn new(num_bins: usize, bin_hz: f64) -> Self {
        let total = NUM_LINEAR + NUM_LOG;
        let mut edges = Vec::with_capacity(total + 2);
        for i in 0..NUM_LINEAR {
            edges.push(LOW_FREQ + i as f64 * LINEAR_SPACING);
        }
        let last_linear = edges[NUM_LINEAR - 1];
        for i in 1..=NUM_LOG + 2 {
            edges.push(last_linear * LOG_SPACING.powi(i as i32));
        }

        let mut filters = Vec::with_capacity(total);
        for b in 0..total {
            let (low, center, high) = (edges[b], edges[b + 1], edges[b + 2]);
            let height = 2.0 / (high - low);
            let mut filter = vec![0.0; num_bins];
            for (k, w) in filter.iter_mut().enumerate() {
                let f = k as f64 * bin_hz;
                if f > low && f <= center {
                    *w = height * (f - low) / (center - low);
                } else if f > center && f < high {
                    *w = height * (high - f) / (high - center);
                }
            }
            filters.push(filter);
        }
        Self { filters }
    }

    /// Computes the first [`NUM_CEPS`] coefficients of a magnitude spectrum.
    pub fn coefficients(&self, magnitude: &[f64]) -> [f64; NUM_CEPS] {
        let log_energies: Vec<f64> = self
            .filters
            .iter()
            .map(|filter| {
                let e: f64 = filter.iter().zip(magnitude).map(|(w, m)| w * m).sum();
                (e + EPS).log10()
            })
            .collect();

        let mut out = [0.0; NUM_CEPS];
        dct2_ortho(&log_energies, &mut out);
        out
    }
}

/// Orthonormal DCT-II, writing only the first `out.len()` coefficients.
fn dct2_ortho(x: &[f64], out: &mut [f64]) {
    let n = x.len() as f64;
    for (k, y) in out.iter_mut().enumerate() {
        let sum: f64 = x
            .iter()
            .enumerate()
            .map(|(i, &v)| v * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
            .sum();
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        *y = scale * sum;
    }
}
