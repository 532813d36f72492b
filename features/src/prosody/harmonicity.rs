//! Harmonics-to-noise ratio by cross-correlation.
//!
//! Every 10 ms a one-period window is correlated against lagged copies of
//! itself. The strongest local maximum `r` gives `10·log10(r / (1 - r))`.
//! Frames quieter than 10 % of the global peak are skipped.

const TIME_STEP: f64 = 0.01;
const SILENCE_THRESHOLD: f64 = 0.1;
const PERIODS_PER_WINDOW: f64 = 1.0;
const MIN_R: f64 = 1e-10;
const MAX_R: f64 = 1.0 - 1e-6;

/// Mean HNR in dB over the periodic frames, or `None` when no frame
/// qualifies.
pub fn mean_hnr(samples: &[f64], sample_rate: f64, min_pitch: f64) -> Option<f64> {
    let window_len = (PERIODS_PER_WINDOW / min_pitch * sample_rate).round() as usize;
    let max_lag = (sample_rate / min_pitch).ceil() as usize;
    let step_len = ((TIME_STEP * sample_rate).round() as usize).max(1);
    let span = window_len + max_lag + 1;
    if window_len < 2 || max_lag < 3 || samples.len() < span {
        return None;
    }

    let global_peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    if global_peak == 0.0 {
        return None;
    }

    let num_frames = (samples.len() - span) / step_len + 1;
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut r = vec![0.0; max_lag + 2];

    for f in 0..num_frames {
        let start = f * step_len;
        let a = &samples[start..start + window_len];
        let local_peak = samples[start..start + span]
            .iter()
            .fold(0.0f64, |m, s| m.max(s.abs()));
        if local_peak < SILENCE_THRESHOLD * global_peak {
            continue;
        }

        let energy_a: f64 = a.iter().map(|v| v * v).sum();
        for (lag, slot) in r.iter_mut().enumerate().skip(1) {
            let b = &samples[start + lag..start + lag + window_len];
            let energy_b: f64 = b.iter().map(|v| v * v).sum();
            let cross: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let denom = (energy_a * energy_b).sqrt();
            *slot = if denom > 0.0 { cross / denom } else { 0.0 };
        }

        let best = (2..=max_lag)
            .filter(|&lag| r[lag] > r[lag - 1] && r[lag] >= r[lag + 1])
            .map(|lag| r[lag])
            .fold(f64::NEG_INFINITY, f64::max);
        if best <= 0.0 {
            continue;
        }
        let rc = best.clamp(MIN_R, MAX_R);
        sum += 10.0 * (rc / (1.0 - rc)).log10();
        count += 1;
    }

    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / rate;
                0.6 * (2.0 * PI * freq * t).sin() + 0.2 * (2.0 * PI * 2.0 * freq * t).sin()
            })
            .collect()
    }

    /// Deterministic pseudo-noise in [-1, 1].
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut s = seed;
        (0..n)
            .map(|_| {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((s >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_clean_tone_has_high_hnr() {
        let hnr = mean_hnr(&tone(150.0, 16000.0, 16000), 16000.0, 75.0).unwrap();
        assert!(hnr > 20.0, "hnr {hnr}");
    }

    #[test]
    fn test_noise_lowers_hnr() {
        let clean = tone(150.0, 16000.0, 16000);
        let n = noise(16000, 7);
        let noisy: Vec<f64> = clean.iter().zip(&n).map(|(c, e)| c + 0.3 * e).collect();
        let a = mean_hnr(&clean, 16000.0, 75.0).unwrap();
        let b = mean_hnr(&noisy, 16000.0, 75.0).unwrap();
        assert!(b < a, "clean {a} noisy {b}");
    }

    #[test]
    fn test_silence_is_none() {
        assert!(mean_hnr(&vec![0.0; 16000], 16000.0, 75.0).is_none());
    }
}
