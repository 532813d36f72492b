//! Intensity contour in dB (re 2·10⁻⁵ Pa).
//!
//! Window of 3.2 periods of the minimum pitch, hop of 0.8 periods,
//! Gaussian weighting and per-frame DC removal.

const WINDOW_PERIODS: f64 = 3.2;
const STEP_PERIODS: f64 = 0.8;
const REFERENCE_POWER: f64 = 4.0e-10;
const FLOOR_DB: f64 = -300.0;

/// Computes the intensity contour. Returns `None` if the signal is shorter
/// than one window.
pub fn contour(samples: &[f64], sample_rate: f64, min_pitch: f64) -> Option<Vec<f64>> {
    let window_len = (WINDOW_PERIODS / min_pitch * sample_rate).round() as usize;
    let step_len = ((STEP_PERIODS / min_pitch * sample_rate).round() as usize).max(1);
    if window_len == 0 || samples.len() < window_len {
        return None;
    }

    let window: Vec<f64> = (0..window_len)
        .map(|i| {
            let u = (i as f64 + 0.5) / window_len as f64 - 0.5;
            (-12.0 * u * u).exp()
        })
        .collect();
    let weight: f64 = window.iter().sum();

    let num_frames = (samples.len() - window_len) / step_len + 1;
    let db = (0..num_frames)
        .map(|f| {
            let frame = &samples[f * step_len..f * step_len + window_len];
            let mean = frame.iter().zip(&window).map(|(x, w)| x * w).sum::<f64>() / weight;
            let power = frame
                .iter()
                .zip(&window)
                .map(|(x, w)| w * (x - mean) * (x - mean))
                .sum::<f64>()
                / weight;
            if power < 1e-30 {
                FLOOR_DB
            } else {
                10.0 * (power / REFERENCE_POWER).log10()
            }
        })
        .collect();
    Some(db)
}

/// Energy-averaged mean of a dB contour.
pub fn energy_mean(db: &[f64]) -> f64 {
    let mean_power = db.iter().map(|v| 10f64.powf(v / 10.0)).sum::<f64>() / db.len() as f64;
    10.0 * mean_power.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_full_scale_sine_level() {
        // RMS of a unit sine is 1/sqrt(2): 10*log10(0.5 / 4e-10) ≈ 90.97 dB.
        let rate = 16000.0;
        let x: Vec<f64> = (0..16000)
            .map(|i| (2.0 * PI * 200.0 * i as f64 / rate).sin())
            .collect();
        let db = contour(&x, rate, 75.0).unwrap();
        let mean = energy_mean(&db);
        assert!((mean - 90.97).abs() < 0.2, "mean {mean}");
    }

    #[test]
    fn test_half_amplitude_is_six_db_lower() {
        let rate = 16000.0;
        let full: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 150.0 * i as f64 / rate).sin())
            .collect();
        let half: Vec<f64> = full.iter().map(|v| v * 0.5).collect();
        let a = energy_mean(&contour(&full, rate, 75.0).unwrap());
        let b = energy_mean(&contour(&half, rate, 75.0).unwrap());
        assert!((a - b - 6.02).abs() < 0.05);
    }

    #[test]
    fn test_silence_floor() {
        let db = contour(&vec![0.0; 4000], 16000.0, 75.0).unwrap();
        assert!(db.iter().all(|&v| v == FLOOR_DB));
    }

    #[test]
    fn test_too_short() {
        assert!(contour(&vec![0.0; 100], 16000.0, 75.0).is_none());
    }
}
