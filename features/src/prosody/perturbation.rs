//! Jitter and shimmer.
//!
//! Periods come from consecutive pulse instants. A period takes part only
//! if it lies within `[period_floor, period_ceiling]`; a neighbourhood of
//! periods counts only if every consecutive pair differs by at most
//! `max_period_factor` (and, for shimmer, the amplitudes by at most
//! `max_amplitude_factor`).

use serde::{Deserialize, Serialize};

/// Fixed parameters of perturbation analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationParams {
    /// Shortest usable period in seconds (default: 0.0001).
    pub period_floor: f64,
    /// Longest usable period in seconds (default: 0.02).
    pub period_ceiling: f64,
    /// Largest ratio between consecutive periods (default: 1.3).
    pub max_period_factor: f64,
    /// Largest ratio between consecutive amplitudes (default: 1.6).
    pub max_amplitude_factor: f64,
}

impl Default for PerturbationParams {
    fn default() -> Self {
        Self {
            period_floor: 0.0001,
            period_ceiling: 0.02,
            max_period_factor: 1.3,
            max_amplitude_factor: 1.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub local: f64,
    pub local_absolute: f64,
    pub rap: f64,
    pub ppq5: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shimmer {
    pub local: f64,
    pub local_db: f64,
    pub apq3: f64,
    pub apq5: f64,
    pub apq11: f64,
}

struct Periods {
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl Periods {
    fn from_pulses(times: &[f64], params: &PerturbationParams) -> Self {
        let values: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let valid = values
            .iter()
            .map(|&p| p >= params.period_floor && p <= params.period_ceiling)
            .collect();
        Self { values, valid }
    }

    fn mean(&self) -> Option<f64> {
        mean_where(&self.values, &self.valid)
    }
}

/// Computes the four jitter measures. Returns `None` when any of them has
/// no qualifying period.
pub fn jitter(times: &[f64], params: &PerturbationParams) -> Option<Jitter> {
    let periods = Periods::from_pulses(times, params);
    let mean_period = periods.mean()?;
    let pair_ok = |i: usize| ratio(periods.values[i], periods.values[i - 1]) <= params.max_period_factor;

    let local_absolute = mean_abs_diff(&periods.values, &periods.valid, &pair_ok)?;
    let rap = perturbation_quotient(&periods.values, &periods.valid, 1, &pair_ok)?;
    let ppq5 = perturbation_quotient(&periods.values, &periods.valid, 2, &pair_ok)?;

    Some(Jitter {
        local: local_absolute / mean_period,
        local_absolute,
        rap: rap / mean_period,
        ppq5: ppq5 / mean_period,
    })
}

/// Computes the five shimmer measures from per-period peak amplitudes.
pub fn shimmer(
    times: &[f64],
    samples: &[f64],
    sample_rate: f64,
    params: &PerturbationParams,
) -> Option<Shimmer> {
    let periods = Periods::from_pulses(times, params);
    let amplitudes: Vec<f64> = times
        .windows(2)
        .map(|w| period_peak(samples, sample_rate, w[0], w[1]))
        .collect();
    let valid: Vec<bool> = periods
        .valid
        .iter()
        .zip(&amplitudes)
        .map(|(&v, &a)| v && a > 0.0)
        .collect();
    let mean_amp = mean_where(&amplitudes, &valid)?;

    let pair_ok = |i: usize| {
        ratio(periods.values[i], periods.values[i - 1]) <= params.max_period_factor
            && ratio(amplitudes[i], amplitudes[i - 1]) <= params.max_amplitude_factor
    };

    let local = mean_abs_diff(&amplitudes, &valid, &pair_ok)? / mean_amp;

    let mut db_sum = 0.0;
    let mut db_count = 0usize;
    for i in 1..amplitudes.len() {
        if valid[i] && valid[i - 1] && pair_ok(i) {
            db_sum += (20.0 * (amplitudes[i] / amplitudes[i - 1]).log10()).abs();
            db_count += 1;
        }
    }
    if db_count == 0 {
        return None;
    }

    Some(Shimmer {
        local,
        local_db: db_sum / db_count as f64,
        apq3: perturbation_quotient(&amplitudes, &valid, 1, &pair_ok)? / mean_amp,
        apq5: perturbation_quotient(&amplitudes, &valid, 2, &pair_ok)? / mean_amp,
        apq11: perturbation_quotient(&amplitudes, &valid, 5, &pair_ok)? / mean_amp,
    })
}

fn ratio(a: f64, b: f64) -> f64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if lo <= 0.0 { f64::INFINITY } else { hi / lo }
}

fn mean_where(values: &[f64], valid: &[bool]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .zip(valid)
        .filter(|(_, ok)| **ok)
        .fold((0.0, 0usize), |(s, n), (v, _)| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean of `|v[i] - v[i-1]|` over qualifying neighbours.
fn mean_abs_diff(values: &[f64], valid: &[bool], pair_ok: &dyn Fn(usize) -> bool) -> Option<f64> {
    let terms: Vec<f64> = (1..values.len())
        .filter(|&i| valid[i] && valid[i - 1] && pair_ok(i))
        .map(|i| (values[i] - values[i - 1]).abs())
        .collect();
    (!terms.is_empty()).then(|| terms.iter().sum::<f64>() / terms.len() as f64)
}

/// Mean absolute deviation of each value from the average of the
/// `2 * half + 1` values centred on it.
fn perturbation_quotient(
    values: &[f64],
    valid: &[bool],
    half: usize,
    pair_ok: &dyn Fn(usize) -> bool,
) -> Option<f64> {
    let width = 2 * half + 1;
    if values.len() < width {
        return None;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in half..values.len() - half {
        let range = i - half..=i + half;
        if !valid[range.clone()].iter().all(|&v| v) {
            continue;
        }
        if !(i - half + 1..=i + half).all(pair_ok) {
            continue;
        }
        let avg = values[range].iter().sum::<f64>() / width as f64;
        sum += (values[i] - avg).abs();
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

fn period_peak(samples: &[f64], sample_rate: f64, from: f64, to: f64) -> f64 {
    let lo = ((from * sample_rate).round().max(0.0) as usize).min(samples.len());
    let hi = ((to * sample_rate).round().max(0.0) as usize).min(samples.len());
    samples[lo..hi.max(lo)]
        .iter()
        .fold(0.0f64, |m, s| m.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(period: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * period).collect()
    }

    #[test]
    fn test_perfectly_periodic_has_zero_jitter() {
        let j = jitter(&regular(0.005, 50), &PerturbationParams::default()).unwrap();
        assert!(j.local.abs() < 1e-9);
        assert!(j.local_absolute.abs() < 1e-12);
        assert!(j.rap.abs() < 1e-9);
        assert!(j.ppq5.abs() < 1e-9);
    }

    #[test]
    fn test_alternating_periods() {
        // Periods alternate 4.5 ms / 5.5 ms: |diff| = 1 ms, mean period 5 ms.
        let mut times = vec![0.0];
        for i in 0..40 {
            let p = if i % 2 == 0 { 0.0045 } else { 0.0055 };
            times.push(times.last().unwrap() + p);
        }
        let j = jitter(&times, &PerturbationParams::default()).unwrap();
        assert!((j.local_absolute - 0.001).abs() < 1e-9);
        assert!((j.local - 0.2).abs() < 1e-6);
        // Window of three around 4.5 ms: avg 5.1667 ms, deviation 0.6667 ms.
        assert!((j.rap - 0.000_666_667 / 0.005).abs() < 1e-4);
    }

    #[test]
    fn test_large_ratio_pairs_are_ignored() {
        // 4 ms vs 8 ms exceeds factor 1.3 everywhere.
        let mut times = vec![0.0];
        for i in 0..20 {
            let p = if i % 2 == 0 { 0.004 } else { 0.008 };
            times.push(times.last().unwrap() + p);
        }
        assert!(jitter(&times, &PerturbationParams::default()).is_none());
    }

    #[test]
    fn test_periods_above_ceiling_are_ignored() {
        let times = regular(0.03, 20);
        assert!(jitter(&times, &PerturbationParams::default()).is_none());
    }

    #[test]
    fn test_shimmer_constant_amplitude() {
        let rate = 10000.0;
        // One unit spike per 5 ms period.
        let mut x = vec![0.0; 5000];
        for i in (0..5000).step_by(50) {
            x[i + 25] = 1.0;
        }
        let times = regular(0.005, 99);
        let s = shimmer(&times, &x, rate, &PerturbationParams::default()).unwrap();
        assert!(s.local.abs() < 1e-12);
        assert!(s.local_db.abs() < 1e-12);
        assert!(s.apq11.abs() < 1e-12);
    }

    #[test]
    fn test_shimmer_alternating_amplitude() {
        let rate = 10000.0;
        let mut x = vec![0.0; 5000];
        for (k, i) in (0..5000).step_by(50).enumerate() {
            x[i + 25] = if k % 2 == 0 { 1.0 } else { 0.8 };
        }
        let times = regular(0.005, 99);
        let s = shimmer(&times, &x, rate, &PerturbationParams::default()).unwrap();
        // |1.0 - 0.8| / 0.9
        assert!((s.local - 0.2 / 0.9).abs() < 1e-3, "local {}", s.local);
        assert!((s.local_db - 20.0 * (1.0f64 / 0.8).log10()).abs() < 1e-9);
    }
}
