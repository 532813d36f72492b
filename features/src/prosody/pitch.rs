//! Autocorrelation pitch tracking.
//!
//! Each frame is Hann-windowed and its autocorrelation is divided by the
//! autocorrelation of the window itself, so a perfectly periodic frame
//! peaks at 1.0 at its period. Among the autocorrelation peaks within
//! `[1/f0_max, 1/f0_min]` the shortest lag wins unless it is weaker than the
//! strongest peak by more than `OCTAVE_TOLERANCE`, which keeps multiples of
//! the true period from being picked.

use std::f64::consts::PI;

const PERIODS_PER_WINDOW: f64 = 3.0;
const STEP_PERIODS: f64 = 0.75;
const VOICING_THRESHOLD: f64 = 0.45;
const SILENCE_THRESHOLD: f64 = 0.03;
const OCTAVE_TOLERANCE: f64 = 0.05;

/// One analysis frame of a pitch contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame center in seconds.
    pub time: f64,
    /// Fundamental frequency in Hz, `None` when unvoiced.
    pub f0: Option<f64>,
    /// Normalized autocorrelation at the chosen lag.
    pub strength: f64,
}

/// A pitch contour sampled every `time_step` seconds.
#[derive(Debug, Clone)]
pub struct PitchContour {
    pub time_step: f64,
    pub frames: Vec<PitchFrame>,
}

impl PitchContour {
    /// F0 values of the voiced frames, in Hz.
    pub fn voiced(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().filter_map(|f| f.f0)
    }

    pub fn voiced_count(&self) -> usize {
        self.voiced().count()
    }

    /// F0 of the voiced frame closest to `time`, if that frame is voiced.
    pub fn f0_at(&self, time: f64) -> Option<f64> {
        let first = self.frames.first()?;
        let idx = ((time - first.time) / self.time_step).round();
        let idx = idx.clamp(0.0, (self.frames.len() - 1) as f64) as usize;
        self.frames[idx].f0
    }

    /// Runs of consecutive voiced frames as `(start_time, end_time)`.
    pub fn voiced_intervals(&self) -> Vec<(f64, f64)> {
        let half = self.time_step / 2.0;
        let mut out = Vec::new();
        let mut start: Option<f64> = None;
        let mut last = 0.0;
        for f in &self.frames {
            match (f.f0.is_some(), start) {
                (true, None) => {
                    start = Some(f.time - half);
                    last = f.time;
                }
                (true, Some(_)) => last = f.time,
                (false, Some(s)) => {
                    out.push((s, last + half));
                    start = None;
                }
                (false, None) => {}
            }
        }
        if let Some(s) = start {
            out.push((s, last + half));
        }
        out
    }
}

/// Tracks pitch over `samples`.
///
/// Returns `None` when the signal is shorter than one analysis window or
/// the lag range is empty at this sample rate.
pub fn track(samples: &[f64], sample_rate: f64, f0_min: f64, f0_max: f64) -> Option<PitchContour> {
    let window_len = (PERIODS_PER_WINDOW / f0_min * sample_rate).round() as usize;
    let step_len = ((STEP_PERIODS / f0_min * sample_rate).round() as usize).max(1);
    if window_len < 4 || samples.len() < window_len {
        return None;
    }

    let min_lag = ((sample_rate / f0_max).floor() as usize).max(2);
    let max_lag = ((sample_rate / f0_min).ceil() as usize).min(window_len - 2);
    if min_lag >= max_lag {
        return None;
    }

    let window = hann(window_len);
    let window_ac = normalized_autocorrelation(&window, max_lag + 2);
    let global_peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));

    let num_frames = (samples.len() - window_len) / step_len + 1;
    let mut frames = Vec::with_capacity(num_frames);
    let mut buf = vec![0.0; window_len];

    for f in 0..num_frames {
        let start = f * step_len;
        let raw = &samples[start..start + window_len];
        let time = (start as f64 + window_len as f64 / 2.0) / sample_rate;

        let mean = raw.iter().sum::<f64>() / window_len as f64;
        let local_peak = raw.iter().fold(0.0f64, |m, s| m.max((s - mean).abs()));
        for (b, (x, w)) in buf.iter_mut().zip(raw.iter().zip(&window)) {
            *b = (x - mean) * w;
        }

        let mut frame = PitchFrame {
            time,
            f0: None,
            strength: 0.0,
        };
        if local_peak < SILENCE_THRESHOLD * global_peak || local_peak == 0.0 {
            frames.push(frame);
            continue;
        }

        let ac = normalized_autocorrelation(&buf, max_lag + 2);
        let mut peaks: Vec<(f64, f64)> = Vec::new(); // (lag, strength), ascending lag
        for lag in min_lag..=max_lag {
            let r = ac[lag] / window_ac[lag];
            let prev = ac[lag - 1] / window_ac[lag - 1];
            let next = ac[lag + 1] / window_ac[lag + 1];
            if r < prev || r < next || r <= 0.0 {
                continue;
            }
            // Parabolic refinement of the peak position and height.
            let denom = prev - 2.0 * r + next;
            let (offset, height) = if denom < 0.0 {
                let d = 0.5 * (prev - next) / denom;
                (d, r - 0.25 * (prev - next) * d)
            } else {
                (0.0, r)
            };
            peaks.push((lag as f64 + offset, height.min(1.0)));
        }

        let strongest = peaks.iter().map(|p| p.1).fold(0.0f64, f64::max);
        let best = peaks
            .iter()
            .find(|p| p.1 >= strongest - OCTAVE_TOLERANCE)
            .copied();

        if let Some((lag, strength)) = best {
            frame.strength = strength;
            let f0 = sample_rate / lag;
            if strength >= VOICING_THRESHOLD && f0 >= f0_min && f0 <= f0_max {
                frame.f0 = Some(f0);
            }
        }
        frames.push(frame);
    }

    Some(PitchContour {
        time_step: step_len as f64 / sample_rate,
        frames,
    })
}

fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * (i as f64 + 0.5) / n as f64).cos())
        .collect()
}

/// Autocorrelation for lags `0..max_lag`, divided by the lag-0 value.
fn normalized_autocorrelation(x: &[f64], max_lag: usize) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0; max_lag];
    for (lag, r) in out.iter_mut().enumerate().take(n) {
        *r = x[..n - lag].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
    }
    let r0 = out[0];
    if r0 > 0.0 {
        for r in &mut out {
            *r /= r0;
        }
    }
    out
}
