//! Glottal pulse detection.
//!
//! Walks every voiced interval of a pitch contour and places one pulse per
//! period at the waveform maximum near the predicted instant.

use super::pitch::PitchContour;

const SEARCH_FRACTION: f64 = 0.2;

/// Pulse instants in seconds, strictly increasing.
#[derive(Debug, Clone, Default)]
pub struct PointProcess {
    pub times: Vec<f64>,
}

impl PointProcess {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

pub fn periodic_pulses(samples: &[f64], sample_rate: f64, contour: &PitchContour) -> PointProcess {
    let duration = samples.len() as f64 / sample_rate;
    let mut times = Vec::new();

    for (start, end) in contour.voiced_intervals() {
        let start = start.max(0.0);
        let end = end.min(duration);
        let Some(f0) = contour
            .f0_at(start + contour.time_step / 2.0)
            .or_else(|| contour.f0_at((start + end) / 2.0))
        else {
            continue;
        };

        let mut period = 1.0 / f0;
        let Some(mut pulse) = peak_in(samples, sample_rate, start, start + period) else {
            continue;
        };
        times.push(pulse);

        loop {
            if let Some(f0) = contour.f0_at(pulse) {
                period = 1.0 / f0;
            }
            let predicted = pulse + period;
            if predicted > end {
                break;
            }
            let lo = predicted - SEARCH_FRACTION * period;
            let hi = (predicted + SEARCH_FRACTION * period).min(end);
            match peak_in(samples, sample_rate, lo, hi) {
                Some(next) if next > pulse => {
                    times.push(next);
                    pulse = next;
                }
                _ => break,
            }
        }
    }

    PointProcess { times }
}

/// Time of the largest sample in `[from, to]`, refined by a parabola.
fn peak_in(samples: &[f64], sample_rate: f64, from: f64, to: f64) -> Option<f64> {
    let last = samples.len().checked_sub(1)?;
    let lo = ((from * sample_rate).ceil().max(0.0) as usize).min(last);
    let hi = ((to * sample_rate).floor().max(0.0) as usize).min(last);
    if hi <= lo {
        return None;
    }

    let (idx, _) = samples[lo..=hi]
        .iter()
        .enumerate()
        .fold((0usize, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 { (i, v) } else { best }
        });
    let i = lo + idx;

    let mut offset = 0.0;
    if i > 0 && i < last {
        let (y0, y1, y2) = (samples[i - 1], samples[i], samples[i + 1]);
        let denom = y0 - 2.0 * y1 + y2;
        if denom < 0.0 {
            offset = (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5);
        }
    }
    Some((i as f64 + offset) / sample_rate)
}

#[cfg(test)]
mod tests {
    use super::super::pitch;
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pulses_follow_period() {
        let rate = 16000.0;
        let x: Vec<f64> = (0..16000)
            .map(|i| {
                let t = i as f64 / rate;
                0.5 * (2.0 * PI * 125.0 * t).sin() + 0.2 * (2.0 * PI * 250.0 * t).sin()
            })
            .collect();
        let contour = pitch::track(&x, rate, 75.0, 500.0).unwrap();
        let pp = periodic_pulses(&x, rate, &contour);
        assert!(pp.len() > 100, "got {} pulses", pp.len());

        let periods: Vec<f64> = pp.times.windows(2).map(|w| w[1] - w[0]).collect();
        let mean = periods.iter().sum::<f64>() / periods.len() as f64;
        assert!((mean - 0.008).abs() < 1e-4, "mean period {mean}");
        assert!(pp.times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_no_pulses_in_silence() {
        let x = vec![0.0; 8000];
        let contour = pitch::track(&x, 16000.0, 75.0, 500.0).unwrap();
        assert!(periodic_pulses(&x, 16000.0, &contour).is_empty());
    }

    #[test]
    fn test_peak_in_refines_position() {
        let rate = 1000.0;
        // Symmetric peak between samples 10 and 11.
        let mut x = vec![0.0; 20];
        x[9] = 0.5;
        x[10] = 1.0;
        x[11] = 1.0;
        x[12] = 0.5;
        let t = peak_in(&x, rate, 0.005, 0.015).unwrap();
        assert!((t - 0.0105).abs() < 1e-3);
    }
}
