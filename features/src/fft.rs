//! Magnitude spectra of real frames.
//!
//! A real frame of `N` samples is packed into `N / 2` complex points
//! (even samples real, odd samples imaginary), transformed with a
//! half-size radix-2 FFT, then split back into the first `N / 2` bins of
//! the real spectrum. Tables are built once per frame size and shared
//! across every frame of a recording.

use std::f64::consts::PI;

/// Precomputed plan for one zero-padded frame size.
#[derive(Debug, Clone)]
pub struct RealSpectrum {
    size: usize,
    /// Bit-reversed index for each packed point.
    reversed: Vec<usize>,
    /// `e^{-2πij/(N/2)}` for `j < N/4`, used by the packed transform.
    twiddles: Vec<(f64, f64)>,
    /// `e^{-2πik/N}` for `k < N/2`, used to split the packed result.
    split: Vec<(f64, f64)>,
}

impl RealSpectrum {
    /// Plans a transform of `size` points, rounded up to a power of two
    /// and at least 2.
    pub fn new(size: usize) -> Self {
        let size = next_pow2(size.max(2));
        let half = size / 2;
        let bits = half.trailing_zeros();
        let reversed = (0..half)
            .map(|i| if bits == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - bits) })
            .collect();
        let unit = |k: usize, n: usize| {
            let a = -2.0 * PI * k as f64 / n as f64;
            (a.cos(), a.sin())
        };
        Self {
            size,
            reversed,
            twiddles: (0..half / 2).map(|j| unit(j, half)).collect(),
            split: (0..half).map(|k| unit(k, size)).collect(),
        }
    }

    /// Transform size `N`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of bins returned by [`magnitudes`](Self::magnitudes).
    pub fn bins(&self) -> usize {
        self.size / 2
    }

    /// First `N / 2` magnitudes of `frame` zero-padded to `N`, each divided
    /// by `N / 2`. Samples past `N` are ignored.
    pub fn magnitudes(&self, frame: &[f64]) -> Vec<f64> {
        let half = self.size / 2;
        let sample = |i: usize| frame.get(i).copied().unwrap_or(0.0);

        let mut z = vec![(0.0, 0.0); half];
        for (m, &r) in self.reversed.iter().enumerate() {
            z[r] = (sample(2 * m), sample(2 * m + 1));
        }
        self.butterflies(&mut z);

        let scale = half as f64;
        (0..half)
            .map(|k| {
                let (ar, ai) = z[k];
                let (br, bi) = z[(half - k) % half];
                // Even part: (Z[k] + conj Z[-k]) / 2; odd part: (Z[k] - conj Z[-k]) / 2i.
                let (er, ei) = (0.5 * (ar + br), 0.5 * (ai - bi));
                let (or, oi) = (0.5 * (ai + bi), -0.5 * (ar - br));
                let (wr, wi) = self.split[k];
                let re = er + wr * or - wi * oi;
                let im = ei + wr * oi + wi * or;
                re.hypot(im) / scale
            })
            .collect()
    }

    /// Decimation-in-time passes over bit-reversed input.
    fn butterflies(&self, z: &mut [(f64, f64)]) {
        let n = z.len();
        let mut span = 2;
        while span <= n {
            let step = n / span;
            for block in z.chunks_exact_mut(span) {
                let (lo, hi) = block.split_at_mut(span / 2);
                for (k, (u, v)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    let (wr, wi) = self.twiddles[k * step];
                    let t = (wr * v.0 - wi * v.1, wr * v.1 + wi * v.0);
                    *v = (u.0 - t.0, u.1 - t.1);
                    *u = (u.0 + t.0, u.1 + t.1);
                }
            }
            span <<= 1;
        }
    }
}

/// Returns the smallest power of two that is `>= n`.
fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dft_magnitudes(frame: &[f64], size: usize) -> Vec<f64> {
        let half = size / 2;
        (0..half)
            .map(|k| {
                let (mut re, mut im) = (0.0, 0.0);
                for (n, &v) in frame.iter().take(size).enumerate() {
                    let a = -2.0 * PI * (k * n) as f64 / size as f64;
                    re += v * a.cos();
                    im += v * a.sin();
                }
                re.hypot(im) / half as f64
            })
            .collect()
    }

    #[test]
    fn test_matches_dft() {
        let frame = [
            0.5, -1.0, 2.0, 0.25, -0.75, 1.5, 0.0, 3.0, -2.5, 0.125, 1.0, -0.5, 0.3, 0.9, -1.2, 0.6,
        ];
        let plan = RealSpectrum::new(16);
        let got = plan.magnitudes(&frame);
        let want = dft_magnitudes(&frame, 16);
        assert_eq!(got.len(), 8);
        for (k, (g, w)) in got.iter().zip(&want).enumerate() {
            assert!((g - w).abs() < 1e-9, "bin {k}: {g} vs {w}");
        }
    }

    #[test]
    fn test_zero_pads_short_frames() {
        let frame: Vec<f64> = (0..11).map(|i| ((i * 5) % 7) as f64 - 3.0).collect();
        let plan = RealSpectrum::new(11);
        assert_eq!(plan.size(), 16);
        assert_eq!(plan.bins(), 8);
        let got = plan.magnitudes(&frame);
        let want = dft_magnitudes(&frame, 16);
        for (g, w) in got.iter().zip(&want) {
            assert!((g - w).abs() < 1e-9);
        }
    }

    #[test]
    fn test_smallest_plan() {
        let plan = RealSpectrum::new(0);
        assert_eq!(plan.size(), 2);
        // DC bin of [3, 1] is 4, scaled by 1.
        assert!((plan.magnitudes(&[3.0, 1.0])[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(800), 1024);
        assert_eq!(next_pow2(1024), 1024);
    }

    #[test]
    fn test_peak_bin() {
        // 16 cycles over 256 samples lands exactly on bin 16.
        let frame: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 16.0 * i as f64 / 256.0).sin())
            .collect();
        let mag = RealSpectrum::new(256).magnitudes(&frame);
        assert_eq!(mag.len(), 128);
        let peak = mag
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
        assert!((mag[16] - 1.0).abs() < 1e-9);
    }
}
