//! Twelve-class chroma vector.
//!
//! Every spectrum bin above 0 Hz is assigned the pitch class
//! `round(12 * log2(f / 27.5)) mod 12`. A class value is the mean power of
//! its bins divided by the total power of the frame.

/// Number of pitch classes.
pub const NUM_CHROMA: usize = 12;

const REFERENCE_HZ: f64 = 27.5;

#[derive(Debug, Clone)]
pub struct ChromaMap {
    classes: Vec<Option<usize>>, // per bin
    bins_per_class: [usize; NUM_CHROMA],
}

impl ChromaMap {
    pub fn new(num_bins: usize, bin_hz: f64) -> Self {
        let mut bins_per_class = [0usize; NUM_CHROMA];
        let classes = (0..num_bins)
            .map(|k| {
                let f = k as f64 * bin_hz;
                if f <= 0.0 {
                    return None;
                }
                let semis = (12.0 * (f / REFERENCE_HZ).log2()).round() as i64;
                let class = semis.rem_euclid(NUM_CHROMA as i64) as usize;
                bins_per_class[class] += 1;
                Some(class)
            })
            .collect();
        Self {
            classes,
            bins_per_class,
        }
    }

    /// Returns the chroma vector and its population standard deviation.
    pub fn chroma(&self, magnitude: &[f64]) -> ([f64; NUM_CHROMA], f64) {
        let mut sums = [0.0; NUM_CHROMA];
        let mut total = 0.0;
        for (class, m) in self.classes.iter().zip(magnitude) {
            let power = m * m;
            total += power;
            if let Some(c) = class {
                sums[*c] += power;
            }
        }

        let mut out = [0.0; NUM_CHROMA];
        if total > 0.0 {
            for c in 0..NUM_CHROMA {
                if self.bins_per_class[c] > 0 {
                    out[c] = sums[c] / self.bins_per_class[c] as f64 / total;
                }
            }
        }

        let mean = out.iter().sum::<f64>() / NUM_CHROMA as f64;
        let var = out.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / NUM_CHROMA as f64;
        (out, var.sqrt())
    }
}
