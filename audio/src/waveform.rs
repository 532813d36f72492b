use std::time::Duration;

use crate::AudioError;

/// A finite mono recording.
///
/// Samples are `f64` in `[-1, 1]`. Multi-channel input is reduced to mono
/// by averaging the channels of each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl Waveform {
    /// Creates a waveform from mono samples.
    ///
    /// An empty sample vector is accepted here; analysis stages decide
    /// whether a signal is long enough for them.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AudioError::NonFinite(i));
        }
        Ok(Self {
            sample_rate,
            samples,
        })
    }

    /// Creates a mono waveform from interleaved multi-channel samples.
    pub fn from_interleaved(
        samples: &[f64],
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if channels == 0 {
            return Err(AudioError::InvalidChannels(channels));
        }
        if samples.len() % channels != 0 {
            return Err(AudioError::PartialFrame {
                samples: samples.len(),
                channels,
            });
        }
        if channels == 1 {
            return Self::new(samples.to_vec(), sample_rate);
        }
        let mono = samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect();
        Self::new(mono, sample_rate)
    }

    /// Creates a mono waveform from PCM16 signed little-endian bytes.
    pub fn from_pcm16(audio: &[u8], channels: usize, sample_rate: u32) -> Result<Self, AudioError> {
        let samples: Vec<f64> = audio
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64 / 32768.0)
            .collect();
        Self::from_interleaved(&samples, channels, sample_rate)
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the mono samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the waveform holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the duration of the recording.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Returns the largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |m, s| m.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        // Stereo: L=1.0, R=0.0, L=0.5, R=0.5
        let w = Waveform::from_interleaved(&[1.0, 0.0, 0.5, 0.5], 2, 16000).unwrap();
        assert_eq!(w.len(), 2);
        assert!((w.samples()[0] - 0.5).abs() < 1e-12);
        assert!((w.samples()[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_downmix_three_channels() {
        let w = Waveform::from_interleaved(&[0.3, 0.6, 0.9], 3, 8000).unwrap();
        assert_eq!(w.len(), 1);
        assert!((w.samples()[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_partial_frame_rejected() {
        let err = Waveform::from_interleaved(&[0.1, 0.2, 0.3], 2, 16000).unwrap_err();
        assert!(matches!(err, AudioError::PartialFrame { samples: 3, channels: 2 }));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            Waveform::new(vec![0.0], 0),
            Err(AudioError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            Waveform::new(vec![0.0, f64::NAN], 16000),
            Err(AudioError::NonFinite(1))
        ));
    }

    #[test]
    fn test_empty_is_allowed() {
        let w = Waveform::new(Vec::new(), 16000).unwrap();
        assert!(w.is_empty());
        assert_eq!(w.duration(), Duration::ZERO);
    }

    #[test]
    fn test_from_pcm16() {
        let mut data = Vec::new();
        data.extend_from_slice(&16384i16.to_le_bytes());
        data.extend_from_slice(&(-32768i16).to_le_bytes());
        let w = Waveform::from_pcm16(&data, 1, 16000).unwrap();
        assert_eq!(w.samples(), &[0.5, -1.0]);
        assert_eq!(w.peak(), 1.0);
    }

    #[test]
    fn test_duration() {
        let w = Waveform::new(vec![0.0; 8000], 16000).unwrap();
        assert_eq!(w.duration(), Duration::from_millis(500));
    }
}
