//! RIFF/WAVE decoding.
//!
//! Integer PCM is scaled by `2^(bits-1)`; float PCM is taken as is.
//! Channels are averaged to mono.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::{AudioError, Waveform};

/// Loads a WAV file from disk.
pub fn load_wav(path: impl AsRef<Path>) -> Result<Waveform, AudioError> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let waveform = read_waveform(reader)?;
    tracing::debug!(
        path = %path.display(),
        sample_rate = waveform.sample_rate(),
        samples = waveform.len(),
        "audio: loaded wav"
    );
    Ok(waveform)
}

/// Decodes a WAV stream (for example an in-memory buffer).
pub fn decode_wav<R: Read>(reader: R) -> Result<Waveform, AudioError> {
    read_waveform(WavReader::new(reader)?)
}

fn read_waveform<R: Read>(reader: WavReader<R>) -> Result<Waveform, AudioError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(AudioError::UnsupportedBitDepth(bits));
            }
            let max_val = (1u64 << (bits - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<Result<_, _>>()?
        }
    };

    if samples.is_empty() {
        return Err(AudioError::Empty);
    }
    Waveform::from_interleaved(&samples, channels, spec.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn write_i16(channels: u16, frames: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = WavWriter::new(&mut buf, spec).unwrap();
            for &s in frames {
                w.write_sample(s).unwrap();
            }
            w.finalize().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_decode_mono_i16() {
        let data = write_i16(1, &[0, 16384, -16384]);
        let w = decode_wav(Cursor::new(data)).unwrap();
        assert_eq!(w.sample_rate(), 16000);
        assert_eq!(w.samples(), &[0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        let data = write_i16(2, &[16384, 0, -16384, -16384]);
        let w = decode_wav(Cursor::new(data)).unwrap();
        assert_eq!(w.len(), 2);
        assert!((w.samples()[0] - 0.25).abs() < 1e-12);
        assert!((w.samples()[1] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_decode_float() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = WavWriter::new(&mut buf, spec).unwrap();
            w.write_sample(0.25f32).unwrap();
            w.write_sample(-0.75f32).unwrap();
            w.finalize().unwrap();
        }
        let w = decode_wav(Cursor::new(buf.into_inner())).unwrap();
        assert_eq!(w.sample_rate(), 8000);
        assert_eq!(w.samples(), &[0.25, -0.75]);
    }

    #[test]
    fn test_decode_empty_rejected() {
        let data = write_i16(1, &[]);
        assert!(matches!(decode_wav(Cursor::new(data)), Err(AudioError::Empty)));
    }

    #[test]
    fn test_decode_garbage_rejected() {
        let err = decode_wav(Cursor::new(b"not a wav file".to_vec())).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn test_load_wav_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, write_i16(1, &[1000; 320])).unwrap();
        let w = load_wav(&path).unwrap();
        assert_eq!(w.len(), 320);
    }
}
