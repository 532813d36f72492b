//! Waveform loading for voice analysis.
//!
//! This crate turns a finite, uncompressed recording into a [`Waveform`]:
//! a sample rate plus mono `f64` samples normalized to `[-1, 1]`.
//!
//! - `wav`: RIFF/WAVE decoding (integer and float PCM) via `hound`
//! - `waveform`: the mono sample buffer and channel downmixing
//!
//! # Example
//!
//! ```rust
//! use voxid_audio::Waveform;
//!
//! // Two stereo frames: (1.0, 0.0) and (0.5, 0.5).
//! let w = Waveform::from_interleaved(&[1.0, 0.0, 0.5, 0.5], 2, 16000).unwrap();
//! assert_eq!(w.samples(), &[0.5, 0.5]);
//! assert_eq!(w.sample_rate(), 16000);
//! ```

mod error;
pub mod wav;
mod waveform;

pub use error::AudioError;
pub use wav::{decode_wav, load_wav};
pub use waveform::Waveform;
