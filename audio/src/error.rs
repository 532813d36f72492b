use thiserror::Error;

/// Errors returned while loading or building a waveform.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: empty signal")]
    Empty,

    #[error("audio: invalid sample rate {0}")]
    InvalidSampleRate(u32),

    #[error("audio: invalid channel count {0}")]
    InvalidChannels(usize),

    #[error("audio: {samples} interleaved samples is not a multiple of {channels} channels")]
    PartialFrame { samples: usize, channels: usize },

    #[error("audio: non-finite sample at index {0}")]
    NonFinite(usize),

    #[error("audio: unsupported bit depth {0}")]
    UnsupportedBitDepth(u16),

    #[error("audio: decode wav: {0}")]
    Decode(#[from] hound::Error),
}
