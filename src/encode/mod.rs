//! Output container encoding.

pub mod wav;

pub use wav::{encode_wav, to_pcm16, write_wav, WAV_HEADER_LEN};

/// Errors that can occur during encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Cannot encode a buffer with no channels")]
    NoChannels,
    #[error("Too many channels for a WAV header: {0}")]
    TooManyChannels(usize),
    #[error("Byte rate overflows the WAV header: {sample_rate} Hz x {channels} channels")]
    ByteRateOverflow { sample_rate: u32, channels: u16 },
    #[error("PCM data too large for a WAV file: {0} bytes")]
    DataTooLarge(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
