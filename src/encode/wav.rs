//! 16-bit PCM RIFF/WAVE encoding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::EncodeError;
use crate::audio::SampleBuffer;

/// Size of the canonical RIFF/WAVE header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u32 = 2;

/// Convert a float sample to 16-bit PCM.
pub fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Encode `buffer` as an in-memory 16-bit PCM WAV file.
///
/// Samples are clipped to `-1.0..=1.0` and interleaved. An empty buffer with
/// at least one channel yields a bare 44-byte header.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, EncodeError> {
    let channels = buffer.num_channels();
    if channels == 0 {
        return Err(EncodeError::NoChannels);
    }

    let data_len = buffer.len() as u64 * channels as u64 * BYTES_PER_SAMPLE as u64;
    // chunk size (36 + data) must fit the 32-bit field too.
    if data_len + 36 > u32::MAX as u64 {
        return Err(EncodeError::DataTooLarge(data_len));
    }
    let channels_u16 = u16::try_from(channels).map_err(|_| EncodeError::TooManyChannels(channels))?;

    let block_align = channels_u16
        .checked_mul(BYTES_PER_SAMPLE as u16)
        .ok_or(EncodeError::TooManyChannels(channels))?;

    let sample_rate = buffer.sample_rate();
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or(EncodeError::ByteRateOverflow {
            sample_rate,
            channels: channels_u16,
        })?;
    let data_size = data_len as u32;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    out.extend_from_slice(&channels_u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for i in 0..buffer.len() {
        for channel in buffer.channels() {
            out.extend_from_slice(&to_pcm16(channel[i]).to_le_bytes());
        }
    }

    Ok(out)
}

/// Encode `buffer` and write it to `path`.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<(), EncodeError> {
    let bytes = encode_wav(buffer)?;
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&bytes)?;
    file.flush()?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
