//! Audio file decoding using Symphonia.
//!
//! This is the input collaborator: it turns a file on disk into a planar
//! [`SampleBuffer`]. Supports WAV, MP3, FLAC, and AAC formats.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

use super::buffer::SampleBuffer;

/// Errors raised while building or loading sample buffers.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Channel length mismatch: expected {expected} samples, got {got}")]
    RaggedChannels { expected: usize, got: usize },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,
}

/// Decode an audio file into a planar sample buffer.
///
/// # Example
///
/// ```no_run
/// use djmix::audio::loader::load_audio;
/// use std::path::Path;
///
/// let track = load_audio(Path::new("song.mp3")).unwrap();
/// println!("Duration: {:.2}s", track.duration());
/// println!("Channels: {}", track.num_channels());
/// ```
pub fn load_audio(path: &Path) -> Result<SampleBuffer, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved = Vec::new();
    let mut sample_buf: Option<InterleavedBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(InterleavedBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = &mut sample_buf {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    let buffer = SampleBuffer::from_interleaved(&interleaved, channels, sample_rate)?;
    log::info!(
        "Decoded {}: {} frames, {} channels, {}Hz ({:.1}s)",
        path.display(),
        buffer.len(),
        buffer.num_channels(),
        sample_rate,
        buffer.duration()
    );
    Ok(buffer)
}
