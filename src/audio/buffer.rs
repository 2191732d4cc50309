//! Planar sample buffer shared by every stage of the mixer.

use serde::{Deserialize, Serialize};

use super::loader::AudioError;

/// Per-channel f32 samples plus sample rate.
///
/// Every channel has the same length. Samples are nominally in `-1.0..=1.0`
/// but mixing may push them past that range; the encoder clips on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleBuffer")]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

/// Unchecked wire form; deserialization goes through [`SampleBuffer::new`].
#[derive(Deserialize)]
struct RawSampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl TryFrom<RawSampleBuffer> for SampleBuffer {
    type Error = AudioError;

    fn try_from(raw: RawSampleBuffer) -> Result<Self, Self::Error> {
        Self::new(raw.channels, raw.sample_rate)
    }
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Fails if the sample rate is zero or the channels differ in length.
    /// Zero channels and zero-length channels are accepted here; stages that
    /// need audio call [`SampleBuffer::require_audio`].
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        if let Some(first) = channels.first() {
            let expected = first.len();
            if let Some(bad) = channels.iter().find(|c| c.len() != expected) {
                return Err(AudioError::RaggedChannels {
                    expected,
                    got: bad.len(),
                });
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Build from channels whose shape the caller already guarantees.
    pub(crate) fn from_shaped(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        Self {
            channels,
            sample_rate,
        }
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        Self::new(vec![samples], sample_rate)
    }

    /// Silent buffer of the given shape.
    pub fn silence(num_channels: usize, len: usize, sample_rate: u32) -> Result<Self, AudioError> {
        Self::new(vec![vec![0.0; len]; num_channels], sample_rate)
    }

    /// De-interleave `samples` into `num_channels` planar channels.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if num_channels == 0 {
            return Err(AudioError::InvalidInput(
                "interleaved data needs at least one channel".into(),
            ));
        }
        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Sample at `index` of `channel`, or 0.0 past the end.
    ///
    /// Channels past the last one read from the last channel, so a mono
    /// source fills every output channel.
    pub fn sample_or_zero(&self, channel: usize, index: usize) -> f32 {
        let Some(last) = self.channels.len().checked_sub(1) else {
            return 0.0;
        };
        self.channels[channel.min(last)]
            .get(index)
            .copied()
            .unwrap_or(0.0)
    }

    /// Average all channels into one.
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => (0..self.len())
                .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / n as f32)
                .collect(),
        }
    }

    /// Interleave channels frame by frame.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.num_channels());
        for i in 0..self.len() {
            out.extend(self.channels.iter().map(|c| c[i]));
        }
        out
    }

    /// Reject buffers with no channels or no samples.
    pub fn require_audio(&self) -> Result<(), AudioError> {
        if self.channels.is_empty() {
            return Err(AudioError::InvalidInput("buffer has no channels".into()));
        }
        if self.is_empty() {
            return Err(AudioError::InvalidInput("buffer has no samples".into()));
        }
        Ok(())
    }
}
