//! Mid/side stem approximation.
//!
//! The centre (mid) signal stands in for vocals; subtracting it leaves an
//! approximate instrumental. This is a heuristic, not source separation.

use serde::{Deserialize, Serialize};

use crate::audio::SampleBuffer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemConfig {
    /// Gain applied to the centre signal before it is used or removed.
    pub attenuation: f32,
    /// Stereo width boost used by [`remove_vocals`].
    pub width: f32,
}

impl Default for StemConfig {
    fn default() -> Self {
        Self {
            attenuation: 0.8,
            width: 0.1,
        }
    }
}

/// Approximate vocal and instrumental versions of one track.
#[derive(Debug, Clone)]
pub struct Stems {
    pub vocals: SampleBuffer,
    pub instrumental: SampleBuffer,
}

fn center(buffer: &SampleBuffer, attenuation: f32) -> Vec<f32> {
    let left = &buffer.channels()[0];
    let right = &buffer.channels()[1];
    left.iter()
        .zip(right)
        .map(|(l, r)| (l + r) / 2.0 * attenuation)
        .collect()
}

/// Split `buffer` into vocal and instrumental stems of the same shape.
///
/// Buffers with fewer than two channels cannot be split and come back
/// unchanged in both stems.
pub fn split_stems(buffer: &SampleBuffer, config: &StemConfig) -> Stems {
    if buffer.num_channels() < 2 {
        return Stems {
            vocals: buffer.clone(),
            instrumental: buffer.clone(),
        };
    }

    let mid = center(buffer, config.attenuation);
    let vocals = vec![mid.clone(); buffer.num_channels()];
    let instrumental = buffer
        .channels()
        .iter()
        .map(|channel| channel.iter().zip(&mid).map(|(s, m)| s - m).collect())
        .collect();

    Stems {
        vocals: SampleBuffer::from_shaped(vocals, buffer.sample_rate()),
        instrumental: SampleBuffer::from_shaped(instrumental, buffer.sample_rate()),
    }
}

/// Standalone karaoke-style output: centre removed, width boosted, clipped.
pub fn remove_vocals(buffer: &SampleBuffer, config: &StemConfig) -> SampleBuffer {
    if buffer.num_channels() < 2 {
        return buffer.clone();
    }

    let instrumental = split_stems(buffer, config).instrumental.into_channels();
    let (wide, narrow) = (1.0 + config.width, config.width);
    let left = &instrumental[0];
    let right = &instrumental[1];

    let mut channels: Vec<Vec<f32>> = vec![
        left.iter()
            .zip(right)
            .map(|(l, r)| (l * wide - r * narrow).clamp(-1.0, 1.0))
            .collect(),
        right
            .iter()
            .zip(left)
            .map(|(r, l)| (r * wide - l * narrow).clamp(-1.0, 1.0))
            .collect(),
    ];
    channels.extend(
        instrumental[2..]
            .iter()
            .map(|c| c.iter().map(|s| s.clamp(-1.0, 1.0)).collect()),
    );

    SampleBuffer::from_shaped(channels, buffer.sample_rate())
}
