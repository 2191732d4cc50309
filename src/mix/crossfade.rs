//! Fixed-length transition rendering between two tracks.

use serde::{Deserialize, Serialize};

use super::stems::Stems;
use super::MixError;
use crate::analysis::MixPoints;
use crate::audio::SampleBuffer;

/// How the two tracks are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossfadeMode {
    /// Straight linear crossfade of the full tracks.
    #[default]
    Basic,
    /// Vocals switch around the midpoint while the instrumental bed overlaps.
    Stems,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Length of the rendered transition.
    pub duration_seconds: f64,
    /// Output gain applied after blending.
    pub headroom: f32,
    pub mode: CrossfadeMode,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 20.0,
            headroom: 0.8,
            mode: CrossfadeMode::Basic,
        }
    }
}

/// Per-track input to the crossfader.
#[derive(Debug, Clone, Copy)]
pub enum MixSource<'a> {
    Full(&'a SampleBuffer),
    Split(&'a Stems),
}

impl MixSource<'_> {
    fn reference(&self) -> &SampleBuffer {
        match self {
            MixSource::Full(buffer) => buffer,
            MixSource::Split(stems) => &stems.instrumental,
        }
    }

    /// (vocal, instrumental) sample; a full track counts as all instrumental.
    ///
    /// Mono stems hold the same signal twice, so only the instrumental is read.
    fn parts(&self, channel: usize, index: usize) -> (f32, f32) {
        match self {
            MixSource::Full(buffer) => (0.0, buffer.sample_or_zero(channel, index)),
            MixSource::Split(stems) if stems.vocals.num_channels() < 2 => {
                (0.0, stems.instrumental.sample_or_zero(channel, index))
            }
            MixSource::Split(stems) => (
                stems.vocals.sample_or_zero(channel, index),
                stems.instrumental.sample_or_zero(channel, index),
            ),
        }
    }
}

/// Linear weights: A fades out as B fades in.
pub fn linear_weights(progress: f64) -> (f32, f32) {
    let p = progress.clamp(0.0, 1.0) as f32;
    (1.0 - p, p)
}

/// Vocal weights: A is gone by the midpoint, B only starts after it.
pub fn vocal_weights(progress: f64) -> (f32, f32) {
    let p = progress.clamp(0.0, 1.0) as f32;
    ((1.0 - 2.0 * p).max(0.0), (2.0 * p - 1.0).max(0.0))
}

/// Instrumental weights: A alone, then a 0.4-0.6 overlap, then B takes over.
pub fn instrumental_weights(progress: f64) -> (f32, f32) {
    let p = progress.clamp(0.0, 1.0) as f32;
    if p < 0.4 {
        (1.0, 0.0)
    } else if p <= 0.6 {
        let t = (p - 0.4) / 0.2;
        (1.0 - 0.3 * t, 0.7 * t)
    } else {
        let t = (p - 0.6) / 0.4;
        (0.7 * (1.0 - t), 0.7 + 0.3 * t)
    }
}

/// Render the transition from `a` (from its exit point) into `b` (from its
/// entry point).
///
/// The output has `round(duration × sample_rate)` samples and as many
/// channels as the wider input. Reads past either track's end contribute
/// silence. The result is not clipped.
pub fn crossfade(
    a: MixSource<'_>,
    b: MixSource<'_>,
    points: &MixPoints,
    config: &CrossfadeConfig,
) -> Result<SampleBuffer, MixError> {
    let ref_a = a.reference();
    let ref_b = b.reference();
    ref_a.require_audio()?;
    ref_b.require_audio()?;
    if ref_a.sample_rate() != ref_b.sample_rate() {
        return Err(MixError::SampleRateMismatch {
            a: ref_a.sample_rate(),
            b: ref_b.sample_rate(),
        });
    }

    let sample_rate = ref_a.sample_rate();
    let total = (config.duration_seconds.max(0.0) * sample_rate as f64).round() as usize;
    let num_channels = ref_a.num_channels().max(ref_b.num_channels());
    let start_a = points.exit.sample;
    let start_b = points.entry.sample;

    log::debug!(
        "Crossfading {} samples x {} channels ({:?}) from A@{} into B@{}",
        total,
        num_channels,
        config.mode,
        start_a,
        start_b
    );

    let mut channels = vec![vec![0.0f32; total]; num_channels];
    for i in 0..total {
        let progress = i as f64 / total as f64;
        let weights = match config.mode {
            CrossfadeMode::Basic => {
                let w = linear_weights(progress);
                (w, w)
            }
            CrossfadeMode::Stems => (vocal_weights(progress), instrumental_weights(progress)),
        };
        let ((va_w, vb_w), (ia_w, ib_w)) = weights;

        for (c, channel) in channels.iter_mut().enumerate() {
            let (voc_a, inst_a) = a.parts(c, start_a + i);
            let (voc_b, inst_b) = b.parts(c, start_b + i);
            let vocals = voc_a * va_w + voc_b * vb_w;
            let instrumental = inst_a * ia_w + inst_b * ib_w;
            channel[i] = (vocals + instrumental) * config.headroom;
        }
    }

    Ok(SampleBuffer::from_shaped(channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MixPoint;
    use crate::mix::stems::{split_stems, StemConfig};

    fn point(sample: usize) -> MixPoint {
        MixPoint {
            time: sample as f64 / 1000.0,
            sample,
            energy: 0.5,
            score: 0.5,
        }
    }

    fn points(a: usize, b: usize) -> MixPoints {
        MixPoints {
            exit: point(a),
            entry: point(b),
        }
    }

    fn config(seconds: f64, mode: CrossfadeMode) -> CrossfadeConfig {
        CrossfadeConfig {
            duration_seconds: seconds,
            mode,
            ..CrossfadeConfig::default()
        }
    }

    #[test]
    fn test_weight_schedules() {
        assert_eq!(linear_weights(0.25), (0.75, 0.25));
        assert_eq!(vocal_weights(0.25), (0.5, 0.0));
        assert_eq!(vocal_weights(0.75), (0.0, 0.5));
        assert_eq!(instrumental_weights(0.2), (1.0, 0.0));
        let (a, b) = instrumental_weights(0.5);
        assert!((a - 0.85).abs() < 1e-6 && (b - 0.35).abs() < 1e-6);
        let (a, b) = instrumental_weights(0.6);
        assert!((a - 0.7).abs() < 1e-6 && (b - 0.7).abs() < 1e-6);
        let (a, b) = instrumental_weights(1.0);
        assert!(a.abs() < 1e-6 && (b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_basic_fade_values() {
        let a = SampleBuffer::mono(vec![1.0; 1000], 1000).unwrap();
        let b = SampleBuffer::mono(vec![-1.0; 1000], 1000).unwrap();
        let out = crossfade(
            MixSource::Full(&a),
            MixSource::Full(&b),
            &points(0, 0),
            &config(0.1, CrossfadeMode::Basic),
        )
        .unwrap();

        assert_eq!(out.len(), 100);
        let samples = out.channel(0).unwrap();
        assert!((samples[0] - 0.8).abs() < 1e-6);
        // Halfway: 0.5 - 0.5 = 0.
        assert!(samples[50].abs() < 1e-6);
    }

    #[test]
    fn test_reads_past_end_are_silent() {
        let a = SampleBuffer::mono(vec![1.0; 10], 1000).unwrap();
        let b = SampleBuffer::mono(vec![0.0; 10], 1000).unwrap();
        let out = crossfade(
            MixSource::Full(&a),
            MixSource::Full(&b),
            &points(5, 0),
            &config(0.02, CrossfadeMode::Basic),
        )
        .unwrap();
        let samples = out.channel(0).unwrap();
        assert!(samples[4] > 0.0);
        assert!(samples[5..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_channel_count_is_max() {
        let a = SampleBuffer::mono(vec![0.5; 100], 1000).unwrap();
        let b = SampleBuffer::silence(2, 100, 1000).unwrap();
        let out = crossfade(
            MixSource::Full(&a),
            MixSource::Full(&b),
            &points(0, 0),
            &config(0.05, CrossfadeMode::Basic),
        )
        .unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.channel(0).unwrap(), out.channel(1).unwrap());
    }

    #[test]
    fn test_stem_mode_vocals_switch_at_midpoint() {
        // Centre-only content is all "vocal".
        let a = SampleBuffer::new(vec![vec![1.0; 1000], vec![1.0; 1000]], 1000).unwrap();
        let b = SampleBuffer::new(vec![vec![-1.0; 1000], vec![-1.0; 1000]], 1000).unwrap();
        let stem_config = StemConfig::default();
        let stems_a = split_stems(&a, &stem_config);
        let stems_b = split_stems(&b, &stem_config);

        let out = crossfade(
            MixSource::Split(&stems_a),
            MixSource::Split(&stems_b),
            &points(0, 0),
            &config(0.1, CrossfadeMode::Stems),
        )
        .unwrap();
        let samples = out.channel(0).unwrap();

        // Start: vocals 0.8 + instrumental 0.2 from A only.
        assert!((samples[0] - 0.8).abs() < 1e-5);
        // Midpoint: no vocals, instrumental 0.2*0.85 - 0.2*0.35.
        assert!((samples[50] - 0.08).abs() < 1e-5);
    }

    #[test]
    fn test_mono_stems_keep_basic_level() {
        let mono = SampleBuffer::mono(vec![0.5; 1000], 1000).unwrap();
        let stereo = SampleBuffer::new(vec![vec![0.5; 1000], vec![0.5; 1000]], 1000).unwrap();
        let stem_config = StemConfig::default();
        let mono_stems = split_stems(&mono, &stem_config);
        let stereo_stems = split_stems(&stereo, &stem_config);
        let silent = SampleBuffer::mono(vec![0.0; 1000], 1000).unwrap();
        let silent_stems = split_stems(&silent, &stem_config);

        let render = |a: MixSource<'_>, b: MixSource<'_>, mode| {
            crossfade(a, b, &points(0, 0), &config(0.1, mode)).unwrap()
        };
        let mono_split = render(
            MixSource::Split(&mono_stems),
            MixSource::Split(&silent_stems),
            CrossfadeMode::Stems,
        );
        let stereo_split = render(
            MixSource::Split(&stereo_stems),
            MixSource::Split(&silent_stems),
            CrossfadeMode::Stems,
        );
        let mono_full = render(
            MixSource::Full(&mono),
            MixSource::Full(&silent),
            CrossfadeMode::Basic,
        );

        let first = |buffer: &SampleBuffer| buffer.channel(0).unwrap()[0];
        assert!((first(&mono_split) - 0.4).abs() < 1e-6);
        assert!((first(&stereo_split) - 0.4).abs() < 1e-6);
        assert!((first(&mono_full) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let a = SampleBuffer::mono(vec![0.0; 10], 44100).unwrap();
        let b = SampleBuffer::mono(vec![0.0; 10], 48000).unwrap();
        let err = crossfade(
            MixSource::Full(&a),
            MixSource::Full(&b),
            &points(0, 0),
            &CrossfadeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MixError::SampleRateMismatch { .. }));
    }
}
