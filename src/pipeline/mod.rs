//! End-to-end transition pipeline: analysis, mixing, encoding, classification.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::{BeatConfig, BeatDetector, BeatInfo, MixPointSelector, MixPoints, SelectorConfig};
use crate::audio::{load_audio, AudioError, SampleBuffer};
use crate::encode::{encode_wav, EncodeError};
use crate::energy::{EnergyAnalysis, EnergyClassifier, EnergyConfig};
use crate::mix::{crossfade, split_stems, CrossfadeConfig, CrossfadeMode, MixError, MixSource, StemConfig};

/// Progress callback, called with values in `0.0..=1.0` that never decrease.
pub type ProgressCallback = Box<dyn Fn(f32) + Send>;

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub beat: BeatConfig,
    pub selector: SelectorConfig,
    pub stems: StemConfig,
    pub crossfade: CrossfadeConfig,
    pub energy: EnergyConfig,
}

impl MixConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Mix error: {0}")]
    Mix(#[from] MixError),
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything produced by one transition.
#[derive(Debug, Clone)]
pub struct MixResult {
    pub mix: SampleBuffer,
    /// The mix as a 16-bit PCM WAV file.
    pub wav: Vec<u8>,
    pub energy: EnergyAnalysis,
    pub mix_points: MixPoints,
    pub beats_a: BeatInfo,
    pub beats_b: BeatInfo,
}

fn report(progress: &Option<ProgressCallback>, value: f32) {
    if let Some(ref callback) = progress {
        callback(value);
    }
}

/// Render a transition from `a` into `b`.
pub fn mix_buffers(
    a: &SampleBuffer,
    b: &SampleBuffer,
    config: &MixConfig,
    progress: Option<ProgressCallback>,
) -> Result<MixResult, PipelineError> {
    a.require_audio()?;
    b.require_audio()?;
    if a.sample_rate() != b.sample_rate() {
        return Err(MixError::SampleRateMismatch {
            a: a.sample_rate(),
            b: b.sample_rate(),
        }
        .into());
    }
    report(&progress, 0.3);

    // Beat detection
    let detector = BeatDetector::new(config.beat.clone());
    let (beats_a, beats_b) = rayon::join(|| detector.analyze(a), || detector.analyze(b));
    let (beats_a, beats_b) = (beats_a?, beats_b?);
    log::info!(
        "Track A: {} BPM ({} beats), track B: {} BPM ({} beats)",
        beats_a.bpm,
        beats_a.beats.len(),
        beats_b.bpm,
        beats_b.beats.len()
    );
    report(&progress, 0.5);

    // Mix points
    let selector = MixPointSelector::new(config.selector.clone());
    let mix_points = selector.select(&beats_a, a, &beats_b, b)?;
    log::info!(
        "Mixing out of A at {:.2}s into B at {:.2}s",
        mix_points.exit.time,
        mix_points.entry.time
    );
    report(&progress, 0.7);

    // Crossfade
    let mix = match config.crossfade.mode {
        CrossfadeMode::Basic => crossfade(
            MixSource::Full(a),
            MixSource::Full(b),
            &mix_points,
            &config.crossfade,
        )?,
        CrossfadeMode::Stems => {
            let (stems_a, stems_b) = rayon::join(
                || split_stems(a, &config.stems),
                || split_stems(b, &config.stems),
            );
            crossfade(
                MixSource::Split(&stems_a),
                MixSource::Split(&stems_b),
                &mix_points,
                &config.crossfade,
            )?
        }
    };
    log::info!(
        "Rendered {:.1}s transition ({} samples, {} channels)",
        mix.duration(),
        mix.len(),
        mix.num_channels()
    );
    report(&progress, 0.9);

    let wav = encode_wav(&mix)?;
    let energy = EnergyClassifier::new(&config.energy).classify(&mix);
    report(&progress, 1.0);

    Ok(MixResult {
        mix,
        wav,
        energy,
        mix_points,
        beats_a,
        beats_b,
    })
}

/// Load two audio files and render a transition between them.
pub fn mix_files<P: AsRef<Path>, Q: AsRef<Path>>(
    path_a: P,
    path_b: Q,
    config: &MixConfig,
    progress: Option<ProgressCallback>,
) -> Result<MixResult, PipelineError> {
    let (path_a, path_b) = (path_a.as_ref(), path_b.as_ref());
    let (a, b) = rayon::join(|| load_audio(path_a), || load_audio(path_b));
    mix_buffers(&a?, &b?, config, progress)
}

/// Classify the energy of an audio file.
///
/// A file that cannot be loaded yields the neutral fallback.
pub fn analyze_energy_file<P: AsRef<Path>>(path: P, config: &EnergyConfig) -> EnergyAnalysis {
    let classifier = EnergyClassifier::new(config);
    match load_audio(path.as_ref()) {
        Ok(buffer) => classifier.classify(&buffer),
        Err(e) => {
            log::warn!(
                "Could not load {} ({}), using neutral energy",
                path.as_ref().display(),
                e
            );
            EnergyAnalysis::fallback(classifier.table())
        }
    }
}

/// Detect the tempo of an audio file.
pub fn detect_tempo_file<P: AsRef<Path>>(path: P, config: &BeatConfig) -> Result<BeatInfo, PipelineError> {
    let buffer = load_audio(path.as_ref())?;
    Ok(BeatDetector::new(config.clone()).analyze(&buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::{CategoryScheme, ScoringVariant};

    #[test]
    fn test_config_from_partial_json() {
        let config = MixConfig::from_json(
            r#"{
                "crossfade": { "duration_seconds": 8.0, "mode": "stems" },
                "energy": { "scheme": "five_level", "scoring": "penalty_softmax" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.crossfade.duration_seconds, 8.0);
        assert_eq!(config.crossfade.mode, CrossfadeMode::Stems);
        assert_eq!(config.crossfade.headroom, 0.8);
        assert_eq!(config.energy.scheme, CategoryScheme::FiveLevel);
        assert_eq!(config.energy.scoring, ScoringVariant::PenaltySoftmax);
        assert_eq!(config.beat, BeatConfig::default());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = MixConfig::default();
        let parsed = MixConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(matches!(
            MixConfig::from_json("{ not json"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_sample_rate_mismatch_rejected() {
        let a = SampleBuffer::mono(vec![0.0; 4410], 44100).unwrap();
        let b = SampleBuffer::mono(vec![0.0; 4800], 48000).unwrap();
        let err = mix_buffers(&a, &b, &MixConfig::default(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Mix(MixError::SampleRateMismatch { .. })));
    }

    #[test]
    fn test_empty_input_rejected() {
        let a = SampleBuffer::mono(Vec::new(), 44100).unwrap();
        let b = SampleBuffer::mono(vec![0.0; 4410], 44100).unwrap();
        let err = mix_buffers(&a, &b, &MixConfig::default(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Audio(AudioError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file_energy_falls_back() {
        let analysis = analyze_energy_file("/nonexistent/track.wav", &EnergyConfig::default());
        assert_eq!(analysis.energy_level, "Groove");
        assert_eq!(analysis.confidence, 0.5);
    }
}
