//! Beat detection and BPM estimation from an RMS energy curve.
//!
//! 1. Slice the channel into windows with a quarter-window hop and take RMS
//! 2. Threshold at a multiple of the curve's median
//! 3. Accept strict local maxima (two neighbours each side) above the
//!    threshold, at least `min_spacing_seconds` apart
//! 4. Derive BPM from the mean inter-beat interval and confidence from how
//!    regular the intervals are

use serde::{Deserialize, Serialize};

use crate::audio::{AudioError, SampleBuffer};

/// Tuning for [`BeatDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// RMS window length in seconds. The hop is a quarter of this.
    pub window_seconds: f32,
    /// Threshold = median energy × this factor.
    pub threshold_factor: f32,
    /// Minimum distance between accepted beats in seconds.
    pub min_spacing_seconds: f32,
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// Reported when fewer than two beats are found.
    pub default_bpm: f32,
    /// Beat count below which confidence is `low_confidence`.
    pub min_beats_for_confidence: usize,
    pub low_confidence: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.05,
            threshold_factor: 1.5,
            min_spacing_seconds: 0.35,
            min_bpm: 85.0,
            max_bpm: 175.0,
            default_bpm: 120.0,
            min_beats_for_confidence: 4,
            low_confidence: 0.3,
        }
    }
}

impl BeatConfig {
    /// The wider 60-180 BPM band for quieter material.
    pub fn wide_band() -> Self {
        Self {
            min_bpm: 60.0,
            max_bpm: 180.0,
            ..Self::default()
        }
    }
}

/// Tempo and beat positions of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatInfo {
    pub bpm: f32,
    /// Beat positions as sample indices, strictly increasing.
    pub beats: Vec<usize>,
    /// Regularity of the beat spacing, 0.3 to 1.0.
    pub confidence: f32,
}

/// Calculate RMS (Root Mean Square) energy of audio samples.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// RMS of every full `window`-sample slice, advancing by `hop`.
pub fn energy_curve(samples: &[f32], window: usize, hop: usize) -> Vec<f32> {
    let window = window.max(1);
    let hop = hop.max(1);
    if samples.len() < window {
        return Vec::new();
    }
    (0..=samples.len() - window)
        .step_by(hop)
        .map(|start| calculate_rms(&samples[start..start + window]))
        .collect()
}

pub(crate) fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Energy-curve beat detector.
#[derive(Debug, Clone, Default)]
pub struct BeatDetector {
    config: BeatConfig,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    /// Detect beats on the mono downmix of `buffer`.
    ///
    /// Fails on buffers without channels or samples.
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<BeatInfo, AudioError> {
        buffer.require_audio()?;
        Ok(self.detect(&buffer.to_mono(), buffer.sample_rate()))
    }

    /// Detect beats in one channel.
    ///
    /// Never fails: too little material yields the default BPM and low
    /// confidence.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> BeatInfo {
        let beats = self.find_beats(samples, sample_rate);
        let bpm = self.estimate_bpm(&beats, sample_rate);
        let confidence = self.confidence(&beats);

        if beats.len() < 2 {
            log::debug!(
                "Only {} beat(s) found, using default {} BPM",
                beats.len(),
                self.config.default_bpm
            );
        }

        BeatInfo {
            bpm,
            beats,
            confidence,
        }
    }

    pub(crate) fn window_and_hop(&self, sample_rate: u32) -> (usize, usize) {
        let window = ((sample_rate as f32 * self.config.window_seconds) as usize).max(1);
        (window, (window / 4).max(1))
    }

    fn find_beats(&self, samples: &[f32], sample_rate: u32) -> Vec<usize> {
        let (window, hop) = self.window_and_hop(sample_rate);
        let energies = energy_curve(samples, window, hop);
        if energies.len() < 5 {
            return Vec::new();
        }

        let threshold = median(&energies) * self.config.threshold_factor;
        let min_spacing = (sample_rate as f32 * self.config.min_spacing_seconds) as usize;

        let mut beats: Vec<usize> = Vec::new();
        for i in 2..energies.len() - 2 {
            let e = energies[i];
            let is_peak = e > threshold
                && e > energies[i - 1]
                && e > energies[i - 2]
                && e > energies[i + 1]
                && e > energies[i + 2];
            if !is_peak {
                continue;
            }

            let position = i * hop;
            let far_enough = beats.last().map_or(true, |&last| position - last >= min_spacing);
            if far_enough {
                beats.push(position);
            }
        }
        beats
    }

    fn estimate_bpm(&self, beats: &[usize], sample_rate: u32) -> f32 {
        if beats.len() < 2 {
            return self.config.default_bpm;
        }
        let intervals = intervals(beats);
        let mean = intervals.iter().sum::<f32>() / intervals.len() as f32;
        let bpm = 60.0 * sample_rate as f32 / mean;
        bpm.clamp(self.config.min_bpm, self.config.max_bpm).round()
    }

    fn confidence(&self, beats: &[usize]) -> f32 {
        if beats.len() < self.config.min_beats_for_confidence.max(2) {
            return self.config.low_confidence;
        }
        let intervals = intervals(beats);
        let n = intervals.len() as f32;
        let mean = intervals.iter().sum::<f32>() / n;
        let variance = intervals.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / n;
        let cv = variance.sqrt() / mean;
        (1.0 - cv).clamp(self.config.low_confidence, 1.0)
    }
}

fn intervals(beats: &[usize]) -> Vec<f32> {
    beats.windows(2).map(|w| (w[1] - w[0]) as f32).collect()
}

/// Detect beats with the default configuration.
pub fn detect_beats(samples: &[f32], sample_rate: u32) -> BeatInfo {
    BeatDetector::default().detect(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::generate_pulse_track;
    use std::f32::consts::PI;

    #[test]
    fn test_calculate_rms() {
        // RMS of a sine wave should be 1/sqrt(2) ≈ 0.707
        let samples: Vec<f32> = (0..1000)
            .map(|i| (2.0 * PI * i as f32 / 100.0).sin())
            .collect();
        let rms = calculate_rms(&samples);
        assert!((rms - 0.707).abs() < 0.01);
    }

    #[test]
    fn test_energy_curve_shape() {
        let curve = energy_curve(&[1.0; 100], 20, 5);
        assert_eq!(curve.len(), 17);
        assert!(curve.iter().all(|&e| (e - 1.0).abs() < 1e-6));
        assert!(energy_curve(&[1.0; 10], 20, 5).is_empty());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_silence_uses_defaults() {
        let info = detect_beats(&vec![0.0; 44100 * 2], 44100);
        assert_eq!(info.bpm, 120.0);
        assert_eq!(info.confidence, 0.3);
        assert!(info.beats.is_empty());
    }

    #[test]
    fn test_pulse_track_tempo() {
        let samples = generate_pulse_track(120.0, 44100, 10.0, 0.05, 0.8);
        let info = detect_beats(&samples, 44100);

        assert!(info.beats.len() >= 15, "found {} beats", info.beats.len());
        assert!((info.bpm - 120.0).abs() <= 2.0, "bpm = {}", info.bpm);
        assert!(info.confidence > 0.8, "confidence = {}", info.confidence);
        assert!(info.beats.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_min_spacing_suppresses_fast_pulses() {
        // 240 BPM pulses are 250ms apart, closer than the 350ms minimum.
        let samples = generate_pulse_track(240.0, 44100, 6.0, 0.05, 0.8);
        let info = detect_beats(&samples, 44100);
        let min_gap = (44100.0 * 0.35) as usize;
        assert!(info.beats.windows(2).all(|w| w[1] - w[0] >= min_gap));
        assert!(info.bpm <= 175.0);
    }

    #[test]
    fn test_slow_pulses_clamped_to_band() {
        let samples = generate_pulse_track(50.0, 44100, 20.0, 0.05, 0.8);
        let info = detect_beats(&samples, 44100);
        assert!(info.beats.len() >= 2);
        assert_eq!(info.bpm, 85.0);

        let wide = BeatDetector::new(BeatConfig::wide_band()).detect(&samples, 44100);
        assert_eq!(wide.bpm, 60.0);
    }

    #[test]
    fn test_analyze_rejects_empty_buffer() {
        let empty = SampleBuffer::new(Vec::new(), 44100).unwrap();
        assert!(BeatDetector::default().analyze(&empty).is_err());
    }
}
