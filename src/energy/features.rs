//! Fixed-order feature vector for energy classification.

use serde::{Deserialize, Serialize};

use crate::analysis::beat::{calculate_rms, energy_curve, BeatConfig, BeatDetector};
use crate::audio::{SampleBuffer, SpectrumAnalyzer};

/// Number of computed features.
pub const FEATURE_COUNT: usize = 11;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "rms",
    "spectral_centroid",
    "zero_crossing_rate",
    "spectral_rolloff",
    "spectral_bandwidth",
    "tempo",
    "peak_amplitude",
    "dynamic_range",
    "spectral_contrast",
    "beat_strength",
    "stereo_width",
];

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("buffer has no channels")]
    NoChannels,
    #[error("buffer has no samples")]
    Empty,
    #[error("feature {0} is not finite")]
    NonFinite(&'static str),
    #[error("invalid feature config: {0}")]
    InvalidConfig(String),
}

/// Whole-track features. Spectral values are in Hz, tempo in BPM.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyFeatures {
    pub rms: f32,
    pub spectral_centroid: f32,
    pub zero_crossing_rate: f32,
    pub spectral_rolloff: f32,
    pub spectral_bandwidth: f32,
    pub tempo: f32,
    pub peak_amplitude: f32,
    /// Max sample minus min sample.
    pub dynamic_range: f32,
    /// Mean minus median spectral magnitude.
    pub spectral_contrast: f32,
    /// Mean windowed RMS.
    pub beat_strength: f32,
    /// Side/mid RMS ratio of the first two channels; 0 for mono.
    pub stereo_width: f32,
}

impl EnergyFeatures {
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.rms,
            self.spectral_centroid,
            self.zero_crossing_rate,
            self.spectral_rolloff,
            self.spectral_bandwidth,
            self.tempo,
            self.peak_amplitude,
            self.dynamic_range,
            self.spectral_contrast,
            self.beat_strength,
            self.stereo_width,
        ]
    }

    /// Features laid out in `width` slots, zero-padded or truncated.
    pub fn to_slots(&self, width: usize) -> Vec<f32> {
        let mut slots: Vec<f32> = self.to_array().into_iter().take(width).collect();
        slots.resize(width, 0.0);
        slots
    }

    /// Name of the first non-finite feature, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.to_array()
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(v, _)| !v.is_finite())
            .map(|(_, name)| name)
    }
}

/// The four normalised inputs of the older compact model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactFeatures {
    pub rms: f32,
    pub tempo: f32,
    pub peak: f32,
    pub brightness: f32,
}

impl CompactFeatures {
    /// Brightness assumed for a silent track.
    pub const SILENT_BRIGHTNESS_HZ: f32 = 2000.0;

    pub fn from_features(features: &EnergyFeatures) -> Self {
        let brightness = if features.spectral_centroid > 0.0 {
            features.spectral_centroid
        } else {
            Self::SILENT_BRIGHTNESS_HZ
        };
        Self {
            rms: (features.rms * 3.0).min(1.0),
            tempo: ((features.tempo - 60.0) / 120.0).clamp(0.0, 1.0),
            peak: (features.peak_amplitude * 1.5).min(1.0),
            brightness: ((brightness - 1000.0) / 6000.0).clamp(0.0, 1.0),
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.rms, self.tempo, self.peak, self.brightness]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub fft_size: usize,
    pub hop_size: usize,
    /// Cumulative magnitude fraction for the rolloff frequency.
    pub rolloff_fraction: f32,
    /// Coarse beat detector settings for the tempo and beat-strength features.
    pub tempo: BeatConfig,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_size: 1024,
            rolloff_fraction: 0.85,
            tempo: BeatConfig {
                window_seconds: 0.1,
                ..BeatConfig::wide_band()
            },
        }
    }
}

impl FeatureConfig {
    /// Largest accepted FFT size.
    pub const MAX_FFT_SIZE: usize = 1 << 16;

    /// Check the settings the spectrum analyzer and beat detector rely on.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !self.fft_size.is_power_of_two() || self.fft_size > Self::MAX_FFT_SIZE {
            return Err(FeatureError::InvalidConfig(format!(
                "fft_size must be a power of two up to {}, got {}",
                Self::MAX_FFT_SIZE,
                self.fft_size
            )));
        }
        if self.hop_size == 0 {
            return Err(FeatureError::InvalidConfig("hop_size must be positive".into()));
        }
        if !(self.rolloff_fraction > 0.0 && self.rolloff_fraction <= 1.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "rolloff_fraction must be in (0, 1], got {}",
                self.rolloff_fraction
            )));
        }
        if !(self.tempo.window_seconds.is_finite() && self.tempo.window_seconds > 0.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "tempo window must be positive, got {}",
                self.tempo.window_seconds
            )));
        }
        Ok(())
    }
}

/// Computes [`EnergyFeatures`] from a sample buffer.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract the feature vector from the first channel (stereo width uses
    /// the first two).
    pub fn extract(&self, buffer: &SampleBuffer) -> Result<EnergyFeatures, FeatureError> {
        self.config.validate()?;
        let samples = buffer.channel(0).ok_or(FeatureError::NoChannels)?;
        if samples.is_empty() {
            return Err(FeatureError::Empty);
        }
        let sample_rate = buffer.sample_rate();

        let (centroid, rolloff, bandwidth, contrast) = self.spectral_shape(samples, sample_rate);

        let detector = BeatDetector::new(self.config.tempo.clone());
        let tempo = detector.detect(samples, sample_rate).bpm;
        let (window, hop) = detector.window_and_hop(sample_rate);
        let curve = energy_curve(samples, window, hop);
        let rms = calculate_rms(samples);
        let beat_strength = if curve.is_empty() {
            rms
        } else {
            curve.iter().sum::<f32>() / curve.len() as f32
        };

        let (min, max) = samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });

        let features = EnergyFeatures {
            rms,
            spectral_centroid: centroid,
            zero_crossing_rate: zero_crossing_rate(samples),
            spectral_rolloff: rolloff,
            spectral_bandwidth: bandwidth,
            tempo,
            peak_amplitude: samples.iter().map(|s| s.abs()).fold(0.0, f32::max),
            dynamic_range: max - min,
            spectral_contrast: contrast,
            beat_strength,
            stereo_width: stereo_width(buffer),
        };

        if let Some(name) = features.first_non_finite() {
            return Err(FeatureError::NonFinite(name));
        }
        log::debug!("Energy features: {:?}", features);
        Ok(features)
    }

    /// Mean centroid, rolloff, bandwidth and contrast over all windows.
    fn spectral_shape(&self, samples: &[f32], sample_rate: u32) -> (f32, f32, f32, f32) {
        let mut analyzer = SpectrumAnalyzer::new(self.config.fft_size);
        let frames = analyzer.frames(samples, self.config.hop_size, sample_rate);

        let mean_of = |values: Vec<f32>| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f32>() / values.len() as f32
            }
        };

        let centroid = mean_of(frames.iter().filter_map(|f| f.centroid()).collect());
        let rolloff = mean_of(
            frames
                .iter()
                .filter_map(|f| f.rolloff(self.config.rolloff_fraction))
                .collect(),
        );
        let bandwidth = mean_of(frames.iter().filter_map(|f| f.bandwidth()).collect());
        let contrast = mean_of(frames.iter().map(|f| f.contrast()).collect());
        (centroid, rolloff, bandwidth, contrast)
    }
}

/// Fraction of adjacent sample pairs that change sign.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

fn stereo_width(buffer: &SampleBuffer) -> f32 {
    let (Some(left), Some(right)) = (buffer.channel(0), buffer.channel(1)) else {
        return 0.0;
    };
    let mid: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l + r) / 2.0).collect();
    let side: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l - r) / 2.0).collect();
    let (mid_rms, side_rms) = (calculate_rms(&mid), calculate_rms(&side));
    if mid_rms <= 1e-9 {
        return if side_rms > 1e-9 { 1.0 } else { 0.0 };
    }
    (side_rms / mid_rms).clamp(0.0, 1.0)
}
