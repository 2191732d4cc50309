//! Scoring strategies mapping a feature vector onto a category table.
//!
//! Two interchangeable strategies are provided:
//! - Normalized: weighted closeness-to-target scores divided by their sum
//! - PenaltySoftmax: the older compact-vector model, distance scores with
//!   out-of-band penalties passed through a temperature-3 softmax

use serde::{Deserialize, Serialize};

use super::categories::{CategoryTable, EnergyCategory};
use super::features::{CompactFeatures, EnergyFeatures};

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("category table is empty")]
    NoCategories,
    #[error("scores are not finite")]
    NonFinite,
    #[error("all category scores are zero")]
    Degenerate,
}

/// Per-category probabilities (table order) plus confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    pub probabilities: Vec<f32>,
    pub confidence: f32,
}

/// A way of turning features into category probabilities.
pub trait ScoringStrategy: Send + Sync {
    fn variant(&self) -> ScoringVariant;

    fn score(&self, features: &EnergyFeatures, table: &CategoryTable) -> Result<Scores, ScoringError>;
}

/// Available scoring strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringVariant {
    #[default]
    Normalized,
    PenaltySoftmax,
}

impl ScoringVariant {
    pub fn all() -> &'static [ScoringVariant] {
        &[ScoringVariant::Normalized, ScoringVariant::PenaltySoftmax]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringVariant::Normalized => "normalized",
            ScoringVariant::PenaltySoftmax => "penalty_softmax",
        }
    }
}

/// Create a strategy instance from its variant.
///
/// # Example
/// ```
/// use djmix::energy::{create_strategy, ScoringStrategy, ScoringVariant};
///
/// let strategy = create_strategy(ScoringVariant::PenaltySoftmax);
/// assert_eq!(strategy.variant(), ScoringVariant::PenaltySoftmax);
/// ```
pub fn create_strategy(variant: ScoringVariant) -> Box<dyn ScoringStrategy> {
    match variant {
        ScoringVariant::Normalized => Box::new(NormalizedScorer::default()),
        ScoringVariant::PenaltySoftmax => Box::new(PenaltySoftmaxScorer::default()),
    }
}

/// 1 at the target, falling linearly to 0 at `band` away.
fn closeness(value: f32, target: f32, band: f32) -> f32 {
    (1.0 - (value - target).abs() / band).max(0.0)
}

/// Per-feature weights of [`NormalizedScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedWeights {
    pub loudness: f32,
    pub tempo: f32,
    pub pulse: f32,
    pub brightness: f32,
    pub peak: f32,
    pub noisiness: f32,
    /// BPM distance at which tempo closeness reaches zero.
    pub tempo_band: f32,
    /// Added to every category so the sum is never zero.
    pub floor: f32,
}

impl Default for NormalizedWeights {
    fn default() -> Self {
        Self {
            loudness: 0.3,
            tempo: 0.2,
            pulse: 0.15,
            brightness: 0.1,
            peak: 0.1,
            noisiness: 0.05,
            tempo_band: 30.0,
            floor: 1e-3,
        }
    }
}

/// Closeness scoring with plain normalisation. Confidence is the winning
/// probability.
///
/// Reads loudness, tempo, beat strength, centroid, peak and zero-crossing
/// rate. Rolloff, bandwidth, contrast, dynamic range and stereo width do not
/// affect the scores; they are carried for [`EnergyFeatures::to_slots`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedScorer {
    weights: NormalizedWeights,
}

impl NormalizedScorer {
    pub fn new(weights: NormalizedWeights) -> Self {
        Self { weights }
    }

    fn category_score(&self, features: &EnergyFeatures, category: &EnergyCategory) -> f32 {
        let w = &self.weights;
        let compact = CompactFeatures::from_features(features);
        let pulse = (features.beat_strength * 3.0).min(1.0);
        let noisiness = (features.zero_crossing_rate * 5.0).min(1.0);

        w.loudness * closeness(compact.rms, category.level, 0.35)
            + w.tempo * closeness(features.tempo, category.tempo, w.tempo_band)
            + w.pulse * closeness(pulse, category.level, 0.35)
            + w.brightness * closeness(compact.brightness, category.brightness, 0.5)
            + w.peak * closeness(compact.peak, category.level, 0.5)
            + w.noisiness * closeness(noisiness, category.level * 0.5, 0.5)
            + w.floor
    }
}

impl ScoringStrategy for NormalizedScorer {
    fn variant(&self) -> ScoringVariant {
        ScoringVariant::Normalized
    }

    fn score(&self, features: &EnergyFeatures, table: &CategoryTable) -> Result<Scores, ScoringError> {
        if table.is_empty() {
            return Err(ScoringError::NoCategories);
        }
        let raw: Vec<f32> = table.iter().map(|c| self.category_score(features, c)).collect();
        if raw.iter().any(|s| !s.is_finite()) {
            return Err(ScoringError::NonFinite);
        }
        let total: f32 = raw.iter().sum();
        if total <= 0.0 {
            return Err(ScoringError::Degenerate);
        }

        let probabilities: Vec<f32> = raw.iter().map(|s| s / total).collect();
        let confidence = probabilities.iter().copied().fold(0.0, f32::max);
        Ok(Scores {
            probabilities,
            confidence,
        })
    }
}

/// Distance scoring on [`CompactFeatures`] with a softmax over the
/// penalty-adjusted scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltySoftmaxScorer {
    pub temperature: f32,
    /// Loudness distance tolerated before the penalty applies.
    pub loudness_tolerance: f32,
    pub loudness_penalty: f32,
    /// BPM distance tolerated before the tempo penalty applies.
    pub tempo_tolerance: f32,
    pub tempo_penalty: f32,
    pub min_confidence: f32,
    pub max_confidence: f32,
}

impl Default for PenaltySoftmaxScorer {
    fn default() -> Self {
        Self {
            temperature: 3.0,
            loudness_tolerance: 0.3,
            loudness_penalty: 0.5,
            tempo_tolerance: 30.0,
            tempo_penalty: 0.2,
            min_confidence: 0.4,
            max_confidence: 0.95,
        }
    }
}

impl PenaltySoftmaxScorer {
    fn category_score(&self, features: &EnergyFeatures, category: &EnergyCategory) -> f32 {
        let compact = CompactFeatures::from_features(features).to_array();
        let targets = [
            category.level,
            ((category.tempo - 60.0) / 120.0).clamp(0.0, 1.0),
            category.level,
            category.brightness,
        ];
        let distance = compact
            .iter()
            .zip(targets)
            .map(|(x, t)| (x - t).abs())
            .sum::<f32>()
            / compact.len() as f32;

        let mut penalty = 0.0;
        let loudness_gap = (compact[0] - category.level).abs();
        if loudness_gap > self.loudness_tolerance {
            penalty += self.loudness_penalty * (loudness_gap - self.loudness_tolerance);
        }
        if (features.tempo - category.tempo).abs() > self.tempo_tolerance {
            penalty += self.tempo_penalty;
        }
        1.0 - distance - penalty
    }
}

impl ScoringStrategy for PenaltySoftmaxScorer {
    fn variant(&self) -> ScoringVariant {
        ScoringVariant::PenaltySoftmax
    }

    fn score(&self, features: &EnergyFeatures, table: &CategoryTable) -> Result<Scores, ScoringError> {
        if table.is_empty() {
            return Err(ScoringError::NoCategories);
        }
        let raw: Vec<f32> = table.iter().map(|c| self.category_score(features, c)).collect();
        if raw.iter().any(|s| !s.is_finite()) {
            return Err(ScoringError::NonFinite);
        }

        let scaled: Vec<f32> = raw.iter().map(|s| s * self.temperature).collect();
        let max = scaled.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scaled.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        let probabilities: Vec<f32> = exps.iter().map(|e| e / total).collect();

        let mut sorted = raw.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let gap = sorted[0] - sorted.get(1).copied().unwrap_or(0.0);
        let confidence = (0.5 + gap).clamp(self.min_confidence, self.max_confidence);

        Ok(Scores {
            probabilities,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(rms: f32, tempo: f32, peak: f32) -> EnergyFeatures {
        EnergyFeatures {
            rms,
            tempo,
            peak_amplitude: peak,
            beat_strength: rms,
            spectral_centroid: 1500.0,
            zero_crossing_rate: 0.05,
            ..EnergyFeatures::default()
        }
    }

    #[test]
    fn test_closeness() {
        assert_eq!(closeness(0.5, 0.5, 0.2), 1.0);
        assert!((closeness(0.6, 0.5, 0.2) - 0.5).abs() < 1e-6);
        assert_eq!(closeness(1.0, 0.5, 0.2), 0.0);
    }

    #[test]
    fn test_factory_variants() {
        for &variant in ScoringVariant::all() {
            assert_eq!(create_strategy(variant).variant(), variant);
        }
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let table = CategoryTable::five_level();
        let scores = NormalizedScorer::default()
            .score(&features(0.2, 125.0, 0.7), &table)
            .unwrap();
        assert_eq!(scores.probabilities.len(), 5);
        let sum: f32 = scores.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        let max = scores.probabilities.iter().copied().fold(0.0, f32::max);
        assert_eq!(scores.confidence, max);
    }

    #[test]
    fn test_normalized_orders_by_loudness() {
        let table = CategoryTable::three_level();
        let scorer = NormalizedScorer::default();
        let quiet = scorer.score(&features(0.05, 85.0, 0.1), &table).unwrap();
        let loud = scorer.score(&features(0.3, 135.0, 0.9), &table).unwrap();
        assert!(quiet.probabilities[0] > quiet.probabilities[2]);
        assert!(loud.probabilities[2] > loud.probabilities[0]);
    }

    #[test]
    fn test_extreme_finite_features_stay_normalised() {
        let table = CategoryTable::three_level();
        let scores = NormalizedScorer::default()
            .score(&features(1e30, 1e30, 1e30), &table)
            .unwrap();
        let sum: f32 = scores.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_ignores_slot_only_features() {
        let table = CategoryTable::five_level();
        let scorer = NormalizedScorer::default();
        let base = features(0.2, 125.0, 0.7);
        let varied = EnergyFeatures {
            spectral_rolloff: 9000.0,
            spectral_bandwidth: 4000.0,
            spectral_contrast: 3.0,
            dynamic_range: 1.8,
            stereo_width: 1.0,
            ..base
        };
        assert_eq!(
            scorer.score(&base, &table).unwrap(),
            scorer.score(&varied, &table).unwrap()
        );
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let table = CategoryTable::three_level();
        let bad = features(f32::NAN, 120.0, 0.5);
        assert!(matches!(
            NormalizedScorer::default().score(&bad, &table),
            Err(ScoringError::NonFinite)
        ));
        assert!(matches!(
            PenaltySoftmaxScorer::default().score(&bad, &table),
            Err(ScoringError::NonFinite)
        ));
    }

    #[test]
    fn test_penalty_softmax() {
        let table = CategoryTable::three_level();
        let scores = PenaltySoftmaxScorer::default()
            .score(&features(0.3, 135.0, 0.9), &table)
            .unwrap();
        let sum: f32 = scores.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores.probabilities[2] > scores.probabilities[1]);
        assert!(scores.probabilities[1] > scores.probabilities[0]);
        assert!((0.4..=0.95).contains(&scores.confidence));
    }
}
