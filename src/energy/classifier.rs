//! Rule-based energy classifier with a neutral fallback.

use serde::{Deserialize, Serialize};

use super::categories::{CategoryScheme, CategoryTable, EnergyAnalysis};
use super::features::{EnergyFeatures, FeatureConfig, FeatureExtractor, FEATURE_COUNT};
use super::scoring::{create_strategy, ScoringStrategy, ScoringVariant};
use crate::audio::SampleBuffer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub scheme: CategoryScheme,
    pub scoring: ScoringVariant,
    /// Width of the slot vector exposed to hosts that expect a fixed model input.
    pub feature_slots: usize,
    pub features: FeatureConfig,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            scheme: CategoryScheme::ThreeLevel,
            scoring: ScoringVariant::Normalized,
            feature_slots: FEATURE_COUNT,
            features: FeatureConfig::default(),
        }
    }
}

/// Classifies a buffer into one of the table's energy categories.
///
/// Classification never fails; any problem yields
/// [`EnergyAnalysis::fallback`].
pub struct EnergyClassifier {
    table: CategoryTable,
    strategy: Box<dyn ScoringStrategy>,
    extractor: FeatureExtractor,
    feature_slots: usize,
}

impl EnergyClassifier {
    pub fn new(config: &EnergyConfig) -> Self {
        Self {
            table: config.scheme.table(),
            strategy: create_strategy(config.scoring),
            extractor: FeatureExtractor::new(config.features.clone()),
            feature_slots: config.feature_slots,
        }
    }

    /// Classifier over a custom table and strategy with default extraction.
    pub fn with_strategy(table: CategoryTable, strategy: Box<dyn ScoringStrategy>) -> Self {
        Self {
            table,
            strategy,
            extractor: FeatureExtractor::default(),
            feature_slots: FEATURE_COUNT,
        }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn scoring_variant(&self) -> ScoringVariant {
        self.strategy.variant()
    }

    pub fn classify(&self, buffer: &SampleBuffer) -> EnergyAnalysis {
        match self.extractor.extract(buffer) {
            Ok(features) => self.classify_features(&features),
            Err(e) => {
                log::warn!("Feature extraction failed ({}), using neutral energy", e);
                EnergyAnalysis::fallback(&self.table)
            }
        }
    }

    pub fn classify_features(&self, features: &EnergyFeatures) -> EnergyAnalysis {
        if let Some(name) = features.first_non_finite() {
            log::warn!("Feature {} is not finite, using neutral energy", name);
            return EnergyAnalysis::fallback(&self.table);
        }
        match self.strategy.score(features, &self.table) {
            Ok(scores) => {
                let analysis =
                    EnergyAnalysis::from_probabilities(&self.table, &scores.probabilities, scores.confidence);
                log::info!(
                    "Energy: {} ({:.0}% confidence, {} scoring)",
                    analysis.energy_level,
                    analysis.confidence * 100.0,
                    self.strategy.variant().name()
                );
                analysis
            }
            Err(e) => {
                log::warn!("Energy scoring failed ({}), using neutral energy", e);
                EnergyAnalysis::fallback(&self.table)
            }
        }
    }

    /// Feature vector laid out in the configured number of slots, or `None`
    /// when extraction fails.
    pub fn feature_slots(&self, buffer: &SampleBuffer) -> Option<Vec<f32>> {
        self.extractor
            .extract(buffer)
            .ok()
            .map(|f| f.to_slots(self.feature_slots))
    }
}

impl Default for EnergyClassifier {
    fn default() -> Self {
        Self::new(&EnergyConfig::default())
    }
}

impl std::fmt::Debug for EnergyClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnergyClassifier")
            .field("table", &self.table.labels())
            .field("strategy", &self.strategy.variant())
            .field("feature_slots", &self.feature_slots)
            .finish()
    }
}

/// Classify with the default configuration.
pub fn classify_energy(buffer: &SampleBuffer) -> EnergyAnalysis {
    EnergyClassifier::default().classify(buffer)
}
