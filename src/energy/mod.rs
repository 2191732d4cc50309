//! Energy feature extraction and classification.
//!
//! The classifier is rule-based: a fixed feature vector is scored against a
//! configurable category table by a selectable [`ScoringStrategy`].

pub mod categories;
pub mod classifier;
pub mod features;
pub mod scoring;

pub use categories::{CategoryScheme, CategoryTable, EnergyAnalysis, EnergyCategory};
pub use classifier::{classify_energy, EnergyClassifier, EnergyConfig};
pub use features::{
    CompactFeatures, EnergyFeatures, FeatureConfig, FeatureError, FeatureExtractor, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use scoring::{
    create_strategy, NormalizedScorer, NormalizedWeights, PenaltySoftmaxScorer, Scores,
    ScoringError, ScoringStrategy, ScoringVariant,
};
