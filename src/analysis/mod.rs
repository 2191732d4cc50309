//! Tempo analysis and mix-point selection.

pub mod beat;
pub mod mix_point;

pub use beat::{calculate_rms, detect_beats, energy_curve, BeatConfig, BeatDetector, BeatInfo};
pub use mix_point::{MixPoint, MixPointSelector, MixPoints, SelectorConfig};
