//! Transition rendering: stem approximation and crossfading.

pub mod crossfade;
pub mod stems;

pub use crossfade::{crossfade, CrossfadeConfig, CrossfadeMode, MixSource};
pub use stems::{remove_vocals, split_stems, StemConfig, Stems};

use crate::audio::AudioError;

/// Errors that can occur while rendering a transition.
#[derive(Debug, thiserror::Error)]
pub enum MixError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Sample rate mismatch: track A is {a}Hz, track B is {b}Hz")]
    SampleRateMismatch { a: u32, b: u32 },
}
