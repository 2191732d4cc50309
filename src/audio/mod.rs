//! Audio buffers, decoding, and spectral primitives.
//!
//! This module provides:
//! - The planar [`SampleBuffer`] every stage consumes
//! - Audio file loading via Symphonia (WAV, MP3, FLAC, AAC)
//! - FFT magnitude spectra via RustFFT
//! - Deterministic synthetic signals for tests and demos

pub mod buffer;
pub mod fft;
pub mod loader;
pub mod synth;

pub use buffer::SampleBuffer;
pub use fft::{Spectrum, SpectrumAnalyzer};
pub use loader::{load_audio, AudioError};
pub use synth::{
    generate_click_track, generate_energy_sample, generate_kick, generate_pulse_track,
    generate_sine, generate_white_noise, EnergyStyle,
};
