//! DJ Mix Core
//!
//! Two-track transition engine: finds the beat grid of each track, picks
//! where to splice, renders a crossfade and classifies the energy of the
//! result.
//!
//! # Features
//!
//! - Audio loading (WAV, MP3, FLAC, AAC) via Symphonia
//! - Beat detection and BPM estimation
//! - Mix-point selection by energy matching
//! - Linear or stem-aware crossfades with mid/side vocal approximation
//! - 16-bit PCM WAV encoding
//! - Rule-based energy classification with selectable scoring strategies
//! - Python bindings via PyO3 (when `python` feature is enabled)

pub mod analysis;
pub mod audio;
pub mod encode;
pub mod energy;
pub mod mix;
pub mod pipeline;

// Re-export commonly used types
pub use analysis::{BeatConfig, BeatDetector, BeatInfo, MixPoint, MixPointSelector, MixPoints, SelectorConfig};
pub use audio::{load_audio, AudioError, SampleBuffer, SpectrumAnalyzer};
pub use encode::{encode_wav, write_wav, EncodeError};
pub use energy::{
    classify_energy, CategoryScheme, CategoryTable, EnergyAnalysis, EnergyClassifier, EnergyConfig,
    EnergyFeatures, ScoringStrategy, ScoringVariant,
};
pub use mix::{crossfade, remove_vocals, split_stems, CrossfadeConfig, CrossfadeMode, MixError, MixSource, StemConfig, Stems};
pub use pipeline::{
    analyze_energy_file, detect_tempo_file, mix_buffers, mix_files, MixConfig, MixResult,
    PipelineError, ProgressCallback,
};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
#[allow(deprecated)] // PyO3 0.27 deprecations - APIs still functional
mod python_bindings {
    use crate::audio::synth::{self, EnergyStyle};
    use crate::audio::SampleBuffer;
    use crate::energy::{CategoryScheme, EnergyConfig, ScoringVariant};
    use crate::mix::CrossfadeMode;
    use crate::pipeline::{self, MixConfig, ProgressCallback};
    use crate::BeatConfig;
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use pyo3::types::PyAny;
    use std::sync::{Arc, Mutex};

    fn runtime_err(e: impl std::fmt::Display) -> PyErr {
        PyRuntimeError::new_err(e.to_string())
    }

    fn parse_scheme(name: &str) -> PyResult<CategoryScheme> {
        match name.to_lowercase().as_str() {
            "three" | "3" | "three_level" => Ok(CategoryScheme::ThreeLevel),
            "five" | "5" | "five_level" => Ok(CategoryScheme::FiveLevel),
            _ => Err(PyValueError::new_err(format!("Unknown category scheme: {}", name))),
        }
    }

    fn parse_scoring(name: &str) -> PyResult<ScoringVariant> {
        ScoringVariant::all()
            .iter()
            .copied()
            .find(|v| v.name() == name.to_lowercase())
            .ok_or_else(|| {
                PyValueError::new_err(format!(
                    "Unknown scoring: {}. Available: normalized, penalty_softmax",
                    name
                ))
            })
    }

    /// Classify the energy of an audio file and return JSON.
    #[pyfunction]
    #[pyo3(signature = (audio_path, scheme="three", scoring="normalized"))]
    fn analyze_energy(py: Python<'_>, audio_path: &str, scheme: &str, scoring: &str) -> PyResult<String> {
        let config = EnergyConfig {
            scheme: parse_scheme(scheme)?,
            scoring: parse_scoring(scoring)?,
            ..EnergyConfig::default()
        };
        let path = audio_path.to_string();
        let analysis = py.allow_threads(|| pipeline::analyze_energy_file(&path, &config));
        serde_json::to_string_pretty(&analysis).map_err(runtime_err)
    }

    /// Detect the tempo of an audio file and return JSON beat info.
    #[pyfunction]
    #[pyo3(signature = (audio_path, wide_band=false))]
    fn detect_tempo(py: Python<'_>, audio_path: &str, wide_band: bool) -> PyResult<String> {
        let config = if wide_band {
            BeatConfig::wide_band()
        } else {
            BeatConfig::default()
        };
        let path = audio_path.to_string();
        let info = py
            .allow_threads(|| pipeline::detect_tempo_file(&path, &config))
            .map_err(runtime_err)?;
        serde_json::to_string_pretty(&info).map_err(runtime_err)
    }

    /// Mix two audio files, write the transition to a WAV file and return
    /// JSON describing the mix points and energy.
    #[pyfunction]
    #[pyo3(signature = (track_a, track_b, output_path, duration=20.0, stems=false, config_json=None, progress_callback=None))]
    fn mix_tracks(
        py: Python<'_>,
        track_a: &str,
        track_b: &str,
        output_path: &str,
        duration: f64,
        stems: bool,
        config_json: Option<&str>,
        progress_callback: Option<Py<PyAny>>,
    ) -> PyResult<String> {
        let mut config = match config_json {
            Some(json) => MixConfig::from_json(json).map_err(runtime_err)?,
            None => MixConfig::default(),
        };
        config.crossfade.duration_seconds = duration;
        if stems {
            config.crossfade.mode = CrossfadeMode::Stems;
        }

        // Create callback wrapper
        let callback: Option<ProgressCallback> = progress_callback.map(|cb| {
            let cb = Arc::new(Mutex::new(cb));
            Box::new(move |progress: f32| {
                Python::with_gil(|py| {
                    if let Ok(cb) = cb.lock() {
                        let _ = cb.call1(py, (progress,));
                    }
                });
            }) as ProgressCallback
        });

        let (a, b, output) = (track_a.to_string(), track_b.to_string(), output_path.to_string());
        let result = py
            .allow_threads(|| {
                let result = pipeline::mix_files(&a, &b, &config, callback)?;
                std::fs::write(&output, &result.wav)?;
                Ok::<_, pipeline::PipelineError>(result)
            })
            .map_err(runtime_err)?;

        let summary = serde_json::json!({
            "output_path": output_path,
            "duration": result.mix.duration(),
            "bpm_a": result.beats_a.bpm,
            "bpm_b": result.beats_b.bpm,
            "mix_points": result.mix_points,
            "energy": result.energy,
        });
        serde_json::to_string_pretty(&summary).map_err(runtime_err)
    }

    /// Generate a synthetic energy-style sample and save it to a WAV file.
    #[pyfunction]
    #[pyo3(signature = (output_path, style="groove", index=0, duration=10.0, sample_rate=22050))]
    fn generate_energy_sample(
        output_path: &str,
        style: &str,
        index: usize,
        duration: f32,
        sample_rate: u32,
    ) -> PyResult<()> {
        let style = match style.to_lowercase().as_str() {
            "chill" => EnergyStyle::Chill,
            "groove" => EnergyStyle::Groove,
            "club" => EnergyStyle::Club,
            _ => return Err(PyValueError::new_err(format!("Unknown style: {}", style))),
        };
        let samples = synth::generate_energy_sample(style, index, sample_rate, duration);
        let buffer = SampleBuffer::mono(samples, sample_rate).map_err(runtime_err)?;
        crate::encode::write_wav(std::path::Path::new(output_path), &buffer).map_err(runtime_err)
    }

    /// Generate a kick pulse track and save it to a WAV file.
    #[pyfunction]
    #[pyo3(signature = (output_path, bpm=128.0, duration=30.0, sample_rate=44100))]
    fn generate_pulse_track(output_path: &str, bpm: f32, duration: f32, sample_rate: u32) -> PyResult<()> {
        let samples = synth::generate_pulse_track(bpm, sample_rate, duration, 0.05, 0.8);
        let buffer = SampleBuffer::mono(samples, sample_rate).map_err(runtime_err)?;
        crate::encode::write_wav(std::path::Path::new(output_path), &buffer).map_err(runtime_err)
    }

    /// DJ mix core Python module
    #[pymodule]
    pub fn djmix(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        m.add_function(wrap_pyfunction!(analyze_energy, m)?)?;
        m.add_function(wrap_pyfunction!(detect_tempo, m)?)?;
        m.add_function(wrap_pyfunction!(mix_tracks, m)?)?;
        m.add_function(wrap_pyfunction!(generate_energy_sample, m)?)?;
        m.add_function(wrap_pyfunction!(generate_pulse_track, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python_bindings::*;
