//! Synthetic audio generation for tests, benches and demos.
//!
//! Every generator is deterministic: noise comes from a seeded LCG.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Generate a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `amplitude` - Amplitude (0.0 to 1.0)
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Small linear congruential generator yielding values in -1.0..1.0.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 as f32 / u64::MAX as f32) * 2.0 - 1.0
    }
}

/// Generate white noise.
pub fn generate_white_noise(
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let mut rng = Lcg(seed);
    (0..num_samples).map(|_| amplitude * rng.next()).collect()
}

/// Generate a click track (metronome) of 10ms decaying sine clicks.
pub fn generate_click_track(
    bpm: f32,
    sample_rate: u32,
    duration: f32,
    click_freq: f32,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let click_samples = (sample_rate as f32 * 0.01) as usize;

    let mut samples = vec![0.0; num_samples];

    let mut pos = 0;
    while pos < num_samples {
        for i in 0..click_samples.min(num_samples - pos) {
            let t = i as f32 / sample_rate as f32;
            let envelope = (1.0 - i as f32 / click_samples as f32).powi(2);
            samples[pos + i] = envelope * (2.0 * PI * click_freq * t).sin();
        }
        pos += samples_per_beat.max(1);
    }

    samples
}

/// Generate a 150ms bass drum hit with a falling pitch.
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    let num_samples = (0.15 * sample_rate as f32) as usize;

    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // 150 Hz dropping to 50 Hz
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            let amp = (-t * 15.0).exp();
            amp * (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Kick on every beat over a quiet noise bed.
///
/// The first kick lands at `offset` seconds.
pub fn generate_pulse_track(
    bpm: f32,
    sample_rate: u32,
    duration: f32,
    offset: f32,
    level: f32,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let samples_per_beat = ((60.0 / bpm * sample_rate as f32) as usize).max(1);
    let kick = generate_kick(sample_rate);

    let mut samples = generate_white_noise(sample_rate, duration, 0.01 * level, 7);
    let mut pos = (offset * sample_rate as f32) as usize;
    while pos < num_samples {
        for (i, &k) in kick.iter().enumerate() {
            if pos + i >= num_samples {
                break;
            }
            samples[pos + i] += k * level;
        }
        pos += samples_per_beat;
    }
    samples
}

/// Energy character of a synthetic sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyStyle {
    /// Soft, low partials, no percussion.
    Chill,
    /// Medium partials with a kick/snare pattern every 0.5s.
    Groove,
    /// Bright partials with a kick every 0.25s.
    Club,
}

impl EnergyStyle {
    pub fn all() -> &'static [EnergyStyle] {
        &[EnergyStyle::Chill, EnergyStyle::Groove, EnergyStyle::Club]
    }
}

struct StyleParams {
    base_freq: f32,
    tempo_factor: f32,
    amplitude: f32,
    partials: usize,
    peak: f32,
}

fn style_params(style: EnergyStyle, index: usize) -> StyleParams {
    let i = index as f32;
    match style {
        EnergyStyle::Chill => StyleParams {
            base_freq: 200.0 + i * 8.0,
            tempo_factor: 0.4 + (index % 5) as f32 * 0.1,
            amplitude: 0.15 + (index % 3) as f32 * 0.05,
            partials: 1 + index % 2,
            peak: 0.12,
        },
        EnergyStyle::Groove => StyleParams {
            base_freq: 350.0 + i * 12.0,
            tempo_factor: 0.8 + (index % 6) as f32 * 0.08,
            amplitude: 0.25 + (index % 4) as f32 * 0.05,
            partials: 2 + index % 3,
            peak: 0.5,
        },
        EnergyStyle::Club => StyleParams {
            base_freq: 500.0 + i * 15.0,
            tempo_factor: 1.1 + (index % 7) as f32 * 0.07,
            amplitude: 0.35 + (index % 5) as f32 * 0.05,
            partials: 3 + index % 3,
            peak: 0.95,
        },
    }
}

fn add_hit(samples: &mut [f32], start: usize, len: usize, freq: f32, gain: f32, sample_rate: u32) {
    for i in 0..len {
        let Some(slot) = samples.get_mut(start + i) else {
            break;
        };
        let t = i as f32 / sample_rate as f32;
        *slot += gain * (2.0 * PI * freq * t).sin();
    }
}

/// Generate a mono sample with the energy character of `style`.
///
/// `index` varies pitch, partial count and level within the style so a
/// family of distinct but similar samples can be produced.
pub fn generate_energy_sample(
    style: EnergyStyle,
    index: usize,
    sample_rate: u32,
    duration: f32,
) -> Vec<f32> {
    let params = style_params(style, index);
    let num_samples = (duration * sample_rate as f32) as usize;
    let sr = sample_rate as f32;

    let mut samples: Vec<f32> = (0..num_samples)
        .map(|n| {
            let t = n as f32 / sr;
            (1..=params.partials)
                .map(|k| {
                    let freq = params.base_freq * k as f32 * params.tempo_factor;
                    params.amplitude / k as f32 * (2.0 * PI * freq * t).sin()
                })
                .sum()
        })
        .collect();

    match style {
        EnergyStyle::Chill => {}
        EnergyStyle::Groove => {
            let step = (0.5 * sr) as usize;
            for (beat, pos) in (0..num_samples).step_by(step.max(1)).enumerate() {
                if beat % 2 == 0 {
                    add_hit(&mut samples, pos, (0.1 * sr) as usize, 60.0, 0.15, sample_rate);
                } else {
                    add_hit(&mut samples, pos, (0.05 * sr) as usize, 200.0, 0.1, sample_rate);
                }
                add_hit(&mut samples, pos, (0.02 * sr) as usize, 800.0, 0.05, sample_rate);
            }
        }
        EnergyStyle::Club => {
            let step = (0.25 * sr) as usize;
            for (beat, pos) in (0..num_samples).step_by(step.max(1)).enumerate() {
                add_hit(&mut samples, pos, (0.15 * sr) as usize, 50.0, 0.2, sample_rate);
                if beat % 4 == 2 {
                    add_hit(&mut samples, pos, (0.08 * sr) as usize, 150.0, 0.15, sample_rate);
                }
                add_hit(&mut samples, pos, (0.01 * sr) as usize, 1000.0, 0.08, sample_rate);
            }
        }
    }

    let noise = generate_white_noise(sample_rate, duration, 0.005, index as u64 + 1);
    for (s, n) in samples.iter_mut().zip(noise) {
        *s += n;
    }

    let max_val = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if max_val > 0.0 {
        let gain = params.peak / max_val;
        for s in &mut samples {
            *s *= gain;
        }
    }
    samples
}

/// Pan a mono signal into two channels with the given left/right gains.
pub fn pan(samples: &[f32], left_gain: f32, right_gain: f32) -> Vec<Vec<f32>> {
    vec![
        samples.iter().map(|s| s * left_gain).collect(),
        samples.iter().map(|s| s * right_gain).collect(),
    ]
}
