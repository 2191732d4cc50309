//! Magnitude spectra via RustFFT and the spectral shape measures built on them.

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrum of one analysis window.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Magnitudes from DC up to (excluding) Nyquist.
    pub magnitudes: Vec<f32>,
    /// Width of one bin in Hz.
    pub bin_hz: f32,
}

impl Spectrum {
    fn total(&self) -> f32 {
        self.magnitudes.iter().sum()
    }

    fn freq(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_hz
    }

    /// Magnitude-weighted mean frequency, or `None` for a silent window.
    pub fn centroid(&self) -> Option<f32> {
        let total = self.total();
        if total <= 1e-10 {
            return None;
        }
        let weighted: f32 = self
            .magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| self.freq(i) * m)
            .sum();
        Some(weighted / total)
    }

    /// Frequency below which `fraction` of the cumulative magnitude lies.
    pub fn rolloff(&self, fraction: f32) -> Option<f32> {
        let total = self.total();
        if total <= 1e-10 {
            return None;
        }
        let target = total * fraction;
        let mut cumulative = 0.0;
        for (i, &m) in self.magnitudes.iter().enumerate() {
            cumulative += m;
            if cumulative >= target {
                return Some(self.freq(i));
            }
        }
        Some(self.freq(self.magnitudes.len().saturating_sub(1)))
    }

    /// Magnitude-weighted standard deviation of frequency around the centroid.
    pub fn bandwidth(&self) -> Option<f32> {
        let centroid = self.centroid()?;
        let total = self.total();
        let spread: f32 = self
            .magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| m * (self.freq(i) - centroid).powi(2))
            .sum();
        Some((spread / total).sqrt())
    }

    /// Mean minus median magnitude.
    pub fn contrast(&self) -> f32 {
        if self.magnitudes.is_empty() {
            return 0.0;
        }
        let mean = self.total() / self.magnitudes.len() as f32;
        let mut sorted = self.magnitudes.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        mean - median
    }
}

/// Spectrum analyzer for audio data.
///
/// Applies a Hann window and returns positive-frequency magnitudes.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    fft_size: usize,
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create a new spectrum analyzer with the given FFT size.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size` is not a power of two.
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size.is_power_of_two(), "FFT size must be a power of 2");

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1).max(1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        Self {
            planner: FftPlanner::new(),
            fft_size,
            window,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins in the output (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Magnitude spectrum of the first `fft_size` samples.
    ///
    /// Shorter input is zero-padded.
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.fft_size];
        for ((slot, &s), &w) in buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }

        let fft = self.planner.plan_fft_forward(self.fft_size);
        fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() / (self.fft_size as f32).sqrt())
            .collect()
    }

    /// Spectra of overlapping windows advancing by `hop` samples.
    ///
    /// Input shorter than one window still yields a single zero-padded
    /// spectrum; empty input yields none.
    pub fn frames(&mut self, samples: &[f32], hop: usize, sample_rate: u32) -> Vec<Spectrum> {
        if samples.is_empty() {
            return Vec::new();
        }
        let hop = hop.max(1);
        let bin_hz = sample_rate as f32 / self.fft_size as f32;
        let last_start = samples.len().saturating_sub(self.fft_size);

        let mut spectra = Vec::with_capacity(last_start / hop + 1);
        let mut start = 0;
        loop {
            let end = (start + self.fft_size).min(samples.len());
            spectra.push(Spectrum {
                magnitudes: self.analyze(&samples[start..end]),
                bin_hz,
            });
            start += hop;
            if start > last_start {
                break;
            }
        }
        spectra
    }

    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.fft_size as f32
    }

    pub fn freq_to_bin(&self, freq: f32, sample_rate: u32) -> usize {
        (freq * self.fft_size as f32 / sample_rate as f32).round() as usize
    }
}
