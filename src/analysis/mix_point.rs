//! Mix-point selection: where to leave track A and where to enter track B.

use serde::{Deserialize, Serialize};

use super::beat::{calculate_rms, BeatInfo};
use crate::audio::{AudioError, SampleBuffer};

/// A candidate splice point in one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixPoint {
    /// Position in seconds.
    pub time: f64,
    /// Position as a sample index.
    pub sample: usize,
    /// Local RMS energy.
    pub energy: f32,
    pub score: f32,
}

/// Chosen exit point in A and entry point in B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixPoints {
    pub exit: MixPoint,
    pub entry: MixPoint,
}

/// Tuning for [`MixPointSelector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Allowed exit region of track A as fractions of its duration.
    pub exit_window: (f64, f64),
    /// Allowed entry region of track B as fractions of its duration.
    pub entry_window: (f64, f64),
    /// Length of the RMS window measured from each candidate beat.
    pub energy_window_seconds: f32,
    /// Candidates kept per track.
    pub top_k: usize,
    pub fallback_exit: f64,
    pub fallback_entry: f64,
    /// Energy and score given to fallback points.
    pub fallback_value: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            exit_window: (0.6, 0.85),
            entry_window: (0.15, 0.5),
            energy_window_seconds: 0.1,
            top_k: 5,
            fallback_exit: 0.7,
            fallback_entry: 0.3,
            fallback_value: 0.5,
        }
    }
}

/// Picks the best-matching (exit, entry) pair from two beat grids.
#[derive(Debug, Clone, Default)]
pub struct MixPointSelector {
    config: SelectorConfig,
}

impl MixPointSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Top candidates among `beats` lying inside `window` of the track,
    /// best first.
    pub fn candidates(
        &self,
        beats: &BeatInfo,
        track: &SampleBuffer,
        window: (f64, f64),
    ) -> Vec<MixPoint> {
        let mono = track.to_mono();
        let sample_rate = track.sample_rate();
        let len = mono.len() as f64;
        let lo = window.0 * len;
        let hi = window.1 * len;
        let span = hi - lo;
        let energy_len = ((sample_rate as f32 * self.config.energy_window_seconds) as usize).max(1);

        let mut candidates: Vec<MixPoint> = beats
            .beats
            .iter()
            .copied()
            .filter(|&b| (b as f64) >= lo && (b as f64) <= hi && b < mono.len())
            .map(|b| {
                let end = (b + energy_len).min(mono.len());
                let energy = calculate_rms(&mono[b..end]);
                let position = if span > 0.0 {
                    (b as f64 - lo) / span
                } else {
                    0.5
                };
                let position_score = 1.0 - (position - 0.5).abs() as f32;
                MixPoint {
                    time: b as f64 / sample_rate as f64,
                    sample: b,
                    energy,
                    score: energy * position_score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(self.config.top_k);
        candidates
    }

    /// Choose one exit point in `track_a` and one entry point in `track_b`.
    ///
    /// Falls back to fixed fractions of each track's duration when either
    /// track has no beat inside its window.
    pub fn select(
        &self,
        beats_a: &BeatInfo,
        track_a: &SampleBuffer,
        beats_b: &BeatInfo,
        track_b: &SampleBuffer,
    ) -> Result<MixPoints, AudioError> {
        track_a.require_audio()?;
        track_b.require_audio()?;

        let exits = self.candidates(beats_a, track_a, self.config.exit_window);
        let entries = self.candidates(beats_b, track_b, self.config.entry_window);
        log::debug!(
            "Mix candidates: {} exit, {} entry",
            exits.len(),
            entries.len()
        );

        if exits.is_empty() || entries.is_empty() {
            log::info!("No beat candidates in window, using fallback mix points");
            return Ok(MixPoints {
                exit: self.fallback_point(track_a, self.config.fallback_exit),
                entry: self.fallback_point(track_b, self.config.fallback_entry),
            });
        }

        let mut best: Option<(f32, MixPoints)> = None;
        for exit in &exits {
            for entry in &entries {
                let energy_match = 1.0 - (exit.energy - entry.energy).abs();
                let pair_score = energy_match * exit.score * entry.score;
                if best.map_or(true, |(score, _)| pair_score > score) {
                    best = Some((
                        pair_score,
                        MixPoints {
                            exit: *exit,
                            entry: *entry,
                        },
                    ));
                }
            }
        }

        // Both lists are non-empty so a pair was recorded.
        Ok(best.map(|(_, points)| points).unwrap_or(MixPoints {
            exit: exits[0],
            entry: entries[0],
        }))
    }

    fn fallback_point(&self, track: &SampleBuffer, fraction: f64) -> MixPoint {
        let sample = (track.len() as f64 * fraction) as usize;
        MixPoint {
            time: sample as f64 / track.sample_rate() as f64,
            sample,
            energy: self.config.fallback_value,
            score: self.config.fallback_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::generate_pulse_track;

    fn grid(start: usize, step: usize, end: usize, bpm: f32) -> BeatInfo {
        BeatInfo {
            bpm,
            beats: (start..end).step_by(step).collect(),
            confidence: 1.0,
        }
    }

    #[test]
    fn test_candidates_stay_in_window() {
        let sr = 44100;
        let track = SampleBuffer::mono(generate_pulse_track(128.0, sr, 30.0, 0.0, 0.8), sr).unwrap();
        let beats = grid(0, 20671, track.len(), 128.0);
        let selector = MixPointSelector::default();

        let candidates = selector.candidates(&beats, &track, (0.6, 0.85));
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 5);
        for c in &candidates {
            let fraction = c.time / track.duration();
            assert!((0.6..=0.85).contains(&fraction), "fraction {}", fraction);
        }
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_fallback_when_no_beats() {
        let sr = 44100;
        let a = SampleBuffer::silence(2, sr as usize * 10, sr).unwrap();
        let b = SampleBuffer::silence(2, sr as usize * 20, sr).unwrap();
        let empty = BeatInfo {
            bpm: 120.0,
            beats: Vec::new(),
            confidence: 0.3,
        };

        let points = MixPointSelector::default().select(&empty, &a, &empty, &b).unwrap();
        assert!((points.exit.time - 7.0).abs() < 1e-6);
        assert!((points.entry.time - 6.0).abs() < 1e-6);
        assert_eq!(points.exit.energy, 0.5);
        assert_eq!(points.entry.score, 0.5);
    }

    #[test]
    fn test_pair_prefers_matching_energy() {
        let sr = 44100;
        let loud = SampleBuffer::mono(vec![0.9; sr as usize * 10], sr).unwrap();
        let mut mixed = vec![0.9; sr as usize * 10];
        // Quieter stretch around 2-3s of track B.
        for s in &mut mixed[2 * sr as usize..3 * sr as usize] {
            *s = 0.2;
        }
        let quiet_then_loud = SampleBuffer::mono(mixed, sr).unwrap();

        let beats_a = grid(6 * sr as usize, sr as usize / 2, 8 * sr as usize, 120.0);
        let beats_b = grid(sr as usize * 3 / 2, sr as usize / 4, 5 * sr as usize, 120.0);

        let points = MixPointSelector::default()
            .select(&beats_a, &loud, &beats_b, &quiet_then_loud)
            .unwrap();
        assert!((points.exit.energy - points.entry.energy).abs() < 0.05);
    }
}
