//! End-to-end pipeline tests.

use std::sync::{Arc, Mutex};

use djmix::audio::synth::pan;
use djmix::audio::{generate_pulse_track, SampleBuffer};
use djmix::encode::{write_wav, WAV_HEADER_LEN};
use djmix::mix::CrossfadeMode;
use djmix::pipeline::{
    analyze_energy_file, detect_tempo_file, mix_buffers, mix_files, MixConfig, PipelineError,
    ProgressCallback,
};

const SAMPLE_RATE: u32 = 44100;

fn track(bpm: f32, seconds: f32, stereo: bool) -> SampleBuffer {
    let mono = generate_pulse_track(bpm, SAMPLE_RATE, seconds, 0.05, 0.8);
    let channels = if stereo { pan(&mono, 0.9, 0.6) } else { vec![mono] };
    SampleBuffer::new(channels, SAMPLE_RATE).unwrap()
}

fn recording_progress() -> (ProgressCallback, Arc<Mutex<Vec<f32>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Box::new(move |p| sink.lock().unwrap().push(p));
    (callback, seen)
}

#[test]
fn test_mix_buffers_end_to_end() {
    let a = track(128.0, 40.0, true);
    let b = track(130.0, 40.0, false);
    let (callback, seen) = recording_progress();

    let result = mix_buffers(&a, &b, &MixConfig::default(), Some(callback)).unwrap();

    assert_eq!(result.mix.len(), 20 * SAMPLE_RATE as usize);
    assert_eq!(result.mix.num_channels(), 2);
    assert_eq!(result.wav.len(), WAV_HEADER_LEN + result.mix.len() * 2 * 2);
    assert!((result.beats_a.bpm - 128.0).abs() <= 2.0);
    assert!((result.beats_b.bpm - 130.0).abs() <= 2.0);

    let sum: f32 = result.energy.probabilities.values().sum();
    assert!((sum - 1.0).abs() < 1e-6);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[0.3, 0.5, 0.7, 0.9, 1.0]);
}

#[test]
fn test_stem_mode_pipeline() {
    let a = track(124.0, 30.0, true);
    let b = track(126.0, 30.0, true);
    let mut config = MixConfig::default();
    config.crossfade.mode = CrossfadeMode::Stems;
    config.crossfade.duration_seconds = 8.0;

    let result = mix_buffers(&a, &b, &config, None).unwrap();
    assert_eq!(result.mix.len(), 8 * SAMPLE_RATE as usize);
    assert_eq!(result.mix.num_channels(), 2);
}

#[test]
fn test_mix_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.wav");
    let path_b = dir.path().join("b.wav");
    write_wav(&path_a, &track(120.0, 30.0, true)).unwrap();
    write_wav(&path_b, &track(122.0, 30.0, true)).unwrap();

    let config = MixConfig::from_json(r#"{ "crossfade": { "duration_seconds": 10.0 } }"#).unwrap();
    let (callback, seen) = recording_progress();
    let result = mix_files(&path_a, &path_b, &config, Some(callback)).unwrap();

    assert_eq!(result.mix.len(), 10 * SAMPLE_RATE as usize);
    assert!(seen.lock().unwrap().windows(2).all(|w| w[0] <= w[1]));

    let tempo = detect_tempo_file(&path_a, &config.beat).unwrap();
    assert!((tempo.bpm - 120.0).abs() <= 2.0);

    let energy = analyze_energy_file(&path_b, &config.energy);
    assert!(!energy.energy_level.is_empty());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.wav");
    write_wav(&present, &track(120.0, 2.0, false)).unwrap();

    let err = mix_files(dir.path().join("missing.wav"), &present, &MixConfig::default(), None)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Audio(_)));
}

#[test]
fn test_mono_tracks_same_level_in_stem_mode() {
    let a = track(128.0, 40.0, false);
    let b = track(130.0, 40.0, false);
    let basic = mix_buffers(&a, &b, &MixConfig::default(), None).unwrap();
    let mut config = MixConfig::default();
    config.crossfade.mode = CrossfadeMode::Stems;
    let stems = mix_buffers(&a, &b, &config, None).unwrap();

    // Both modes play A alone at the start of the transition.
    let head = (SAMPLE_RATE / 10) as usize;
    let basic_head = &basic.mix.channel(0).unwrap()[..head];
    let stems_head = &stems.mix.channel(0).unwrap()[..head];
    for (x, y) in basic_head.iter().zip(stems_head) {
        assert!((x - y).abs() < 1e-6);
    }
}
