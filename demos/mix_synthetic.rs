//! Example: Mix two tracks into a 20 second transition.
//!
//! With no arguments, two synthetic pulse tracks (128 and 130 BPM) are
//! generated and mixed. With two file arguments, those files are mixed.
//!
//! Run with:
//!     RUST_LOG=info cargo run --example mix_synthetic [track_a track_b] [--stems]

use anyhow::{bail, Context, Result};
use djmix::audio::synth::{generate_pulse_track, pan};
use djmix::audio::SampleBuffer;
use djmix::mix::CrossfadeMode;
use djmix::pipeline::{mix_buffers, mix_files, MixConfig, MixResult, ProgressCallback};
use std::path::Path;

fn synthetic_track(bpm: f32, seconds: f32, sample_rate: u32) -> Result<SampleBuffer> {
    let mono = generate_pulse_track(bpm, sample_rate, seconds, 0.05, 0.8);
    SampleBuffer::new(pan(&mono, 0.9, 0.7), sample_rate).context("building synthetic track")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let stems = args.iter().any(|a| a == "--stems");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let mut config = MixConfig::default();
    if stems {
        config.crossfade.mode = CrossfadeMode::Stems;
    }

    println!("DJ Mix Core - Transition Example");
    println!("================================\n");

    let progress: ProgressCallback = Box::new(|p| println!("  progress: {:>3.0}%", p * 100.0));

    let result: MixResult = match paths.as_slice() {
        [] => {
            let sample_rate = 44100;
            println!("Generating synthetic tracks (128 and 130 BPM, 60s each)...");
            let a = synthetic_track(128.0, 60.0, sample_rate)?;
            let b = synthetic_track(130.0, 60.0, sample_rate)?;
            mix_buffers(&a, &b, &config, Some(progress))?
        }
        [a, b] => {
            println!("Mixing {} into {}...", a, b);
            mix_files(a.as_str(), b.as_str(), &config, Some(progress))
                .with_context(|| format!("mixing {} into {}", a, b))?
        }
        _ => bail!("expected zero or two track paths"),
    };

    println!();
    println!("  Track A: {} BPM (confidence {:.2})", result.beats_a.bpm, result.beats_a.confidence);
    println!("  Track B: {} BPM (confidence {:.2})", result.beats_b.bpm, result.beats_b.confidence);
    println!(
        "  Exit A at {:.2}s, enter B at {:.2}s",
        result.mix_points.exit.time, result.mix_points.entry.time
    );
    println!(
        "  Energy: {} ({:.0}%)",
        result.energy.energy_level,
        result.energy.confidence * 100.0
    );
    for (label, p) in &result.energy.probabilities {
        println!("    {:<12} {:.3}", label, p);
    }

    let output_path = Path::new("transition_mix.wav");
    std::fs::write(output_path, &result.wav)
        .with_context(|| format!("writing {}", output_path.display()))?;
    println!("\nWrote {} ({} bytes)", output_path.display(), result.wav.len());

    Ok(())
}
