//! Integration tests for WAV encoding, cross-checked with an independent reader.

use std::io::Cursor;

use djmix::audio::{generate_sine, SampleBuffer};
use djmix::encode::{encode_wav, to_pcm16, write_wav, WAV_HEADER_LEN};

#[test]
fn test_length_formula() {
    for (channels, len, rate) in [(1, 0, 8000), (1, 44100, 44100), (2, 1000, 48000), (6, 17, 22050)] {
        let buffer = SampleBuffer::silence(channels, len, rate).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN + len * channels * 2);

        let byte_rate = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
        let block_align = u16::from_le_bytes([bytes[32], bytes[33]]);
        assert_eq!(byte_rate, rate * channels as u32 * 2);
        assert_eq!(block_align as usize, channels * 2);
    }
}

#[test]
fn test_hound_reads_encoder_output() {
    let left = generate_sine(440.0, 44100, 0.25, 0.9);
    let right: Vec<f32> = left.iter().map(|s| s * -1.5).collect();
    let buffer = SampleBuffer::new(vec![left.clone(), right.clone()], 44100).unwrap();

    let bytes = encode_wav(&buffer).unwrap();
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.duration() as usize, buffer.len());

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), buffer.len() * 2);
    for (i, frame) in samples.chunks_exact(2).enumerate() {
        assert_eq!(frame[0], to_pcm16(left[i]));
        assert_eq!(frame[1], to_pcm16(right[i]));
    }
    // The right channel overshoots and must have been clipped.
    assert!(samples.iter().any(|&s| s == -32767 || s == 32767));
}

#[test]
fn test_write_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.wav");
    let buffer = SampleBuffer::mono(generate_sine(1000.0, 22050, 0.5, 0.5), 22050).unwrap();
    write_wav(&path, &buffer).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 22050);
    assert_eq!(reader.len() as usize, buffer.len());
}
