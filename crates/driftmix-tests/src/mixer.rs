//! Decoding and mixing, without an output device.

use std::io::Write;

use driftmix_audio::decode::decode_file;
use driftmix_audio::{Mixer, RingBuffer, TrackStatus};
use driftmix_core::PcmData;

/// 16-bit PCM WAV with `frames` frames of a constant value.
fn wav_bytes(value: i16, frames: u32, channels: u16, rate: u32) -> Vec<u8> {
    let block = channels as u32 * 2;
    let data_len = frames * block;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * block).to_le_bytes());
    out.extend_from_slice(&(block as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for _ in 0..frames * channels as u32 {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[test]
fn decodes_wav_to_interleaved_f32() {
    let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    file.write_all(&wav_bytes(16384, 480, 2, 48000)).unwrap();

    let pcm = decode_file("tone", file.path()).unwrap();
    assert_eq!(pcm.channels, 2);
    assert_eq!(pcm.sample_rate, 48000);
    assert_eq!(pcm.frames(), 480);
    assert!(pcm.samples.iter().all(|s| (s - 0.5).abs() < 1e-3));
}

#[test]
fn muted_voice_produces_silence() {
    let mut mixer = Mixer::new(48000);
    let id = mixer.add_voice(PcmData::new(vec![1.0; 128], 48000, 2), 0.0, true);
    mixer.voice_mut(id).unwrap().status = TrackStatus::Playing;

    let mut out = vec![1.0f32; 128];
    mixer.render(&mut out);
    assert!(out.iter().all(|&s| s.abs() < 1e-6));
}

#[test]
fn limiter_clamps_summed_voices() {
    let mut mixer = Mixer::new(48000);
    for _ in 0..3 {
        let id = mixer.add_voice(PcmData::new(vec![0.8; 64], 48000, 2), 1.0, true);
        mixer.voice_mut(id).unwrap().status = TrackStatus::Playing;
    }

    let mut out = vec![0.0f32; 64];
    mixer.render(&mut out);
    assert!(out.iter().all(|&s| (s - mixer.limiter_threshold).abs() < 1e-6));
}

#[test]
fn resampling_advances_at_source_rate() {
    let mut mixer = Mixer::new(48000);
    let id = mixer.add_voice(PcmData::new(vec![0.1; 200], 24000, 2), 1.0, false);
    mixer.voice_mut(id).unwrap().status = TrackStatus::Playing;

    let mut out = vec![0.0f32; 40];
    mixer.render(&mut out);
    assert!((mixer.voice(id).unwrap().position() - 10.0).abs() < 1e-9);
}

#[test]
fn rendered_audio_flows_through_ring_buffer() {
    let ring = RingBuffer::new(256);
    let mut mixer = Mixer::new(48000);
    let id = mixer.add_voice(PcmData::new(vec![0.25; 64], 48000, 1), 1.0, true);
    mixer.voice_mut(id).unwrap().status = TrackStatus::Playing;

    let mut chunk = vec![0.0f32; 128];
    mixer.render(&mut chunk);
    assert_eq!(ring.write(&chunk), 128);

    let mut out = vec![0.0f32; 128];
    assert_eq!(ring.read(&mut out), 128);
    assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    assert!(ring.is_empty());
}
