//! Audio mixer — sums looping voices into a stereo output buffer.

use std::collections::HashMap;

use driftmix_core::PcmData;

use crate::backend::TrackStatus;

/// Identifies a voice inside a [`Mixer`].
pub type VoiceId = u64;

/// One loaded sound being rendered by the mixer.
#[derive(Debug, Clone)]
pub struct Voice {
    pcm: PcmData,
    /// Read position in source frames (fractional when resampling).
    position: f64,
    /// Source frames advanced per output frame.
    step: f64,
    /// Volume (0.0 to 1.0).
    pub volume: f32,
    pub looping: bool,
    pub status: TrackStatus,
}

impl Voice {
    fn new(pcm: PcmData, output_rate: u32, volume: f32, looping: bool) -> Self {
        let mut voice = Self {
            pcm,
            position: 0.0,
            step: 1.0,
            volume,
            looping,
            status: TrackStatus::Stopped,
        };
        voice.retune(output_rate);
        voice
    }

    fn retune(&mut self, output_rate: u32) {
        self.step = if output_rate == 0 {
            1.0
        } else {
            self.pcm.sample_rate as f64 / output_rate as f64
        };
    }

    /// Stop and rewind to the start.
    pub fn stop(&mut self) {
        self.status = TrackStatus::Stopped;
        self.position = 0.0;
    }

    /// Current position in source frames.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Next stereo frame, advancing the read position. `None` once a
    /// non-looping voice runs off the end.
    fn next_frame(&mut self) -> Option<(f32, f32)> {
        let frames = self.pcm.frames();
        if frames == 0 {
            self.stop();
            return None;
        }

        if self.position >= frames as f64 {
            if self.looping {
                self.position %= frames as f64;
            } else {
                self.stop();
                return None;
            }
        }

        let index = self.position as usize;
        let channels = self.pcm.channels as usize;
        let base = index * channels;
        let left = self.pcm.samples[base];
        let right = if channels > 1 {
            self.pcm.samples[base + 1]
        } else {
            left
        };

        self.position += self.step;
        Some((left, right))
    }
}

/// Sums every playing voice into interleaved stereo.
pub struct Mixer {
    voices: HashMap<VoiceId, Voice>,
    next_id: VoiceId,
    output_rate: u32,
    /// Master volume.
    pub master_volume: f32,
    /// Hard clamp on the summed signal.
    pub limiter_enabled: bool,
    /// Limiter threshold in linear amplitude.
    pub limiter_threshold: f32,
}

impl Mixer {
    pub fn new(output_rate: u32) -> Self {
        Self {
            voices: HashMap::new(),
            next_id: 1,
            output_rate,
            master_volume: 1.0,
            limiter_enabled: true,
            limiter_threshold: 0.98,
        }
    }

    /// Change the device rate; every voice is retuned.
    pub fn set_output_rate(&mut self, rate: u32) {
        self.output_rate = rate;
        for voice in self.voices.values_mut() {
            voice.retune(rate);
        }
    }

    /// Add a stopped voice.
    pub fn add_voice(&mut self, pcm: PcmData, volume: f32, looping: bool) -> VoiceId {
        let id = self.next_id;
        self.next_id += 1;
        self.voices
            .insert(id, Voice::new(pcm, self.output_rate, volume, looping));
        id
    }

    pub fn remove_voice(&mut self, id: VoiceId) -> bool {
        self.voices.remove(&id).is_some()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(&id)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(&id)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn playing_count(&self) -> usize {
        self.voices
            .values()
            .filter(|v| v.status.is_playing())
            .count()
    }

    /// Render `out.len() / 2` stereo frames, overwriting `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        for voice in self.voices.values_mut() {
            if !voice.status.is_playing() {
                continue;
            }
            let gain = voice.volume;
            for frame in out.chunks_exact_mut(2) {
                match voice.next_frame() {
                    Some((l, r)) => {
                        frame[0] += l * gain;
                        frame[1] += r * gain;
                    }
                    None => break,
                }
            }
        }

        for s in out.iter_mut() {
            *s *= self.master_volume;
        }

        if self.limiter_enabled {
            let threshold = self.limiter_threshold;
            for s in out.iter_mut() {
                *s = s.clamp(-threshold, threshold);
            }
        }
    }
}
