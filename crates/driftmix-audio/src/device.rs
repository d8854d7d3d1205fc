//! Output-device backend: decoded voices, a mixer thread and a cpal stream.
//!
//! Architecture:
//! - `Mixer` (behind a mutex) holds one voice per loaded track
//! - the mixer thread renders it into a `RingBuffer` a few ms ahead
//! - the cpal callback drains the ring buffer into the device
//!
//! The cpal stream is created and dropped on the mixer thread because
//! streams are not `Send` on every platform.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, SizedSample,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use driftmix_core::{DriftmixError, Result, Sound, SoundSource};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::backend::{AudioBackend, LoadOptions, PlaybackHandle, SessionMode, TrackStatus};
use crate::decode::decode_file;
use crate::mixer::{Mixer, VoiceId};
use crate::ring_buffer::RingBuffer;

/// Ring buffer length: ~100ms of stereo at 48kHz.
const RING_SAMPLES: usize = 48000 / 10 * 2;
/// Frames rendered per mixer pass.
const RENDER_FRAMES: usize = 256;
/// How often the mixer thread tops up the ring buffer.
const RENDER_INTERVAL: Duration = Duration::from_millis(5);

/// Plays tracks through the default output device.
pub struct DeviceBackend {
    mixer: Arc<Mutex<Mixer>>,
    session: Mutex<SessionMode>,
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceBackend {
    /// Open the default output device and start the mixer thread.
    pub fn open() -> Result<Self> {
        let mixer = Arc::new(Mutex::new(Mixer::new(0)));
        let ring = Arc::new(RingBuffer::new(RING_SAMPLES));
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = {
            let mixer = Arc::clone(&mixer);
            thread::Builder::new()
                .name("driftmix-mixer".into())
                .spawn(move || run_output(mixer, ring, ready_tx, shutdown_rx))?
        };

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| DriftmixError::Audio("mixer thread exited during startup".into()))??;

        info!(sample_rate, "Audio output opened");
        Ok(Self {
            mixer,
            session: Mutex::new(SessionMode::default()),
            shutdown: shutdown_tx,
            thread: Some(thread),
        })
    }

    pub fn session(&self) -> SessionMode {
        *self.session.lock()
    }
}

impl AudioBackend for DeviceBackend {
    fn name(&self) -> &'static str {
        "device"
    }

    fn configure_session(&self, mode: SessionMode) -> Result<()> {
        // A desktop output stream has no OS-level audio session; the mode is
        // recorded so it can be reported and applied by platform shims.
        debug!(?mode, "Audio session configured");
        *self.session.lock() = mode;
        Ok(())
    }

    fn load(&self, sound: &Sound, options: LoadOptions) -> Result<Box<dyn PlaybackHandle>> {
        let pcm = match &sound.source {
            SoundSource::File(path) => decode_file(sound.id.as_str(), path)?,
            SoundSource::Pcm(pcm) => pcm.clone(),
        };

        let voice = {
            let mut mixer = self.mixer.lock();
            let voice = mixer.add_voice(pcm, options.volume, options.looping);
            if options.autoplay {
                if let Some(v) = mixer.voice_mut(voice) {
                    v.status = TrackStatus::Playing;
                }
            }
            voice
        };

        Ok(Box::new(DeviceHandle {
            id: sound.id.to_string(),
            voice,
            mixer: Arc::clone(&self.mixer),
        }))
    }
}

impl Drop for DeviceBackend {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Mixer thread panicked");
            }
        }
    }
}

/// A voice in the device mixer.
struct DeviceHandle {
    id: String,
    voice: VoiceId,
    mixer: Arc<Mutex<Mixer>>,
}

impl DeviceHandle {
    fn with_voice<T>(&self, f: impl FnOnce(&mut crate::mixer::Voice) -> T) -> Result<T> {
        let mut mixer = self.mixer.lock();
        mixer
            .voice_mut(self.voice)
            .map(f)
            .ok_or_else(|| DriftmixError::transport(&self.id, "voice no longer exists"))
    }
}

impl PlaybackHandle for DeviceHandle {
    fn play(&mut self) -> Result<()> {
        self.with_voice(|v| v.status = TrackStatus::Playing)
    }

    fn pause(&mut self) -> Result<()> {
        self.with_voice(|v| {
            if v.status.is_playing() {
                v.status = TrackStatus::Paused;
            }
        })
    }

    fn stop(&mut self) -> Result<()> {
        self.with_voice(|v| v.stop())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.with_voice(|v| v.volume = volume)
    }

    fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.with_voice(|v| v.looping = looping)
    }

    fn status(&self) -> TrackStatus {
        self.mixer
            .lock()
            .voice(self.voice)
            .map(|v| v.status)
            .unwrap_or(TrackStatus::Stopped)
    }

    fn release(self: Box<Self>) {
        // Drop removes the voice.
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.mixer.lock().remove_voice(self.voice) {
            debug!(sound = %self.id, voice = self.voice, "Voice released");
        }
    }
}

/// Mixer thread body: open the stream, then keep the ring buffer full
/// until told to shut down.
fn run_output(
    mixer: Arc<Mutex<Mixer>>,
    ring: Arc<RingBuffer>,
    ready: Sender<Result<u32>>,
    shutdown: Receiver<()>,
) {
    let stream = match open_stream(Arc::clone(&ring)) {
        Ok((stream, sample_rate)) => {
            mixer.lock().set_output_rate(sample_rate);
            let _ = ready.send(Ok(sample_rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut scratch = vec![0.0f32; RENDER_FRAMES * 2];
    loop {
        match shutdown.recv_timeout(RENDER_INTERVAL) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        while ring.free() >= scratch.len() {
            mixer.lock().render(&mut scratch);
            ring.write(&scratch);
        }
    }

    drop(stream);
    info!("Audio output closed");
}

fn open_stream(ring: Arc<RingBuffer>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| DriftmixError::Audio("no output device found".into()))?;

    let supported = device
        .default_output_config()
        .map_err(|e| DriftmixError::Audio(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, ring)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, ring)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, ring)?,
        other => {
            return Err(DriftmixError::Audio(format!(
                "unsupported sample format '{other}'"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| DriftmixError::Audio(e.to_string()))?;
    Ok((stream, sample_rate))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<RingBuffer>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let output_channels = config.channels as usize;
    let mut stereo = Vec::<f32>::with_capacity(RING_SAMPLES);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / output_channels;
                stereo.resize(frames * 2, 0.0);
                let read = ring.read(&mut stereo);
                // Underrun: pad with silence.
                stereo[read..].fill(0.0);

                for (frame, lr) in data.chunks_mut(output_channels).zip(stereo.chunks(2)) {
                    let (l, r) = (lr[0], lr[1]);
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        let value = match (output_channels, ch) {
                            (1, _) => (l + r) * 0.5,
                            (_, 0) => l,
                            (_, 1) => r,
                            _ => (l + r) * 0.5,
                        };
                        *sample = T::from_sample(value);
                    }
                }
            },
            |err| warn!("Output stream error: {err}"),
            None,
        )
        .map_err(|e| DriftmixError::Audio(e.to_string()))
}
