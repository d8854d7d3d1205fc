//! Mix playback engine: owns the loaded tracks of the current mix (or of
//! the composer preview), the sleep timer, and the observable state.
//!
//! All track mutation happens under one async lock, so operations apply in
//! call order. `stop_mix` moves a generation counter on before taking the
//! lock; a load that finishes under a stale generation releases what it
//! loaded instead of starting playback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use driftmix_core::{DriftmixError, Result, SoundCatalog, SoundId, SoundMix, TimerMinutes};
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, SessionMode};
use crate::sleep_timer::SleepTimer;
use crate::state::{EngineState, PlaybackPhase};
use crate::track_set::{LoadedTracks, SkippedTrack, TrackInfo, TrackSet};

/// Volume a preview track starts at when the composer has none for it.
pub const DEFAULT_PREVIEW_VOLUME: f32 = 0.5;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Initial loop flag.
    pub loop_enabled: bool,
    /// Session requested before each mix starts.
    pub session: SessionMode,
    /// Sleep timer resolution. One tick is one second of countdown.
    pub timer_tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_enabled: true,
            session: SessionMode::BACKGROUND_EXCLUSIVE,
            timer_tick: Duration::from_secs(1),
        }
    }
}

/// What [`MixEngine::play_mix`] did.
#[derive(Debug)]
pub enum PlayOutcome {
    /// Playback started with `tracks` tracks.
    Started {
        tracks: usize,
        skipped: Vec<SkippedTrack>,
    },
    /// Every track failed to resolve or load; the engine is idle.
    NothingPlayable { skipped: Vec<SkippedTrack> },
    /// Another mix is loading; this call was ignored.
    AlreadyLoading,
    /// `stop_mix` ran while the tracks were loading.
    Cancelled,
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlayOutcome::Started { .. })
    }
}

#[derive(Default)]
struct Slots {
    mix: TrackSet,
    preview: TrackSet,
    /// Composer volumes, in the order sounds were first touched.
    preview_volumes: Vec<(SoundId, f32)>,
}

impl Slots {
    fn preview_volume(&self, id: &SoundId) -> Option<f32> {
        self.preview_volumes
            .iter()
            .find(|(sound, _)| sound == id)
            .map(|(_, v)| *v)
    }

    fn remember_volume(&mut self, id: &SoundId, volume: f32) {
        match self.preview_volumes.iter_mut().find(|(sound, _)| sound == id) {
            Some(entry) => entry.1 = volume,
            None => self.preview_volumes.push((id.clone(), volume)),
        }
    }
}

struct EngineInner {
    backend: Arc<dyn AudioBackend>,
    catalog: Arc<SoundCatalog>,
    config: EngineConfig,
    runtime: Handle,
    slots: Mutex<Slots>,
    state: watch::Sender<EngineState>,
    generation: AtomicU64,
    loading: AtomicBool,
    timer: parking_lot::Mutex<SleepTimer>,
}

impl EngineInner {
    fn publish(&self, update: impl FnOnce(&mut EngineState)) {
        self.state.send_modify(update);
    }

    fn cancel_timer(&self) {
        let mut timer = self.timer.lock();
        timer.cancel();
        self.publish(EngineState::clear_timer);
    }

    /// Stop and release the mix tracks. Caller holds the slots lock.
    fn stop_locked(&self, slots: &mut Slots) {
        self.cancel_timer();
        let loaded = slots.mix.len();
        slots.mix.stop_all();
        self.publish(|s| {
            s.phase = PlaybackPhase::Idle;
            s.current_mix = None;
        });
        if loaded > 0 {
            info!(tracks = loaded, "Mix stopped");
        }
    }

    fn stop_preview_locked(&self, slots: &mut Slots) {
        if !slots.preview.is_empty() {
            debug!(tracks = slots.preview.len(), "Stopping preview");
            slots.preview.stop_all();
        }
        self.publish(|s| s.previewing = false);
    }

    /// Starting preview playback ends the mix.
    fn leave_mix_mode(&self, slots: &mut Slots) {
        if !slots.mix.is_empty() || self.state.borrow().current_mix.is_some() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.stop_locked(slots);
        }
    }
}

/// Clears the loading flag, and a stranded `Loading` phase, when a play
/// call ends by any path, including its future being dropped.
struct LoadingGuard<'a> {
    inner: &'a EngineInner,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(inner: &'a EngineInner) -> Option<Self> {
        inner
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { inner })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.loading.store(false, Ordering::Release);
        self.inner.state.send_if_modified(|s| {
            if s.phase == PlaybackPhase::Loading {
                s.phase = PlaybackPhase::Idle;
                s.current_mix = None;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to the playback engine. Clones share one engine.
#[derive(Clone)]
pub struct MixEngine {
    inner: Arc<EngineInner>,
}

impl MixEngine {
    /// Create an engine on the current Tokio runtime.
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        catalog: Arc<SoundCatalog>,
        config: EngineConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| DriftmixError::Audio(format!("Engine needs a Tokio runtime: {}", e)))?;
        let (state, _) = watch::channel(EngineState::new(config.loop_enabled));

        info!(backend = backend.name(), sounds = catalog.len(), "Mix engine created");
        Ok(Self {
            inner: Arc::new(EngineInner {
                backend,
                catalog,
                config,
                runtime,
                slots: Mutex::new(Slots::default()),
                state,
                generation: AtomicU64::new(0),
                loading: AtomicBool::new(false),
                timer: parking_lot::Mutex::new(SleepTimer::new()),
            }),
        })
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.inner.catalog
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    /// Current state snapshot.
    pub fn state(&self) -> EngineState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    async fn slots(&self) -> MutexGuard<'_, Slots> {
        self.inner.slots.lock().await
    }

    /// Replace whatever is playing with `mix`.
    ///
    /// Tracks with unknown ids or failed loads are skipped. Returns
    /// [`PlayOutcome::AlreadyLoading`] without side effects while another
    /// mix is loading.
    pub async fn play_mix(&self, mix: SoundMix) -> Result<PlayOutcome> {
        if !mix.is_playable() {
            return Err(DriftmixError::validation("add at least one sound to your mix"));
        }
        for track in &mix.sounds {
            check_volume(track.volume)?;
        }

        let inner = &*self.inner;
        let Some(_loading) = LoadingGuard::acquire(inner) else {
            debug!(mix = %mix.id, "Mix already loading, ignoring play request");
            return Ok(PlayOutcome::AlreadyLoading);
        };
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.publish(|s| s.phase = PlaybackPhase::Loading);

        let mut slots = self.slots().await;
        if !slots.mix.is_empty() {
            info!(tracks = slots.mix.len(), "Stopping previous mix");
            slots.mix.stop_all();
            inner.publish(|s| s.current_mix = None);
        }
        inner.stop_preview_locked(&mut slots);

        if let Err(error) = inner.backend.configure_session(inner.config.session) {
            warn!(%error, "Failed to configure audio session");
        }

        let looping = inner.state.borrow().is_loop_enabled;
        info!(mix = %mix.id, name = %mix.name, tracks = mix.sounds.len(), "Loading mix");
        let LoadedTracks { mut set, skipped } =
            TrackSet::load_all(&inner.backend, &inner.catalog, &mix.sounds, looping).await;

        if inner.generation.load(Ordering::SeqCst) != generation {
            info!(mix = %mix.id, "Stop requested during load, releasing tracks");
            set.stop_all();
            return Ok(PlayOutcome::Cancelled);
        }

        if set.is_empty() {
            warn!(mix = %mix.id, skipped = skipped.len(), "No track of the mix could be loaded");
            inner.publish(|s| {
                s.phase = PlaybackPhase::Idle;
                s.current_mix = None;
            });
            return Ok(PlayOutcome::NothingPlayable { skipped });
        }

        let started = set.play_all();
        let tracks = set.len();
        slots.mix = set;
        inner.publish(|s| {
            s.phase = PlaybackPhase::Playing;
            s.current_mix = Some(mix);
        });
        info!(tracks, started, skipped = skipped.len(), "Mix playing");

        Ok(PlayOutcome::Started { tracks, skipped })
    }

    /// Pause every track of the mix. Handles stay loaded.
    pub async fn pause_mix(&self) {
        let mut slots = self.slots().await;
        slots.mix.pause_all();
        self.inner.publish(|s| {
            if s.phase == PlaybackPhase::Playing {
                s.phase = PlaybackPhase::Paused;
            }
        });
        debug!("Mix paused");
    }

    /// Resume the loaded mix without reloading. Returns `false` when there
    /// is no current mix.
    pub async fn resume_mix(&self) -> bool {
        let mut slots = self.slots().await;
        if self.inner.state.borrow().current_mix.is_none() {
            debug!("No current mix to resume");
            return false;
        }
        slots.mix.play_all();
        let any_playing = slots.mix.any_playing();
        self.inner.publish(|s| {
            s.phase = if any_playing {
                PlaybackPhase::Playing
            } else {
                PlaybackPhase::Paused
            };
        });
        debug!(any_playing, "Mix resumed");
        true
    }

    /// Stop and release every mix track and cancel the sleep timer.
    /// Safe to call in any state, including mid-load.
    pub async fn stop_mix(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_timer();
        let mut slots = self.slots().await;
        self.inner.stop_locked(&mut slots);
    }

    /// Flip the loop flag and apply it to every loaded track.
    pub async fn toggle_loop(&self) -> bool {
        let mut slots = self.slots().await;
        let enabled = !self.inner.state.borrow().is_loop_enabled;
        slots.mix.set_looping_all(enabled);
        self.inner.publish(|s| s.is_loop_enabled = enabled);
        info!(enabled, "Loop toggled");
        enabled
    }

    /// Arm the sleep timer for `minutes`; zero cancels it. Expiry stops
    /// the mix.
    pub fn set_timer(&self, minutes: u32) -> Result<()> {
        if minutes == 0 {
            self.inner.cancel_timer();
            info!("Sleep timer cancelled");
            return Ok(());
        }
        let minutes = TimerMinutes::new(minutes)?;

        let tick_engine: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let expire_engine = tick_engine.clone();
        let mut timer = self.inner.timer.lock();

        self.inner.publish(|s| {
            s.timer_minutes = minutes.get();
            s.timer_active = true;
            s.time_remaining = minutes.as_seconds();
        });
        timer.arm(
            &self.inner.runtime,
            minutes,
            self.inner.config.timer_tick,
            move |ticket, remaining| {
                if let Some(inner) = tick_engine.upgrade() {
                    inner.state.send_if_modified(|s| {
                        if ticket.is_current() {
                            s.time_remaining = remaining;
                            true
                        } else {
                            false
                        }
                    });
                }
            },
            move || async move {
                if let Some(inner) = expire_engine.upgrade() {
                    MixEngine { inner }.stop_mix().await;
                }
            },
        );
        info!(minutes = minutes.get(), "Sleep timer set");
        Ok(())
    }

    /// Change one mix track's volume. Zero pauses just that track; above
    /// zero starts it if it was not playing. Returns `false` if the sound
    /// is not part of the loaded mix.
    pub async fn set_track_volume(&self, id: &str, volume: f32) -> Result<bool> {
        check_volume(volume)?;
        let id = self.resolve(id)?;
        let mut slots = self.slots().await;
        if !slots.mix.set_volume(&id, volume)? {
            return Ok(false);
        }

        let any_playing = slots.mix.any_playing();
        self.inner.publish(|s| {
            if s.current_mix.is_some() {
                s.phase = if any_playing {
                    PlaybackPhase::Playing
                } else {
                    PlaybackPhase::Paused
                };
            }
        });
        Ok(true)
    }

    /// Snapshots of the loaded mix tracks, in mix order.
    pub async fn active_tracks(&self) -> Vec<TrackInfo> {
        self.slots().await.mix.infos()
    }

    /// Play or pause one sound in the composer. Starting a preview stops
    /// the mix. Returns whether the sound is now playing.
    pub async fn preview_toggle(&self, id: &str) -> Result<bool> {
        let id = self.resolve(id)?;
        let inner = &*self.inner;
        let mut slots = self.slots().await;
        inner.leave_mix_mode(&mut slots);

        let was_playing = slots.preview.get(&id).is_some_and(|t| t.is_playing());
        if !was_playing {
            // A muted sound comes back audible.
            let volume = slots
                .preview_volume(&id)
                .filter(|v| *v > 0.0)
                .unwrap_or(DEFAULT_PREVIEW_VOLUME);
            if slots.preview.contains(&id) {
                slots.preview.set_volume_quiet(&id, volume)?;
            } else {
                slots
                    .preview
                    .load_one(&inner.backend, &inner.catalog, &id, volume, true)
                    .await?;
            }
            slots.remember_volume(&id, volume);
        }

        let playing = slots.preview.toggle(&id)?.unwrap_or(false);
        let previewing = slots.preview.any_playing();
        inner.publish(|s| s.previewing = previewing);
        debug!(sound = %id, playing, "Preview toggled");
        Ok(playing)
    }

    /// Set a composer volume. Above zero the sound is previewed (loading
    /// it if needed); zero pauses its preview.
    pub async fn preview_set_volume(&self, id: &str, volume: f32) -> Result<()> {
        check_volume(volume)?;
        let id = self.resolve(id)?;
        let inner = &*self.inner;
        let mut slots = self.slots().await;
        slots.remember_volume(&id, volume);

        if volume > 0.0 {
            inner.leave_mix_mode(&mut slots);
        }
        if !slots.preview.set_volume(&id, volume)? && volume > 0.0 {
            slots
                .preview
                .load_one(&inner.backend, &inner.catalog, &id, volume, true)
                .await?;
            slots.preview.set_volume(&id, volume)?;
        }

        let previewing = slots.preview.any_playing();
        inner.publish(|s| s.previewing = previewing);
        Ok(())
    }

    /// Stop and release every preview track. Composer volumes are kept.
    pub async fn preview_stop(&self) {
        let mut slots = self.slots().await;
        self.inner.stop_preview_locked(&mut slots);
    }

    /// Composer volumes, in the order sounds were first touched.
    pub async fn preview_volumes(&self) -> Vec<(SoundId, f32)> {
        self.slots().await.preview_volumes.clone()
    }

    pub async fn preview_tracks(&self) -> Vec<TrackInfo> {
        self.slots().await.preview.infos()
    }

    /// Forget composer volumes and stop the preview.
    pub async fn preview_reset(&self) {
        let mut slots = self.slots().await;
        self.inner.stop_preview_locked(&mut slots);
        slots.preview_volumes.clear();
    }

    /// Build an unsaved mix from the composer volumes.
    pub async fn preview_mix(&self, name: &str) -> Result<SoundMix> {
        let volumes = self.preview_volumes().await;
        SoundMix::preview(name, volumes.into_iter().map(|(id, v)| (id.to_string(), v)))
    }

    /// Stop everything and release every handle.
    pub async fn shutdown(&self) {
        self.stop_mix().await;
        self.preview_stop().await;
        info!("Mix engine shut down");
    }

    fn resolve(&self, id: &str) -> Result<SoundId> {
        self.inner
            .catalog
            .resolve(id)
            .ok_or_else(|| DriftmixError::CatalogMiss(id.to_string()))
    }
}

fn check_volume(volume: f32) -> Result<()> {
    if volume.is_finite() && (0.0..=1.0).contains(&volume) {
        Ok(())
    } else {
        Err(DriftmixError::validation(format!(
            "volume must be between 0 and 1, got {}",
            volume
        )))
    }
}
