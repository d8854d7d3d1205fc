//! Headless backend: tracks transport state without producing sound.
//!
//! Used by tests and by the front-end when no output device is wanted.
//! Loads and transport calls can be made to fail for chosen sound ids, and
//! every call is counted.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use driftmix_core::{DriftmixError, Result, Sound};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::backend::{AudioBackend, LoadOptions, PlaybackHandle, SessionMode, TrackStatus};

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedStats {
    pub sessions: u64,
    pub loads: u64,
    pub plays: u64,
    pub pauses: u64,
    pub stops: u64,
    pub releases: u64,
}

/// Snapshot of one live simulated track.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrack {
    pub sound: String,
    pub status: TrackStatus,
    pub volume: f32,
    pub looping: bool,
}

#[derive(Default)]
struct Shared {
    stats: Mutex<SimulatedStats>,
    live: Mutex<HashMap<u64, SimulatedTrack>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_transport: Mutex<HashSet<String>>,
    session: Mutex<Option<SessionMode>>,
    gate: Gate,
    next_id: AtomicU64,
}

/// Blocks loads while closed.
#[derive(Default)]
struct Gate {
    closed: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut closed = self.closed.lock();
        while *closed {
            self.opened.wait(&mut closed);
        }
    }

    fn set(&self, closed: bool) {
        *self.closed.lock() = closed;
        if !closed {
            self.opened.notify_all();
        }
    }
}

/// A backend that plays nothing. Cloning shares state.
#[derive(Clone, Default)]
pub struct SimulatedBackend {
    shared: Arc<Shared>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every load of `id` fail.
    pub fn fail_loads_for(&self, id: impl Into<String>) {
        self.shared.failing_loads.lock().insert(id.into());
    }

    /// Make play/pause/stop on `id` fail.
    pub fn fail_transport_for(&self, id: impl Into<String>) {
        self.shared.failing_transport.lock().insert(id.into());
    }

    /// Block loads until the returned guard is released or dropped.
    pub fn hold_loads(&self) -> LoadGate {
        self.shared.gate.set(true);
        LoadGate {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn stats(&self) -> SimulatedStats {
        *self.shared.stats.lock()
    }

    /// Tracks loaded and not yet released.
    pub fn live_tracks(&self) -> Vec<SimulatedTrack> {
        let live = self.shared.live.lock();
        let mut ids: Vec<_> = live.keys().copied().collect();
        ids.sort_unstable();
        ids.iter().map(|id| live[id].clone()).collect()
    }

    pub fn live_count(&self) -> usize {
        self.shared.live.lock().len()
    }

    pub fn session(&self) -> Option<SessionMode> {
        *self.shared.session.lock()
    }
}

/// Keeps simulated loads blocked while alive.
pub struct LoadGate {
    shared: Arc<Shared>,
}

impl LoadGate {
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LoadGate {
    fn drop(&mut self) {
        self.shared.gate.set(false);
    }
}

impl AudioBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn configure_session(&self, mode: SessionMode) -> Result<()> {
        self.shared.stats.lock().sessions += 1;
        *self.shared.session.lock() = Some(mode);
        Ok(())
    }

    fn load(&self, sound: &Sound, options: LoadOptions) -> Result<Box<dyn PlaybackHandle>> {
        self.shared.gate.wait();
        self.shared.stats.lock().loads += 1;

        let id = sound.id.to_string();
        if self.shared.failing_loads.lock().contains(&id) {
            return Err(DriftmixError::load(id, "simulated load failure"));
        }

        let handle_id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let status = if options.autoplay {
            TrackStatus::Playing
        } else {
            TrackStatus::Stopped
        };
        self.shared.live.lock().insert(
            handle_id,
            SimulatedTrack {
                sound: id.clone(),
                status,
                volume: options.volume,
                looping: options.looping,
            },
        );
        trace!(sound = %id, handle = handle_id, "Simulated load");

        Ok(Box::new(SimulatedHandle {
            id: handle_id,
            sound: id,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct SimulatedHandle {
    id: u64,
    sound: String,
    shared: Arc<Shared>,
}

impl SimulatedHandle {
    fn transport(&mut self, status: TrackStatus) -> Result<()> {
        {
            let mut stats = self.shared.stats.lock();
            match status {
                TrackStatus::Playing => stats.plays += 1,
                TrackStatus::Paused => stats.pauses += 1,
                TrackStatus::Stopped => stats.stops += 1,
            }
        }
        if self.shared.failing_transport.lock().contains(&self.sound) {
            return Err(DriftmixError::transport(
                &self.sound,
                "simulated transport failure",
            ));
        }
        self.update(|t| {
            // Pausing a stopped track leaves it stopped.
            if !(status == TrackStatus::Paused && t.status == TrackStatus::Stopped) {
                t.status = status;
            }
        })
    }

    fn update(&self, f: impl FnOnce(&mut SimulatedTrack)) -> Result<()> {
        let mut live = self.shared.live.lock();
        let track = live
            .get_mut(&self.id)
            .ok_or_else(|| DriftmixError::transport(&self.sound, "track already released"))?;
        f(track);
        Ok(())
    }
}

impl PlaybackHandle for SimulatedHandle {
    fn play(&mut self) -> Result<()> {
        self.transport(TrackStatus::Playing)
    }

    fn pause(&mut self) -> Result<()> {
        self.transport(TrackStatus::Paused)
    }

    fn stop(&mut self) -> Result<()> {
        self.transport(TrackStatus::Stopped)
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.update(|t| t.volume = volume)
    }

    fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.update(|t| t.looping = looping)
    }

    fn status(&self) -> TrackStatus {
        self.shared
            .live
            .lock()
            .get(&self.id)
            .map(|t| t.status)
            .unwrap_or(TrackStatus::Stopped)
    }

    fn release(self: Box<Self>) {
        // Drop does the bookkeeping.
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        if self.shared.live.lock().remove(&self.id).is_some() {
            self.shared.stats.lock().releases += 1;
        }
    }
}
