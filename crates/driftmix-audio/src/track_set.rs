//! The set of loaded, independently controllable tracks of one mix.
//!
//! Failures confined to one track (unknown id, load error, transport
//! error) are logged and skipped; they never abort the aggregate
//! operation.

use std::sync::Arc;

use driftmix_core::{dedupe_tracks, DriftmixError, MixTrack, Result, SoundCatalog, SoundId};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::backend::{AudioBackend, LoadOptions, PlaybackHandle, TrackStatus};

/// One loaded sound: the runtime counterpart of a [`MixTrack`].
pub struct TrackHandle {
    id: SoundId,
    resource: Box<dyn PlaybackHandle>,
    volume: f32,
    looping: bool,
}

impl TrackHandle {
    pub fn id(&self) -> &SoundId {
        &self.id
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn status(&self) -> TrackStatus {
        self.resource.status()
    }

    pub fn is_playing(&self) -> bool {
        self.status().is_playing()
    }

    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            id: self.id.clone(),
            volume: self.volume,
            looping: self.looping,
            status: self.status(),
        }
    }

    fn play(&mut self) -> Result<()> {
        self.resource.play()
    }

    fn pause(&mut self) -> Result<()> {
        self.resource.pause()
    }

    fn stop(&mut self) -> Result<()> {
        self.resource.stop()
    }

    fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.resource.set_looping(looping)?;
        self.looping = looping;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.resource.set_volume(volume)?;
        self.volume = volume;
        Ok(())
    }

    fn release(self) {
        self.resource.release();
    }
}

/// Plain snapshot of a track for observers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub id: SoundId,
    pub volume: f32,
    pub looping: bool,
    pub status: TrackStatus,
}

/// A mix entry that did not make it into the set.
#[derive(Debug)]
pub struct SkippedTrack {
    pub id: String,
    pub error: DriftmixError,
}

/// Result of [`TrackSet::load_all`].
pub struct LoadedTracks {
    pub set: TrackSet,
    pub skipped: Vec<SkippedTrack>,
}

/// Tracks of the current mix, in mix order.
#[derive(Default)]
pub struct TrackSet {
    tracks: Vec<TrackHandle>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and load every track concurrently, without starting playback.
    ///
    /// Unknown ids and failed loads are reported in `skipped`; the rest of
    /// the mix still loads. Repeated ids load once (last volume wins).
    pub async fn load_all(
        backend: &Arc<dyn AudioBackend>,
        catalog: &SoundCatalog,
        tracks: &[MixTrack],
        looping: bool,
    ) -> LoadedTracks {
        let mut skipped = Vec::new();
        let mut pending = Vec::new();

        for (slot, track) in dedupe_tracks(tracks).into_iter().enumerate() {
            match catalog.lookup(&track.id) {
                Some(sound) => pending.push((slot, sound.clone(), track.volume)),
                None => {
                    warn!(sound = %track.id, "Sound not in catalog, skipping");
                    skipped.push(SkippedTrack {
                        error: DriftmixError::CatalogMiss(track.id.clone()),
                        id: track.id,
                    });
                }
            }
        }

        let mut jobs = JoinSet::new();
        for (slot, sound, volume) in pending {
            let backend = Arc::clone(backend);
            jobs.spawn_blocking(move || {
                let options = LoadOptions::new(volume, looping);
                let result = backend.load(&sound, options);
                (slot, sound.id, volume, result)
            });
        }

        let mut loaded = Vec::new();
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((slot, id, volume, Ok(resource))) => {
                    debug!(sound = %id, volume, "Track loaded");
                    loaded.push((
                        slot,
                        TrackHandle {
                            id,
                            resource,
                            volume,
                            looping,
                        },
                    ));
                }
                Ok((_, id, _, Err(error))) => {
                    warn!(sound = %id, %error, "Failed to load track, skipping");
                    skipped.push(SkippedTrack {
                        id: id.to_string(),
                        error,
                    });
                }
                Err(join_error) => {
                    warn!(error = %join_error, "Track load task failed");
                }
            }
        }

        loaded.sort_by_key(|(slot, _)| *slot);
        LoadedTracks {
            set: Self {
                tracks: loaded.into_iter().map(|(_, t)| t).collect(),
            },
            skipped,
        }
    }

    /// Load a single sound and add it to the set.
    pub async fn load_one(
        &mut self,
        backend: &Arc<dyn AudioBackend>,
        catalog: &SoundCatalog,
        id: &SoundId,
        volume: f32,
        looping: bool,
    ) -> Result<()> {
        let sound = catalog
            .lookup(id.as_str())
            .cloned()
            .ok_or_else(|| DriftmixError::CatalogMiss(id.to_string()))?;

        let backend = Arc::clone(backend);
        let resource = tokio::task::spawn_blocking(move || {
            backend.load(&sound, LoadOptions::new(volume, looping))
        })
        .await
        .map_err(|e| DriftmixError::load(id.as_str(), e))??;

        self.remove(id);
        self.tracks.push(TrackHandle {
            id: id.clone(),
            resource,
            volume,
            looping,
        });
        Ok(())
    }

    /// Start every audible track. Muted tracks are left as they are, and
    /// tracks that fail to start are logged and skipped. Returns how many
    /// started.
    pub fn play_all(&mut self) -> usize {
        let mut started = 0;
        for track in self.tracks.iter_mut().filter(|t| t.volume > 0.0) {
            match track.play() {
                Ok(()) => started += 1,
                Err(error) => warn!(sound = %track.id, %error, "Failed to play track"),
            }
        }
        started
    }

    pub fn pause_all(&mut self) -> usize {
        self.for_each("pause", TrackHandle::pause)
    }

    /// Stop every track and release its resource. The set is empty after.
    pub fn stop_all(&mut self) -> usize {
        let stopped = self.for_each("stop", TrackHandle::stop);
        for track in self.tracks.drain(..) {
            track.release();
        }
        stopped
    }

    /// Change looping on every track without touching playback position.
    pub fn set_looping_all(&mut self, looping: bool) -> usize {
        self.for_each("set looping", |t| t.set_looping(looping))
    }

    /// Set one track's volume.
    ///
    /// At zero the track is paused on its own; above zero a track that is
    /// not playing is started. Returns `false` if the id is not loaded.
    pub fn set_volume(&mut self, id: &SoundId, volume: f32) -> Result<bool> {
        let Some(track) = self.get_mut(id) else {
            return Ok(false);
        };

        track.set_volume(volume)?;
        if volume == 0.0 {
            track.pause()?;
        } else if !track.is_playing() {
            track.play()?;
        }
        Ok(true)
    }

    /// Set one track's volume with no transport side effects.
    pub fn set_volume_quiet(&mut self, id: &SoundId, volume: f32) -> Result<bool> {
        match self.get_mut(id) {
            Some(track) => track.set_volume(volume).map(|_| true),
            None => Ok(false),
        }
    }

    /// Toggle one track between playing and paused. Returns the new
    /// playing state, or `None` if the id is not loaded.
    pub fn toggle(&mut self, id: &SoundId) -> Result<Option<bool>> {
        let Some(track) = self.get_mut(id) else {
            return Ok(None);
        };
        if track.is_playing() {
            track.pause()?;
            Ok(Some(false))
        } else {
            track.play()?;
            Ok(Some(true))
        }
    }

    /// True iff no track reports playing.
    pub fn all_paused(&self) -> bool {
        self.tracks.iter().all(|t| !t.is_playing())
    }

    pub fn any_playing(&self) -> bool {
        !self.all_paused()
    }

    pub fn contains(&self, id: &SoundId) -> bool {
        self.tracks.iter().any(|t| &t.id == id)
    }

    pub fn get(&self, id: &SoundId) -> Option<&TrackHandle> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    fn get_mut(&mut self, id: &SoundId) -> Option<&mut TrackHandle> {
        self.tracks.iter_mut().find(|t| &t.id == id)
    }

    fn remove(&mut self, id: &SoundId) {
        if let Some(pos) = self.tracks.iter().position(|t| &t.id == id) {
            let mut track = self.tracks.remove(pos);
            let _ = track.stop();
            track.release();
        }
    }

    pub fn infos(&self) -> Vec<TrackInfo> {
        self.tracks.iter().map(TrackHandle::info).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Apply `op` to every track, logging failures. Returns how many
    /// succeeded.
    fn for_each(
        &mut self,
        action: &'static str,
        mut op: impl FnMut(&mut TrackHandle) -> Result<()>,
    ) -> usize {
        let mut ok = 0;
        for track in &mut self.tracks {
            match op(track) {
                Ok(()) => ok += 1,
                Err(error) => warn!(sound = %track.id, %error, "Failed to {} track", action),
            }
        }
        ok
    }
}

impl Drop for TrackSet {
    fn drop(&mut self) {
        for track in self.tracks.drain(..) {
            track.release();
        }
    }
}
