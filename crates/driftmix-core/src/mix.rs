//! Sound mixes: named, ordered sets of sound-id/volume pairs.
//!
//! The JSON shape is shared with saved-mix storage and screen-to-screen
//! transfer, so field names are fixed (`createdAt` in camel case).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DriftmixError, Result};

/// Id used for unsaved mixes started from the composer.
pub const TEMP_MIX_ID: &str = "temp";

/// One sound of a mix at a given volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixTrack {
    /// Catalog id. Kept as a plain string so mixes that reference sounds
    /// removed from the catalog still load.
    pub id: String,
    /// Linear volume in `[0, 1]`.
    pub volume: f32,
}

impl MixTrack {
    pub fn new(id: impl Into<String>, volume: f32) -> Self {
        Self {
            id: id.into(),
            volume,
        }
    }

    pub fn is_audible(&self) -> bool {
        self.volume > 0.0
    }
}

/// A user-composed soundscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundMix {
    pub id: String,
    pub name: String,
    pub sounds: Vec<MixTrack>,
    /// ISO-8601 timestamp, kept verbatim.
    pub created_at: String,
}

impl SoundMix {
    /// Build a mix from raw parts without validation.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sounds: Vec<MixTrack>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sounds,
            created_at: created_at.into(),
        }
    }

    /// Build a new mix from composer volumes.
    ///
    /// Silent entries are dropped, repeated ids keep their last volume, and
    /// the mix gets a fresh id and the current time.
    pub fn compose<I, S>(name: impl Into<String>, volumes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let id = Uuid::new_v4().simple().to_string();
        Self::compose_with_id(id, name, volumes)
    }

    /// Same as [`compose`](Self::compose) but with the [`TEMP_MIX_ID`] id,
    /// for mixes played straight from the composer without saving.
    pub fn preview<I, S>(name: impl Into<String>, volumes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self::compose_with_id(TEMP_MIX_ID, name, volumes)
    }

    fn compose_with_id<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        volumes: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let tracks = volumes
            .into_iter()
            .map(|(id, volume)| MixTrack::new(id, volume))
            .collect::<Vec<_>>();
        let sounds = dedupe_tracks(&tracks)
            .into_iter()
            .filter(MixTrack::is_audible)
            .collect::<Vec<_>>();

        let mix = Self::new(id, name, sounds, now_iso8601());
        mix.validate()?;
        Ok(mix)
    }

    pub fn is_temporary(&self) -> bool {
        self.id == TEMP_MIX_ID
    }

    /// At least one track with volume above zero.
    pub fn is_playable(&self) -> bool {
        self.sounds.iter().any(MixTrack::is_audible)
    }

    /// Tracks with volume above zero, in mix order.
    pub fn active_tracks(&self) -> impl Iterator<Item = &MixTrack> {
        self.sounds.iter().filter(|t| t.is_audible())
    }

    /// Tracks with repeated ids collapsed: first position, last volume.
    pub fn deduped_tracks(&self) -> Vec<MixTrack> {
        dedupe_tracks(&self.sounds)
    }

    /// Check the mix can be saved or played.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DriftmixError::validation("mix name must not be empty"));
        }
        for (i, track) in self.sounds.iter().enumerate() {
            if !track.volume.is_finite() || !(0.0..=1.0).contains(&track.volume) {
                return Err(DriftmixError::validation(format!(
                    "volume for {} must be between 0 and 1, got {}",
                    track.id, track.volume
                )));
            }
            if self.sounds[..i].iter().any(|t| t.id == track.id) {
                return Err(DriftmixError::validation(format!(
                    "sound {} appears more than once",
                    track.id
                )));
            }
        }
        if !self.is_playable() {
            return Err(DriftmixError::validation("add at least one sound to your mix"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| DriftmixError::Serialization(format!("Failed to serialize mix: {}", e)))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| DriftmixError::Serialization(format!("Invalid mix JSON: {}", e)))
    }
}

/// Current UTC time as `2024-01-01T00:00:00.000Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Collapse repeated ids: each id keeps its first position and last volume.
pub fn dedupe_tracks(tracks: &[MixTrack]) -> Vec<MixTrack> {
    let mut out: Vec<MixTrack> = Vec::with_capacity(tracks.len());
    for track in tracks {
        match out.iter_mut().find(|t| t.id == track.id) {
            Some(existing) => existing.volume = track.volume,
            None => out.push(track.clone()),
        }
    }
    out
}
