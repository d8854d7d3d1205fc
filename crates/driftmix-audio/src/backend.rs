//! Seam between the engine and whatever actually produces sound.
//!
//! A backend turns a catalog [`Sound`] into a [`PlaybackHandle`]: one
//! independently controllable, loaded resource. The engine never touches
//! samples or devices directly.

use driftmix_core::{Result, Sound};

/// Transport state reported by a loaded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    Playing,
    Paused,
    Stopped,
}

impl TrackStatus {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Initial settings for a newly loaded track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub volume: f32,
    pub looping: bool,
    /// Start playing as soon as the load completes.
    pub autoplay: bool,
}

impl LoadOptions {
    pub fn new(volume: f32, looping: bool) -> Self {
        Self {
            volume,
            looping,
            autoplay: false,
        }
    }
}

/// How the shared audio session should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionMode {
    /// Keep playing while the app is not in the foreground.
    pub background_capable: bool,
    /// Let other apps' audio play at the same time (and duck ours).
    pub mix_with_others: bool,
}

impl SessionMode {
    /// Background-capable playback that does not share the output.
    pub const BACKGROUND_EXCLUSIVE: Self = Self {
        background_capable: true,
        mix_with_others: false,
    };
}

impl Default for SessionMode {
    fn default() -> Self {
        Self::BACKGROUND_EXCLUSIVE
    }
}

/// Loads sounds into playable handles.
///
/// `load` may block (decoding); the track set calls it from blocking tasks.
pub trait AudioBackend: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn configure_session(&self, mode: SessionMode) -> Result<()>;

    fn load(&self, sound: &Sound, options: LoadOptions) -> Result<Box<dyn PlaybackHandle>>;
}

/// One loaded audio resource.
///
/// Implementations must free their resource on drop as well as on
/// [`release`](Self::release), so a handle lost to a cancelled task does
/// not leak.
pub trait PlaybackHandle: Send + 'static {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Stop and rewind.
    fn stop(&mut self) -> Result<()>;

    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Takes effect without moving the playback position.
    fn set_looping(&mut self, looping: bool) -> Result<()>;

    fn status(&self) -> TrackStatus;

    /// Free the underlying resource.
    fn release(self: Box<Self>);
}
