//! Driftmix Audio - Multi-track mix playback
//!
//! Loads the sounds of a mix, plays them in unison, and keeps playback in
//! step with the sleep timer and the application lifecycle.
//!
//! Architecture:
//! - `AudioBackend`: Loads sounds into controllable `PlaybackHandle`s
//! - `DeviceBackend`: Decodes files and mixes voices into the output device
//! - `SimulatedBackend`: Headless backend with failure injection
//! - `RingBuffer`: Lock-free SPSC buffer between mixer thread and audio callback
//! - `TrackSet`: The loaded tracks of one mix
//! - `MixEngine`: Top-level orchestrator with observable state
//! - `SleepTimer`: Countdown that stops the mix on expiry
//! - `LifecycleCoordinator`: Playback notification while backgrounded

pub mod backend;
pub mod decode;
pub mod device;
pub mod engine;
pub mod lifecycle;
pub mod mixer;
pub mod ring_buffer;
pub mod simulated;
pub mod sleep_timer;
pub mod state;
pub mod track_set;

pub use backend::{AudioBackend, LoadOptions, PlaybackHandle, SessionMode, TrackStatus};
pub use device::DeviceBackend;
pub use engine::{EngineConfig, MixEngine, PlayOutcome, DEFAULT_PREVIEW_VOLUME};
pub use lifecycle::{
    AppPhase, LifecycleCoordinator, LifecycleSubscription, Notification, NotificationId, Notifier,
};
pub use mixer::{Mixer, Voice, VoiceId};
pub use ring_buffer::RingBuffer;
pub use simulated::{LoadGate, SimulatedBackend, SimulatedStats, SimulatedTrack};
pub use sleep_timer::{SleepTimer, TimerTicket};
pub use state::{EngineState, PlaybackPhase};
pub use track_set::{LoadedTracks, SkippedTrack, TrackHandle, TrackInfo, TrackSet};
