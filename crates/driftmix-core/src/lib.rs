//! Driftmix Core - Foundation types for the ambient sound mixer
//!
//! This crate provides the value types shared by the engine, storage and
//! front-end:
//! - Sounds and the sound catalog (SoundId, Sound, SoundCatalog)
//! - Mixes and their JSON form (SoundMix, MixTrack)
//! - Sleep timer durations and countdown formatting
//! - The common error type

pub mod catalog;
pub mod date;
pub mod error;
pub mod mix;
pub mod sound;
pub mod timer;

pub use catalog::SoundCatalog;
pub use date::{format_created_at, format_created_at_in};
pub use error::{DriftmixError, Result};
pub use mix::{dedupe_tracks, now_iso8601, MixTrack, SoundMix, TEMP_MIX_ID};
pub use sound::{PcmData, Sound, SoundCategory, SoundId, SoundSource};
pub use timer::{format_remaining, TimerMinutes, MAX_TIMER_MINUTES, TIMER_PRESETS};
