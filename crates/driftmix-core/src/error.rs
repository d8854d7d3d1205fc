//! Error types for Driftmix.

use thiserror::Error;

/// Main error type for Driftmix operations.
#[derive(Error, Debug)]
pub enum DriftmixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected input: empty mix, bad timer entry, out-of-range volume.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown sound: {0}")]
    CatalogMiss(String),

    #[error("Failed to load sound {id}: {reason}")]
    Load { id: String, reason: String },

    /// A play/pause/stop call on an already loaded track failed.
    #[error("Playback error on {id}: {reason}")]
    Transport { id: String, reason: String },

    #[error("Audio device error: {0}")]
    Audio(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl DriftmixError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn load(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transport(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for Driftmix operations.
pub type Result<T> = std::result::Result<T, DriftmixError>;
