//! Sound catalog entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier of a catalog sound.
///
/// Obtained from [`SoundCatalog::resolve`](crate::SoundCatalog::resolve) so that
/// only known ids reach the playback layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(String);

impl SoundId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SoundId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification tag for a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Nature,
    Water,
    Urban,
    Noise,
    Other,
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nature => "nature",
            Self::Water => "water",
            Self::Urban => "urban",
            Self::Noise => "noise",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Interleaved f32 PCM held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmData {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

/// Where the audio data for a sound comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSource {
    /// An encoded file (mp3, ogg, wav, flac) to be decoded on load.
    File(PathBuf),
    /// Already decoded samples.
    Pcm(PcmData),
}

impl SoundSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Resolve a relative file source against `root`.
    pub fn rooted(&self, root: &Path) -> Self {
        match self {
            Self::File(path) if path.is_relative() => Self::File(root.join(path)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Pcm(pcm) => write!(
                f,
                "<pcm {} frames @ {} Hz x{}>",
                pcm.frames(),
                pcm.sample_rate,
                pcm.channels
            ),
        }
    }
}

/// A catalog entry. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub id: SoundId,
    pub name: String,
    pub source: SoundSource,
    pub category: SoundCategory,
}

impl Sound {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: SoundSource,
        category: SoundCategory,
    ) -> Self {
        Self {
            id: SoundId::new(id),
            name: name.into(),
            source,
            category,
        }
    }
}
