//! Saved mix persistence.
//!
//! Mixes live in one JSON file with a schema version field:
//! `{ "version": 1, "mixes": [...] }`. Older files are migrated on read.

use std::path::{Path, PathBuf};

use driftmix_core::{DriftmixError, Result, SoundMix};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned mix file wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixFile {
    pub version: u32,
    pub mixes: Vec<SoundMix>,
}

impl MixFile {
    pub fn new(mixes: Vec<SoundMix>) -> Self {
        Self {
            version: CURRENT_VERSION,
            mixes,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| DriftmixError::Serialization(format!("Failed to serialize mixes: {}", e)))
    }

    /// Deserialize, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| DriftmixError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = match raw.get("version").and_then(|v| v.as_u64()) {
            Some(v) => u32::try_from(v).map_err(|_| {
                DriftmixError::Storage(format!("Mix file version {} is out of range", v))
            })?,
            None => 0,
        };
        if version > CURRENT_VERSION {
            return Err(DriftmixError::Storage(format!(
                "Mix file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| DriftmixError::Serialization(format!("Failed to parse mixes: {}", e)))
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 is the bare array the first release stored.
                if data.is_array() {
                    data = serde_json::json!({
                        "version": 1,
                        "mixes": data,
                    });
                } else {
                    return Err(DriftmixError::Storage(
                        "Unversioned mix file must be an array".into(),
                    ));
                }
                version = 1;
            }
            _ => {
                return Err(DriftmixError::Storage(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}

/// File-backed list of saved mixes, in save order.
pub struct MixStore {
    path: PathBuf,
    mixes: Mutex<Vec<SoundMix>>,
}

impl MixStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mixes = match tokio::fs::read(&path).await {
            Ok(data) => MixFile::from_json(&data)?.mixes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), mixes = mixes.len(), "Mix store opened");

        Ok(Self {
            path,
            mixes: Mutex::new(mixes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Vec<SoundMix> {
        self.mixes.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<SoundMix> {
        self.mixes.lock().await.iter().find(|m| m.id == id).cloned()
    }

    /// Save `mix`, replacing a stored mix with the same id in place.
    pub async fn save(&self, mix: SoundMix) -> Result<()> {
        mix.validate()?;
        if mix.is_temporary() {
            return Err(DriftmixError::validation("give the mix a name before saving"));
        }

        let mut mixes = self.mixes.lock().await;
        let mut next = mixes.clone();
        match next.iter_mut().find(|m| m.id == mix.id) {
            Some(existing) => *existing = mix.clone(),
            None => next.push(mix.clone()),
        }
        self.write(&next).await?;
        *mixes = next;

        info!(mix = %mix.id, name = %mix.name, "Mix saved");
        Ok(())
    }

    /// Remove the mix with `id`. Returns whether one was stored.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut mixes = self.mixes.lock().await;
        let Some(pos) = mixes.iter().position(|m| m.id == id) else {
            return Ok(false);
        };

        let mut next = mixes.clone();
        next.remove(pos);
        self.write(&next).await?;
        *mixes = next;

        info!(mix = %id, "Mix deleted");
        Ok(true)
    }

    /// Write to a sibling temp file, then rename over the store.
    async fn write(&self, mixes: &[SoundMix]) -> Result<()> {
        let data = MixFile::new(mixes.to_vec()).to_json()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await.map_err(|e| {
            DriftmixError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DriftmixError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!(
            path = %self.path.display(),
            mixes = mixes.len(),
            bytes = data.len(),
            "Mix file written"
        );
        Ok(())
    }
}
