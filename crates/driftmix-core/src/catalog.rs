//! Static sound catalog: sound id to loadable source and display metadata.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{DriftmixError, Result};
use crate::sound::{Sound, SoundCategory, SoundId, SoundSource};

/// Process-wide mapping from [`SoundId`] to [`Sound`].
///
/// Iteration follows insertion order so UIs list sounds the way the
/// catalog declares them.
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    sounds: Vec<Sound>,
    index: HashMap<String, usize>,
}

impl SoundCatalog {
    /// Build a catalog from entries. Duplicate ids are rejected.
    pub fn new(sounds: Vec<Sound>) -> Result<Self> {
        let mut catalog = Self::default();
        for sound in sounds {
            catalog.insert(sound)?;
        }
        Ok(catalog)
    }

    /// The sounds shipped with the app.
    pub fn builtin() -> Self {
        let sounds = vec![
            Sound::new(
                "Rain",
                "Rain",
                SoundSource::file("rain.mp3"),
                SoundCategory::Nature,
            ),
            Sound::new(
                "florest",
                "Florest",
                SoundSource::file("rain-florest.mp3"),
                SoundCategory::Nature,
            ),
        ];
        let mut catalog = Self::default();
        for sound in sounds {
            catalog.push(sound);
        }
        catalog
    }

    /// Resolve every relative file source against `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        for sound in &mut self.sounds {
            sound.source = sound.source.rooted(root);
        }
        self
    }

    /// Add an entry.
    pub fn insert(&mut self, sound: Sound) -> Result<()> {
        if self.index.contains_key(sound.id.as_str()) {
            return Err(DriftmixError::validation(format!(
                "duplicate sound id in catalog: {}",
                sound.id
            )));
        }
        self.push(sound);
        Ok(())
    }

    fn push(&mut self, sound: Sound) {
        self.index.insert(sound.id.as_str().to_owned(), self.sounds.len());
        self.sounds.push(sound);
    }

    pub fn lookup(&self, id: &str) -> Option<&Sound> {
        self.index.get(id).map(|&i| &self.sounds[i])
    }

    /// Turn a raw string into a typed id, if the catalog knows it.
    pub fn resolve(&self, id: &str) -> Option<SoundId> {
        self.lookup(id).map(|s| s.id.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sound> {
        self.sounds.iter()
    }

    pub fn by_category(&self, category: SoundCategory) -> impl Iterator<Item = &Sound> {
        self.sounds.iter().filter(move |s| s.category == category)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
