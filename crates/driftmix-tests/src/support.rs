//! Shared fixtures.

use std::sync::Arc;
use std::time::Duration;

use driftmix_audio::{EngineConfig, MixEngine, SimulatedBackend};
use driftmix_core::{MixTrack, SoundCatalog, SoundMix};

pub fn engine() -> (SimulatedBackend, MixEngine) {
    let sim = SimulatedBackend::new();
    let engine = MixEngine::new(
        Arc::new(sim.clone()),
        Arc::new(SoundCatalog::builtin()),
        EngineConfig::default(),
    )
    .unwrap();
    (sim, engine)
}

pub fn mix(id: &str, entries: &[(&str, f32)]) -> SoundMix {
    SoundMix::new(
        id,
        "Test",
        entries.iter().map(|(s, v)| MixTrack::new(*s, *v)).collect(),
        "2024-01-01T00:00:00.000Z",
    )
}

pub fn m1() -> SoundMix {
    mix("m1", &[("Rain", 0.6), ("florest", 0.3)])
}

/// Let spawned tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
