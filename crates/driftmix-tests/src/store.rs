//! Saved mixes through the store and back into the engine.

use driftmix_core::{MixTrack, SoundMix};
use driftmix_store::MixStore;

use crate::support::{engine, m1};

#[test]
fn mix_json_roundtrip_is_structural() {
    let mix = m1();
    let json = mix.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"id":"m1","name":"Test","sounds":[{"id":"Rain","volume":0.6},{"id":"florest","volume":0.3}],"createdAt":"2024-01-01T00:00:00.000Z"}"#
    );
    assert_eq!(SoundMix::from_json(&json).unwrap(), mix);
}

#[tokio::test]
async fn saved_mix_plays_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixes.json");

    let composed = SoundMix::compose("Evening", [("Rain", 0.6), ("florest", 0.0)]).unwrap();
    {
        let store = MixStore::open(&path).await.unwrap();
        store.save(composed.clone()).await.unwrap();
    }

    let store = MixStore::open(&path).await.unwrap();
    let loaded = store.get(&composed.id).await.unwrap();
    assert_eq!(loaded, composed);
    assert_eq!(loaded.sounds, vec![MixTrack::new("Rain", 0.6)]);

    let (sim, engine) = engine();
    assert!(engine.play_mix(loaded).await.unwrap().is_started());
    assert_eq!(sim.live_count(), 1);
}

#[tokio::test]
async fn legacy_array_file_is_migrated_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixes.json");
    let legacy = serde_json_array(&[m1()]);
    std::fs::write(&path, legacy).unwrap();

    let store = MixStore::open(&path).await.unwrap();
    assert_eq!(store.list().await, vec![m1()]);

    let mut renamed = m1();
    renamed.name = "Renamed".into();
    store.save(renamed).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"version\": 1"));
    assert!(raw.contains("Renamed"));
}

#[tokio::test]
async fn corrupt_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixes.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(MixStore::open(&path).await.is_err());
}

fn serde_json_array(mixes: &[SoundMix]) -> String {
    let items: Vec<String> = mixes.iter().map(|m| m.to_json().unwrap()).collect();
    format!("[{}]", items.join(","))
}
