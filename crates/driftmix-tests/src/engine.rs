//! Engine behaviour across the track set and the simulated backend.

use driftmix_audio::{
    EngineState, PlayOutcome, PlaybackPhase, TrackStatus, DEFAULT_PREVIEW_VOLUME,
};
use driftmix_core::{MixTrack, SoundId, SoundMix};

use crate::support::{engine, m1, mix, settle};

fn volumes(state: &EngineState) -> Vec<f32> {
    state
        .current_mix
        .as_ref()
        .map(|m| m.sounds.iter().map(|t| t.volume).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn play_pause_resume_reuses_loaded_handles() {
    let (sim, engine) = engine();

    engine.play_mix(m1()).await.unwrap();
    let state = engine.state();
    assert!(state.is_playing());
    assert_eq!(state.current_mix.as_ref().unwrap().id, "m1");
    assert_eq!(volumes(&state), vec![0.6, 0.3]);

    let tracks = engine.active_tracks().await;
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].volume, 0.6);
    assert_eq!(tracks[1].volume, 0.3);

    engine.pause_mix().await;
    assert!(!engine.state().is_playing());
    assert_eq!(sim.live_count(), 2);
    assert!(sim
        .live_tracks()
        .iter()
        .all(|t| t.status == TrackStatus::Paused));

    assert!(engine.resume_mix().await);
    assert!(engine.state().is_playing());
    assert_eq!(sim.stats().loads, 2);
    assert!(sim
        .live_tracks()
        .iter()
        .all(|t| t.status == TrackStatus::Playing));
}

#[tokio::test]
async fn play_then_stop_restores_initial_state() {
    let (sim, engine) = engine();
    let before = engine.state();

    engine.play_mix(m1()).await.unwrap();
    engine.stop_mix().await;

    assert_eq!(engine.state(), before);
    assert!(engine.active_tracks().await.is_empty());
    assert_eq!(sim.live_count(), 0);
}

#[tokio::test]
async fn stop_twice_is_idempotent() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();

    engine.stop_mix().await;
    let once = engine.state();
    let stats = sim.stats();

    engine.stop_mix().await;
    assert_eq!(engine.state(), once);
    assert_eq!(sim.stats(), stats);
}

#[tokio::test]
async fn unknown_sound_is_skipped() {
    let (sim, engine) = engine();
    let outcome = engine
        .play_mix(mix("m2", &[("Rain", 0.5), ("unknown", 0.5)]))
        .await
        .unwrap();

    match outcome {
        PlayOutcome::Started { tracks, skipped } => {
            assert_eq!(tracks, 1);
            assert_eq!(skipped.len(), 1);
            assert_eq!(skipped[0].id, "unknown");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let tracks = engine.active_tracks().await;
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, SoundId::new("Rain"));
    assert_eq!(sim.live_count(), 1);
}

#[tokio::test]
async fn load_failure_still_plays_the_rest() {
    let (sim, engine) = engine();
    sim.fail_loads_for("Rain");

    let outcome = engine.play_mix(m1()).await.unwrap();
    assert!(matches!(outcome, PlayOutcome::Started { tracks: 1, .. }));
    assert!(engine.state().is_playing());
}

#[tokio::test]
async fn transport_failure_is_not_fatal() {
    let (sim, engine) = engine();
    sim.fail_transport_for("florest");

    engine.play_mix(m1()).await.unwrap();
    assert!(engine.state().is_playing());
    let playing = sim
        .live_tracks()
        .iter()
        .filter(|t| t.status == TrackStatus::Playing)
        .count();
    assert_eq!(playing, 1);

    engine.stop_mix().await;
    assert_eq!(sim.live_count(), 0);
}

#[tokio::test]
async fn muting_pauses_only_that_track() {
    let (_, engine) = engine();
    engine.play_mix(m1()).await.unwrap();

    assert!(engine.set_track_volume("Rain", 0.0).await.unwrap());
    let tracks = engine.active_tracks().await;
    assert_eq!(tracks[0].status, TrackStatus::Paused);
    assert_eq!(tracks[1].status, TrackStatus::Playing);
    assert!(engine.state().is_playing());

    engine.set_track_volume("florest", 0.0).await.unwrap();
    assert_eq!(engine.state().phase, PlaybackPhase::Paused);

    engine.set_track_volume("florest", 0.5).await.unwrap();
    assert!(engine.state().is_playing());
    let tracks = engine.active_tracks().await;
    assert_eq!(tracks[0].status, TrackStatus::Paused);
    assert_eq!(tracks[1].volume, 0.5);
}

#[tokio::test]
async fn muted_entry_is_loaded_but_not_started() {
    let (_, engine) = engine();
    engine
        .play_mix(mix("m2", &[("Rain", 0.5), ("florest", 0.0)]))
        .await
        .unwrap();

    let tracks = engine.active_tracks().await;
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].status, TrackStatus::Playing);
    assert!(!tracks[1].status.is_playing());
    assert!(engine.state().is_playing());

    engine.set_track_volume("Rain", 0.0).await.unwrap();
    assert_eq!(engine.state().phase, PlaybackPhase::Paused);
    assert!(engine
        .active_tracks()
        .await
        .iter()
        .all(|t| !t.status.is_playing()));
}

#[tokio::test]
async fn resume_keeps_muted_tracks_paused() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_track_volume("Rain", 0.0).await.unwrap();

    engine.pause_mix().await;
    assert!(engine.resume_mix().await);

    let tracks = engine.active_tracks().await;
    assert_eq!(tracks[0].volume, 0.0);
    assert_eq!(tracks[0].status, TrackStatus::Paused);
    assert_eq!(tracks[1].status, TrackStatus::Playing);
    assert!(engine.state().is_playing());

    engine.set_track_volume("florest", 0.0).await.unwrap();
    engine.pause_mix().await;
    assert!(engine.resume_mix().await);
    assert_eq!(engine.state().phase, PlaybackPhase::Paused);
    assert!(sim
        .live_tracks()
        .iter()
        .all(|t| t.status != TrackStatus::Playing));
}

#[tokio::test]
async fn toggle_loop_keeps_mix_and_applies_to_tracks() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    assert!(engine.state().is_loop_enabled);
    assert!(sim.live_tracks().iter().all(|t| t.looping));

    assert!(!engine.toggle_loop().await);
    let state = engine.state();
    assert!(!state.is_loop_enabled);
    assert_eq!(state.current_mix.unwrap().id, "m1");
    assert!(sim
        .live_tracks()
        .iter()
        .all(|t| !t.looping && t.status == TrackStatus::Playing));

    // The flag carries over to the next mix.
    engine.play_mix(mix("m2", &[("Rain", 0.4)])).await.unwrap();
    assert!(sim.live_tracks().iter().all(|t| !t.looping));
}

#[tokio::test]
async fn replacing_a_mix_releases_the_previous_one() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.play_mix(mix("m2", &[("florest", 0.8)])).await.unwrap();

    assert_eq!(engine.state().current_mix.unwrap().id, "m2");
    let live = sim.live_tracks();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].sound, "florest");
    assert_eq!(sim.stats().releases, 2);
}

#[tokio::test]
async fn play_while_loading_is_ignored() {
    let (sim, engine) = engine();
    let gate = sim.hold_loads();

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.play_mix(m1()).await })
    };
    engine
        .subscribe()
        .wait_for(|s| s.is_loading())
        .await
        .unwrap();

    let second = engine.play_mix(mix("m2", &[("Rain", 0.2)])).await.unwrap();
    assert!(matches!(second, PlayOutcome::AlreadyLoading));

    gate.release();
    assert!(first.await.unwrap().unwrap().is_started());
    assert_eq!(engine.state().current_mix.unwrap().id, "m1");
    assert_eq!(sim.stats().loads, 2);
}

#[tokio::test]
async fn stop_during_load_releases_everything() {
    let (sim, engine) = engine();
    let gate = sim.hold_loads();

    let player = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.play_mix(m1()).await })
    };
    engine
        .subscribe()
        .wait_for(|s| s.is_loading())
        .await
        .unwrap();

    let stopper = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.stop_mix().await })
    };
    settle().await;
    gate.release();

    assert!(matches!(
        player.await.unwrap().unwrap(),
        PlayOutcome::Cancelled
    ));
    stopper.await.unwrap();

    let state = engine.state();
    assert_eq!(state.phase, PlaybackPhase::Idle);
    assert!(state.current_mix.is_none());
    assert_eq!(sim.live_count(), 0);
    assert_eq!(sim.stats().plays, 0);
}

#[tokio::test]
async fn preview_and_mix_are_exclusive() {
    let (sim, engine) = engine();

    assert!(engine.preview_toggle("Rain").await.unwrap());
    assert!(engine.state().previewing);

    engine.play_mix(mix("m2", &[("florest", 0.4)])).await.unwrap();
    let state = engine.state();
    assert!(!state.previewing);
    assert!(engine.preview_tracks().await.is_empty());
    assert_eq!(sim.live_count(), 1);

    assert!(engine.preview_toggle("Rain").await.unwrap());
    let state = engine.state();
    assert!(state.current_mix.is_none());
    assert!(state.previewing);
    let live = sim.live_tracks();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].sound, "Rain");
}

#[tokio::test]
async fn preview_volume_zero_pauses_last_track() {
    let (_, engine) = engine();
    engine.preview_set_volume("Rain", 0.7).await.unwrap();
    engine.preview_set_volume("florest", 0.2).await.unwrap();
    assert!(engine.state().previewing);

    engine.preview_set_volume("Rain", 0.0).await.unwrap();
    assert!(engine.state().previewing);
    engine.preview_set_volume("florest", 0.0).await.unwrap();
    assert!(!engine.state().previewing);

    // Toggling a muted sound brings it back at an audible volume.
    assert!(engine.preview_toggle("Rain").await.unwrap());
    let mix: SoundMix = engine.preview_mix("Draft").await.unwrap();
    assert_eq!(
        mix.sounds,
        vec![MixTrack::new("Rain", DEFAULT_PREVIEW_VOLUME)]
    );
}

#[tokio::test]
async fn shutdown_releases_preview_and_mix() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_timer(30).unwrap();
    engine.shutdown().await;

    let state = engine.state();
    assert!(!state.timer_active);
    assert!(state.current_mix.is_none());
    assert_eq!(sim.live_count(), 0);
}
