//! Sleep timer coupled to the engine, on a paused clock.

use std::time::Duration;

use driftmix_audio::PlaybackPhase;

use crate::support::{engine, m1};

/// Sleep off the one-second tick grid so checks never race a tick.
async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn expiry_stops_exactly_once() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_timer(1).unwrap();

    advance(30_500).await;
    let state = engine.state();
    assert!(state.is_playing());
    assert!(state.timer_active);
    assert_eq!(state.time_remaining, 30);

    advance(31_000).await;
    let state = engine.state();
    assert_eq!(state.phase, PlaybackPhase::Idle);
    assert!(state.current_mix.is_none());
    assert!(!state.timer_active);
    assert_eq!(state.time_remaining, 0);
    assert_eq!(sim.live_count(), 0);

    let stats = sim.stats();
    assert_eq!(stats.stops, 2);
    assert_eq!(stats.releases, 2);

    advance(300_000).await;
    assert_eq!(sim.stats(), stats);
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_stop_at_original_mark() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_timer(30).unwrap();

    advance(60_500).await;
    engine.set_timer(0).unwrap();
    let state = engine.state();
    assert!(!state.timer_active);
    assert_eq!(state.time_remaining, 0);
    assert_eq!(state.timer_minutes, 0);

    advance(31 * 60_000).await;
    assert!(engine.state().is_playing());
    assert_eq!(sim.stats().stops, 0);
}

#[tokio::test(start_paused = true)]
async fn rearming_invalidates_previous_expiry() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_timer(1).unwrap();

    advance(45_500).await;
    engine.set_timer(5).unwrap();
    assert_eq!(engine.state().time_remaining, 300);

    advance(60_250).await;
    assert!(engine.state().is_playing());
    assert_eq!(engine.state().time_remaining, 240);

    advance(241_000).await;
    assert_eq!(engine.state().phase, PlaybackPhase::Idle);
    assert_eq!(sim.stats().stops, 2);
}

#[tokio::test(start_paused = true)]
async fn explicit_stop_wins_over_expiry() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.set_timer(1).unwrap();

    advance(10_500).await;
    engine.stop_mix().await;
    assert!(!engine.state().timer_active);
    let stats = sim.stats();

    advance(120_000).await;
    assert_eq!(sim.stats(), stats);
}

#[tokio::test(start_paused = true)]
async fn invalid_minutes_leave_state_unchanged() {
    let (_, engine) = engine();
    engine.set_timer(15).unwrap();
    advance(5_500).await;
    let before = engine.state();

    assert!(engine.set_timer(181).is_err());
    assert_eq!(engine.state(), before);
}

#[tokio::test(start_paused = true)]
async fn timer_runs_while_paused() {
    let (sim, engine) = engine();
    engine.play_mix(m1()).await.unwrap();
    engine.pause_mix().await;
    engine.set_timer(1).unwrap();

    advance(61_000).await;
    assert_eq!(engine.state().phase, PlaybackPhase::Idle);
    assert_eq!(sim.live_count(), 0);
}
