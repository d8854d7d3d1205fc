//! Lifecycle coordinator driving a recording notifier.

use std::sync::Arc;

use driftmix_audio::{AppPhase, LifecycleCoordinator, Notification, NotificationId, Notifier};
use driftmix_core::{DriftmixError, Result};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::support::{engine, m1, mix, settle};

#[derive(Default)]
struct Recorder {
    unavailable: Mutex<bool>,
    next: Mutex<u64>,
    shown: Mutex<Vec<(NotificationId, Notification)>>,
    dismissed: Mutex<Vec<NotificationId>>,
}

impl Recorder {
    fn outstanding(&self) -> Vec<Notification> {
        let dismissed = self.dismissed.lock();
        self.shown
            .lock()
            .iter()
            .filter(|(id, _)| !dismissed.contains(id))
            .map(|(_, n)| n.clone())
            .collect()
    }

    fn shown_count(&self) -> usize {
        self.shown.lock().len()
    }
}

impl Notifier for Recorder {
    fn show(&self, notification: &Notification) -> Result<NotificationId> {
        if *self.unavailable.lock() {
            return Err(DriftmixError::Notification("channel unavailable".into()));
        }
        let mut next = self.next.lock();
        *next += 1;
        let id = NotificationId(*next);
        self.shown.lock().push((id, notification.clone()));
        Ok(id)
    }

    fn dismiss(&self, id: NotificationId) -> Result<()> {
        self.dismissed.lock().push(id);
        Ok(())
    }
}

#[tokio::test]
async fn notification_follows_phase_and_playback() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    let (phase, phases) = watch::channel(AppPhase::Foreground);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    // Backgrounding while idle shows nothing.
    phase.send_replace(AppPhase::Background);
    settle().await;
    assert_eq!(recorder.shown_count(), 0);

    phase.send_replace(AppPhase::Foreground);
    engine.play_mix(m1()).await.unwrap();
    phase.send_replace(AppPhase::Background);
    settle().await;
    let outstanding = recorder.outstanding();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].body, "Playing: Test");
    assert_eq!(outstanding[0].mix_id, "m1");

    phase.send_replace(AppPhase::Foreground);
    settle().await;
    assert!(recorder.outstanding().is_empty());

    subscription.shutdown().await;
}

#[tokio::test]
async fn pause_dismisses_and_resume_shows_again() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    let (phase, phases) = watch::channel(AppPhase::Background);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    engine.play_mix(m1()).await.unwrap();
    settle().await;
    assert_eq!(recorder.outstanding().len(), 1);

    engine.pause_mix().await;
    settle().await;
    assert!(recorder.outstanding().is_empty());

    engine.resume_mix().await;
    settle().await;
    assert_eq!(recorder.outstanding().len(), 1);
    assert_eq!(recorder.shown_count(), 2);

    drop(phase);
    settle().await;
    assert!(recorder.outstanding().is_empty());
    assert!(!subscription.is_running());
}

#[tokio::test]
async fn replacing_mix_keeps_one_notification() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    let (_phase, phases) = watch::channel(AppPhase::Background);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    engine.play_mix(m1()).await.unwrap();
    settle().await;
    let mut next = mix("m2", &[("florest", 0.5)]);
    next.name = "Forest".into();
    engine.play_mix(next).await.unwrap();
    settle().await;

    let outstanding = recorder.outstanding();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].body, "Playing: Forest");

    subscription.shutdown().await;
    assert!(recorder.outstanding().is_empty());
}

#[tokio::test]
async fn dropping_subscription_dismisses() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    let (_phase, phases) = watch::channel(AppPhase::Background);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    engine.play_mix(m1()).await.unwrap();
    settle().await;
    assert_eq!(recorder.outstanding().len(), 1);

    drop(subscription);
    settle().await;
    assert!(recorder.outstanding().is_empty());

    // No coordinator left to react.
    engine.stop_mix().await;
    engine.play_mix(m1()).await.unwrap();
    settle().await;
    assert_eq!(recorder.shown_count(), 1);
}

#[tokio::test]
async fn renamed_preview_mix_updates_notification() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    let (_phase, phases) = watch::channel(AppPhase::Background);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    let mut first = mix("temp", &[("Rain", 0.5)]);
    first.name = "Draft".into();
    engine.play_mix(first).await.unwrap();
    settle().await;
    assert_eq!(recorder.outstanding()[0].body, "Playing: Draft");

    let mut second = mix("temp", &[("florest", 0.5)]);
    second.name = "Second draft".into();
    engine.play_mix(second).await.unwrap();
    settle().await;

    let outstanding = recorder.outstanding();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].body, "Playing: Second draft");
    assert_eq!(outstanding[0].mix_id, "temp");

    subscription.shutdown().await;
}

#[tokio::test]
async fn failed_show_is_retried_on_next_change() {
    let (_, engine) = engine();
    let recorder = Arc::new(Recorder::default());
    *recorder.unavailable.lock() = true;
    let (_phase, phases) = watch::channel(AppPhase::Background);
    let subscription =
        LifecycleCoordinator::spawn(&engine, phases, recorder.clone(), "Relaxing Sounds");

    engine.play_mix(m1()).await.unwrap();
    settle().await;
    assert_eq!(recorder.shown_count(), 0);
    assert!(subscription.is_running());

    *recorder.unavailable.lock() = false;
    engine.pause_mix().await;
    engine.resume_mix().await;
    settle().await;
    assert_eq!(recorder.outstanding().len(), 1);

    subscription.shutdown().await;
}
