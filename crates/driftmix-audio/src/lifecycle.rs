//! Keeps a playback notification in step with the app phase and the
//! engine state.
//!
//! The notification exists exactly while the app is backgrounded and the
//! engine is playing. At most one is outstanding; replacing it dismisses
//! the old one first.

use std::sync::Arc;

use driftmix_core::Result;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::MixEngine;
use crate::state::EngineState;

/// Whether the application is visible to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppPhase {
    #[default]
    Foreground,
    Background,
}

/// Content of a playback notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Mix the notification refers to.
    pub mix_id: String,
}

impl Notification {
    pub fn playing(title: impl Into<String>, mix_id: impl Into<String>, mix_name: &str) -> Self {
        Self {
            title: title.into(),
            body: format!("Playing: {}", mix_name),
            mix_id: mix_id.into(),
        }
    }
}

/// Handle returned by [`Notifier::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u64);

/// Platform notification surface.
pub trait Notifier: Send + Sync + 'static {
    fn show(&self, notification: &Notification) -> Result<NotificationId>;
    fn dismiss(&self, id: NotificationId) -> Result<()>;
}

struct Outstanding {
    id: NotificationId,
    notification: Notification,
}

/// Background task reconciling the notification with app and engine state.
pub struct LifecycleCoordinator {
    engine: watch::Receiver<EngineState>,
    phases: watch::Receiver<AppPhase>,
    notifier: Arc<dyn Notifier>,
    title: String,
    outstanding: Option<Outstanding>,
}

impl LifecycleCoordinator {
    /// Start coordinating on the current runtime. The task runs until the
    /// returned subscription is shut down or dropped, or the phase sender
    /// goes away.
    pub fn spawn(
        engine: &MixEngine,
        phases: watch::Receiver<AppPhase>,
        notifier: Arc<dyn Notifier>,
        title: impl Into<String>,
    ) -> LifecycleSubscription {
        let coordinator = Self {
            engine: engine.subscribe(),
            phases,
            notifier,
            title: title.into(),
            outstanding: None,
        };
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(coordinator.run(stopped));
        debug!("Lifecycle coordinator started");

        LifecycleSubscription {
            stop: Some(stop),
            task: Some(task),
        }
    }

    async fn run(mut self, mut stopped: oneshot::Receiver<()>) {
        self.reconcile();
        loop {
            tokio::select! {
                _ = &mut stopped => break,
                changed = self.phases.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!(phase = ?*self.phases.borrow(), "App phase changed");
                }
                changed = self.engine.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            self.reconcile();
        }
        self.dismiss();
        debug!("Lifecycle coordinator stopped");
    }

    fn reconcile(&mut self) {
        let phase = *self.phases.borrow_and_update();
        let wanted = {
            let state = self.engine.borrow_and_update();
            match (&state.current_mix, phase) {
                (Some(mix), AppPhase::Background) if state.is_playing() => {
                    Some(Notification::playing(&self.title, &mix.id, &mix.name))
                }
                _ => None,
            }
        };

        match wanted {
            Some(notification) => {
                let current = self
                    .outstanding
                    .as_ref()
                    .is_some_and(|o| o.notification == notification);
                if !current {
                    self.show(notification);
                }
            }
            None => self.dismiss(),
        }
    }

    fn show(&mut self, notification: Notification) {
        self.dismiss();
        match self.notifier.show(&notification) {
            Ok(id) => {
                debug!(id = id.0, mix = %notification.mix_id, "Playback notification shown");
                self.outstanding = Some(Outstanding { id, notification });
            }
            Err(error) => warn!(%error, "Failed to show playback notification"),
        }
    }

    fn dismiss(&mut self) {
        if let Some(outstanding) = self.outstanding.take() {
            match self.notifier.dismiss(outstanding.id) {
                Ok(()) => debug!(id = outstanding.id.0, "Playback notification dismissed"),
                Err(error) => warn!(%error, "Failed to dismiss playback notification"),
            }
        }
    }
}

/// Scoped ownership of a running [`LifecycleCoordinator`].
pub struct LifecycleSubscription {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LifecycleSubscription {
    /// Stop the coordinator and wait until its notification is dismissed.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "Lifecycle coordinator task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
