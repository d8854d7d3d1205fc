//! Notification surface for terminal sessions: notifications go to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use driftmix_audio::{Notification, NotificationId, Notifier};
use driftmix_core::Result;
use tracing::info;

#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn show(&self, notification: &Notification) -> Result<NotificationId> {
        let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        info!(
            id = id.0,
            title = %notification.title,
            mix = %notification.mix_id,
            "{}",
            notification.body
        );
        Ok(id)
    }

    fn dismiss(&self, id: NotificationId) -> Result<()> {
        info!(id = id.0, "Notification dismissed");
        Ok(())
    }
}
