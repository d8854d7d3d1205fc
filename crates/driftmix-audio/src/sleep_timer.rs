//! Countdown that fires once after a number of minutes.
//!
//! Each arming gets a ticket. Re-arming or cancelling moves the epoch on,
//! which turns every older ticket stale: stale ticks publish nothing and a
//! stale expiry never fires. Expiry claims the epoch with a compare-and-swap
//! so it runs at most once even when it races a cancel.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use driftmix_core::TimerMinutes;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// Identifies one arming of a [`SleepTimer`].
#[derive(Debug, Clone)]
pub struct TimerTicket {
    epoch: Arc<AtomicU64>,
    id: u64,
}

impl TimerTicket {
    /// False once the timer was re-armed, cancelled or has expired.
    pub fn is_current(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) == self.id
    }

    fn claim_expiry(&self) -> bool {
        self.epoch
            .compare_exchange(self.id, self.id + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// A cancellable one-shot countdown with per-tick callbacks.
#[derive(Default)]
pub struct SleepTimer {
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down `minutes`, replacing any running countdown.
    ///
    /// `on_tick` gets the seconds left after every `tick`. `on_expire` is
    /// spawned as its own task when the count reaches zero, so it may
    /// cancel this timer without aborting itself.
    pub fn arm<T, E, Fut>(
        &mut self,
        runtime: &Handle,
        minutes: TimerMinutes,
        tick: Duration,
        on_tick: T,
        on_expire: E,
    ) -> TimerTicket
    where
        T: Fn(&TimerTicket, u64) + Send + 'static,
        E: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let id = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = TimerTicket {
            epoch: Arc::clone(&self.epoch),
            id,
        };
        let total = minutes.as_seconds();
        let spawner = runtime.clone();
        let task_ticket = ticket.clone();

        debug!(minutes = minutes.get(), "Sleep timer armed");
        self.task = Some(runtime.spawn(async move {
            let ticket = task_ticket;
            let mut ticks = interval_at(Instant::now() + tick, tick);
            let mut remaining = total;

            while remaining > 0 {
                ticks.tick().await;
                if !ticket.is_current() {
                    return;
                }
                remaining -= 1;
                on_tick(&ticket, remaining);
            }

            if ticket.claim_expiry() {
                info!("Sleep timer expired");
                spawner.spawn(on_expire());
            }
        }));

        ticket
    }

    /// Stop the countdown. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        match self.task.take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.abort();
                if was_running {
                    debug!("Sleep timer cancelled");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SleepTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
