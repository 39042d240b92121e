//! Per-question countdown.
//!
//! Ticks once a second on the tokio runtime. The views poll `remaining()`
//! between prompts; nothing else is shared with the ticking task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

pub struct Countdown {
    runtime: Handle,
    remaining: Arc<AtomicU32>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            remaining: Arc::new(AtomicU32::new(0)),
            task: None,
        }
    }

    /// Starts counting down from `secs`, cancelling any run in progress.
    /// `0` leaves the countdown stopped.
    pub fn start(&mut self, secs: u32) {
        self.cancel();
        if secs == 0 {
            return;
        }

        let remaining = Arc::new(AtomicU32::new(secs));
        self.remaining = remaining.clone();

        self.task = Some(self.runtime.spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let left = remaining.load(Ordering::SeqCst).saturating_sub(1);
                remaining.store(left, Ordering::SeqCst);
                if left == 0 {
                    debug!("countdown expired");
                    break;
                }
            }
        }));
        debug!(secs, "countdown started");
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// True once a started run has reached zero.
    pub fn expired(&self) -> bool {
        self.task.is_some() && self.remaining() == 0
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.remaining = Arc::new(AtomicU32::new(0));
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    async fn step(secs: u64) {
        for _ in 0..secs {
            advance(Duration::from_secs(1)).await;
            settle().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_to_zero() {
        let mut countdown = Countdown::new(Handle::current());
        countdown.start(3);
        settle().await;
        assert_eq!(countdown.remaining(), 3);
        assert!(!countdown.expired());

        step(1).await;
        assert_eq!(countdown.remaining(), 2);

        step(2).await;
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.expired());

        step(2).await;
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_previous_run() {
        let mut countdown = Countdown::new(Handle::current());
        countdown.start(2);
        settle().await;
        step(1).await;
        assert_eq!(countdown.remaining(), 1);

        countdown.start(5);
        settle().await;
        step(1).await;
        assert_eq!(countdown.remaining(), 4);
        step(1).await;
        assert_eq!(countdown.remaining(), 3);
        assert!(!countdown.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticking() {
        let mut countdown = Countdown::new(Handle::current());
        countdown.start(3);
        settle().await;
        countdown.cancel();
        step(5).await;
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.expired());
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_disables_countdown() {
        let mut countdown = Countdown::new(Handle::current());
        countdown.start(0);
        step(1).await;
        assert!(!countdown.is_running());
        assert!(!countdown.expired());
    }
}
