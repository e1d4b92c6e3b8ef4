//! Scoped timers: a spawned tokio task that is aborted when its handle drops.
//!
//! Every arm has exactly one disarm, whichever path leaves the scope
//! (replacement, explicit `cancel`, owner dropped).

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug)]
pub struct ScopedTimer {
    label: &'static str,
    handle: JoinHandle<()>,
}

impl ScopedTimer {
    /// Run `fut` until it finishes or the timer is dropped.
    pub fn spawn<F>(label: &'static str, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(timer = label, "timer armed");
        Self {
            label,
            handle: tokio::spawn(fut),
        }
    }

    /// Send `event` every `period`, first after one full period. Stops when the receiver is gone.
    pub fn repeating<E>(
        label: &'static str,
        period: Duration,
        tx: mpsc::UnboundedSender<E>,
        event: E,
    ) -> Self
    where
        E: Clone + Send + 'static,
    {
        Self::spawn(label, async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(event.clone()).is_err() {
                    break;
                }
            }
        })
    }

    /// Send `event` once after `delay`.
    pub fn one_shot<E>(
        label: &'static str,
        delay: Duration,
        tx: mpsc::UnboundedSender<E>,
        event: E,
    ) -> Self
    where
        E: Send + 'static,
    {
        Self::spawn(label, async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Disarm now. Same as dropping, but reads better at call sites.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            debug!(timer = self.label, "timer disarmed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_repeating_fires_each_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let _timer = ScopedTimer::repeating("test", Duration::from_millis(100), tx, 7u8);
        tokio::time::sleep_until(start + Duration::from_millis(350)).await;
        let mut fired = 0;
        while rx.try_recv().is_ok() {
            fired += 1;
        }
        assert_eq!(fired, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_disarms() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = ScopedTimer::one_shot("test", Duration::from_millis(100), tx, ());
        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = ScopedTimer::one_shot("test", Duration::from_millis(100), tx, 1u32);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert!(rx.try_recv().is_err());
        assert!(timer.is_finished());
    }
}
