//! Periodic play-head polling.
//!
//! The native engine refreshes its own position on roughly the same cadence,
//! so polling faster than the configured period yields no new information.
//! Every tick publishes unconditionally, even when the value is unchanged,
//! so consumers relying on replay semantics behave predictably.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use clipcut_types::Progress;

use crate::backend::MediaBackend;

pub struct ProgressSource {
    tx: watch::Sender<Progress>,
    task: JoinHandle<()>,
}

impl ProgressSource {
    /// Spawns the poll loop. Must be called inside a tokio runtime context;
    /// the loop yields between ticks and never blocks on I/O.
    pub fn spawn(backend: Arc<dyn MediaBackend>, period: Duration) -> Self {
        let (tx, _) = watch::channel(Progress::default());
        let poller_tx = tx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let total = backend.length();
                let elapsed = backend.time();
                let fraction = backend.position();
                poller_tx.send_replace(Progress::new(fraction, elapsed, total));
            }
        });
        Self { tx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Progress {
        *self.tx.borrow()
    }

    /// Cancels the poll loop as a unit. There is no per-tick cancellation.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for ProgressSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockBackend;

    #[tokio::test(start_paused = true)]
    async fn publishes_backend_position_each_tick() {
        let backend = MockBackend::new();
        backend.set_length(Duration::from_secs(100));
        backend.set_position(0.25);
        backend.set_time(Duration::from_secs(25));

        let source = ProgressSource::spawn(backend.clone(), Duration::from_millis(250));
        let mut rx = source.subscribe();

        rx.changed().await.expect("poller alive");
        let progress = *rx.borrow_and_update();
        assert_eq!(progress.fraction, 0.25);
        assert_eq!(progress.elapsed, Duration::from_secs(25));
        assert_eq!(progress.total, Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn republishes_even_when_unchanged() {
        let backend = MockBackend::new();
        backend.set_length(Duration::from_secs(10));

        let source = ProgressSource::spawn(backend.clone(), Duration::from_millis(250));
        let mut rx = source.subscribe();

        rx.changed().await.expect("first tick");
        let first = *rx.borrow_and_update();
        rx.changed().await.expect("second tick");
        let second = *rx.borrow_and_update();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_publication() {
        let backend = MockBackend::new();
        let source = ProgressSource::spawn(backend.clone(), Duration::from_millis(250));
        let mut rx = source.subscribe();
        rx.changed().await.expect("first tick");
        source.abort();
        drop(source);
        // Both sender halves are gone once the aborted task unwinds.
        assert!(rx.changed().await.is_err());
    }
}
