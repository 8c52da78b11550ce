//! Periodic task scheduling with graceful shutdown.
//!
//! Every background loop (promotion, expiry sweep, metrics sampling,
//! heartbeat) runs as a [`PeriodicTask`]: a tokio interval raced against a
//! watch-channel shutdown signal. A tick body that is already running
//! finishes before the task stops, and a tick that returns an error is
//! logged and absorbed so the schedule always continues.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::observability::Logger;

/// Error type tick bodies may return; absorbed and logged by the runner.
pub type TickError = Box<dyn std::error::Error + Send + Sync>;

/// Shutdown signal shared by all periodic tasks.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A receiver for one task. Must be taken before `trigger`.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Ask every subscribed task to stop after its current tick.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A named periodic loop.
pub struct PeriodicTask;

impl PeriodicTask {
    /// Spawn a loop that runs `tick` every `period` until shutdown.
    ///
    /// The first tick fires after one full period, not immediately; missed
    /// ticks are delayed, not burst.
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut tick: F,
    ) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TickError>> + Send,
    {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The interval's first tick completes immediately; consume it
            // so the loop body first runs a full period after startup.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(err) = tick().await {
                            Logger::error(
                                "task.tick_failed",
                                &[("task", name), ("error", err.to_string().as_str())],
                            );
                        }
                    }
                    result = shutdown.changed() => {
                        let stop = result.is_err() || *shutdown.borrow();
                        if stop {
                            Logger::info("task.stopped", &[("task", name)]);
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_the_period() {
        let shutdown = Shutdown::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        let handle = PeriodicTask::spawn(
            "test",
            Duration::from_secs(2),
            shutdown.subscribe(),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );

        tokio::time::sleep(Duration::from_millis(6_100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        shutdown.trigger();
        handle.await.unwrap();
        // No further ticks after shutdown.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_errors_do_not_stop_the_schedule() {
        let shutdown = Shutdown::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        let handle = PeriodicTask::spawn(
            "flaky",
            Duration::from_secs(1),
            shutdown.subscribe(),
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n % 2 == 0 {
                        Err("transient".into())
                    } else {
                        Ok(())
                    }
                }
            },
        );

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        shutdown.trigger();
        handle.await.unwrap();
    }
}
