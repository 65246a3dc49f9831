//! Periodic background refresh.
//!
//! A single spawned loop runs a cycle and then sleeps for the interval, so two
//! ticks never overlap. Starting again replaces the running loop. Cancellation
//! is cooperative: a cycle that already started always runs to completion.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use super::refresh_pipeline::RefreshPipeline;
use super::sync_config::MIN_REFRESH_INTERVAL;
use crate::errors::{Error, Result};

struct RunningSchedule {
    interval: Duration,
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RunningSchedule {
    /// Signals the loop and waits for its current cycle, if any, to finish.
    async fn shutdown(self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_one();
        if let Err(err) = self.handle.await {
            warn!("[Scheduler] Refresh loop ended abnormally: {}", err);
        }
    }
}

pub struct AutoRefreshScheduler {
    pipeline: Arc<RefreshPipeline>,
    task: Mutex<Option<RunningSchedule>>,
}

impl AutoRefreshScheduler {
    pub fn new(pipeline: Arc<RefreshPipeline>) -> Self {
        Self {
            pipeline,
            task: Mutex::new(None),
        }
    }

    /// Cancels any running schedule, then ticks now and every `interval` after
    /// each cycle completes.
    pub async fn start(&self, interval: Duration) -> Result<()> {
        if interval < MIN_REFRESH_INTERVAL {
            return Err(Error::validation(format!(
                "Refresh interval must be at least {}ms",
                MIN_REFRESH_INTERVAL.as_millis()
            )));
        }

        let mut guard = self.task.lock().await;
        if let Some(previous) = guard.take() {
            previous.shutdown().await;
            debug!("[Scheduler] Replaced running schedule");
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let wake = Arc::clone(&wake);
            async move {
                while !cancelled.load(Ordering::Acquire) {
                    let result = pipeline.run_cycle().await;
                    debug!(
                        "[Scheduler] Tick done status={:?} duration_ms={}",
                        result.status_source, result.duration_ms
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {}
                        _ = wake.notified() => {}
                    }
                }
            }
        });
        *guard = Some(RunningSchedule {
            interval,
            cancelled,
            wake,
            handle,
        });
        info!("[Scheduler] Auto refresh every {:?}", interval);
        Ok(())
    }

    /// Returns whether a schedule was running. Waits for an in-progress
    /// cycle to finish.
    pub async fn stop(&self) -> bool {
        let mut guard = self.task.lock().await;
        match guard.take() {
            Some(running) => {
                running.shutdown().await;
                info!("[Scheduler] Auto refresh stopped");
                true
            }
            None => false,
        }
    }

    /// Interval of the running schedule, if any.
    pub async fn interval(&self) -> Option<Duration> {
        let guard = self.task.lock().await;
        guard
            .as_ref()
            .filter(|running| !running.handle.is_finished())
            .map(|running| running.interval)
    }

    pub async fn is_running(&self) -> bool {
        self.interval().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::PlanTier;
    use crate::sync::testing::{test_state, ScriptedBackend, STATUS};
    use crate::sync::SyncConfig;

    fn scheduler() -> (Arc<ScriptedBackend>, AutoRefreshScheduler) {
        let backend = Arc::new(ScriptedBackend::new());
        let config = SyncConfig {
            insights_enabled: false,
            ..SyncConfig::default()
        };
        let pipeline = Arc::new(RefreshPipeline::new(
            backend.clone(),
            test_state(PlanTier::Basic),
            &config,
        ));
        (backend, AutoRefreshScheduler::new(pipeline))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let (backend, scheduler) = scheduler();
        scheduler.start(Duration::from_secs(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.calls(STATUS), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.calls(STATUS), 2);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(backend.calls(STATUS), 5);
        assert!(scheduler.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_running_timer() {
        let (backend, scheduler) = scheduler();
        scheduler.start(Duration::from_secs(1)).await.unwrap();
        scheduler.start(Duration::from_secs(1)).await.unwrap();
        scheduler.start(Duration::from_secs(2)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        // Replaced loops were cancelled before their first cycle.
        assert_eq!(backend.calls(STATUS), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.calls(STATUS), 2);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(backend.calls(STATUS), 4);
        assert_eq!(scheduler.interval().await, Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_do_not_overlap() {
        let (backend, scheduler) = scheduler();
        backend.delay(STATUS, Duration::from_secs(5));
        scheduler.start(Duration::from_secs(1)).await.unwrap();

        // Cycle one ends at 5s, cycle two starts at 6s and ends at 11s.
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(backend.calls(STATUS), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.calls(STATUS), 2);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(backend.calls(STATUS), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_halts_ticks() {
        let (backend, scheduler) = scheduler();
        assert!(!scheduler.stop().await);

        scheduler.start(Duration::from_secs(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(scheduler.is_running().await);
        assert!(scheduler.stop().await);
        assert!(!scheduler.stop().await);
        assert!(!scheduler.is_running().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(STATUS), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_the_running_cycle_finish() {
        let (backend, scheduler) = scheduler();
        let state = scheduler.pipeline.state();
        backend.delay(STATUS, Duration::from_secs(5));
        scheduler.start(Duration::from_secs(1)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.view().cycle_count, 0);
        assert!(scheduler.stop().await);

        let view = state.view();
        assert_eq!(view.cycle_count, 1);
        assert!(view.status.is_some());
        assert!(view.last_refreshed_at.is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(STATUS), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_for_the_running_cycle() {
        let (backend, scheduler) = scheduler();
        let state = scheduler.pipeline.state();
        backend.delay(STATUS, Duration::from_secs(5));
        scheduler.start(Duration::from_secs(1)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // The old cycle completes before the new loop ticks.
        scheduler.start(Duration::from_secs(2)).await.unwrap();
        assert_eq!(state.view().cycle_count, 1);
        assert_eq!(backend.calls(STATUS), 1);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.calls(STATUS), 2);
        assert!(scheduler.stop().await);
        assert_eq!(state.view().cycle_count, 2);
    }

    #[tokio::test]
    async fn rejects_too_short_interval() {
        let (_backend, scheduler) = scheduler();
        let result = scheduler.start(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(!scheduler.is_running().await);
    }
}
