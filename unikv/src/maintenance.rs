// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Background maintenance task
//!
//! Runs an engine maintenance job on a fixed interval for as long as a
//! provider is open. Failures are logged and retried on the next tick; they
//! never reach foreground callers. Stopping wakes the task immediately
//! instead of waiting out the current interval.

use crate::error::KvResult;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// Handle to a running periodic job
pub struct MaintenanceTask {
    name: String,
    signal: Arc<StopSignal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MaintenanceTask {
    /// Start running `job` every `interval` on a dedicated thread
    ///
    /// The first run happens one interval after the task starts.
    pub fn spawn<F>(name: &str, interval: Duration, mut job: F) -> KvResult<Self>
    where
        F: FnMut() -> KvResult<()> + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let task_signal = signal.clone();
        let task_name = name.to_string();

        let handle = std::thread::Builder::new()
            .name(format!("unikv-maint-{}", name))
            .spawn(move || {
                let mut stopped = task_signal.stopped.lock();
                let mut deadline = Instant::now() + interval;
                while !*stopped {
                    // Early wakeups wait out the rest of the same interval
                    let woken = task_signal.condvar.wait_until(&mut stopped, deadline);
                    if *stopped || !woken.timed_out() {
                        continue;
                    }

                    // Run the job without the lock so stop() never waits on it
                    let result = parking_lot::MutexGuard::unlocked(&mut stopped, &mut job);
                    match result {
                        Ok(()) => log::debug!("Maintenance pass completed: {}", task_name),
                        Err(e) => log::warn!(
                            "Maintenance pass failed for {}, retrying next tick: {}",
                            task_name,
                            e
                        ),
                    }
                    deadline = Instant::now() + interval;
                }
                log::debug!("Maintenance task stopped: {}", task_name);
            })?;

        log::debug!("Maintenance task started: {} every {:?}", name, interval);

        Ok(Self {
            name: name.to_string(),
            signal,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the task and wait for it to exit; later calls do nothing
    ///
    /// A job that is mid-run finishes its pass first.
    pub fn stop(&self) {
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
            self.signal.condvar.notify_all();
        }

        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::warn!("Maintenance task {} panicked", self.name);
            }
        }
    }
}

impl Drop for MaintenanceTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_periodically_and_stops() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let task = MaintenanceTask::spawn("tick", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while runs.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(runs.load(Ordering::SeqCst) >= 3);

        task.stop();
        assert!(!task.is_running());
        let after_stop = runs.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_failures_are_retried() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let task = MaintenanceTask::spawn("flaky", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(KvError::engine("compaction failed"))
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while runs.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(runs.load(Ordering::SeqCst) >= 2);
        task.stop();
    }

    #[test]
    fn test_wakeups_do_not_restart_interval() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let task = MaintenanceTask::spawn("nudged", Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        // Notifications without a stop arrive far more often than the interval
        let deadline = Instant::now() + Duration::from_secs(5);
        while runs.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            task.signal.condvar.notify_all();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(runs.load(Ordering::SeqCst) >= 1);
        task.stop();
    }

    #[test]
    fn test_stop_does_not_wait_for_interval() {
        let hour = Duration::from_secs(3600);
        let task = MaintenanceTask::spawn("slow", hour, || Ok(())).unwrap();
        assert!(task.is_running());

        let started = Instant::now();
        task.stop();
        task.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!task.is_running());
    }
}
