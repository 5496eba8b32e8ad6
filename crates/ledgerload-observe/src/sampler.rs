//! Periodic resource sampler.
//!
//! The sampler runs as a scheduled tokio task that appends one
//! [`ResourceSample`] per tick. [`SamplerGuard::stop`] is the deterministic
//! cancellation point: once it returns, no further samples are appended.
//! Dropping the guard without stopping aborts the task.

use std::sync::Arc;
use std::time::Duration;

use ledgerload_core::{ResourceSample, TransferCounter, epoch_millis};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{ObserveError, Result};
use crate::monitor::HostMonitor;

#[derive(Debug, Default)]
struct SampleLog {
    samples: Vec<ResourceSample>,
    stopped: bool,
}

impl SampleLog {
    /// Appends unless stopped; returns false once stopped.
    fn push(&mut self, sample: ResourceSample) -> bool {
        if self.stopped {
            return false;
        }
        self.samples.push(sample);
        true
    }
}

/// Samples host resources on a fixed period.
#[derive(Debug, Clone)]
pub struct ResourceSampler {
    interval: Duration,
    counter: TransferCounter,
}

impl ResourceSampler {
    /// Creates a sampler reading the given byte counter.
    #[must_use]
    pub const fn new(interval: Duration, counter: TransferCounter) -> Self {
        Self { interval, counter }
    }

    /// Returns the sampling period.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts sampling; the first sample is taken immediately.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn start(self) -> SamplerGuard {
        let log = Arc::new(Mutex::new(SampleLog::default()));
        let task_log = Arc::clone(&log);
        let Self { interval, counter } = self;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "resource sampler started");

        let task = tokio::spawn(async move {
            let mut monitor = HostMonitor::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let host = monitor.sample();
                let bytes = counter.total();

                let sample = ResourceSample {
                    timestamp_ms: epoch_millis(),
                    cpu_percent: host.cpu_percent,
                    mem_used_bytes: host.mem_used_bytes,
                    mem_total_bytes: host.mem_total_bytes,
                    cumulative_bytes_sent: bytes,
                    cumulative_bytes_received: bytes,
                };
                if !task_log.lock().push(sample) {
                    break;
                }
            }
        });

        SamplerGuard {
            log,
            task: Some(task),
        }
    }
}

/// Scoped handle on a running sampler.
#[derive(Debug)]
pub struct SamplerGuard {
    log: Arc<Mutex<SampleLog>>,
    task: Option<JoinHandle<()>>,
}

impl SamplerGuard {
    /// Number of samples taken so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().samples.len()
    }

    /// Returns true if no sample has been taken yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops sampling and returns the collected samples in tick order.
    ///
    /// # Errors
    /// Returns an error if the sampling task panicked.
    pub async fn stop(mut self) -> Result<Vec<ResourceSample>> {
        let samples = {
            let mut log = self.log.lock();
            log.stopped = true;
            std::mem::take(&mut log.samples)
        };

        if let Some(task) = self.task.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(ObserveError::sampler(e.to_string())),
            }
        }

        tracing::debug!(samples = samples.len(), "resource sampler stopped");
        Ok(samples)
    }
}

impl Drop for SamplerGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.log.lock().stopped = true;
            task.abort();
        }
    }
}
