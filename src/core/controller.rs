//! Orchestration of one benchmark run across the render thread and the
//! thermal sampler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::core::error::BenchError;
use crate::render::{FrameClock, FrameWorkload, MonotonicClock, RenderLoop, SchedulerHandle};
use crate::stats::BenchResult;
use crate::thermal::ThermalSampler;

/// Result of a completed run together with the temperatures sampled during it
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub result: BenchResult,
    pub temperatures: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(BenchReport),
    /// Stopped, or replaced by a newer run, before the duration elapsed
    Cancelled,
}

/// Starts and stops the render loop and the thermal sampler together
pub struct BenchmarkController<W, C = MonotonicClock> {
    render: SchedulerHandle<RenderLoop<W, C>>,
    sampler: Arc<ThermalSampler>,
    poll_interval: Duration,
    generation: Arc<AtomicU64>,
}

impl<W: FrameWorkload, C: FrameClock> BenchmarkController<W, C> {
    pub fn new(
        render: SchedulerHandle<RenderLoop<W, C>>,
        sampler: Arc<ThermalSampler>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            render,
            sampler,
            poll_interval,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the benchmark for `duration` and return its report.
    ///
    /// Sampling starts before the render loop so the series covers the whole
    /// run. The finish callback stops the sampler and snapshots the series on
    /// the render thread, so the report only ever carries this run's samples.
    /// Resolves to [`RunOutcome::Cancelled`] when the run is stopped or a
    /// newer run replaces it.
    pub async fn run_benchmark(&self, duration: Duration) -> Result<RunOutcome, BenchError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.sampler.start(self.poll_interval);

        let (tx, rx) = oneshot::channel();
        let sampler = self.sampler.clone();
        let current = self.generation.clone();
        let posted = self.start(duration, move |result| {
            // A newer run owns the sampler; its series is not ours to report
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            sampler.stop();
            let _ = tx.send(BenchReport {
                result,
                temperatures: sampler.results(),
            });
        });
        if let Err(e) = posted {
            self.sampler.stop();
            return Err(e);
        }

        match rx.await {
            Ok(report) => Ok(RunOutcome::Completed(report)),
            Err(_) => {
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.sampler.stop();
                }
                Ok(RunOutcome::Cancelled)
            }
        }
    }

    /// Cancel the current run on both subsystems; no result is produced
    pub fn stop_benchmark(&self) -> Result<(), BenchError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let stopped = self.stop();
        self.sampler.stop();
        stopped
    }

    // ------------------------------------------------------------------------
    // Presentation-facing operations
    // ------------------------------------------------------------------------

    /// Start the render loop alone; `on_finish` runs on the render thread
    pub fn start<F>(&self, duration: Duration, on_finish: F) -> Result<(), BenchError>
    where
        F: FnOnce(BenchResult) + Send + 'static,
    {
        self.render
            .post(move |render_loop| render_loop.start(duration, on_finish))
    }

    /// Cancel the render loop without a result
    pub fn stop(&self) -> Result<(), BenchError> {
        self.render.post(|render_loop| render_loop.stop())
    }

    pub fn start_sampling(&self) {
        self.sampler.start(self.poll_interval);
    }

    pub fn stop_sampling(&self) {
        self.sampler.stop();
    }

    pub fn on_temperature_update<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.sampler.on_temperature_update(callback);
    }

    pub fn temperature_samples(&self) -> Vec<f32> {
        self.sampler.results()
    }

    pub fn sampler(&self) -> &Arc<ThermalSampler> {
        &self.sampler
    }
}
