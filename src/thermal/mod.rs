//! Periodic temperature sampling, independent of the render loop.
//!
//! The sampler runs as a tokio task: every tick it reads the probe on the
//! blocking pool, appends a successful reading, notifies the registered
//! observer and then waits for the next tick or for cancellation.

pub mod sources;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use sources::{battery_celsius, zone_celsius, RawSensor, SysfsSensor, TemperatureProbe};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

/// Samples of the current sampling session
#[derive(Default)]
struct SampleSeries {
    session: u64,
    values: Vec<f32>,
}

struct SamplingTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls a [`TemperatureProbe`] on a fixed cadence and keeps the series
pub struct ThermalSampler {
    probe: Arc<TemperatureProbe>,
    series: Arc<Mutex<SampleSeries>>,
    on_update: Arc<Mutex<Option<UpdateCallback>>>,
    task: Mutex<Option<SamplingTask>>,
}

impl ThermalSampler {
    pub fn new(probe: TemperatureProbe) -> Self {
        Self {
            probe: Arc::new(probe),
            series: Arc::new(Mutex::new(SampleSeries::default())),
            on_update: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Start a new sampling session, restarting any session in progress.
    ///
    /// The first reading is taken immediately. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, poll_interval: Duration) {
        let mut task = lock(&self.task);

        let session = {
            let mut series = lock(&self.series);
            if let Some(previous) = task.take() {
                let _ = previous.cancel.send(true);
            }
            series.session += 1;
            series.values.clear();
            series.session
        };

        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(sampling_loop(
            self.probe.clone(),
            self.series.clone(),
            self.on_update.clone(),
            session,
            poll_interval,
            cancelled,
        ));
        *task = Some(SamplingTask { cancel, handle });
        log::info!("Thermal sampling started (every {:?})", poll_interval);
    }

    /// Cancel the sampling task; a no-op when not running.
    ///
    /// No sample is appended once this returns.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.task).take() {
            let series = lock(&self.series);
            let _ = task.cancel.send(true);
            log::info!("Thermal sampling stopped after {} samples", series.values.len());
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Copy of the samples collected in the current session
    pub fn results(&self) -> Vec<f32> {
        lock(&self.series).values.clone()
    }

    /// Register the observer called once per tick, replacing any previous one
    pub fn on_temperature_update<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.on_update) = Some(Arc::new(callback));
    }
}

impl Drop for ThermalSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sampling_loop(
    probe: Arc<TemperatureProbe>,
    series: Arc<Mutex<SampleSeries>>,
    on_update: Arc<Mutex<Option<UpdateCallback>>>,
    session: u64,
    poll_interval: Duration,
    mut cancelled: watch::Receiver<bool>,
) {
    loop {
        if *cancelled.borrow() {
            break;
        }

        let reader = probe.clone();
        let reading = tokio::task::spawn_blocking(move || reader.read_celsius())
            .await
            .unwrap_or(None);

        {
            // Cancellation is signalled under this lock
            let mut series = lock(&series);
            if *cancelled.borrow() || series.session != session {
                break;
            }
            match reading {
                Some(celsius) => {
                    series.values.push(celsius);
                    log::debug!("Temperature sample {:.1} °C", celsius);
                }
                None => log::debug!("No temperature source readable this tick"),
            }
        }

        let callback = lock(&on_update).clone();
        if *cancelled.borrow() {
            break;
        }
        if let Some(callback) = callback {
            callback();
        }

        tokio::select! {
            _ = cancelled.changed() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}
