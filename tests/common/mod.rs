#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gpu_thermal_bench::render::FrameWorkload;
use gpu_thermal_bench::thermal::{RawSensor, TemperatureProbe};
use gpu_thermal_bench::BenchError;

/// Workload that only counts calls, optionally taking some time per frame
pub struct FakeWorkload {
    pub draws: Arc<AtomicUsize>,
    pub frame_cost: Duration,
    pub fail_init: bool,
}

impl FakeWorkload {
    pub fn new(frame_cost: Duration) -> (Self, Arc<AtomicUsize>) {
        let draws = Arc::new(AtomicUsize::new(0));
        let workload = Self {
            draws: draws.clone(),
            frame_cost,
            fail_init: false,
        };
        (workload, draws)
    }
}

impl FrameWorkload for FakeWorkload {
    fn initialize(&mut self) -> Result<(), BenchError> {
        if self.fail_init {
            return Err(BenchError::Shader {
                stage: "fragment",
                diagnostics: "syntax error".into(),
            });
        }
        Ok(())
    }

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    fn draw_frame(&mut self) {
        self.draws.fetch_add(1, Ordering::SeqCst);
        if !self.frame_cost.is_zero() {
            std::thread::sleep(self.frame_cost);
        }
    }
}

/// Sensor with a fixed raw value, or unreadable when `None`
pub struct StaticSensor(pub Option<f64>);

impl RawSensor for StaticSensor {
    fn describe(&self) -> String {
        format!("static({:?})", self.0)
    }

    fn read_raw(&self) -> io::Result<f64> {
        self.0
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no sensor"))
    }
}

/// Sensor reporting 1, 2, 3, ... on successive reads
#[derive(Default)]
pub struct CountingSensor {
    reads: AtomicUsize,
}

impl RawSensor for CountingSensor {
    fn describe(&self) -> String {
        "counting".to_string()
    }

    fn read_raw(&self) -> io::Result<f64> {
        Ok((self.reads.fetch_add(1, Ordering::SeqCst) + 1) as f64)
    }
}

pub fn counting_probe() -> TemperatureProbe {
    TemperatureProbe::new(vec![Box::new(CountingSensor::default())], Vec::new())
}

pub fn zone_probe(raw: Option<f64>) -> TemperatureProbe {
    TemperatureProbe::new(vec![Box::new(StaticSensor(raw))], Vec::new())
}
