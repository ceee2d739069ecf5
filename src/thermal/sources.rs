//! Temperature sources and the fallback chain across them

use std::fs;
use std::io::{self, Error, ErrorKind};
use std::path::PathBuf;

/// Raw zone values above this are millidegrees
const MILLIDEGREE_THRESHOLD: f64 = 1000.0;

/// A sensor endpoint that yields one raw numeric reading or fails
pub trait RawSensor: Send + Sync {
    fn describe(&self) -> String;
    fn read_raw(&self) -> io::Result<f64>;
}

/// A sysfs-style file holding a single numeric value
#[derive(Debug, Clone)]
pub struct SysfsSensor {
    path: PathBuf,
}

impl SysfsSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RawSensor for SysfsSensor {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_raw(&self) -> io::Result<f64> {
        let text = fs::read_to_string(&self.path)?;
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{}: {}", self.path.display(), e)))?;
        if !value.is_finite() {
            return Err(Error::new(ErrorKind::InvalidData, "non-finite sensor value"));
        }
        Ok(value)
    }
}

/// Thermal zone reading in Celsius: values above 1000 are millidegrees
pub fn zone_celsius(raw: f64) -> f32 {
    if raw > MILLIDEGREE_THRESHOLD {
        (raw / 1000.0) as f32
    } else {
        raw as f32
    }
}

/// Battery reading in tenths of a degree; non-positive values mean "no reading"
pub fn battery_celsius(raw: f64) -> Option<f32> {
    (raw > 0.0).then(|| (raw / 10.0) as f32)
}

/// Ordered thermal zones with battery sensors as the fallback
pub struct TemperatureProbe {
    zones: Vec<Box<dyn RawSensor>>,
    batteries: Vec<Box<dyn RawSensor>>,
}

impl TemperatureProbe {
    pub fn new(zones: Vec<Box<dyn RawSensor>>, batteries: Vec<Box<dyn RawSensor>>) -> Self {
        Self { zones, batteries }
    }

    pub fn from_paths(zone_paths: &[PathBuf], battery_paths: &[PathBuf]) -> Self {
        let boxed = |paths: &[PathBuf]| -> Vec<Box<dyn RawSensor>> {
            paths
                .iter()
                .map(|p| Box::new(SysfsSensor::new(p.clone())) as Box<dyn RawSensor>)
                .collect()
        };
        Self::new(boxed(zone_paths), boxed(battery_paths))
    }

    /// Read the current temperature.
    ///
    /// The first readable thermal zone wins; battery sensors are only tried
    /// when no zone can be read. Individual failures are swallowed.
    pub fn read_celsius(&self) -> Option<f32> {
        self.zones
            .iter()
            .find_map(|zone| zone.read_raw().ok().map(zone_celsius))
            .or_else(|| {
                self.batteries
                    .iter()
                    .find_map(|battery| battery.read_raw().ok().and_then(battery_celsius))
            })
    }

    /// Descriptions of the sensors that can currently be read
    pub fn readable_sources(&self) -> Vec<String> {
        self.zones
            .iter()
            .chain(self.batteries.iter())
            .filter(|s| s.read_raw().is_ok())
            .map(|s| s.describe())
            .collect()
    }
}
