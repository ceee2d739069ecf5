use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::core::error::BenchError;
use crate::render::workload::DEFAULT_TRIANGLE_COUNT;
use crate::thermal::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

// ============================================================================
// SETTINGS FILE
// ============================================================================

/// Benchmark parameters, read from `appsettings.json`.
///
/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    #[serde(rename = "DurationSeconds", deserialize_with = "validate_positive")]
    pub duration_seconds: u64,
    #[serde(rename = "TriangleCount", deserialize_with = "validate_positive")]
    pub triangle_count: u32,
    #[serde(rename = "PollIntervalMs", deserialize_with = "validate_positive")]
    pub poll_interval_ms: u64,
    /// Host frame cadence, 0 means uncapped
    #[serde(rename = "RefreshHz", deserialize_with = "validate_refresh_hz")]
    pub refresh_hz: f64,
    #[serde(rename = "Width", deserialize_with = "validate_positive")]
    pub width: u32,
    #[serde(rename = "Height", deserialize_with = "validate_positive")]
    pub height: u32,
    #[serde(rename = "MeshSeed")]
    pub mesh_seed: u64,
    #[serde(rename = "ThermalZonePaths")]
    pub thermal_zone_paths: Vec<PathBuf>,
    #[serde(rename = "BatteryPaths")]
    pub battery_paths: Vec<PathBuf>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 60,
            triangle_count: DEFAULT_TRIANGLE_COUNT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            refresh_hz: 60.0,
            width: 1280,
            height: 720,
            mesh_seed: 42,
            thermal_zone_paths: (0..3)
                .map(|i| PathBuf::from(format!("/sys/class/thermal/thermal_zone{}/temp", i)))
                .collect(),
            battery_paths: vec![
                PathBuf::from("/sys/class/power_supply/battery/temp"),
                PathBuf::from("/sys/class/power_supply/BAT0/temp"),
            ],
        }
    }
}

fn validate_positive<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + PartialOrd + Default,
{
    let value = T::deserialize(deserializer)?;
    if value > T::default() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

/// Lowest capped refresh rate, one frame every 100 seconds
pub const MIN_REFRESH_HZ: f64 = 0.01;

/// Zero means uncapped; anything else must be a finite rate of at least [`MIN_REFRESH_HZ`]
fn check_refresh_hz(value: f64) -> Result<f64, String> {
    if value == 0.0 || (value.is_finite() && value >= MIN_REFRESH_HZ) {
        Ok(value)
    } else {
        Err(format!(
            "refresh rate must be 0 (uncapped) or at least {} Hz, got {}",
            MIN_REFRESH_HZ, value
        ))
    }
}

fn validate_refresh_hz<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    check_refresh_hz(value).map_err(serde::de::Error::custom)
}

impl BenchmarkSettings {
    /// Load settings from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        if !path.exists() {
            log::info!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        log::debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Apply command-line overrides on top of the file values
    pub fn apply_overrides(&mut self, args: &CliArgs) -> Result<(), BenchError> {
        if let Some(duration) = args.duration {
            self.duration_seconds = duration;
        }
        if let Some(triangles) = args.triangles {
            self.triangle_count = triangles;
        }
        if let Some(poll_ms) = args.poll_ms {
            self.poll_interval_ms = poll_ms;
        }
        if let Some(refresh_hz) = args.refresh_hz {
            self.refresh_hz = check_refresh_hz(refresh_hz)
                .map_err(|e| BenchError::Config(format!("--refresh-hz: {}", e)))?;
        }
        if let Some(width) = args.width {
            self.width = width;
        }
        if let Some(height) = args.height {
            self.height = height;
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Time between host frame callbacks, `None` when uncapped
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.refresh_hz > 0.0).then(|| Duration::from_secs_f64(1.0 / self.refresh_hz))
    }
}

// ============================================================================
// COMMAND LINE
// ============================================================================

/// Sustained GPU throughput benchmark with thermal sampling
#[derive(Debug, Default, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Benchmark duration in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: Option<u64>,

    /// Number of triangles in the workload mesh
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub triangles: Option<u32>,

    /// Thermal polling interval in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: Option<u64>,

    /// Frame callback rate in Hz (0 = uncapped)
    #[arg(long)]
    pub refresh_hz: Option<f64>,

    /// Offscreen surface width
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Offscreen surface height
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}
