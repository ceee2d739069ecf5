//! Statistics over frame timestamps and temperature samples

pub mod frame_statistics;
pub mod temperature_summary;

pub use frame_statistics::{compute_result, BenchResult};
pub use temperature_summary::TemperatureSummary;
