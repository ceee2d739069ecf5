//! GPU Thermal Benchmark Library
//!
//! Renders a fixed, fragment-heavy workload for a chosen duration, records
//! frame timestamps, derives throughput statistics and samples device
//! temperature alongside.

pub mod core;
pub mod render;
pub mod stats;
pub mod thermal;
pub mod ui;

pub use self::core::{run_benchmark, BenchError, BenchReport, BenchmarkController, RunOutcome};
pub use self::stats::{compute_result, BenchResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
