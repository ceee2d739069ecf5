//! Frame-rate statistics for GPU throughput benchmarking
//!
//! Converts the ordered frame timestamps recorded by the render loop into
//! aggregate throughput metrics.

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Aggregate throughput metrics for one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BenchResult {
    pub average_fps: f64,
    pub min_fps: f64,
    pub fps_drop_percent: f64, // Largest dip relative to the average
    pub frame_count: usize,    // Number of instantaneous FPS values
    pub fps_std_dev: f64,      // Population standard deviation
}

impl BenchResult {
    /// The all-zero result returned when no interval can be derived
    pub const fn degenerate() -> Self {
        Self {
            average_fps: 0.0,
            min_fps: 0.0,
            fps_drop_percent: 0.0,
            frame_count: 0,
            fps_std_dev: 0.0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.frame_count == 0
    }
}

/// Compute throughput metrics from monotonic frame timestamps in nanoseconds.
///
/// Each pair of consecutive timestamps yields one instantaneous FPS value.
/// Fewer than two timestamps produce [`BenchResult::degenerate`].
pub fn compute_result(timestamps: &[u64]) -> BenchResult {
    if timestamps.len() < 2 {
        return BenchResult::degenerate();
    }

    let fps: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| {
            let interval_ms = pair[1].saturating_sub(pair[0]) as f64 / NANOS_PER_MILLI;
            1000.0 / interval_ms
        })
        .collect();

    let n = fps.len() as f64;
    let average_fps = fps.iter().sum::<f64>() / n;
    let min_fps = fps.iter().copied().reduce(f64::min).unwrap_or(average_fps);

    // Population variance: the run's intervals are the whole population
    let variance = fps.iter()
        .map(|x| (x - average_fps).powi(2))
        .sum::<f64>() / n;
    let fps_std_dev = variance.sqrt();

    let fps_drop_percent = if average_fps > 0.0 {
        (average_fps - min_fps) / average_fps * 100.0
    } else {
        0.0
    };

    BenchResult {
        average_fps,
        min_fps,
        fps_drop_percent,
        frame_count: fps.len(),
        fps_std_dev,
    }
}
