//! Duration-bounded render loop.
//!
//! The loop is a small state machine driven by the host's frame callback:
//!
//! ```text
//! Idle --start--> Running --duration elapsed--> Finishing --callback--> Idle
//!                    |
//!                    +--stop--> Idle   (no callback)
//! ```

use std::time::{Duration, Instant};

use crate::core::error::BenchError;
use crate::render::scheduler::RenderSurface;
use crate::render::workload::FrameWorkload;
use crate::stats::{compute_result, BenchResult};

/// Source of monotonic frame timestamps in nanoseconds
pub trait FrameClock: Send + 'static {
    fn now_ns(&self) -> u64;
}

/// Nanoseconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl FrameClock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Finishing,
}

pub type FinishCallback = Box<dyn FnOnce(BenchResult) + Send>;

struct Session {
    started_at_ns: Option<u64>,
    duration_ns: u64,
    on_finish: FinishCallback,
}

/// Records one timestamp per frame while a benchmark session is running
pub struct RenderLoop<W, C = MonotonicClock> {
    workload: W,
    clock: C,
    state: LoopState,
    timestamps: Vec<u64>,
    session: Option<Session>,
}

impl<W: FrameWorkload> RenderLoop<W> {
    pub fn new(workload: W) -> Self {
        Self::with_clock(workload, MonotonicClock::default())
    }
}

impl<W: FrameWorkload, C: FrameClock> RenderLoop<W, C> {
    pub fn with_clock(workload: W, clock: C) -> Self {
        Self {
            workload,
            clock,
            state: LoopState::Idle,
            timestamps: Vec::new(),
            session: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_recorded(&self) -> usize {
        self.timestamps.len()
    }

    /// Begin a session of `duration`; `on_finish` runs once when it elapses.
    ///
    /// Any session already running is replaced and its callback dropped
    /// without being invoked.
    pub fn start<F>(&mut self, duration: Duration, on_finish: F)
    where
        F: FnOnce(BenchResult) + Send + 'static,
    {
        if self.session.is_some() {
            log::debug!("Replacing running session after {} frames", self.timestamps.len());
        }
        self.timestamps.clear();
        self.session = Some(Session {
            started_at_ns: None,
            duration_ns: u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
            on_finish: Box::new(on_finish),
        });
        self.state = LoopState::Running;
        log::info!("Benchmark session started ({:?})", duration);
    }

    /// Cancel the running session without producing a result
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            log::info!("Benchmark session cancelled after {} frames", self.timestamps.len());
        }
        self.state = LoopState::Idle;
    }

    fn finish(&mut self) {
        self.state = LoopState::Finishing;
        let result = compute_result(&self.timestamps);
        log::info!(
            "Benchmark session finished: {} frames, {:.2} avg fps",
            result.frame_count,
            result.average_fps
        );
        if let Some(session) = self.session.take() {
            (session.on_finish)(result);
        }
        self.state = LoopState::Idle;
    }
}

impl<W: FrameWorkload, C: FrameClock> RenderSurface for RenderLoop<W, C> {
    fn on_surface_created(&mut self) -> Result<(), BenchError> {
        self.workload.initialize()
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.workload.on_resize(width, height);
    }

    fn on_draw_frame(&mut self) {
        if self.state != LoopState::Running {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            self.state = LoopState::Idle;
            return;
        };

        let now = self.clock.now_ns();
        let started_at = *session.started_at_ns.get_or_insert(now);
        let duration_ns = session.duration_ns;
        self.timestamps.push(now);

        self.workload.draw_frame();

        if now.saturating_sub(started_at) >= duration_ns {
            self.finish();
        }
    }

    fn wants_frames(&self) -> bool {
        self.state == LoopState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const MS: u64 = 1_000_000;

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn set(&self, ns: u64) {
            self.0.store(ns, Ordering::SeqCst);
        }
    }

    impl FrameClock for ManualClock {
        fn now_ns(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Default)]
    struct CountingWorkload {
        draws: Arc<AtomicUsize>,
    }

    impl FrameWorkload for CountingWorkload {
        fn initialize(&mut self) -> Result<(), BenchError> {
            Ok(())
        }
        fn on_resize(&mut self, _width: u32, _height: u32) {}
        fn draw_frame(&mut self) {
            self.draws.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn harness() -> (RenderLoop<CountingWorkload, ManualClock>, ManualClock, Arc<AtomicUsize>) {
        let clock = ManualClock::default();
        let workload = CountingWorkload::default();
        let draws = workload.draws.clone();
        (RenderLoop::with_clock(workload, clock.clone()), clock, draws)
    }

    fn capture() -> (Arc<Mutex<Vec<BenchResult>>>, impl FnOnce(BenchResult) + Send + 'static) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        (results, move |r| sink.lock().unwrap().push(r))
    }

    #[test]
    fn idle_loop_records_and_draws_nothing() {
        let (mut rl, clock, draws) = harness();
        clock.set(5 * MS);
        rl.on_draw_frame();
        assert_eq!(rl.state(), LoopState::Idle);
        assert_eq!(rl.frames_recorded(), 0);
        assert_eq!(draws.load(Ordering::SeqCst), 0);
        assert!(!rl.wants_frames());
    }

    #[test]
    fn finishes_once_duration_elapses() {
        let (mut rl, clock, draws) = harness();
        let (results, on_finish) = capture();
        rl.start(Duration::from_millis(30), on_finish);
        assert!(rl.wants_frames());

        for t in [100, 110, 120] {
            clock.set(t * MS);
            rl.on_draw_frame();
        }
        assert_eq!(rl.state(), LoopState::Running);
        assert!(results.lock().unwrap().is_empty());

        clock.set(130 * MS);
        rl.on_draw_frame();
        assert_eq!(rl.state(), LoopState::Idle);
        assert_eq!(draws.load(Ordering::SeqCst), 4);

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].frame_count, 3);
        assert!((results[0].average_fps - 100.0).abs() < 1e-6);

        // Later callbacks do nothing until the next start
        drop(results);
        clock.set(200 * MS);
        rl.on_draw_frame();
        assert_eq!(draws.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn oversized_duration_saturates_instead_of_wrapping() {
        let (mut rl, clock, _) = harness();
        let (results, on_finish) = capture();
        // 2^64 ns plus a little: would wrap to about 0.29 s if truncated
        rl.start(Duration::from_secs(18_446_744_074), on_finish);

        clock.set(1 * MS);
        rl.on_draw_frame();
        clock.set(10_000 * MS);
        rl.on_draw_frame();

        assert_eq!(rl.state(), LoopState::Running);
        assert!(results.lock().unwrap().is_empty());
    }

    #[test]
    fn stop_cancels_without_callback() {
        let (mut rl, clock, _) = harness();
        let (results, on_finish) = capture();
        rl.start(Duration::from_millis(50), on_finish);
        clock.set(1 * MS);
        rl.on_draw_frame();
        rl.stop();
        assert_eq!(rl.state(), LoopState::Idle);

        clock.set(500 * MS);
        rl.on_draw_frame();
        assert!(results.lock().unwrap().is_empty());
    }

    #[test]
    fn restart_discards_previous_session() {
        let (mut rl, clock, _) = harness();
        let (first, first_cb) = capture();
        let (second, second_cb) = capture();

        rl.start(Duration::from_millis(20), first_cb);
        clock.set(0);
        rl.on_draw_frame();
        clock.set(10 * MS);
        rl.on_draw_frame();

        rl.start(Duration::from_millis(20), second_cb);
        assert_eq!(rl.frames_recorded(), 0);
        for t in [50, 60, 70] {
            clock.set(t * MS);
            rl.on_draw_frame();
        }

        assert!(first.lock().unwrap().is_empty());
        let second = second.lock().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].frame_count, 2);
    }

    #[test]
    fn zero_duration_finishes_on_first_frame_with_degenerate_result() {
        let (mut rl, clock, _) = harness();
        let (results, on_finish) = capture();
        rl.start(Duration::ZERO, on_finish);
        clock.set(42);
        rl.on_draw_frame();
        assert_eq!(results.lock().unwrap().as_slice(), &[BenchResult::degenerate()]);
    }
}
