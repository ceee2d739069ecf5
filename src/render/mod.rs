//! Rendering side of the benchmark: the workload, the render loop that times
//! it, and the scheduler thread that drives both.

pub mod gpu;
pub mod render_loop;
pub mod scheduler;
pub mod workload;

pub use gpu::{GpuContext, GpuWorkload};
pub use render_loop::{FrameClock, LoopState, MonotonicClock, RenderLoop};
pub use scheduler::{FrameScheduler, RenderSurface, SchedulerHandle};
pub use workload::{generate_mesh, FrameWorkload};
