//! The per-frame load generator driven by the render loop

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::BenchError;

pub const DEFAULT_TRIANGLE_COUNT: u32 = 2000;

/// Vertices per triangle and components per vertex in the workload mesh
pub const VERTICES_PER_TRIANGLE: usize = 3;
pub const COMPONENTS_PER_VERTEX: usize = 2;

/// A fixed-cost GPU operation issued once per frame callback
pub trait FrameWorkload: Send + 'static {
    /// Compile the shader program and build the mesh.
    ///
    /// A compile or link failure is fatal and carries the compiler diagnostics.
    fn initialize(&mut self) -> Result<(), BenchError>;

    /// Update resolution-dependent fragment state
    fn on_resize(&mut self, width: u32, height: u32);

    /// Clear the target and issue one draw call over the whole mesh.
    ///
    /// Returns once the commands are submitted, without waiting for the GPU.
    fn draw_frame(&mut self);
}

/// Generate `triangle_count` triangles with coordinates uniform in [-1, 1].
///
/// The layout is flat: 3 vertices of 2 components per triangle. The same
/// seed always produces the same mesh.
pub fn generate_mesh(triangle_count: u32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = triangle_count as usize * VERTICES_PER_TRIANGLE * COMPONENTS_PER_VERTEX;
    (0..len).map(|_| rng.gen_range(-1.0f32..=1.0)).collect()
}
