//! wgpu implementation of the frame workload.
//!
//! Renders into an offscreen colour target so the benchmark runs without a
//! window. The fragment stage does a fixed amount of per-pixel work that is
//! independent of the mesh.

use std::collections::VecDeque;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::core::error::BenchError;
use crate::render::workload::{generate_mesh, FrameWorkload, COMPONENTS_PER_VERTEX, VERTICES_PER_TRIANGLE};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Submissions allowed to be queued before the oldest one is waited on
const MAX_FRAMES_IN_FLIGHT: usize = 2;

const VERTEX_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2<f32>,
    _padding: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@fragment
fn fs_main(@builtin(position) frag_coord: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = frag_coord.xy / u.resolution;
    let v = sin(uv.x * 200.0) * cos(uv.y * 200.0);
    var c = 0.0;
    for (var i = 0; i < 8; i = i + 1) {
        c = c + abs(sin(v * f32(i + 1)));
    }
    return vec4<f32>(vec3<f32>(c * 0.125), 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ResolutionUniform {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

impl ResolutionUniform {
    fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            _padding: [0.0; 2],
        }
    }
}

/// Device and queue shared by the workload
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Pick a high-performance adapter and open a device on it
    pub async fn new() -> Result<Self, BenchError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BenchError::Adapter(e.to_string()))?;

        let adapter_info = adapter.get_info();
        log::info!("Using GPU adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gpu_thermal_bench"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| BenchError::Device(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }
}

struct DrawResources {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    target: wgpu::TextureView,
}

/// Random triangle mesh with a fragment-heavy shader, drawn once per frame
pub struct GpuWorkload {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    triangle_count: u32,
    mesh_seed: u64,
    size: (u32, u32),
    resources: Option<DrawResources>,
    in_flight: VecDeque<wgpu::SubmissionIndex>,
}

impl GpuWorkload {
    pub fn new(context: &GpuContext, triangle_count: u32, mesh_seed: u64) -> Self {
        Self {
            device: context.device.clone(),
            queue: context.queue.clone(),
            triangle_count: triangle_count.max(1),
            mesh_seed,
            size: (1, 1),
            resources: None,
            in_flight: VecDeque::with_capacity(MAX_FRAMES_IN_FLIGHT),
        }
    }

    /// Run `f` inside a validation error scope and turn a captured error into a shader failure
    fn validated<T>(&self, stage: &'static str, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, BenchError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match futures::executor::block_on(self.device.pop_error_scope()) {
            Some(error) => {
                log::error!("Could not compile {} shader: {}", stage, error);
                Err(BenchError::Shader { stage, diagnostics: error.to_string() })
            }
            None => Ok(value),
        }
    }

    fn create_target(&self) -> wgpu::TextureView {
        let (width, height) = self.size;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("workload_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

impl FrameWorkload for GpuWorkload {
    fn initialize(&mut self) -> Result<(), BenchError> {
        let vertex_module = self.validated("vertex", |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("workload_vertex"),
                source: wgpu::ShaderSource::Wgsl(VERTEX_SHADER.into()),
            })
        })?;
        let fragment_module = self.validated("fragment", |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("workload_fragment"),
                source: wgpu::ShaderSource::Wgsl(FRAGMENT_SHADER.into()),
            })
        })?;

        let (width, height) = self.size;
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("workload_uniforms"),
            contents: bytemuck::bytes_of(&ResolutionUniform::new(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("workload_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("workload_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("workload_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let stride = (COMPONENTS_PER_VERTEX * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
        let pipeline = self.validated("program link", |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("workload_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let mesh = generate_mesh(self.triangle_count, self.mesh_seed);
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("workload_vertices"),
            contents: bytemuck::cast_slice(&mesh),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let target = self.create_target();
        self.resources = Some(DrawResources {
            pipeline,
            vertex_buffer,
            vertex_count: self.triangle_count * VERTICES_PER_TRIANGLE as u32,
            uniform_buffer,
            bind_group,
            target,
        });
        log::info!("Workload ready: {} triangles", self.triangle_count);
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        let target = self.create_target();
        if let Some(resources) = self.resources.as_mut() {
            let (width, height) = self.size;
            self.queue.write_buffer(
                &resources.uniform_buffer,
                0,
                bytemuck::bytes_of(&ResolutionUniform::new(width, height)),
            );
            resources.target = target;
        }
        log::debug!("Workload resized to {}x{}", self.size.0, self.size.1);
    }

    fn draw_frame(&mut self) {
        let Some(resources) = self.resources.as_ref() else {
            return;
        };

        // Back-pressure on older frames only; the frame submitted below is not waited on
        if self.in_flight.len() >= MAX_FRAMES_IN_FLIGHT {
            if let Some(oldest) = self.in_flight.pop_front() {
                if let Err(e) = self.device.poll(wgpu::PollType::WaitForSubmissionIndex(oldest)) {
                    log::warn!("Waiting on an earlier frame failed: {}", e);
                }
            }
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("workload_frame"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("workload_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &resources.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&resources.pipeline);
            pass.set_bind_group(0, &resources.bind_group, &[]);
            pass.set_vertex_buffer(0, resources.vertex_buffer.slice(..));
            pass.draw(0..resources.vertex_count, 0..1);
        }

        let submission = self.queue.submit(Some(encoder.finish()));
        self.in_flight.push_back(submission);
    }
}
