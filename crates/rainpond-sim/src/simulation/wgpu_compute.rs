//! WebGPU wave integration.
//!
//! Velocity-form update running as two compute dispatches per tick: impact
//! injection into the live height grid, then the wave step writing the
//! opposite grid pair plus the packed surface buffer. Results stay on the
//! GPU until a consumer asks for the surface.

use bytemuck::{Pod, Zeroable};
use rainpond_core::{HeightField, Impact, ImpactQueue, RainpondError, Result, WaveParams};
use tracing::{info, warn};
use wgpu::util::DeviceExt;

use super::backend::{Backend, WaveBackend};

/// Impacts accepted per step by the injection dispatch.
pub const MAX_IMPACTS_PER_STEP: usize = 64;

const WORKGROUP_SIZE: u32 = 16;

/// True when at least one WebGPU adapter can be enumerated.
pub fn is_wgpu_available() -> bool {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    instance
        .enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .next()
        .is_some()
}

const WAVE_SHADER: &str = r#"
struct SimParams {
    resolution: u32,
    impact_count: u32,
    wave_speed_sq: f32,
    damping: f32,
    fade_width: f32,
    fade_strength: f32,
    pad0: f32,
    pad1: f32,
}

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var<storage, read_write> height_src: array<f32>;
@group(0) @binding(2) var<storage, read_write> velocity_src: array<f32>;
@group(0) @binding(3) var<storage, read_write> height_dst: array<f32>;
@group(0) @binding(4) var<storage, read_write> velocity_dst: array<f32>;
@group(0) @binding(5) var<storage, read_write> surface: array<vec4<f32>>;
@group(0) @binding(6) var<storage, read> impacts: array<vec4<f32>>;

const IMPACT_RADIUS: f32 = 3.0;

fn cell_index(x: u32, y: u32) -> u32 {
    return y * params.resolution + x;
}

fn height_at(x: i32, y: i32) -> f32 {
    let edge = i32(params.resolution) - 1;
    let cx = clamp(x, 0, edge);
    let cy = clamp(y, 0, edge);
    return height_src[cell_index(u32(cx), u32(cy))];
}

fn edge_absorption(x: u32, y: u32) -> f32 {
    if (params.fade_width <= 0.0) {
        return 1.0;
    }
    let res = params.resolution;
    let dist = f32(min(min(x, y), min(res - 1u - x, res - 1u - y)));
    let t = clamp(dist / params.fade_width, 0.0, 1.0);
    let eased = t * t * (3.0 - 2.0 * t);
    return params.fade_strength + (1.0 - params.fade_strength) * eased;
}

@compute @workgroup_size(16, 16)
fn inject_impacts(@builtin(global_invocation_id) gid: vec3<u32>) {
    let res = params.resolution;
    if (gid.x >= res || gid.y >= res) {
        return;
    }
    let edge = f32(res - 1u);
    var boost = 0.0;
    for (var i = 0u; i < params.impact_count; i = i + 1u) {
        let impact = impacts[i];
        let dx = f32(gid.x) - impact.x * edge;
        let dy = f32(gid.y) - impact.y * edge;
        let dist = sqrt(dx * dx + dy * dy);
        if (dist < IMPACT_RADIUS) {
            let falloff = 1.0 - dist / IMPACT_RADIUS;
            boost = boost + impact.z * falloff * falloff;
        }
    }
    if (boost != 0.0) {
        let i = cell_index(gid.x, gid.y);
        height_src[i] = height_src[i] + boost;
    }
}

@compute @workgroup_size(16, 16)
fn wave_step(@builtin(global_invocation_id) gid: vec3<u32>) {
    let res = params.resolution;
    if (gid.x >= res || gid.y >= res) {
        return;
    }
    let i = cell_index(gid.x, gid.y);
    let x = i32(gid.x);
    let y = i32(gid.y);

    let center = height_at(x, y);
    let left = height_at(x - 1, y);
    let right = height_at(x + 1, y);
    let up = height_at(x, y - 1);
    let down = height_at(x, y + 1);
    let normal_x = (left - right) * 2.0;
    let normal_y = (up - down) * 2.0;

    if (gid.x == 0u || gid.y == 0u || gid.x == res - 1u || gid.y == res - 1u) {
        height_dst[i] = 0.0;
        velocity_dst[i] = 0.0;
        surface[i] = vec4<f32>(0.0, 0.0, normal_x, normal_y);
        return;
    }

    let laplacian = left + right + up + down - 4.0 * center;
    let absorption = edge_absorption(gid.x, gid.y);
    var velocity = (velocity_src[i] + laplacian * params.wave_speed_sq) * params.damping;
    var height = center + velocity;
    height = height * absorption;
    velocity = velocity * absorption;

    height_dst[i] = height;
    velocity_dst[i] = velocity;
    surface[i] = vec4<f32>(height, velocity, normal_x, normal_y);
}
"#;

/// Uniform block mirrored by `SimParams` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GpuParams {
    resolution: u32,
    impact_count: u32,
    wave_speed_sq: f32,
    damping: f32,
    fade_width: f32,
    fade_strength: f32,
    _pad: [f32; 2],
}

/// One queued impact, packed as a vec4 for the injection dispatch.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GpuImpact {
    x: f32,
    y: f32,
    strength: f32,
    _pad: f32,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Wave integrator running on a WebGPU compute device.
///
/// Height and velocity grids ping-pong between two buffer pairs on the
/// device; the surface buffer is copied back to the host lazily, at most
/// once per completed step.
pub struct WgpuRipples {
    device: wgpu::Device,
    queue: wgpu::Queue,
    inject_pipeline: wgpu::ComputePipeline,
    step_pipeline: wgpu::ComputePipeline,
    bind_group_a: wgpu::BindGroup,
    bind_group_b: wgpu::BindGroup,
    height_a: wgpu::Buffer,
    height_b: wgpu::Buffer,
    velocity_a: wgpu::Buffer,
    velocity_b: wgpu::Buffer,
    surface_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    impacts_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    params: WaveParams,
    resolution: u32,
    current_is_a: bool,
    impacts: ImpactQueue,
    surface: HeightField,
    surface_dirty: bool,
}

impl WgpuRipples {
    /// Create a resting pond on the first available GPU adapter.
    pub async fn new(resolution: u32, params: WaveParams) -> Result<Self> {
        let surface = HeightField::new(resolution)?;
        let cells = surface.len() as u64;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                RainpondError::backend_unavailable("no compatible GPU adapter found")
            })?;
        let info = adapter.get_info();
        info!("Using GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("rainpond device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| {
                RainpondError::backend_unavailable(format!("device request failed: {e}"))
            })?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("wave shader"),
            source: wgpu::ShaderSource::Wgsl(WAVE_SHADER.into()),
        });

        let scalar_size = cells * 4;
        let scalar_buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: scalar_size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let height_a = scalar_buffer("height a");
        let height_b = scalar_buffer("height b");
        let velocity_a = scalar_buffer("velocity a");
        let velocity_b = scalar_buffer("velocity b");

        let surface_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface"),
            size: cells * 16,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface staging"),
            size: cells * 16,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let impacts_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("impacts"),
            size: (MAX_IMPACTS_PER_STEP * std::mem::size_of::<GpuImpact>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wave params"),
            contents: bytemuck::bytes_of(&GpuParams::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("wave bind group layout"),
                entries: &[
                    uniform_entry(0),
                    storage_entry(1, false),
                    storage_entry(2, false),
                    storage_entry(3, false),
                    storage_entry(4, false),
                    storage_entry(5, false),
                    storage_entry(6, true),
                ],
            });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("wave pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let inject_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("inject impacts"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "inject_impacts",
            });
        let step_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("wave step"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "wave_step",
        });

        let make_bind_group = |label: &str,
                               src_h: &wgpu::Buffer,
                               src_v: &wgpu::Buffer,
                               dst_h: &wgpu::Buffer,
                               dst_v: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: src_h.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: src_v.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: dst_h.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: dst_v.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: surface_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: impacts_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_group_a =
            make_bind_group("wave bind group a", &height_a, &velocity_a, &height_b, &velocity_b);
        let bind_group_b =
            make_bind_group("wave bind group b", &height_b, &velocity_b, &height_a, &velocity_a);

        info!(
            "WebGPU wave integrator ready: {}x{} cells",
            resolution, resolution
        );

        Ok(Self {
            device,
            queue,
            inject_pipeline,
            step_pipeline,
            bind_group_a,
            bind_group_b,
            height_a,
            height_b,
            velocity_a,
            velocity_b,
            surface_buffer,
            staging_buffer,
            impacts_buffer,
            params_buffer,
            params,
            resolution,
            current_is_a: true,
            impacts: ImpactQueue::new(),
            surface,
            surface_dirty: false,
        })
    }

    /// Stage queued impacts into the device buffer, capped per step.
    fn upload_impacts(&mut self) -> u32 {
        if self.impacts.is_empty() {
            return 0;
        }
        let mut staged = [GpuImpact::zeroed(); MAX_IMPACTS_PER_STEP];
        let mut count = 0;
        let mut dropped = 0;
        for impact in self.impacts.drain() {
            if count < MAX_IMPACTS_PER_STEP {
                staged[count] = GpuImpact {
                    x: impact.x,
                    y: impact.y,
                    strength: impact.strength,
                    _pad: 0.0,
                };
                count += 1;
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("impact queue overflow: {dropped} impacts dropped this step");
        }
        self.queue
            .write_buffer(&self.impacts_buffer, 0, bytemuck::cast_slice(&staged[..count]));
        count as u32
    }

    fn write_params(&self, impact_count: u32) {
        let uniform = GpuParams {
            resolution: self.resolution,
            impact_count,
            wave_speed_sq: self.params.wave_speed_squared(),
            damping: self.params.damping(),
            fade_width: self.params.edge_fade_width() as f32,
            fade_strength: self.params.edge_fade_strength(),
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Copy the surface buffer back into the host-side field.
    fn download_surface(&mut self) -> Result<()> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("surface readback"),
            });
        encoder.copy_buffer_to_buffer(
            &self.surface_buffer,
            0,
            &self.staging_buffer,
            0,
            self.surface_buffer.size(),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = self.staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| RainpondError::transfer("surface map callback dropped"))?
            .map_err(|e| RainpondError::transfer(format!("surface map failed: {e}")))?;

        {
            let data = slice.get_mapped_range();
            self.surface
                .samples_mut()
                .copy_from_slice(bytemuck::cast_slice(&data));
        }
        self.staging_buffer.unmap();
        Ok(())
    }
}

impl WaveBackend for WgpuRipples {
    fn queue_impact(&mut self, impact: Impact) {
        self.impacts.push(impact);
    }

    fn pending_impacts(&self) -> usize {
        self.impacts.len()
    }

    fn clear_impacts(&mut self) {
        self.impacts.clear();
    }

    fn step(&mut self) -> Result<()> {
        let impact_count = self.upload_impacts();
        self.write_params(impact_count);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wave step"),
            });
        {
            let bind_group = if self.current_is_a {
                &self.bind_group_a
            } else {
                &self.bind_group_b
            };
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("wave step"),
                timestamp_writes: None,
            });
            pass.set_bind_group(0, bind_group, &[]);
            let groups = self.resolution.div_ceil(WORKGROUP_SIZE);
            if impact_count > 0 {
                pass.set_pipeline(&self.inject_pipeline);
                pass.dispatch_workgroups(groups, groups, 1);
            }
            pass.set_pipeline(&self.step_pipeline);
            pass.dispatch_workgroups(groups, groups, 1);
        }
        self.queue.submit(Some(encoder.finish()));

        self.current_is_a = !self.current_is_a;
        self.surface_dirty = true;
        Ok(())
    }

    fn read_surface(&mut self) -> Result<&HeightField> {
        if self.surface_dirty {
            self.download_surface()?;
            self.surface_dirty = false;
        }
        Ok(&self.surface)
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn params(&self) -> &WaveParams {
        &self.params
    }

    fn set_wave_speed(&mut self, speed: f32) -> Result<()> {
        self.params.set_wave_speed(speed)
    }

    fn set_damping(&mut self, damping: f32) -> Result<()> {
        self.params.set_damping(damping)
    }

    fn set_edge_fade_width(&mut self, width: u32) {
        self.params.set_edge_fade_width(width);
    }

    fn set_edge_fade_strength(&mut self, strength: f32) -> Result<()> {
        self.params.set_edge_fade_strength(strength)
    }

    fn reset(&mut self) {
        let cells = self.surface.len();
        let zeros = vec![0u8; cells * 16];
        for buffer in [
            &self.height_a,
            &self.height_b,
            &self.velocity_a,
            &self.velocity_b,
        ] {
            self.queue.write_buffer(buffer, 0, &zeros[..cells * 4]);
        }
        self.queue.write_buffer(&self.surface_buffer, 0, &zeros);
        self.impacts.clear();
        self.surface.reset();
        self.surface_dirty = false;
        self.current_is_a = true;
    }

    fn backend(&self) -> Backend {
        Backend::Wgpu
    }
}
