//! GPU side of the simulation: particle buffers, the compute update and the
//! windowed renderer that wraps it.

mod buffers;
mod update;

use std::sync::Arc;

use winit::window::Window;

pub use buffers::{ParticleBuffers, ParticleReadback};
pub use update::ParticleUpdate;

use crate::controls::ControlState;
use crate::error::GpuError;
use crate::particles::{ParticleSet, COMPONENT_STRIDE};
use crate::shader::{RENDER_SOURCE, WORKGROUP_SIZE};

/// Largest particle count one storage binding and one dispatch can cover.
pub fn max_particles(limits: &wgpu::Limits) -> u32 {
    (limits.max_storage_buffer_binding_size as u64 / COMPONENT_STRIDE)
        .min(limits.max_compute_workgroups_per_dimension as u64 * WORKGROUP_SIZE as u64)
        as u32
}

/// Surface, device and everything one simulation step touches.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    render_bind_group: wgpu::BindGroup,
    update: ParticleUpdate,
    clear_color: wgpu::Color,
    max_particles: u32,
}

impl GpuState {
    /// Set up the device and pipelines with no particles allocated yet.
    ///
    /// Call [`GpuState::reseed`] once [`GpuState::max_particles`] is known.
    pub async fn new(window: Arc<Window>, clear_color: wgpu::Color) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        // The update runs as a compute pass; without it there is no simulation.
        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(GpuError::MissingCapability {
                adapter: info.name,
                capability: "compute shaders",
            });
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let max_particles = max_particles(&device.limits());

        let surface_caps = surface.get_capabilities(&adapter);
        // Linear format: the fragment shader's HSV output goes to screen as-is.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let update = ParticleUpdate::new(&device, &queue, &ParticleSet::default()).await?;

        // Render bind group layout (controls only)
        let render_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Render Bind Group Layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            });

        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Render Bind Group"),
            layout: &render_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: update.controls_buffer().as_entire_binding(),
            }],
        });

        let render_shader = create_checked_module(&device, "render", RENDER_SOURCE).await?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&render_bind_group_layout],
                push_constant_ranges: &[],
            });

        // Slot 0: current position (pre-update). Slot 1: updated velocity.
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    instance_layout(&[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }]),
                    instance_layout(&[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32x2,
                    }]),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::ShaderBuild {
                stage: "render pipeline",
                message: err.to_string(),
            });
        }

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            render_bind_group,
            update,
            clear_color,
            max_particles,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after `Lost`/`Outdated`.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// See [`max_particles`].
    pub fn max_particles(&self) -> u32 {
        self.max_particles
    }

    pub fn particle_count(&self) -> u32 {
        self.update.count()
    }

    /// Discard all particle state and start over from `particles`.
    pub fn reseed(&mut self, particles: &ParticleSet) -> Result<(), GpuError> {
        self.update.reseed(&self.device, &self.queue, particles)
    }

    /// One simulation step: update, draw, copy back, present.
    ///
    /// Any validation error raised by the frame's commands is returned rather
    /// than logged; the caller treats it as fatal.
    pub fn step(&mut self, controls: &ControlState) -> Result<(), GpuError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let count = self.update.count();
        self.update.write_controls(
            &self.queue,
            controls,
            (self.config.width, self.config.height),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });

        self.update.encode(&mut encoder);

        // Render pass
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if count > 0 {
                let particles = self.update.particles();
                let bytes = particles.byte_len();
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.render_bind_group, &[]);
                render_pass.set_vertex_buffer(0, particles.positions.slice(..bytes));
                render_pass.set_vertex_buffer(1, particles.feedback_velocities.slice(..bytes));
                render_pass.draw(0..6, 0..count);
            }
        }

        self.update.particles().encode_copy_back(&mut encoder);

        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::Validation(err.to_string()));
        }

        output.present();

        Ok(())
    }
}

async fn create_checked_module(
    device: &wgpu::Device,
    stage: &'static str,
    source: &str,
) -> Result<wgpu::ShaderModule, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match device.pop_error_scope().await {
        Some(err) => Err(GpuError::ShaderBuild {
            stage,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn instance_layout(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: COMPONENT_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_cap_on_dispatch_size() {
        // 128 MiB binding holds 16_777_216 particles; 65535 workgroups hold fewer.
        assert_eq!(max_particles(&wgpu::Limits::default()), 65_535 * 256);
    }

    #[test]
    fn small_binding_caps_on_storage_size() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 8 * 1000,
            ..wgpu::Limits::default()
        };
        assert_eq!(max_particles(&limits), 1000);
    }
}
