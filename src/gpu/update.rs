//! The compute half of a simulation step.
//!
//! Needs only a device and queue, no surface, so the update can be driven
//! and read back headless.

use super::{create_checked_module, uniform_entry, ParticleBuffers};
use crate::controls::ControlState;
use crate::error::GpuError;
use crate::particles::ParticleSet;
use crate::shader::{ShaderControls, UPDATE_SOURCE, WORKGROUP_SIZE};

/// Update pipeline, its bindings and the particle buffers it advances.
pub struct ParticleUpdate {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    controls_buffer: wgpu::Buffer,
    particles: ParticleBuffers,
}

impl ParticleUpdate {
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        particles: &ParticleSet,
    ) -> Result<Self, GpuError> {
        let shader = create_checked_module(device, "update", UPDATE_SOURCE).await?;

        let controls_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Controls Buffer"),
            size: std::mem::size_of::<ShaderControls>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        // Controls, read pair, feedback pair
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Update Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                    storage_entry(1, true),
                    storage_entry(2, true),
                    storage_entry(3, false),
                    storage_entry(4, false),
                ],
            });

        let particles = ParticleBuffers::new(device, queue, particles);
        let bind_group =
            create_bind_group(device, &bind_group_layout, &controls_buffer, &particles);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Update Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::ShaderBuild {
                stage: "update pipeline",
                message: err.to_string(),
            });
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            controls_buffer,
            particles,
        })
    }

    /// Uniform block shared with the render pass.
    pub fn controls_buffer(&self) -> &wgpu::Buffer {
        &self.controls_buffer
    }

    pub fn particles(&self) -> &ParticleBuffers {
        &self.particles
    }

    pub fn count(&self) -> u32 {
        self.particles.count()
    }

    /// Discard all particle state and start over from `particles`.
    ///
    /// Buffer and bind-group creation run under an error scope, so an
    /// allocation the device rejects comes back as [`GpuError::Validation`].
    pub fn reseed(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        particles: &ParticleSet,
    ) -> Result<(), GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        if self.particles.reseed(device, queue, particles) {
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.controls_buffer,
                &self.particles,
            );
        }

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(GpuError::Validation(err.to_string())),
            None => Ok(()),
        }
    }

    /// Upload this tick's controls. `viewport` is the render target size.
    pub fn write_controls(
        &self,
        queue: &wgpu::Queue,
        controls: &ControlState,
        viewport: (u32, u32),
    ) {
        let uniforms = ShaderControls::new(controls, self.count(), viewport);
        queue.write_buffer(&self.controls_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record the update pass: read pair -> feedback pair.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let count = self.count();
        if count == 0 {
            return;
        }

        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Update Pass"),
            timestamp_writes: None,
        });

        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, &self.bind_group, &[]);
        compute_pass.dispatch_workgroups(count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    controls: &wgpu::Buffer,
    particles: &ParticleBuffers,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Update Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: controls.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: particles.positions.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: particles.velocities.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: particles.feedback_positions.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: particles.feedback_velocities.as_entire_binding(),
            },
        ],
    })
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
