//! The four particle buffers and their ping-pong copy.

use std::sync::mpsc;

use glam::Vec2;

use crate::error::GpuError;
use crate::particles::{ParticleSet, COMPONENT_STRIDE};

const PARTICLE_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::VERTEX)
    .union(wgpu::BufferUsages::COPY_SRC)
    .union(wgpu::BufferUsages::COPY_DST);

/// Host copy of all four buffers, `count` particles each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleReadback {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub feedback_positions: Vec<Vec2>,
    pub feedback_velocities: Vec<Vec2>,
}

/// Current ("read") and next ("write") particle state on the GPU.
///
/// The update pass reads `positions`/`velocities` and writes the feedback
/// pair; [`ParticleBuffers::encode_copy_back`] then copies the feedback pair
/// over the read pair so the next frame starts from this frame's output.
pub struct ParticleBuffers {
    pub positions: wgpu::Buffer,
    pub velocities: wgpu::Buffer,
    pub feedback_positions: wgpu::Buffer,
    pub feedback_velocities: wgpu::Buffer,
    count: u32,
    capacity: u32,
}

impl ParticleBuffers {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, particles: &ParticleSet) -> Self {
        // Zero-sized storage bindings are invalid, keep room for one particle.
        let capacity = particles.len().max(1);
        let size = capacity as u64 * COMPONENT_STRIDE;
        let create = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: PARTICLE_USAGE,
                mapped_at_creation: false,
            })
        };

        let buffers = Self {
            positions: create("Position Buffer"),
            velocities: create("Velocity Buffer"),
            feedback_positions: create("Feedback Position Buffer"),
            feedback_velocities: create("Feedback Velocity Buffer"),
            count: particles.len(),
            capacity,
        };
        buffers.upload(queue, particles);
        buffers
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Particles each buffer can hold without reallocating.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bytes covered by the live particles in each buffer.
    pub fn byte_len(&self) -> u64 {
        self.count as u64 * COMPONENT_STRIDE
    }

    /// Replace the particle set wholesale.
    ///
    /// Handles are kept when the new set fits; otherwise all four buffers are
    /// reallocated and `true` is returned so bind groups can be rebuilt.
    pub fn reseed(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        particles: &ParticleSet,
    ) -> bool {
        if particles.len() > self.capacity {
            log::info!(
                "reallocating particle buffers: {} -> {} particles",
                self.capacity,
                particles.len()
            );
            *self = Self::new(device, queue, particles);
            true
        } else {
            self.count = particles.len();
            self.upload(queue, particles);
            false
        }
    }

    /// Same contents into both pairs so the first copy-back is a no-op.
    fn upload(&self, queue: &wgpu::Queue, particles: &ParticleSet) {
        if particles.is_empty() {
            return;
        }
        let positions = particles.position_bytes();
        let velocities = particles.velocity_bytes();
        queue.write_buffer(&self.positions, 0, positions);
        queue.write_buffer(&self.velocities, 0, velocities);
        queue.write_buffer(&self.feedback_positions, 0, positions);
        queue.write_buffer(&self.feedback_velocities, 0, velocities);
    }

    /// Copy this frame's output over the input for the next frame.
    pub fn encode_copy_back(&self, encoder: &mut wgpu::CommandEncoder) {
        let bytes = self.byte_len();
        if bytes == 0 {
            return;
        }
        encoder.copy_buffer_to_buffer(&self.feedback_positions, 0, &self.positions, 0, bytes);
        encoder.copy_buffer_to_buffer(&self.feedback_velocities, 0, &self.velocities, 0, bytes);
    }

    /// Copy all four buffers back to the host. Blocks until the GPU is idle.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<ParticleReadback, GpuError> {
        let bytes = self.byte_len();
        if bytes == 0 {
            return Ok(ParticleReadback::default());
        }

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: bytes * 4,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        let sources = [
            &self.positions,
            &self.velocities,
            &self.feedback_positions,
            &self.feedback_velocities,
        ];
        for (i, source) in sources.into_iter().enumerate() {
            encoder.copy_buffer_to_buffer(source, 0, &staging, i as u64 * bytes, bytes);
        }
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let readback = {
            let data = slice.get_mapped_range();
            let values: &[Vec2] = bytemuck::cast_slice(&data);
            let mut chunks = values.chunks_exact(self.count as usize).map(<[Vec2]>::to_vec);
            ParticleReadback {
                positions: chunks.next().unwrap_or_default(),
                velocities: chunks.next().unwrap_or_default(),
                feedback_positions: chunks.next().unwrap_or_default(),
                feedback_velocities: chunks.next().unwrap_or_default(),
            }
        };
        staging.unmap();
        Ok(readback)
    }
}
