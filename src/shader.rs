//! WGSL sources and the uniform block they share.

use bytemuck::{Pod, Zeroable};

use crate::controls::ControlState;

/// Compute pass: reads the current particle buffers, writes the next frame.
pub const UPDATE_SOURCE: &str = include_str!("update.wgsl");
/// Render pass: instanced point quads coloured by speed.
pub const RENDER_SOURCE: &str = include_str!("render.wgsl");

/// Threads per workgroup in `update.wgsl`.
pub const WORKGROUP_SIZE: u32 = 256;

/// Mirrors `struct Controls` in both shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ShaderControls {
    pub mouse: [f32; 2],
    pub accel_amount: f32,
    pub accel: u32,
    pub point_size: f32,
    pub count: u32,
    pub viewport: [f32; 2],
}

impl ShaderControls {
    pub fn new(state: &ControlState, count: u32, viewport: (u32, u32)) -> Self {
        Self {
            mouse: state.target.to_array(),
            accel_amount: state.accel_magnitude,
            accel: state.accel_enabled as u32,
            point_size: state.point_size,
            count,
            viewport: [viewport.0.max(1) as f32, viewport.1.max(1) as f32],
        }
    }
}
