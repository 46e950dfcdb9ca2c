//! Error types for pointswarm.
//!
//! GPU setup and per-frame failures are fatal for the demo: they stop the
//! frame driver and are returned from [`crate::run`].

use thiserror::Error;

/// Errors raised while creating or driving GPU state.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The adapter lacks a capability the simulation cannot run without.
    #[error("adapter {adapter} does not support {capability}")]
    MissingCapability {
        adapter: String,
        capability: &'static str,
    },
    /// Shader module or pipeline creation failed.
    #[error("shader build error ({stage}): {message}")]
    ShaderBuild { stage: &'static str, message: String },
    /// A validation error captured while recording or submitting a frame.
    #[error("GPU validation error: {0}")]
    Validation(String),
    /// Mapping a readback buffer failed.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
    /// Acquiring the next swapchain texture failed.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Errors raised while loading or validating a [`crate::SwarmConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur when running the simulation.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization or a frame failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
