//! # pointswarm
//!
//! A swarm of GPU point particles that drift, accelerate toward the mouse,
//! bounce off the edges of the window and are coloured by speed.
//!
//! ## Simulation step
//!
//! Particle state lives in four GPU buffers: a position/velocity pair that is
//! read, and a second pair that receives the updated values. Each frame:
//!
//! 1. the current controls are written to a uniform block,
//! 2. a compute pass advances every particle from the read pair into the
//!    write pair,
//! 3. a render pass clears the target and draws one square point per
//!    particle at its current position, coloured by its updated velocity,
//! 4. the write pair is copied over the read pair.
//!
//! All four steps are recorded into one command encoder, so the next frame
//! always starts from this frame's output.
//!
//! ## Update rule
//!
//! See [`kernel`] for the host copy of the per-particle arithmetic:
//!
//! ```ignore
//! if accel { v += normalize(mouse - p) * accel_amount; }
//! v *= 1.0 - 0.01 * (1.0 + hash(p));
//! p += v;
//! // reflect across any edge that p crossed, negating v on that axis
//! ```
//!
//! ## Controls
//!
//! Hold the left mouse button to attract, the right one to repel. Up/Down
//! change the acceleration, Left/Right choose a new particle count (applied
//! on release), `[`/`]` change the point size and `S` toggles screensaver
//! mode. See [`input`] for the full table.

mod app;
pub mod config;
pub mod controls;
pub mod error;
pub mod gpu;
pub mod input;
pub mod kernel;
pub mod particles;
pub mod screensaver;
pub mod shader;
pub mod time;

pub use app::DriverState;
pub use config::{SliderConfig, SwarmConfig};
pub use controls::{ControlState, Controls, Trigger};
pub use error::{ConfigError, GpuError, SwarmError};
pub use glam::Vec2;
pub use particles::ParticleSet;
pub use screensaver::Screensaver;

use winit::event_loop::{ControlFlow, EventLoop};

/// Open a window and run the simulation until it is closed.
///
/// Returns the error that stopped the frame loop, if any.
pub fn run(config: SwarmConfig) -> Result<(), SwarmError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::App::new(config);
    event_loop.run_app(&mut app)?;
    app.into_result()
}
