//! Frame driver: owns the window, GPU state and controls, and runs one
//! simulation step per redraw.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::SwarmConfig;
use crate::controls::Controls;
use crate::error::{GpuError, SwarmError};
use crate::gpu::GpuState;
use crate::input::Input;
use crate::particles::ParticleSet;
use crate::time::FrameClock;

/// How the driver proceeds after one GPU step.
#[derive(Debug)]
enum StepOutcome {
    Stepped,
    /// Surface lost or outdated; reconfigure and try again next frame.
    Reconfigure,
    /// Surface timed out; nothing was simulated this frame.
    Skipped,
    Fatal(GpuError),
}

impl From<Result<(), GpuError>> for StepOutcome {
    fn from(result: Result<(), GpuError>) -> Self {
        match result {
            Ok(()) => StepOutcome::Stepped,
            Err(GpuError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                StepOutcome::Reconfigure
            }
            Err(GpuError::Surface(wgpu::SurfaceError::Timeout)) => StepOutcome::Skipped,
            Err(err) => StepOutcome::Fatal(err),
        }
    }
}

impl StepOutcome {
    /// Screensaver time only advances with simulated frames.
    fn advances_simulation(&self) -> bool {
        matches!(self, StepOutcome::Stepped)
    }
}

/// `Idle` until the window and GPU exist, then `Running` until the loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

pub struct App {
    config: SwarmConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    controls: Controls,
    input: Input,
    clock: FrameClock,
    rng: StdRng,
    state: DriverState,
    error: Option<SwarmError>,
}

impl App {
    pub fn new(config: SwarmConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut controls = Controls::new(&config);
        if config.screensaver {
            controls.set_screensaver(true, &mut rng);
        }
        let input = Input::new(config.width, config.height);
        Self {
            config,
            window: None,
            gpu_state: None,
            controls,
            input,
            clock: FrameClock::new(),
            rng,
            state: DriverState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The error that stopped the loop, if any.
    pub fn into_result(self) -> Result<(), SwarmError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: impl Into<SwarmError>) {
        self.error = Some(err.into());
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SwarmError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        let gpu_state =
            pollster::block_on(GpuState::new(window.clone(), self.config.clear_color()));
        let mut gpu_state = match gpu_state {
            Ok(gpu_state) => gpu_state,
            Err(err) => {
                // Nothing is drawn without the GPU state; hide the empty window.
                window.set_visible(false);
                return Err(err.into());
            }
        };
        let requested = self.controls.count();
        self.seed_particles(&mut gpu_state, requested)?;

        self.window = Some(window.clone());
        self.gpu_state = Some(gpu_state);
        self.state = DriverState::Running;
        self.update_title();
        window.request_redraw();
        Ok(())
    }

    /// Reseed with `requested` particles, cut to what the device can hold.
    fn seed_particles(
        &mut self,
        gpu_state: &mut GpuState,
        requested: u32,
    ) -> Result<(), GpuError> {
        let count = self.controls.fit_count(requested, gpu_state.max_particles());
        let particles = ParticleSet::seed(count, &mut self.rng);
        gpu_state.reseed(&particles)?;
        log::info!("seeded {} particles", gpu_state.particle_count());
        Ok(())
    }

    /// Apply a queued particle-count change. Only called between ticks.
    fn apply_pending_count(&mut self) -> Result<(), GpuError> {
        let Some(mut gpu_state) = self.gpu_state.take() else {
            return Ok(());
        };
        let result = match self.controls.take_pending_count() {
            Some(requested) => self.seed_particles(&mut gpu_state, requested),
            None => Ok(()),
        };
        self.gpu_state = Some(gpu_state);
        result
    }

    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.apply_pending_count() {
            self.fail(event_loop, err);
            return;
        }

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        let controls = self.controls.state();
        let outcome = StepOutcome::from(gpu_state.step(&controls));
        if outcome.advances_simulation() {
            self.controls.end_frame(&mut self.rng);
        }
        match outcome {
            StepOutcome::Stepped => {}
            StepOutcome::Reconfigure => gpu_state.reconfigure(),
            StepOutcome::Skipped => log::warn!("surface timeout, skipping frame"),
            StepOutcome::Fatal(err) => {
                self.fail(event_loop, err);
                return;
            }
        }

        if self.clock.tick() {
            self.update_title();
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let state = self.controls.state();
        let mut title = format!(
            "{} - {} particles - accel {:.2e} - size {} - {:.0} fps",
            self.config.title,
            self.controls.count(),
            state.accel_magnitude.abs(),
            state.point_size,
            self.clock.fps(),
        );
        if self.controls.preview_count() != self.controls.count() {
            title.push_str(&format!(" - next {}", self.controls.preview_count()));
        }
        if self.controls.screensaver_active() {
            title.push_str(" - screensaver");
        }
        window.set_title(&title);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state() == DriverState::Idle && self.error.is_none() {
            if let Err(err) = self.start(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
                self.input
                    .set_window_size(physical_size.width, physical_size.height);
                log::debug!("resized to {}x{}", physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                if self.state() == DriverState::Running {
                    self.tick(event_loop);
                }
            }
            other => {
                let consumed = self
                    .input
                    .handle_event(&other, &mut self.controls, &mut self.rng);
                if consumed && matches!(other, WindowEvent::KeyboardInput { .. }) {
                    self.update_title();
                }
            }
        }
    }
}
