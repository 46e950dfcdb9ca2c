//! Live control values sampled by the frame driver.
//!
//! [`Controls`] is the control surface: pointer, sliders and the screensaver
//! mutate it between frames, and the frame driver reads one [`ControlState`]
//! snapshot per tick. Particle-count changes are queued and only applied
//! between ticks via [`Controls::take_pending_count`].

use glam::Vec2;
use rand::Rng;

use crate::config::{SliderConfig, SwarmConfig};
use crate::screensaver::Screensaver;

/// Scale from acceleration slider units to per-frame velocity change.
pub const ACCEL_SLIDER_SCALE: f32 = 0.0001;

/// Acceleration magnitude for a slider position.
pub fn accel_from_slider(value: f32) -> f32 {
    value * ACCEL_SLIDER_SCALE
}

/// Particle count for a slider position: `round(500 * exp(value / 12))`.
///
/// `None` when the count does not fit in a `u32`.
pub fn checked_count_from_slider(value: f32) -> Option<u32> {
    let count = (500.0 * (value as f64 / 12.0).exp()).round();
    (count <= u32::MAX as f64).then_some(count as u32)
}

/// Particle count for a slider position, saturating at `u32::MAX`.
pub fn count_from_slider(value: f32) -> u32 {
    checked_count_from_slider(value).unwrap_or(u32::MAX)
}

/// Per-frame uniform values consumed by the simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Attractor position in normalized device coordinates.
    pub target: Vec2,
    pub accel_enabled: bool,
    /// Signed; negative repels.
    pub accel_magnitude: f32,
    /// Rendered point size in pixels.
    pub point_size: f32,
}

/// Which pointer button started the acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Attract toward the pointer.
    Primary,
    /// Repel from the pointer.
    Secondary,
}

/// The control surface.
#[derive(Debug, Clone)]
pub struct Controls {
    state: ControlState,
    accel_slider: SliderConfig,
    points_slider: SliderConfig,
    point_size_slider: SliderConfig,
    /// Count shown while the points slider is being dragged.
    preview_count: u32,
    /// Count of the live particle set (or the one about to replace it).
    count: u32,
    pending_count: Option<u32>,
    screensaver: Screensaver,
}

impl Controls {
    pub fn new(config: &SwarmConfig) -> Self {
        let count = count_from_slider(config.points.value);
        Self {
            state: ControlState {
                target: Vec2::ZERO,
                accel_enabled: false,
                accel_magnitude: accel_from_slider(config.accel.value),
                point_size: config.point_size.value,
            },
            accel_slider: config.accel,
            points_slider: config.points,
            point_size_slider: config.point_size,
            preview_count: count,
            count,
            pending_count: None,
            screensaver: Screensaver::new(),
        }
    }

    /// Snapshot for the current tick.
    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn preview_count(&self) -> u32 {
        self.preview_count
    }

    pub fn accel_slider(&self) -> f32 {
        self.accel_slider.value
    }

    pub fn points_slider(&self) -> f32 {
        self.points_slider.value
    }

    pub fn screensaver_active(&self) -> bool {
        self.screensaver.is_active()
    }

    // ========== Pointer ==========

    pub fn pointer_moved(&mut self, ndc: Vec2) {
        if !self.screensaver.is_active() {
            self.state.target = ndc;
        }
    }

    /// Start accelerating; the trigger picks the sign, the magnitude is kept.
    pub fn pointer_down(&mut self, trigger: Trigger) {
        if self.screensaver.is_active() {
            return;
        }
        self.state.accel_enabled = true;
        let magnitude = self.state.accel_magnitude.abs();
        self.state.accel_magnitude = match trigger {
            Trigger::Primary => magnitude,
            Trigger::Secondary => -magnitude,
        };
    }

    pub fn pointer_up(&mut self) {
        if !self.screensaver.is_active() {
            self.state.accel_enabled = false;
        }
    }

    // ========== Sliders ==========

    /// Set the acceleration slider. The resulting magnitude is positive.
    pub fn set_accel_slider(&mut self, value: f32) {
        self.accel_slider.value = self.accel_slider.clamp(value);
        self.state.accel_magnitude = accel_from_slider(self.accel_slider.value);
    }

    pub fn nudge_accel_slider(&mut self, steps: f32) {
        let value = self.accel_slider.nudge(self.accel_slider.value, steps);
        self.set_accel_slider(value);
    }

    /// Move the points slider without reallocating. Returns the preview count.
    pub fn drag_points_slider(&mut self, value: f32) -> u32 {
        self.points_slider.value = self.points_slider.clamp(value);
        self.preview_count = count_from_slider(self.points_slider.value);
        self.preview_count
    }

    pub fn nudge_points_slider(&mut self, steps: f32) -> u32 {
        let value = self.points_slider.nudge(self.points_slider.value, steps);
        self.drag_points_slider(value)
    }

    /// Release the points slider: the preview becomes the new count and a
    /// full reseed is queued for the next frame boundary.
    pub fn commit_points_slider(&mut self) {
        self.count = self.preview_count;
        self.pending_count = Some(self.count);
    }

    /// Queued particle count, cleared on read.
    pub fn take_pending_count(&mut self) -> Option<u32> {
        self.pending_count.take()
    }

    /// Fit a requested particle count under the device `limit`.
    ///
    /// Returns the count to allocate. When the request is cut down, the
    /// reduced count becomes the committed one so the read-out matches what
    /// is on screen.
    pub fn fit_count(&mut self, requested: u32, limit: u32) -> u32 {
        if requested <= limit {
            return requested;
        }
        log::warn!("{requested} particles exceeds device limit, using {limit}");
        self.count = limit;
        self.preview_count = limit;
        limit
    }

    pub fn set_point_size(&mut self, value: f32) {
        self.point_size_slider.value = self.point_size_slider.clamp(value);
        self.state.point_size = self.point_size_slider.value;
    }

    pub fn nudge_point_size(&mut self, steps: f32) {
        let value = self
            .point_size_slider
            .nudge(self.point_size_slider.value, steps);
        self.set_point_size(value);
    }

    // ========== Screensaver ==========

    pub fn set_screensaver<R: Rng>(&mut self, enabled: bool, rng: &mut R) {
        match (enabled, self.screensaver.is_active()) {
            (true, false) => self.screensaver.enable(&mut self.state, rng),
            (false, true) => self.screensaver.disable(&mut self.state),
            _ => {}
        }
    }

    pub fn toggle_screensaver<R: Rng>(&mut self, rng: &mut R) {
        let enabled = !self.screensaver.is_active();
        self.set_screensaver(enabled, rng);
    }

    /// Called once after every simulation step.
    pub fn end_frame<R: Rng>(&mut self, rng: &mut R) {
        self.screensaver.tick(&mut self.state, rng);
    }
}
