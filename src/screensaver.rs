//! Autonomous control source that wanders the attractor around the screen.
//!
//! While active, the screensaver owns the target and the acceleration sign;
//! pointer input is ignored by [`crate::Controls`].

use glam::Vec2;
use rand::Rng;

use crate::controls::ControlState;

/// Frames before the first retarget after enabling.
pub const INITIAL_COUNTDOWN: i32 = 100;

/// Chance that a retarget repels instead of attracts.
pub const REPEL_CHANCE: f64 = 0.2;

#[derive(Debug, Clone, Default)]
pub struct Screensaver {
    active: bool,
    countdown: i32,
}

impl Screensaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frames left until the next retarget.
    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    /// Take over the controls: acceleration on, random target.
    pub fn enable<R: Rng>(&mut self, state: &mut ControlState, rng: &mut R) {
        self.active = true;
        self.countdown = INITIAL_COUNTDOWN;
        state.accel_enabled = true;
        state.target = random_target(rng);
        log::info!("screensaver on, target {:?}", state.target);
    }

    /// Hand the controls back with the attractor parked at the centre.
    pub fn disable(&mut self, state: &mut ControlState) {
        self.active = false;
        state.target = Vec2::ZERO;
        state.accel_enabled = false;
        log::info!("screensaver off");
    }

    /// Run once after every simulation step.
    pub fn tick<R: Rng>(&mut self, state: &mut ControlState, rng: &mut R) {
        if !self.active {
            return;
        }
        if self.countdown == 0 {
            state.target = random_target(rng);
            let magnitude = state.accel_magnitude.abs();
            if rng.gen_bool(REPEL_CHANCE) {
                state.accel_magnitude = -magnitude;
                self.countdown = rng.gen_range(10..100);
            } else {
                state.accel_magnitude = magnitude;
                self.countdown = rng.gen_range(10..300);
            }
            log::debug!(
                "screensaver retarget {:?}, magnitude {}, next in {}",
                state.target,
                state.accel_magnitude,
                self.countdown
            );
        }
        self.countdown -= 1;
    }
}

/// Uniform point in `[-1, 1)²`, rounded to four decimals.
fn random_target<R: Rng>(rng: &mut R) -> Vec2 {
    let mut axis = || (rng.gen_range(-1.0f32..1.0) * 1e4).round() / 1e4;
    let x = axis();
    let y = axis();
    Vec2::new(x, y)
}
