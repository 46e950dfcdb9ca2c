//! CPU reference for the per-particle update and colour mapping.
//!
//! `update.wgsl` and `render.wgsl` implement exactly this arithmetic on the
//! GPU. Keeping a host copy lets the numeric behaviour be tested without a
//! device: friction jitter, single-pass boundary reflection, and the
//! speed-to-HSV mapping whose value channel is allowed to exceed 1.

use glam::{Vec2, Vec3};

use crate::controls::ControlState;

/// Fraction of velocity lost per frame before jitter is applied.
pub const FRICTION: f32 = 0.01;

/// Velocity magnitude is scaled by this before colour lookup.
pub const SPEED_SCALE: f32 = 20.0;

/// Upper clamp for the scaled speed.
pub const MAX_SPEED: f32 = 2.0;

/// GLSL/WGSL `fract`: always in `[0, 1]`, unlike [`f32::fract`] which keeps
/// the sign of its input.
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Fractional-sine hash of a position.
#[inline]
pub fn hash(p: Vec2) -> f32 {
    fract(p.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.547)
}

/// Per-frame velocity multiplier for a particle at `position`.
///
/// Always within `[0.98, 0.99]`.
#[inline]
pub fn friction(position: Vec2) -> f32 {
    1.0 - FRICTION * (1.0 + hash(position))
}

/// Reflect a position that left `[-1, 1]` back across the boundary it crossed,
/// negating the matching velocity component.
///
/// Each bound is tested once, in the order +x, +y, -x, -y. A particle that
/// overshoots by more than the domain width can therefore remain outside
/// after this call; it is corrected on later frames, never here.
pub fn reflect(mut position: Vec2, mut velocity: Vec2) -> (Vec2, Vec2) {
    if position.x > 1.0 {
        position.x = 2.0 - position.x;
        velocity.x = -velocity.x;
    }
    if position.y > 1.0 {
        position.y = 2.0 - position.y;
        velocity.y = -velocity.y;
    }
    if position.x < -1.0 {
        position.x = -2.0 - position.x;
        velocity.x = -velocity.x;
    }
    if position.y < -1.0 {
        position.y = -2.0 - position.y;
        velocity.y = -velocity.y;
    }
    (position, velocity)
}

/// Advance one particle by one frame.
///
/// Acceleration toward the target, friction, explicit Euler integration and
/// boundary reflection, in that order. A particle sitting exactly on the
/// target divides zero by zero and goes NaN, as it does on the GPU.
pub fn advance(position: Vec2, velocity: Vec2, controls: &ControlState) -> (Vec2, Vec2) {
    let mut velocity = velocity;
    if controls.accel_enabled {
        let delta = controls.target - position;
        velocity += delta / delta.length() * controls.accel_magnitude;
    }
    velocity *= friction(position);
    reflect(position + velocity, velocity)
}

/// HSV triple for a particle moving with `velocity`.
///
/// Hue runs from 0.6 at rest down to -0.6 at full speed; value has a floor of
/// 0.8 and climbs to 2.2, which the HSV conversion lets wrap.
pub fn speed_hsv(velocity: Vec2) -> Vec3 {
    let speed = (velocity.length() * SPEED_SCALE).clamp(0.0, MAX_SPEED);
    Vec3::new(0.6 - speed * 0.6, 1.0, (0.2 + speed).max(0.8))
}

/// Branch-free HSV to RGB conversion, identical to the fragment shader.
pub fn hsv_to_rgb(c: Vec3) -> Vec3 {
    let k = [1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0];
    let channel = |offset: f32| {
        let p = (fract(c.x + offset) * 6.0 - k[3]).abs();
        let t = (p - k[0]).clamp(0.0, 1.0);
        c.z * (k[0] + (t - k[0]) * c.y)
    };
    Vec3::new(channel(k[0]), channel(k[1]), channel(k[2]))
}

/// Final fragment colour for a particle moving with `velocity`.
pub fn speed_color(velocity: Vec2) -> Vec3 {
    hsv_to_rgb(speed_hsv(velocity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn coasting() -> ControlState {
        ControlState {
            target: Vec2::ZERO,
            accel_enabled: false,
            accel_magnitude: 0.001,
            point_size: 1.0,
        }
    }

    #[test]
    fn fract_matches_shader_semantics_for_negatives() {
        assert!((fract(-0.25) - 0.75).abs() < 1e-6);
        assert!((fract(1.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn hash_of_origin_is_zero() {
        assert_eq!(hash(Vec2::ZERO), 0.0);
        assert_eq!(friction(Vec2::ZERO), 0.99);
    }

    #[test]
    fn bounce_off_right_edge() {
        let position = Vec2::new(0.95, 0.0);
        let velocity = Vec2::new(0.10, 0.0);
        let damped = velocity.x * friction(position);

        let (p, v) = advance(position, velocity, &coasting());

        assert!((p.x - (2.0 - (0.95 + damped))).abs() < 1e-6);
        assert!((v.x + damped).abs() < 1e-6);
        assert!(p.x < 1.0 && p.x > 0.94);
    }

    #[test]
    fn bounce_off_bottom_edge() {
        let (p, v) = reflect(Vec2::new(0.0, -1.2), Vec2::new(0.0, -0.3));
        assert!((p.y - -0.8).abs() < 1e-6);
        assert_eq!(v.y, 0.3);
    }

    #[test]
    fn large_overshoot_takes_both_x_checks() {
        // 3.5 reflects to -1.5, which the -x check then reflects to -0.5.
        let (p, v) = reflect(Vec2::new(3.5, 0.0), Vec2::new(1.0, 0.0));
        assert!((p.x - -0.5).abs() < 1e-6);
        assert_eq!(v.x, 1.0);
    }

    #[test]
    fn overshoot_below_is_not_clamped() {
        // -3.5 only meets the -x check once and stays outside the domain.
        let (p, v) = reflect(Vec2::new(-3.5, 0.0), Vec2::new(-1.0, 0.0));
        assert!((p.x - 1.5).abs() < 1e-6);
        assert_eq!(v.x, 1.0);
    }

    #[test]
    fn acceleration_pulls_toward_target() {
        let controls = ControlState {
            target: Vec2::new(1.0, 0.0),
            accel_enabled: true,
            accel_magnitude: 0.01,
            point_size: 1.0,
        };
        let (p, v) = advance(Vec2::ZERO, Vec2::ZERO, &controls);
        assert!((v.x - 0.0099).abs() < 1e-7);
        assert_eq!(v.y, 0.0);
        assert_eq!(p, v);
    }

    #[test]
    fn negative_magnitude_pushes_away() {
        let controls = ControlState {
            target: Vec2::new(0.0, 0.5),
            accel_enabled: true,
            accel_magnitude: -0.01,
            point_size: 1.0,
        };
        let (_, v) = advance(Vec2::ZERO, Vec2::ZERO, &controls);
        assert!(v.y < 0.0);
    }

    #[test]
    fn particle_on_target_goes_nan() {
        let controls = ControlState {
            target: Vec2::new(0.25, 0.25),
            accel_enabled: true,
            accel_magnitude: 0.01,
            point_size: 1.0,
        };
        let (_, v) = advance(Vec2::new(0.25, 0.25), Vec2::ZERO, &controls);
        assert!(v.is_nan());
    }

    #[test]
    fn resting_particle_is_dim_blue() {
        let hsv = speed_hsv(Vec2::ZERO);
        assert!(approx(hsv, Vec3::new(0.6, 1.0, 0.8)));
        assert!(approx(speed_color(Vec2::ZERO), Vec3::new(0.0, 0.32, 0.8)));
    }

    #[test]
    fn saturated_speed_keeps_value_above_one() {
        let hsv = speed_hsv(Vec2::new(0.3, 0.0));
        assert!(approx(hsv, Vec3::new(-0.6, 1.0, 2.2)));
        assert!(approx(speed_color(Vec2::new(0.3, 0.0)), Vec3::new(0.0, 2.2, 0.88)));
    }

    #[test]
    fn zero_saturation_is_grey() {
        let rgb = hsv_to_rgb(Vec3::new(0.3, 0.0, 0.5));
        assert!(approx(rgb, Vec3::splat(0.5)));
    }
}
