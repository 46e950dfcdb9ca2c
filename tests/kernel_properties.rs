//! Property tests for the host-side update rule.

use pointswarm::kernel::{advance, friction, reflect, speed_hsv};
use pointswarm::{ControlState, ParticleSet, Vec2};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn idle_controls() -> ControlState {
    ControlState {
        target: Vec2::ZERO,
        accel_enabled: false,
        accel_magnitude: 0.001,
        point_size: 1.0,
    }
}

proptest! {
    #[test]
    fn friction_stays_in_band(x in -1.0f32..1.0, y in -1.0f32..1.0) {
        let f = friction(Vec2::new(x, y));
        prop_assert!((0.98..=0.99).contains(&f), "friction {f} at ({x}, {y})");
    }

    #[test]
    fn friction_always_slows(
        x in -1.0f32..1.0,
        y in -1.0f32..1.0,
        vx in -1.0f32..1.0,
        vy in -1.0f32..1.0,
    ) {
        let v = Vec2::new(vx, vy);
        prop_assume!(v.length() > 1e-6);
        let slowed = v * friction(Vec2::new(x, y));
        prop_assert!(slowed.length() < v.length());
    }

    #[test]
    fn small_overshoot_lands_inside(
        x in -1.5f32..1.5,
        y in -1.5f32..1.5,
        vx in -0.5f32..0.5,
        vy in -0.5f32..0.5,
    ) {
        let (p, _) = reflect(Vec2::new(x, y), Vec2::new(vx, vy));
        prop_assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "{p:?}");
    }

    #[test]
    fn reflection_flips_only_crossed_axes(
        x in -3.0f32..3.0,
        y in -3.0f32..3.0,
        vx in -1.0f32..1.0,
        vy in -1.0f32..1.0,
    ) {
        let v = Vec2::new(vx, vy);
        let (_, out) = reflect(Vec2::new(x, y), v);
        prop_assert_eq!(out.x.abs(), v.x.abs());
        prop_assert_eq!(out.y.abs(), v.y.abs());
        if x.abs() <= 1.0 {
            prop_assert_eq!(out.x, v.x);
        }
        if y.abs() <= 1.0 {
            prop_assert_eq!(out.y, v.y);
        }
    }

    #[test]
    fn hue_and_value_stay_in_range(vx in -1.0f32..1.0, vy in -1.0f32..1.0) {
        let hsv = speed_hsv(Vec2::new(vx, vy));
        prop_assert!((-0.6..=0.6).contains(&hsv.x));
        prop_assert_eq!(hsv.y, 1.0);
        prop_assert!((0.8..=2.2).contains(&hsv.z));
    }

    #[test]
    fn seeded_sets_cover_the_domain(count in 0u32..2000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let set = ParticleSet::seed(count, &mut rng);
        prop_assert_eq!(set.len(), count);
        prop_assert_eq!(set.byte_len(), count as u64 * 8);
        prop_assert_eq!(set.position_bytes().len() as u64, set.byte_len());
        prop_assert_eq!(set.velocity_bytes().len() as u64, set.byte_len());
        for p in set.positions() {
            prop_assert!((-1.0..1.0).contains(&p.x) && (-1.0..1.0).contains(&p.y));
        }
        prop_assert!(set.velocities().iter().all(|v| *v == Vec2::ZERO));
    }
}

#[test]
fn resting_particles_stay_put() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut set = ParticleSet::seed(256, &mut rng);
    let before = set.positions().to_vec();
    for _ in 0..100 {
        set.step(&idle_controls());
    }
    assert_eq!(set.positions(), &before[..]);
}

#[test]
fn released_attractor_coasts_to_rest() {
    let controls = ControlState {
        accel_enabled: true,
        ..idle_controls()
    };
    let (mut p, mut v) = (Vec2::new(-0.5, 0.25), Vec2::ZERO);
    for _ in 0..10 {
        (p, v) = advance(p, v, &controls);
    }
    let moving = v.length();
    assert!(moving > 0.0);

    for _ in 0..2000 {
        (p, v) = advance(p, v, &idle_controls());
    }
    assert!(v.length() < moving * 1e-6);
    assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0);
}
