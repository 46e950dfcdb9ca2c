//! Host-side particle storage.
//!
//! Particles are kept as structure-of-arrays: every position contiguous, every
//! velocity contiguous. That is also the GPU layout, so uploads are a straight
//! byte cast.

use glam::Vec2;
use rand::Rng;

use crate::controls::ControlState;
use crate::kernel;

/// Bytes per particle per buffer (one `vec2<f32>`).
pub const COMPONENT_STRIDE: u64 = std::mem::size_of::<Vec2>() as u64;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSet {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
}

impl ParticleSet {
    /// Fresh set of `count` particles: uniform positions in `[-1, 1)²`, at rest.
    pub fn seed<R: Rng>(count: u32, rng: &mut R) -> Self {
        let positions = (0..count)
            .map(|_| Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        Self {
            positions,
            velocities: vec![Vec2::ZERO; count as usize],
        }
    }

    /// Set built from explicit state.
    ///
    /// # Panics
    ///
    /// If the two slices differ in length.
    pub fn from_parts(positions: Vec<Vec2>, velocities: Vec<Vec2>) -> Self {
        assert_eq!(
            positions.len(),
            velocities.len(),
            "every particle needs a position and a velocity"
        );
        Self {
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn velocity_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.velocities)
    }

    /// Size of one of the four particle buffers for this set.
    pub fn byte_len(&self) -> u64 {
        self.len() as u64 * COMPONENT_STRIDE
    }

    /// Advance every particle one frame on the CPU.
    pub fn step(&mut self, controls: &ControlState) {
        for (position, velocity) in self.positions.iter_mut().zip(&mut self.velocities) {
            (*position, *velocity) = kernel::advance(*position, *velocity, controls);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seed_fills_the_unit_square_at_rest() {
        let mut rng = StdRng::seed_from_u64(11);
        let set = ParticleSet::seed(2_000, &mut rng);

        assert_eq!(set.len(), 2_000);
        assert_eq!(set.byte_len(), 16_000);
        assert_eq!(set.position_bytes().len(), 16_000);
        assert!(set
            .positions()
            .iter()
            .all(|p| p.abs().max_element() <= 1.0));
        assert!(set.velocities().iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    #[should_panic(expected = "position and a velocity")]
    fn mismatched_parts_panic() {
        ParticleSet::from_parts(vec![Vec2::ZERO; 2], vec![Vec2::ZERO]);
    }

    #[test]
    fn empty_set() {
        let mut rng = StdRng::seed_from_u64(12);
        let set = ParticleSet::seed(0, &mut rng);
        assert!(set.is_empty());
        assert_eq!(set.byte_len(), 0);
        assert!(set.velocity_bytes().is_empty());
    }

    #[test]
    fn step_moves_toward_attractor() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut set = ParticleSet::seed(256, &mut rng);
        let controls = ControlState {
            target: Vec2::new(0.0, 0.0),
            accel_enabled: true,
            accel_magnitude: 0.001,
            point_size: 1.0,
        };
        let before: f32 = set.positions().iter().map(|p| p.length()).sum();
        for _ in 0..20 {
            set.step(&controls);
        }
        let after: f32 = set.positions().iter().map(|p| p.length()).sum();
        assert!(after < before);
    }
}
