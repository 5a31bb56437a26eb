use argmin_math::ArgminRandom;
use nalgebra as na;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Limits used to draw random vectors when a particle is created.
/// Nothing constrains the particles after initialization.
pub trait PSOBounds<const N: usize> {
    fn position_limits(&self) -> (na::SVector<f64, N>, na::SVector<f64, N>);
    fn velocity_limits(&self) -> (na::SVector<f64, N>, na::SVector<f64, N>);

    fn random_position(&self, rng: &mut impl Rng) -> na::SVector<f64, N> {
        let (min, max) = self.position_limits();
        na::SVector::rand_from_range(&min, &max, rng)
    }

    fn random_velocity(&self, rng: &mut impl Rng) -> na::SVector<f64, N> {
        let (min, max) = self.velocity_limits();
        na::SVector::rand_from_range(&min, &max, rng)
    }
}

/// Per-coordinate initialization range, identical for every dimension
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitRange {
    pub position: (f64, f64),
    pub velocity: (f64, f64),
}

impl InitRange {
    pub fn new(position: (f64, f64), velocity: (f64, f64)) -> Self {
        Self { position, velocity }
    }
}

impl<const N: usize> PSOBounds<N> for InitRange {
    fn position_limits(&self) -> (na::SVector<f64, N>, na::SVector<f64, N>) {
        (
            na::SVector::repeat(self.position.0),
            na::SVector::repeat(self.position.1),
        )
    }

    fn velocity_limits(&self) -> (na::SVector<f64, N>, na::SVector<f64, N>) {
        (
            na::SVector::repeat(self.velocity.0),
            na::SVector::repeat(self.velocity.1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_vectors_stay_in_range() {
        let range = InitRange::new((2.56, 5.12), (-2.0, 4.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let x: na::SVector<f64, 30> = range.random_position(&mut rng);
            let v: na::SVector<f64, 30> = range.random_velocity(&mut rng);
            assert!(x.iter().all(|&c| (2.56..5.12).contains(&c)));
            assert!(v.iter().all(|&c| (-2.0..4.0).contains(&c)));
        }
    }
}
