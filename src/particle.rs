use crate::bounds::PSOBounds;
use crate::objective::Objective;
use anyhow::Result;
use argmin::{argmin_error, argmin_error_closure};
use nalgebra as na;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Acceleration and damping coefficients of the velocity update
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// Personal best acceleration coefficient (phi 1)
    pub cognitive: f64,
    /// Neighborhood best acceleration coefficient (phi 2)
    pub social: f64,
    /// Constriction factor applied to the whole velocity
    pub constriction: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            cognitive: 2.05,
            social: 2.05,
            constriction: 0.7298,
        }
    }
}

/// A single particle
#[derive(Clone, Debug, PartialEq)]
pub struct Particle<const N: usize> {
    /// Position of particle
    pub position: na::SVector<f64, N>,
    /// Velocity of particle
    pub velocity: na::SVector<f64, N>,
    /// Cost at the current position, infinite before the first evaluation
    pub cost: f64,
    /// Best position of particle so far
    pub best_position: na::SVector<f64, N>,
    /// Best cost of particle so far
    pub best_cost: f64,
    /// Indices of the particles in this particle's neighborhood, itself included
    pub neighbors: Vec<usize>,
}

impl<const N: usize> Particle<N> {
    /// Draws position, velocity and personal best position independently from the
    /// initialization range. The personal best position is not the initial position;
    /// it only becomes meaningful after the first improvement.
    pub fn initialize(bounds: &impl PSOBounds<N>, rng: &mut impl Rng) -> Self {
        let position = bounds.random_position(rng);
        let best_position = bounds.random_position(rng);
        let velocity = bounds.random_velocity(rng);
        Self {
            position,
            velocity,
            cost: f64::INFINITY,
            best_position,
            best_cost: f64::INFINITY,
            neighbors: Vec::new(),
        }
    }

    /// Whether particle `index` is in this particle's neighborhood.
    pub fn contains_neighbor(&self, index: usize) -> bool {
        self.neighbors.contains(&index)
    }

    /// The neighbor with the lowest personal best. Ties go to the first one listed.
    pub fn neighborhood_best<'a>(&self, swarm: &'a [Particle<N>]) -> Result<&'a Particle<N>> {
        let mut best: Option<&Particle<N>> = None;
        for &i in &self.neighbors {
            let neighbor = swarm.get(i).ok_or_else(argmin_error_closure!(
                PotentialBug,
                "`Particle`: neighbor index out of range."
            ))?;
            match best {
                Some(b) if neighbor.best_cost >= b.best_cost => {}
                _ => best = Some(neighbor),
            }
        }
        best.ok_or_else(argmin_error_closure!(
            PotentialBug,
            "`Particle`: neighborhood is empty."
        ))
    }

    /// Personal best value of the neighborhood best.
    pub fn neighborhood_best_value(&self, swarm: &[Particle<N>]) -> Result<f64> {
        Ok(self.neighborhood_best(swarm)?.best_cost)
    }

    /// Position of the neighborhood best if it beats this particle's own best.
    pub fn guide(&self, swarm: &[Particle<N>]) -> Result<Option<na::SVector<f64, N>>> {
        let nbest = self.neighborhood_best(swarm)?;
        Ok((nbest.best_cost < self.best_cost).then_some(nbest.best_position))
    }

    /// Moves the particle one step. Two random numbers are drawn per dimension even
    /// when there is no guide, so the random stream does not depend on the swarm state.
    pub fn step(
        &mut self,
        guide: Option<&na::SVector<f64, N>>,
        coefficients: &Coefficients,
        rng: &mut impl Rng,
    ) {
        for d in 0..N {
            let r1: f64 = rng.gen();
            let pull_to_best =
                (self.best_position[d] - self.position[d]) * r1 * coefficients.cognitive;

            let r2: f64 = rng.gen();
            let pull_to_neighborhood = match guide {
                Some(g) => (g[d] - self.position[d]) * r2 * coefficients.social,
                None => 0.0,
            };

            self.velocity[d] =
                (self.velocity[d] + pull_to_best + pull_to_neighborhood) * coefficients.constriction;
            self.position[d] += self.velocity[d];
        }
    }

    /// Stores the cost of the current position and updates the personal best on
    /// strict improvement.
    pub fn record(&mut self, cost: f64) {
        self.cost = cost;
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_position = self.position;
        }
    }

    /// One full optimization step: move, evaluate, update the personal best.
    pub fn update(
        &mut self,
        guide: Option<&na::SVector<f64, N>>,
        coefficients: &Coefficients,
        objective: &impl Objective,
        rng: &mut impl Rng,
    ) -> f64 {
        self.step(guide, coefficients, rng);
        let cost = objective.evaluate(self.position.as_slice());
        self.record(cost);
        cost
    }
}

/// Rejects coefficients that would make the update meaningless.
pub(crate) fn check_coefficients(coefficients: &Coefficients) -> Result<()> {
    for (name, value) in [
        ("cognitive", coefficients.cognitive),
        ("social", coefficients.social),
        ("constriction", coefficients.constriction),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(argmin_error!(
                InvalidParameter,
                format!("`Particle`: {} coefficient must be finite and >=0, got {}.", name, value)
            ));
        }
    }
    Ok(())
}
