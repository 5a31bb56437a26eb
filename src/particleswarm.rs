// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Particle Swarm Optimization (PSO) with neighborhood topologies
//!
//! Constricted PSO in which every particle is pulled towards its own best position
//! and towards the best position found in its neighborhood \[0\]. Which particles
//! form a neighborhood is decided once by a [`Topology`].
//!
//! Positions and velocities are not bounded after initialization.
//!
//! ## References
//!
//! \[0\] Clerc, M. and Kennedy, J. (2002): The particle swarm - explosion, stability, and
//! convergence in a multidimensional complex space. IEEE Transactions on Evolutionary
//! Computation 6(1). <https://doi.org/10.1109/4235.985692>
//!
//! \[1\] <https://en.wikipedia.org/wiki/Particle_swarm_optimization>

use crate::bounds::InitRange;
use crate::particle::{check_coefficients, Coefficients, Particle};
use crate::topology::{self, Topology};
use anyhow::Result;
use argmin::{
    argmin_error, argmin_error_closure,
    core::{CostFunction, Error, PopulationState, Problem, Solver, State, SyncAlias, KV},
};
use nalgebra as na;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Best neighborhood value of the whole swarm after `iteration` iterations
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub iteration: u64,
    pub value: f64,
}

pub struct ParticleSwarm<const N: usize> {
    /// Range of the random initial positions and velocities
    bounds: InitRange,
    /// How the particles are connected
    topology: Topology,
    /// Number of particles
    num_particles: usize,
    /// Velocity update coefficients
    coefficients: Coefficients,
    /// Number of iterations between checkpoints
    checkpoint_interval: u64,
    /// Recorded checkpoints
    history: Vec<Checkpoint>,
    /// Random number generator
    rng_generator: StdRng,
}

impl<const N: usize> ParticleSwarm<N> {
    pub fn new(bounds: InitRange, topology: Topology, num_particles: usize) -> Self {
        ParticleSwarm {
            bounds,
            topology,
            num_particles,
            coefficients: Coefficients::default(),
            checkpoint_interval: 1000,
            history: Vec::new(),
            rng_generator: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_generator = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_coefficients(mut self, coefficients: Coefficients) -> Result<Self, Error> {
        check_coefficients(&coefficients)?;
        self.coefficients = coefficients;
        Ok(self)
    }

    pub fn with_checkpoint_interval(mut self, interval: u64) -> Result<Self, Error> {
        if interval == 0 {
            return Err(argmin_error!(
                InvalidParameter,
                "`ParticleSwarm`: checkpoint interval must be >0."
            ));
        }
        self.checkpoint_interval = interval;
        Ok(self)
    }

    pub fn history(&self) -> &[Checkpoint] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Checkpoint> {
        self.history
    }

    /// Creates all particles and connects them according to the topology
    fn initialize_particles(&mut self) -> Result<Vec<Particle<N>>, Error> {
        let mut particles = (0..self.num_particles)
            .map(|_| Particle::initialize(&self.bounds, &mut self.rng_generator))
            .collect::<Vec<_>>();
        topology::wire(&mut particles, &self.topology, &mut self.rng_generator)?;
        Ok(particles)
    }
}

fn best_particle<const N: usize>(particles: &[Particle<N>]) -> Result<&Particle<N>, Error> {
    particles
        .iter()
        .min_by(|a, b| {
            a.best_cost
                .partial_cmp(&b.best_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(argmin_error_closure!(
            PotentialBug,
            "`ParticleSwarm`: swarm is empty."
        ))
}

/// Minimum over all particles of their neighborhood best value
pub fn swarm_best_value<const N: usize>(particles: &[Particle<N>]) -> Result<f64, Error> {
    particles
        .iter()
        .map(|p| p.neighborhood_best_value(particles))
        .try_fold(f64::INFINITY, |min, value| Ok::<_, Error>(min.min(value?)))
}

impl<const N: usize, O> Solver<O, PopulationState<Particle<N>, f64>> for ParticleSwarm<N>
where
    O: CostFunction<Param = na::SVector<f64, N>, Output = f64> + SyncAlias,
{
    const NAME: &'static str = "ParticleSwarm";

    fn init(
        &mut self,
        _problem: &mut Problem<O>,
        mut state: PopulationState<Particle<N>, f64>,
    ) -> Result<(PopulationState<Particle<N>, f64>, Option<KV>), Error> {
        // Users can provide a population or it will be randomly created.
        let particles = match state.take_population() {
            Some(mut particles) if particles.len() == self.num_particles => {
                if particles.iter().any(|p| p.neighbors.is_empty()) {
                    topology::wire(&mut particles, &self.topology, &mut self.rng_generator)?;
                }
                particles
            }
            Some(particles) => {
                return Err(argmin_error!(
                    InvalidParameter,
                    format!(
                        "`ParticleSwarm`: Provided list of particles is of length {}, expected {}",
                        particles.len(),
                        self.num_particles
                    )
                ))
            }
            None => self.initialize_particles()?,
        };
        self.history.clear();

        let best = best_particle(&particles)?.clone();
        let cost = best.best_cost;
        Ok((state.individual(best).cost(cost).population(particles), None))
    }

    /// Perform one iteration of algorithm
    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        mut state: PopulationState<Particle<N>, f64>,
    ) -> Result<(PopulationState<Particle<N>, f64>, Option<KV>), Error> {
        let mut particles = state.take_population().ok_or_else(argmin_error_closure!(
            PotentialBug,
            "`ParticleSwarm`: No population in state."
        ))?;

        // Guides only see personal bests settled in previous iterations.
        let guides = particles
            .iter()
            .map(|p| p.guide(&particles))
            .collect::<Result<Vec<_>>>()?;

        for (particle, guide) in particles.iter_mut().zip(&guides) {
            particle.step(guide.as_ref(), &self.coefficients, &mut self.rng_generator);
        }

        let positions: Vec<na::SVector<f64, N>> = particles.iter().map(|p| p.position).collect();
        let costs = problem.bulk_cost(&positions)?;
        for (p, c) in particles.iter_mut().zip(costs) {
            p.record(c);
        }

        let iteration = state.get_iter() + 1;
        if iteration % self.checkpoint_interval == 0 {
            let value = swarm_best_value(&particles)?;
            self.history.push(Checkpoint { iteration, value });
        }

        let best = best_particle(&particles)?.clone();
        let cost = best.best_cost;
        Ok((state.individual(best).cost(cost).population(particles), None))
    }
}
