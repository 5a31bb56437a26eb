//! Neighborhood topologies.
//!
//! A topology is built once, right after the particles are created, and never
//! changes during a run. Every neighborhood contains the particle itself, so the
//! neighborhood best of a particle is always defined.

use crate::particle::Particle;
use anyhow::{bail, ensure, Result};
use enum_dispatch::enum_dispatch;
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[enum_dispatch]
pub trait NeighborhoodTopology {
    /// Neighbor indices for every particle of a swarm of `num_particles`
    fn neighborhoods(&self, num_particles: usize, rng: &mut StdRng) -> Result<Vec<Vec<usize>>>;

    /// Check whether the topology can be built for this swarm size
    fn validate(&self, num_particles: usize) -> Result<()> {
        ensure!(num_particles > 0, "Swarm must contain at least one particle");
        Ok(())
    }
}

fn push_unique(neighbors: &mut Vec<usize>, index: usize) {
    if !neighbors.contains(&index) {
        neighbors.push(index);
    }
}

/// Every particle sees the whole swarm
#[derive(Clone, Copy, Debug, Default)]
pub struct Global;

impl NeighborhoodTopology for Global {
    fn neighborhoods(&self, num_particles: usize, _rng: &mut StdRng) -> Result<Vec<Vec<usize>>> {
        self.validate(num_particles)?;
        Ok(vec![(0..num_particles).collect(); num_particles])
    }
}

/// Previous and next particle in list order, wrapping at both ends
#[derive(Clone, Copy, Debug, Default)]
pub struct Ring;

impl NeighborhoodTopology for Ring {
    fn neighborhoods(&self, num_particles: usize, _rng: &mut StdRng) -> Result<Vec<Vec<usize>>> {
        self.validate(num_particles)?;
        let n = num_particles;
        Ok((0..n)
            .map(|i| {
                let mut neighbors = Vec::with_capacity(3);
                for j in [(i + n - 1) % n, (i + 1) % n, i] {
                    push_unique(&mut neighbors, j);
                }
                neighbors
            })
            .collect())
    }
}

/// Most square `(rows, cols)` factorization with `2 <= rows <= cols`.
/// 16, 30 and 49 particles give 4x4, 5x6 and 7x7.
pub fn grid_shape(num_particles: usize) -> Result<(usize, usize)> {
    let rows = (2..)
        .take_while(|r| r * r <= num_particles)
        .filter(|r| num_particles % r == 0)
        .last();
    match rows {
        Some(rows) => Ok((rows, num_particles / rows)),
        None => bail!(
            "{} particles cannot be arranged in a grid with at least two rows",
            num_particles
        ),
    }
}

/// Von Neumann neighborhood on a toroidal grid filled in row-major order
#[derive(Clone, Copy, Debug, Default)]
pub struct VonNeumann {
    /// Explicit `(rows, cols)`, otherwise derived from the swarm size
    pub shape: Option<(usize, usize)>,
}

impl VonNeumann {
    fn shape_for(&self, num_particles: usize) -> Result<(usize, usize)> {
        match self.shape {
            Some((rows, cols)) => {
                ensure!(
                    rows > 0 && cols > 0 && rows.checked_mul(cols) == Some(num_particles),
                    "Grid of {}x{} does not fit {} particles",
                    rows,
                    cols,
                    num_particles
                );
                Ok((rows, cols))
            }
            None => grid_shape(num_particles),
        }
    }
}

impl NeighborhoodTopology for VonNeumann {
    fn neighborhoods(&self, num_particles: usize, _rng: &mut StdRng) -> Result<Vec<Vec<usize>>> {
        self.validate(num_particles)?;
        let (rows, cols) = self.shape_for(num_particles)?;
        let index = |r: usize, c: usize| r * cols + c;
        Ok(iproduct!(0..rows, 0..cols)
            .map(|(r, c)| {
                let mut neighbors = Vec::with_capacity(5);
                for j in [
                    index((r + rows - 1) % rows, c),
                    index((r + 1) % rows, c),
                    index(r, (c + cols - 1) % cols),
                    index(r, (c + 1) % cols),
                    index(r, c),
                ] {
                    push_unique(&mut neighbors, j);
                }
                neighbors
            })
            .collect())
    }

    fn validate(&self, num_particles: usize) -> Result<()> {
        ensure!(num_particles > 0, "Swarm must contain at least one particle");
        self.shape_for(num_particles).map(|_| ())
    }
}

/// How the random topology treats a rejected candidate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerollPolicy {
    /// Draw one replacement and insert it unchecked. Duplicates can occur.
    #[default]
    Loose,
    /// Keep drawing until a candidate is new and passes the probability draw
    Strict,
}

/// Neighborhoods of a fixed size filled with randomly chosen other particles
#[derive(Clone, Copy, Debug)]
pub struct RandomNeighborhood {
    /// Neighborhood size, the particle itself included
    pub size: usize,
    pub reroll_probability: f64,
    pub policy: RerollPolicy,
}

impl Default for RandomNeighborhood {
    fn default() -> Self {
        Self {
            size: 5,
            reroll_probability: 0.2,
            policy: RerollPolicy::Loose,
        }
    }
}

/// Uniform index in `0..n` other than `i`. Requires `n >= 2`.
fn random_other(i: usize, n: usize, rng: &mut StdRng) -> usize {
    let j = rng.gen_range(0..n - 1);
    if j >= i {
        j + 1
    } else {
        j
    }
}

impl NeighborhoodTopology for RandomNeighborhood {
    fn neighborhoods(&self, num_particles: usize, rng: &mut StdRng) -> Result<Vec<Vec<usize>>> {
        self.validate(num_particles)?;
        let n = num_particles;
        let mut all = Vec::with_capacity(n);
        for i in 0..n {
            let mut neighbors = Vec::with_capacity(self.size);
            neighbors.push(i);
            if n > 1 {
                match self.policy {
                    RerollPolicy::Loose => {
                        while neighbors.len() < self.size {
                            let mut candidate = random_other(i, n, rng);
                            let p: f64 = rng.gen();
                            if neighbors.contains(&candidate) || p < self.reroll_probability {
                                candidate = random_other(i, n, rng);
                            }
                            neighbors.push(candidate);
                        }
                    }
                    RerollPolicy::Strict => {
                        let target = self.size.min(n);
                        while neighbors.len() < target {
                            let candidate = random_other(i, n, rng);
                            let p: f64 = rng.gen();
                            if !neighbors.contains(&candidate) && p >= self.reroll_probability {
                                neighbors.push(candidate);
                            }
                        }
                    }
                }
            }
            all.push(neighbors);
        }
        Ok(all)
    }

    fn validate(&self, num_particles: usize) -> Result<()> {
        ensure!(num_particles > 0, "Swarm must contain at least one particle");
        ensure!(self.size > 0, "Random neighborhood size must be positive");
        ensure!(
            (0.0..1.0).contains(&self.reroll_probability),
            "Re-roll probability must be in [0, 1), got {}",
            self.reroll_probability
        );
        Ok(())
    }
}

#[enum_dispatch(NeighborhoodTopology)]
#[derive(Clone, Copy, Debug)]
pub enum Topology {
    Global,
    Ring,
    VonNeumann,
    RandomNeighborhood,
}

/// Topology selection as it appears in settings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TopologyKind {
    Global,
    Ring,
    Grid {
        #[serde(default)]
        shape: Option<(usize, usize)>,
    },
    Random {
        #[serde(default)]
        policy: RerollPolicy,
    },
}

impl TopologyKind {
    pub fn topology(self) -> Topology {
        match self {
            TopologyKind::Global => Global.into(),
            TopologyKind::Ring => Ring.into(),
            TopologyKind::Grid { shape } => VonNeumann { shape }.into(),
            TopologyKind::Random { policy } => RandomNeighborhood {
                policy,
                ..Default::default()
            }
            .into(),
        }
    }
}

impl FromStr for TopologyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "gl" => Ok(TopologyKind::Global),
            "ring" | "ri" => Ok(TopologyKind::Ring),
            "grid" | "vonneumann" | "vn" => Ok(TopologyKind::Grid { shape: None }),
            "random" | "ra" => Ok(TopologyKind::Random {
                policy: RerollPolicy::Loose,
            }),
            "random-strict" => Ok(TopologyKind::Random {
                policy: RerollPolicy::Strict,
            }),
            _ => bail!("Unknown topology: {}", s),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyKind::Global => f.write_str("global"),
            TopologyKind::Ring => f.write_str("ring"),
            TopologyKind::Grid { shape: None } => f.write_str("grid"),
            TopologyKind::Grid {
                shape: Some((rows, cols)),
            } => write!(f, "grid({}x{})", rows, cols),
            TopologyKind::Random {
                policy: RerollPolicy::Loose,
            } => f.write_str("random"),
            TopologyKind::Random {
                policy: RerollPolicy::Strict,
            } => f.write_str("random-strict"),
        }
    }
}

/// Assigns the neighbor lists of `topology` to the particles. Fails if the topology
/// cannot be built for this many particles.
pub fn wire<const N: usize>(
    particles: &mut [Particle<N>],
    topology: &Topology,
    rng: &mut StdRng,
) -> Result<()> {
    let neighborhoods = topology.neighborhoods(particles.len(), rng)?;
    for (i, (particle, neighbors)) in particles.iter_mut().zip(neighborhoods).enumerate() {
        debug_assert!(neighbors.contains(&i), "neighborhood of {} lacks itself", i);
        particle.neighbors = neighbors;
    }
    Ok(())
}
