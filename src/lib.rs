pub mod bounds;
pub mod objective;
pub mod particle;
pub mod particleswarm;
pub mod swarm;
pub mod topology;

#[cfg(feature = "python")]
mod python;

pub use objective::{Objective, ObjectiveFunction, ObjectiveKind};
pub use particle::{Coefficients, Particle};
pub use particleswarm::{Checkpoint, ParticleSwarm};
pub use swarm::{run_swarm, run_swarm_seeded, Swarm, SwarmReport, SwarmSettings, DIMENSIONS};
pub use topology::{NeighborhoodTopology, RerollPolicy, Topology, TopologyKind};
