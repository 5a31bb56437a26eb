use crate::objective::ObjectiveKind;
use crate::swarm::{Swarm, SwarmReport, SwarmSettings};
use crate::topology::TopologyKind;
use anyhow::Result;
use indicatif::ProgressBar;
use pyo3::prelude::*;
use rayon::prelude::*;

/// Output of a swarm run.
#[derive(Clone, Debug)]
#[pyclass(module = "pso_topology", frozen)]
pub struct PySwarmReport {
    /// Best value found at every checkpoint
    #[pyo3(get)]
    pub checkpoints: Vec<f64>,
    #[pyo3(get)]
    pub best_value: f64,
    #[pyo3(get)]
    pub best_position: Vec<f64>,
    /// Number of iterations used
    #[pyo3(get)]
    pub iterations: u64,
    /// True if a checkpoint value is NaN or infinite
    #[pyo3(get)]
    pub diverged: bool,
    /// Time taken
    #[pyo3(get)]
    pub time: f64,
}

/// Rust to Python bindings.
impl From<SwarmReport> for PySwarmReport {
    fn from(report: SwarmReport) -> Self {
        PySwarmReport {
            checkpoints: report.values(),
            best_value: report.best_value,
            best_position: report.best_position,
            iterations: report.iterations,
            diverged: report.diverged,
            time: report.time,
        }
    }
}

fn settings(
    num_particles: usize,
    objective: &str,
    topology: &str,
    iterations: Option<u64>,
) -> Result<SwarmSettings> {
    let objective: ObjectiveKind = objective.parse()?;
    let topology: TopologyKind = topology.parse()?;
    let mut settings = SwarmSettings::new(num_particles, objective, topology);
    if let Some(iterations) = iterations {
        settings.iterations = iterations;
    }
    Ok(settings)
}

/// Run one swarm.
/// objective: "rosenbrock", "rastrigin" or "ackley".
/// topology: "global", "ring", "grid", "random" or "random-strict".
#[pyfunction]
#[pyo3(signature = (num_particles, objective, topology, seed=None, iterations=None))]
pub fn run_swarm(
    py: Python<'_>,
    num_particles: usize,
    objective: String,
    topology: String,
    seed: Option<u64>,
    iterations: Option<u64>,
) -> Result<PySwarmReport> {
    let mut settings = settings(num_particles, &objective, &topology, iterations)?;
    settings.seed = seed;
    let swarm = Swarm::new(settings)?;
    py.allow_threads(|| Ok::<_, anyhow::Error>(swarm.run()?.into()))
}

/// Run one swarm per seed using multithreading.
#[pyfunction]
#[pyo3(signature = (num_particles, objective, topology, seeds, iterations=None, progress=None))]
pub fn run_swarm_bulk(
    py: Python<'_>,
    num_particles: usize,
    objective: String,
    topology: String,
    seeds: Vec<u64>,
    iterations: Option<u64>,
    progress: Option<bool>,
) -> Result<Vec<PySwarmReport>> {
    let base = settings(num_particles, &objective, &topology, iterations)?;
    base.validate()?;
    let progress_bar = if progress.unwrap_or(false) {
        ProgressBar::new(seeds.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    py.allow_threads(|| {
        seeds
            .into_par_iter()
            .map(|seed| {
                let report = Swarm::new(base.clone().with_seed(seed))?.run()?;
                progress_bar.inc(1);
                Ok::<PySwarmReport, anyhow::Error>(report.into())
            })
            .collect::<Result<Vec<_>>>()
    })
}

#[pymodule]
fn pso_topology(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySwarmReport>()?;
    m.add_function(wrap_pyfunction!(run_swarm, m)?)?;
    m.add_function(wrap_pyfunction!(run_swarm_bulk, m)?)?;
    Ok(())
}
