use crate::objective::{BenchmarkCost, Objective, ObjectiveKind};
use crate::particle::{check_coefficients, Coefficients, Particle};
use crate::particleswarm::{Checkpoint, ParticleSwarm};
use crate::topology::{NeighborhoodTopology, TopologyKind};
use anyhow::{anyhow, ensure, Context, Result};
use argmin::core::observers::{Observe, ObserverMode};
use argmin::core::{Executor, PopulationState, State, KV};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Dimensionality of the search space
pub const DIMENSIONS: usize = 30;

fn default_iterations() -> u64 {
    10_000
}

fn default_checkpoint_interval() -> u64 {
    1_000
}

/// Everything needed to set up one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwarmSettings {
    pub num_particles: usize,
    pub objective: ObjectiveKind,
    pub topology: TopologyKind,
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,
    #[serde(default)]
    pub coefficients: Coefficients,
    /// Seed of the random number generator, drawn from entropy if absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Evaluate the particles of an iteration on the rayon thread pool
    #[serde(default)]
    pub parallelize: bool,
}

impl SwarmSettings {
    pub fn new(num_particles: usize, objective: ObjectiveKind, topology: TopologyKind) -> Self {
        Self {
            num_particles,
            objective,
            topology,
            iterations: default_iterations(),
            checkpoint_interval: default_checkpoint_interval(),
            coefficients: Coefficients::default(),
            seed: None,
            parallelize: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Error opening {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .context(format!("Error parsing settings from {}", path.display()))
    }

    /// Configuration errors are reported here, before anything runs
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.num_particles > 0,
            "Number of particles must be positive"
        );
        ensure!(
            self.checkpoint_interval > 0,
            "Checkpoint interval must be positive"
        );
        check_coefficients(&self.coefficients)?;
        self.topology
            .topology()
            .validate(self.num_particles)
            .context(format!(
                "Topology {} cannot be built for {} particles",
                self.topology, self.num_particles
            ))
    }
}

/// Outcome of a run
#[derive(Clone, Debug, Serialize)]
pub struct SwarmReport {
    pub settings: SwarmSettings,
    pub checkpoints: Vec<Checkpoint>,
    pub best_value: f64,
    pub best_position: Vec<f64>,
    pub iterations: u64,
    /// Set when a recorded value is NaN or infinite
    pub diverged: bool,
    /// Wall time in seconds
    pub time: f64,
}

impl SwarmReport {
    /// Checkpoint values in order
    pub fn values(&self) -> Vec<f64> {
        self.checkpoints.iter().map(|c| c.value).collect()
    }
}

fn has_diverged(checkpoints: &[Checkpoint], best_value: f64) -> bool {
    !best_value.is_finite() || checkpoints.iter().any(|c| !c.value.is_finite())
}

type SwarmState = PopulationState<Particle<DIMENSIONS>, f64>;

struct ProgressObserver {
    bar: ProgressBar,
}

impl Observe<SwarmState> for ProgressObserver {
    fn observe_iter(&mut self, state: &SwarmState, _kv: &KV) -> Result<()> {
        self.bar.set_message(format!("{:.6e}", state.get_best_cost()));
        self.bar.inc(1);
        Ok(())
    }
}

/// Dumps the state of every particle to `<dir>/<prefix>_<iter>.json` after every
/// `interval`-th sweep, in step with the solver's checkpoints.
struct TraceObserver {
    dir: PathBuf,
    file_prefix: String,
    interval: u64,
}

impl TraceObserver {
    fn new(directory: &Path, file_prefix: &str, interval: u64) -> Self {
        Self {
            dir: directory.to_path_buf(),
            file_prefix: file_prefix.to_string(),
            interval,
        }
    }
}

#[derive(Serialize)]
struct ParticleInfo {
    position: Vec<f64>,
    cost: f64,
    best_cost: f64,
    neighbors: Vec<usize>,
}

impl From<&Particle<DIMENSIONS>> for ParticleInfo {
    fn from(p: &Particle<DIMENSIONS>) -> Self {
        Self {
            position: p.position.iter().copied().collect(),
            cost: p.cost,
            best_cost: p.best_cost,
            neighbors: p.neighbors.clone(),
        }
    }
}

impl Observe<SwarmState> for TraceObserver {
    fn observe_iter(&mut self, state: &SwarmState, _kv: &KV) -> Result<()> {
        // observers run before the executor bumps the counter
        let iter = state.get_iter() + 1;
        if iter % self.interval != 0 {
            return Ok(());
        }
        let particles = state
            .get_population()
            .ok_or(argmin::core::Error::msg("No particles"))?;
        let values: Vec<ParticleInfo> = particles.iter().map(ParticleInfo::from).collect();
        let filename = self.dir.join(format!("{}_{}.json", self.file_prefix, iter));
        let f = BufWriter::new(
            File::create(&filename).context(format!("Error creating {}", filename.display()))?,
        );
        serde_json::to_writer(f, &values)?;
        Ok(())
    }
}

/// A validated swarm configuration, ready to run
pub struct Swarm {
    settings: SwarmSettings,
    progress: bool,
    trace_directory: Option<PathBuf>,
}

impl Swarm {
    pub fn new(settings: SwarmSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            progress: false,
            trace_directory: None,
        })
    }

    /// Show a progress bar on the terminal while running
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Write the particle states at every checkpoint as JSON into `directory`
    pub fn with_trace_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.trace_directory = Some(directory.into());
        self
    }

    pub fn settings(&self) -> &SwarmSettings {
        &self.settings
    }

    pub fn run(&self) -> Result<SwarmReport> {
        let settings = &self.settings;
        let function = settings.objective.function();
        let cost = BenchmarkCost::<DIMENSIONS>::new(function, settings.parallelize);
        let mut solver = ParticleSwarm::<DIMENSIONS>::new(
            function.init_range(),
            settings.topology.topology(),
            settings.num_particles,
        )
        .with_coefficients(settings.coefficients)?
        .with_checkpoint_interval(settings.checkpoint_interval)?;
        if let Some(seed) = settings.seed {
            solver = solver.with_seed(seed);
        }

        let bar = if self.progress {
            ProgressBar::new(settings.iterations)
        } else {
            ProgressBar::hidden()
        };
        let mut executor = Executor::new(cost, solver)
            .configure(|state| state.max_iters(settings.iterations))
            .add_observer(ProgressObserver { bar: bar.clone() }, ObserverMode::Always);
        if let Some(dir) = &self.trace_directory {
            executor = executor.add_observer(
                TraceObserver::new(dir, "iteration", settings.checkpoint_interval),
                ObserverMode::Always,
            );
        }
        let result = executor.run()?;
        bar.finish();

        let iterations = result.state.get_iter();
        let time = match result.state.time {
            Some(t) => t.as_secs_f64(),
            None => 0.0,
        };
        let best = result
            .state
            .best_individual
            .ok_or(anyhow!("No best particle found"))?;
        let checkpoints = result.solver.into_history();
        let diverged = has_diverged(&checkpoints, best.best_cost);

        Ok(SwarmReport {
            settings: settings.clone(),
            checkpoints,
            best_value: best.best_cost,
            best_position: best.best_position.iter().copied().collect(),
            iterations,
            diverged,
            time,
        })
    }
}

/// Runs a swarm with the default schedule (10 000 iterations, a checkpoint
/// every 1 000) and returns the checkpoint values.
pub fn run_swarm(
    num_particles: usize,
    objective: ObjectiveKind,
    topology: TopologyKind,
) -> Result<Vec<f64>> {
    let settings = SwarmSettings::new(num_particles, objective, topology);
    Ok(Swarm::new(settings)?.run()?.values())
}

/// Same as [`run_swarm`] with a fixed seed
pub fn run_swarm_seeded(
    num_particles: usize,
    objective: ObjectiveKind,
    topology: TopologyKind,
    seed: u64,
) -> Result<Vec<f64>> {
    let settings = SwarmSettings::new(num_particles, objective, topology).with_seed(seed);
    Ok(Swarm::new(settings)?.run()?.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::RerollPolicy;

    fn short(objective: ObjectiveKind, topology: TopologyKind) -> SwarmSettings {
        let mut settings = SwarmSettings::new(16, objective, topology).with_seed(3);
        settings.iterations = 200;
        settings.checkpoint_interval = 20;
        settings
    }

    #[test]
    fn rejects_bad_configuration() {
        let grid = TopologyKind::Grid { shape: None };
        assert!(Swarm::new(SwarmSettings::new(0, ObjectiveKind::Ackley, TopologyKind::Ring)).is_err());
        assert!(Swarm::new(SwarmSettings::new(17, ObjectiveKind::Ackley, grid)).is_err());
        assert!(Swarm::new(SwarmSettings::new(16, ObjectiveKind::Ackley, grid)).is_ok());
        let explicit = TopologyKind::Grid { shape: Some((2, 9)) };
        assert!(Swarm::new(SwarmSettings::new(17, ObjectiveKind::Ackley, explicit)).is_err());

        let mut settings = SwarmSettings::new(10, ObjectiveKind::Ackley, TopologyKind::Global);
        settings.coefficients.constriction = -0.5;
        assert!(Swarm::new(settings.clone()).is_err());
        settings.coefficients = Coefficients::default();
        settings.checkpoint_interval = 0;
        assert!(Swarm::new(settings).is_err());
    }

    #[test]
    fn report_has_one_value_per_checkpoint() {
        let report = Swarm::new(short(ObjectiveKind::Ackley, TopologyKind::Ring))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.checkpoints.len(), 10);
        assert_eq!(report.iterations, 200);
        assert_eq!(report.best_position.len(), DIMENSIONS);
        assert!(!report.diverged);
        let last = report.values().last().copied().unwrap();
        assert_eq!(last, report.best_value);
    }

    #[test]
    fn seeded_runs_are_identical() {
        let topology = TopologyKind::Random {
            policy: RerollPolicy::Strict,
        };
        let a = Swarm::new(short(ObjectiveKind::Rastrigin, topology)).unwrap().run().unwrap();
        let b = Swarm::new(short(ObjectiveKind::Rastrigin, topology)).unwrap().run().unwrap();
        assert_eq!(a.values(), b.values());
        assert_eq!(a.best_position, b.best_position);
    }

    #[test]
    fn divergence_is_flagged() {
        let finite = [Checkpoint {
            iteration: 1,
            value: 1.0,
        }];
        assert!(!has_diverged(&finite, 1.0));
        assert!(has_diverged(&finite, f64::INFINITY));
        let nan = [Checkpoint {
            iteration: 1,
            value: f64::NAN,
        }];
        assert!(has_diverged(&nan, 0.0));
    }

    #[test]
    fn settings_from_json_use_defaults() {
        let settings: SwarmSettings = serde_json::from_str(
            r#"{"num_particles": 30, "objective": "ackley", "topology": {"kind": "grid"}}"#,
        )
        .unwrap();
        assert_eq!(settings.iterations, 10_000);
        assert_eq!(settings.checkpoint_interval, 1_000);
        assert_eq!(settings.coefficients, Coefficients::default());
        assert_eq!(settings.seed, None);
        assert!(settings.validate().is_ok());
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(serde_json::from_str::<SwarmSettings>(&json).unwrap(), settings);
    }

    #[test]
    fn settings_file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("pso-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        let settings = short(ObjectiveKind::Rosenbrock, TopologyKind::Global);
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();
        assert_eq!(SwarmSettings::from_json_file(&path).unwrap(), settings);
        assert!(SwarmSettings::from_json_file(dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn trace_files_are_written() {
        let dir = std::env::temp_dir().join(format!("pso-trace-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut settings = short(ObjectiveKind::Ackley, TopologyKind::Grid { shape: None });
        settings.iterations = 40;
        settings.checkpoint_interval = 20;
        let report = Swarm::new(settings)
            .unwrap()
            .with_trace_directory(&dir)
            .run()
            .unwrap();
        let mut written: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        let expected: Vec<String> = report
            .checkpoints
            .iter()
            .map(|c| format!("iteration_{}.json", c.iteration))
            .collect();
        assert_eq!(expected, ["iteration_20.json", "iteration_40.json"]);
        assert_eq!(written, expected);

        let last: Vec<serde_json::Value> = serde_json::from_reader(
            std::fs::File::open(dir.join("iteration_40.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(last.len(), report.settings.num_particles);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
