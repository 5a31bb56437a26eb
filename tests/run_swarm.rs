use pso_topology::{
    run_swarm, run_swarm_seeded, ObjectiveKind, Swarm, SwarmSettings, TopologyKind,
};

#[test]
fn rastrigin_on_grid_of_sixteen() {
    let values = run_swarm(16, ObjectiveKind::Rastrigin, TopologyKind::Grid { shape: None })
        .unwrap();
    assert_eq!(values.len(), 10);
    assert!(values.iter().all(|&v| v >= -1e-9));
    for pair in values.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
}

#[test]
fn rosenbrock_on_global_of_twenty() {
    let settings =
        SwarmSettings::new(20, ObjectiveKind::Rosenbrock, TopologyKind::Global).with_seed(20);
    let report = Swarm::new(settings).unwrap().run().unwrap();
    let values = report.values();
    assert_eq!(values.len(), 10);
    assert!(report.diverged || values.iter().all(|v| v.is_finite()));
    assert_eq!(report.checkpoints.last().unwrap().iteration, 10_000);
}

#[test]
fn seeded_runs_reproduce() {
    let a = run_swarm_seeded(30, ObjectiveKind::Ackley, TopologyKind::Ring, 7).unwrap();
    let b = run_swarm_seeded(30, ObjectiveKind::Ackley, TopologyKind::Ring, 7).unwrap();
    assert_eq!(a, b);
}

#[test]
fn unfactorable_grid_fails_before_running() {
    let result = run_swarm(23, ObjectiveKind::Ackley, TopologyKind::Grid { shape: None });
    assert!(result.is_err());
    let result = run_swarm(0, ObjectiveKind::Ackley, TopologyKind::Ring);
    assert!(result.is_err());
}

#[test]
fn every_topology_improves_on_ackley() {
    for name in ["gl", "ri", "vn", "ra", "random-strict"] {
        let topology: TopologyKind = name.parse().unwrap();
        let mut settings = SwarmSettings::new(16, ObjectiveKind::Ackley, topology).with_seed(1);
        settings.iterations = 2_000;
        settings.checkpoint_interval = 500;
        let report = Swarm::new(settings).unwrap().run().unwrap();
        let values = report.values();
        assert_eq!(values.len(), 4, "{}", name);
        assert!(values[3] <= values[0], "{}", name);
        assert!(values.iter().all(|&v| v >= 0.0 || v.abs() < 1e-9), "{}", name);
    }
}
