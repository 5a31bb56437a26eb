use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pso_topology::objective::{Ackley, Rastrigin, Rosenbrock};
use pso_topology::topology::{RandomNeighborhood, RerollPolicy, VonNeumann};
use pso_topology::{
    NeighborhoodTopology, Objective, ObjectiveKind, Swarm, SwarmSettings, TopologyKind, DIMENSIONS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn benchmark(c: &mut Criterion) {
    let x = [3.0; DIMENSIONS];
    c.bench_function("rosenbrock", |b| b.iter(|| Rosenbrock.evaluate(black_box(&x))));
    c.bench_function("rastrigin", |b| b.iter(|| Rastrigin.evaluate(black_box(&x))));
    c.bench_function("ackley", |b| b.iter(|| Ackley.evaluate(black_box(&x))));

    c.bench_function("grid topology", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| VonNeumann::default().neighborhoods(black_box(49), &mut rng).unwrap())
    });
    c.bench_function("random topology strict", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        let topology = RandomNeighborhood {
            policy: RerollPolicy::Strict,
            ..Default::default()
        };
        b.iter(|| topology.neighborhoods(black_box(49), &mut rng).unwrap())
    });

    let mut settings = SwarmSettings::new(30, ObjectiveKind::Rastrigin, TopologyKind::Ring).with_seed(1);
    settings.iterations = 100;
    settings.checkpoint_interval = 10;
    let swarm = Swarm::new(settings).unwrap();
    c.bench_function("100 iterations", |b| b.iter(|| swarm.run().unwrap()));
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
