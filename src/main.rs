use anyhow::{bail, Context, Result};
use itertools::Itertools;
use pso_topology::{ObjectiveKind, Swarm, SwarmSettings, TopologyKind};
use rayon::prelude::*;
use std::time::Instant;

const USAGE: &str = "usage: pso-topology <num_particles> <rok|ras|ack> <gl|ri|vn|ra> [trials] [seed]\n       pso-topology --settings <file.json> [trials]";

fn parse_args(args: &[String]) -> Result<(SwarmSettings, usize)> {
    if args.first().map(String::as_str) == Some("--settings") {
        let path = args.get(1).context(USAGE)?;
        let settings = SwarmSettings::from_json_file(path)?;
        let trials: Option<usize> = args.get(2).map(|t| t.parse()).transpose().context(USAGE)?;
        return Ok((settings, trials.unwrap_or(1)));
    }
    if args.len() < 3 {
        bail!(USAGE);
    }
    let num_particles: usize = args[0].parse().context(USAGE)?;
    let objective: ObjectiveKind = args[1].parse()?;
    let topology: TopologyKind = args[2].parse()?;
    let trials: Option<usize> = args.get(3).map(|t| t.parse()).transpose().context(USAGE)?;
    let seed: Option<u64> = args.get(4).map(|s| s.parse()).transpose().context(USAGE)?;
    let mut settings = SwarmSettings::new(num_particles, objective, topology);
    settings.seed = seed;
    Ok((settings, trials.unwrap_or(1)))
}

pub fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (settings, trials) = parse_args(&args)?;
    settings.validate()?;

    let start = Instant::now();
    let reports = (0..trials)
        .into_par_iter()
        .map(|i| {
            let mut settings = settings.clone();
            settings.seed = settings.seed.map(|s| s.wrapping_add(i as u64));
            Swarm::new(settings)?.with_progress(trials == 1).run()
        })
        .collect::<Result<Vec<_>>>()?;

    for report in &reports {
        let values = report
            .values()
            .iter()
            .map(|v| format!("{:.6e}", v))
            .join(", ");
        if report.diverged {
            println!("[{}] diverged", values);
        } else {
            println!("[{}]", values);
        }
    }
    println!("Time: {:?}", start.elapsed());
    Ok(())
}
