//! Benchmark objective functions.
//!
//! All three functions are minimized and have a global minimum of `0`.

use crate::bounds::InitRange;
use anyhow::{bail, Result};
use enum_dispatch::enum_dispatch;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

/// A pure function from a position to its fitness (lower is better).
#[enum_dispatch]
pub trait Objective: Send + Sync {
    /// Evaluate the function at `x`
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Range used to draw the initial positions and velocities
    fn init_range(&self) -> InitRange;

    /// Coordinate value at which every dimension attains the global minimum
    fn optimum_coordinate(&self) -> f64 {
        0.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Rosenbrock;

impl Objective for Rosenbrock {
    fn evaluate(&self, x: &[f64]) -> f64 {
        x.windows(2)
            .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (w[0] - 1.0).powi(2))
            .sum()
    }

    fn init_range(&self) -> InitRange {
        InitRange::new((15.0, 30.0), (-2.0, 2.0))
    }

    fn optimum_coordinate(&self) -> f64 {
        1.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Rastrigin;

impl Objective for Rastrigin {
    fn evaluate(&self, x: &[f64]) -> f64 {
        x.iter()
            .map(|&xi| xi * xi - 10.0 * (2.0 * PI * xi).cos() + 10.0)
            .sum()
    }

    fn init_range(&self) -> InitRange {
        InitRange::new((16.0, 32.0), (-2.0, 4.0))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Ackley;

impl Objective for Ackley {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let n = x.len() as f64;
        let (square_sum, cos_sum) = x.iter().fold((0.0, 0.0), |(s, c), &xi| {
            (s + xi * xi, c + (2.0 * PI * xi).cos())
        });
        -20.0 * (-0.2 * (square_sum / n).sqrt()).exp() - (cos_sum / n).exp() + 20.0 + E
    }

    fn init_range(&self) -> InitRange {
        InitRange::new((2.56, 5.12), (-2.0, 4.0))
    }
}

#[enum_dispatch(Objective)]
#[derive(Clone, Copy, Debug)]
pub enum ObjectiveFunction {
    Rosenbrock,
    Rastrigin,
    Ackley,
}

/// Name of a benchmark function, as used in settings and on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Rosenbrock,
    Rastrigin,
    Ackley,
}

impl ObjectiveKind {
    pub fn function(self) -> ObjectiveFunction {
        match self {
            ObjectiveKind::Rosenbrock => Rosenbrock.into(),
            ObjectiveKind::Rastrigin => Rastrigin.into(),
            ObjectiveKind::Ackley => Ackley.into(),
        }
    }
}

impl FromStr for ObjectiveKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rosenbrock" | "rok" => Ok(ObjectiveKind::Rosenbrock),
            "rastrigin" | "ras" => Ok(ObjectiveKind::Rastrigin),
            "ackley" | "ack" => Ok(ObjectiveKind::Ackley),
            _ => bail!("Unknown objective function: {}", s),
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectiveKind::Rosenbrock => "rosenbrock",
            ObjectiveKind::Rastrigin => "rastrigin",
            ObjectiveKind::Ackley => "ackley",
        };
        f.write_str(name)
    }
}

/// Cost function used by the swarm solver
pub struct BenchmarkCost<const N: usize> {
    function: ObjectiveFunction,
    parallelize: bool,
}

impl<const N: usize> BenchmarkCost<N> {
    pub fn new(function: ObjectiveFunction, parallelize: bool) -> Self {
        Self {
            function,
            parallelize,
        }
    }
}

impl<const N: usize> argmin::core::CostFunction for BenchmarkCost<N> {
    type Param = na::SVector<f64, N>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output> {
        Ok(self.function.evaluate(param.as_slice()))
    }

    fn parallelize(&self) -> bool {
        self.parallelize
    }
}
