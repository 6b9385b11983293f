//! Configuration of [`Lspi`](crate::Lspi).
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use crate::error::{LspiError, Result};
use crate::lstdq::PolicyImprover;
use crate::solver::{BiCgStab, IterationMonitor, IterativeSolver, SteepestDescent};

/// Iterative solver used by the sparse evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// Steepest descent; needs `A + A^T` positive definite.
    SteepestDescent,
    /// BiCGSTAB with a growing iteration budget.
    #[default]
    BiCgStab,
}

/// Configuration of the sparse iterative solve.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,

    /// Stopping tolerance. Step infinity norm for steepest descent,
    /// relative residual for BiCGSTAB.
    pub tolerance: f64,

    /// Hard cap on solver iterations.
    pub max_iterations: usize,

    /// First BiCGSTAB iteration budget.
    pub initial_iterations: usize,

    /// Budget multiplier after an unconverged BiCGSTAB attempt.
    pub growth_factor: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            tolerance: 1e-8,
            max_iterations: 10_000,
            initial_iterations: 100,
            growth_factor: 2,
        }
    }
}

impl SolverConfig {
    /// Sets the solver kind.
    pub fn kind(mut self, v: SolverKind) -> Self {
        self.kind = v;
        self
    }

    /// Sets the stopping tolerance.
    pub fn tolerance(mut self, v: f64) -> Self {
        self.tolerance = v;
        self
    }

    /// Sets the iteration cap.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the budget multiplier between BiCGSTAB attempts.
    pub fn growth_factor(mut self, v: usize) -> Self {
        self.growth_factor = v;
        self
    }

    /// Builds the configured solver.
    pub fn build(&self) -> Result<Box<dyn IterativeSolver>> {
        let solver: Box<dyn IterativeSolver> = match self.kind {
            SolverKind::SteepestDescent => {
                Box::new(SteepestDescent::new(self.tolerance, self.max_iterations)?)
            }
            SolverKind::BiCgStab => {
                let monitor = IterationMonitor {
                    tolerance: self.tolerance,
                    initial_iterations: self.initial_iterations,
                    max_iterations: self.max_iterations,
                    growth_factor: self.growth_factor,
                };
                Box::new(BiCgStab::new(monitor)?)
            }
        };
        Ok(solver)
    }
}

/// Configuration of a policy-iteration run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct LspiConfig {
    /// Discount factor.
    pub gamma: f64,

    /// Stop once the infinity norm of the weight change is at most this.
    pub epsilon: f64,

    /// Maximum number of policy-iteration steps.
    pub max_iterations: usize,

    /// Policy evaluation variant.
    pub improver: PolicyImprover,

    /// Solver for the sparse evaluators.
    pub solver: SolverConfig,
}

impl Default for LspiConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            epsilon: 1e-5,
            max_iterations: 10,
            improver: PolicyImprover::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl LspiConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the convergence tolerance on the weight change.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the maximum number of policy-iteration steps.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the policy evaluation variant.
    pub fn improver(mut self, v: PolicyImprover) -> Self {
        self.improver = v;
        self
    }

    /// Sets the solver configuration.
    pub fn solver(mut self, v: SolverConfig) -> Self {
        self.solver = v;
        self
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(LspiError::invalid("gamma must be between 0 and 1"));
        }
        if !(self.epsilon >= 0.0) {
            return Err(LspiError::invalid("epsilon must be non-negative"));
        }
        if self.max_iterations == 0 {
            return Err(LspiError::invalid("max_iterations must be positive"));
        }
        if !(self.solver.tolerance >= 0.0) {
            return Err(LspiError::invalid("solver tolerance must be non-negative"));
        }
        Ok(())
    }

    /// Constructs [`LspiConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves [`LspiConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
