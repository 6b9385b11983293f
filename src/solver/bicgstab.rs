use faer::dyn_stack::{MemBuffer, MemStack};
use faer::matrix_free::IdentityPrecond;
use faer::matrix_free::bicgstab::{BicgParams, bicgstab, bicgstab_scratch};
use faer::sparse::SparseColMat;
use faer::{Mat, Par};
use log::{debug, warn};

use super::{IterativeSolver, Solution, check_dimensions, norm2, residual};
use crate::error::{LspiError, Result};
use crate::sparse::SparseMatrix;

/// Iteration budget and tolerance for [`BiCgStab`]
///
/// A solve starts with `initial_iterations`. Whenever the budget runs out
/// without reaching the tolerance, the budget is multiplied by
/// `growth_factor` and the solve resumes from the current iterate, until the
/// budget would exceed `max_iterations`.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationMonitor {
    /// Relative residual tolerance `||b - A x|| <= tolerance * ||b||`
    pub tolerance: f64,
    pub initial_iterations: usize,
    /// Hard ceiling on a single attempt's budget
    pub max_iterations: usize,
    pub growth_factor: usize,
}

impl Default for IterationMonitor {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            initial_iterations: 100,
            max_iterations: 10_000,
            growth_factor: 2,
        }
    }
}

/// Unpreconditioned BiCGSTAB from `faer`, for non-symmetric systems
#[derive(Debug, Clone)]
pub struct BiCgStab {
    monitor: IterationMonitor,
}

impl BiCgStab {
    pub fn new(monitor: IterationMonitor) -> Result<Self> {
        if !(monitor.tolerance >= 0.0) {
            return Err(LspiError::invalid("solver tolerance must be non-negative"));
        }
        if monitor.growth_factor < 2 {
            return Err(LspiError::invalid("iteration growth factor must be at least 2"));
        }
        Ok(Self { monitor })
    }

    pub fn monitor(&self) -> &IterationMonitor {
        &self.monitor
    }

    /// Run faer's BiCGSTAB for at most `budget` iterations from `x`
    fn attempt(
        &self,
        a: &SparseColMat<usize, f64>,
        b: &Mat<f64>,
        x: &mut Mat<f64>,
        budget: usize,
    ) -> Attempt {
        let dim = b.nrows();
        let precond = IdentityPrecond { dim };
        let mut params = BicgParams::default();
        params.rel_tolerance = self.monitor.tolerance;
        params.abs_tolerance = 0.0;
        params.max_iters = budget;

        let mut next = x.clone();
        let mut buffer = MemBuffer::new(bicgstab_scratch(precond, precond, a.as_ref(), 1, Par::Seq));
        let result = bicgstab(
            next.as_mut(),
            precond,
            precond,
            a.as_ref(),
            b.as_ref(),
            params,
            |_| {},
            Par::Seq,
            MemStack::new(&mut buffer),
        );

        if (0..dim).any(|i| !next[(i, 0)].is_finite()) {
            return Attempt::Breakdown;
        }
        *x = next;
        match result {
            Ok(info) => Attempt::Converged(info.iter_count),
            Err(_) => Attempt::Exhausted,
        }
    }
}

impl IterativeSolver for BiCgStab {
    fn solve(&self, a: &SparseMatrix, b: &[f64], initial: &[f64]) -> Result<Solution> {
        check_dimensions(a, b, initial)?;

        let csc = a.to_faer()?;
        let rhs = Mat::<f64>::from_fn(b.len(), 1, |i, _| b[i]);
        let mut x = Mat::<f64>::from_fn(initial.len(), 1, |i, _| initial[i]);

        let ceiling = self.monitor.max_iterations;
        let mut budget = self.monitor.initial_iterations.min(ceiling);
        let mut iterations = 0;
        let converged = loop {
            match self.attempt(&csc, &rhs, &mut x, budget) {
                Attempt::Converged(used) => {
                    iterations += used;
                    break true;
                }
                Attempt::Breakdown => {
                    warn!("BiCGSTAB broke down after {} iterations", iterations);
                    break false;
                }
                Attempt::Exhausted => {
                    iterations += budget;
                    if budget >= ceiling {
                        break false;
                    }
                }
            }
            budget = (budget * self.monitor.growth_factor).max(1).min(ceiling);
            debug!(
                "BiCGSTAB not converged after {} iterations, retrying with budget {}",
                iterations, budget
            );
        };

        let x: Vec<f64> = (0..initial.len()).map(|i| x[(i, 0)]).collect();
        let residual_norm = norm2(&residual(a, b, &x)?);
        if converged {
            debug!(
                "BiCGSTAB converged after {} iterations, residual {:e}",
                iterations, residual_norm
            );
        } else {
            warn!(
                "BiCGSTAB failed to converge within a budget of {} iterations: residual {:e}",
                ceiling, residual_norm
            );
        }

        Ok(Solution {
            x,
            iterations,
            converged,
            residual_norm,
        })
    }
}

/// Outcome of one budgeted attempt
enum Attempt {
    Converged(usize),
    Exhausted,
    /// The iterate became non-finite; `x` is left untouched
    Breakdown,
}
