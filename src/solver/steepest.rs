use log::{debug, warn};

use super::{IterativeSolver, Solution, check_dimensions, dot, norm2, norm_inf, residual};
use crate::error::{LspiError, Result};
use crate::sparse::SparseMatrix;

/// Steepest-descent solver
///
/// Each step moves along the residual `r = b - A x` with step size
/// `alpha = (r . r) / (r . A r)` and stops once the infinity norm of the
/// step falls below `tolerance`. Convergence requires the symmetric part of
/// `A` to be positive definite; a non-positive curvature `r . A r` stops the
/// iteration early and is reported as non-convergence.
#[derive(Debug, Clone)]
pub struct SteepestDescent {
    tolerance: f64,
    max_iterations: usize,
}

impl SteepestDescent {
    /// Create a steepest-descent solver
    ///
    /// # Arguments
    /// * `tolerance` - Stop when `||delta x||_inf` drops below this value
    /// * `max_iterations` - Hard cap on the number of steps
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self> {
        if !(tolerance >= 0.0) {
            return Err(LspiError::invalid("solver tolerance must be non-negative"));
        }
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl IterativeSolver for SteepestDescent {
    fn solve(&self, a: &SparseMatrix, b: &[f64], initial: &[f64]) -> Result<Solution> {
        check_dimensions(a, b, initial)?;

        let mut x = initial.to_vec();
        let mut step_norm = f64::INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let r = residual(a, b, &x)?;
            let rr = dot(&r, &r);
            if rr == 0.0 {
                step_norm = 0.0;
                converged = true;
                break;
            }

            let ar = a.mul_vec(&r)?;
            let curvature = dot(&r, &ar);
            if !(curvature > 0.0) || !curvature.is_finite() {
                warn!(
                    "Steepest descent stopped at iteration {}: non-positive curvature {}",
                    iterations, curvature
                );
                break;
            }

            let alpha = rr / curvature;
            for (xi, ri) in x.iter_mut().zip(&r) {
                *xi += alpha * ri;
            }
            step_norm = alpha * norm_inf(&r);
            iterations += 1;

            if step_norm < self.tolerance {
                converged = true;
                break;
            }
        }

        let residual_norm = norm2(&residual(a, b, &x)?);
        if converged {
            debug!(
                "Steepest descent converged after {} iterations, step {:e}, residual {:e}",
                iterations, step_norm, residual_norm
            );
        } else {
            warn!(
                "Steepest descent failed to converge within {} iterations: step {:e}, residual {:e}",
                self.max_iterations, step_norm, residual_norm
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
