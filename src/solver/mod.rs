//! Iterative solvers for sparse `A x = b` systems.
//!
//! Iterative solvers never fail on non-convergence. They return the best
//! `x` found together with [`Solution::converged`] and the final residual,
//! and log a warning.
mod bicgstab;
mod steepest;

use std::fmt;

use crate::error::{LspiError, Result};
use crate::sparse::SparseMatrix;

pub use bicgstab::{BiCgStab, IterationMonitor};
pub use steepest::SteepestDescent;

/// Outcome of an iterative solve
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Best-effort solution
    pub x: Vec<f64>,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the solver's stopping criterion was met
    pub converged: bool,
    /// Euclidean norm of `b - A x` for the returned `x`
    pub residual_norm: f64,
}

/// A solver for square sparse systems
pub trait IterativeSolver: Send + Sync + fmt::Debug {
    /// Solve `a x = b` starting from `initial`
    fn solve(&self, a: &SparseMatrix, b: &[f64], initial: &[f64]) -> Result<Solution>;
}

pub(crate) fn check_dimensions(a: &SparseMatrix, b: &[f64], initial: &[f64]) -> Result<()> {
    if a.rows() != a.cols() {
        return Err(LspiError::invalid(format!(
            "iterative solvers need a square matrix, got {}x{}",
            a.rows(),
            a.cols()
        )));
    }
    for len in [b.len(), initial.len()] {
        if len != a.rows() {
            return Err(LspiError::DimensionMismatch {
                expected: a.rows(),
                got: len,
            });
        }
    }
    Ok(())
}

pub(crate) fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

pub(crate) fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

pub(crate) fn norm_inf(x: &[f64]) -> f64 {
    x.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

/// `b - A x`
pub(crate) fn residual(a: &SparseMatrix, b: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    let ax = a.mul_vec(x)?;
    Ok(b.iter().zip(ax).map(|(bi, axi)| bi - axi).collect())
}
