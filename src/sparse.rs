//! Sparse square matrices and the `A x = b` systems built from samples.

use faer::Mat;
use faer::sparse::{SparseColMat, Triplet};
use indexmap::IndexMap;

use crate::error::{LspiError, Result};
use crate::solver::{IterativeSolver, Solution};

/// Sparse matrix stored as a map from `(row, col)` to value
///
/// Absent entries are implicitly zero. Entries are kept in insertion order,
/// so products over the same sequence of updates sum in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    values: IndexMap<(usize, usize), f64>,
}

impl SparseMatrix {
    /// Create an empty (all-zero) matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: IndexMap::new(),
        }
    }

    /// Square matrix with `value` on the diagonal
    pub fn diagonal(dim: usize, value: f64) -> Self {
        let mut values = IndexMap::with_capacity(dim);
        for i in 0..dim {
            values.insert((i, i), value);
        }
        Self {
            rows: dim,
            cols: dim,
            values,
        }
    }

    pub fn identity(dim: usize) -> Self {
        Self::diagonal(dim, 1.0)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_index(row, col)?;
        Ok(self.values.get(&(row, col)).copied().unwrap_or(0.0))
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(row, col)?;
        self.values.insert((row, col), value);
        Ok(())
    }

    /// Add `delta` to the entry at `(row, col)`
    pub fn update(&mut self, row: usize, col: usize, delta: f64) -> Result<()> {
        self.check_index(row, col)?;
        *self.values.entry((row, col)).or_insert(0.0) += delta;
        Ok(())
    }

    /// Multiply every entry by `scalar` in place
    pub fn scale(&mut self, scalar: f64) {
        for value in self.values.values_mut() {
            *value *= scalar;
        }
    }

    /// Sparse matrix times dense vector
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.cols {
            return Err(LspiError::DimensionMismatch {
                expected: self.cols,
                got: x.len(),
            });
        }

        let mut result = vec![0.0; self.rows];
        for (&(row, col), &value) in &self.values {
            result[row] += value * x[col];
        }
        Ok(result)
    }

    /// Dot product of a column-vector matrix with a dense vector
    pub fn dot(&self, x: &[f64]) -> Result<f64> {
        if self.cols != 1 {
            return Err(LspiError::invalid("dot requires a column vector"));
        }
        if x.len() != self.rows {
            return Err(LspiError::DimensionMismatch {
                expected: self.rows,
                got: x.len(),
            });
        }
        Ok(self
            .values
            .iter()
            .map(|(&(row, _), &value)| value * x[row])
            .sum())
    }

    /// Iterate over stored `((row, col), value)` entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.values.iter().map(|(&index, &value)| (index, value))
    }

    /// Materialise as a dense matrix
    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::<f64>::zeros(self.rows, self.cols);
        for (&(row, col), &value) in &self.values {
            dense[(row, col)] = value;
        }
        dense
    }

    /// Compressed sparse column copy for faer's solvers
    pub fn to_faer(&self) -> Result<SparseColMat<usize, f64>> {
        let triplets: Vec<_> = self
            .values
            .iter()
            .map(|(&(row, col), &value)| Triplet::new(row, col, value))
            .collect();
        SparseColMat::try_new_from_triplets(self.rows, self.cols, &triplets)
            .map_err(|e| LspiError::invalid(format!("cannot convert sparse matrix: {:?}", e)))
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows {
            return Err(LspiError::DimensionMismatch {
                expected: self.rows,
                got: row,
            });
        }
        if col >= self.cols {
            return Err(LspiError::DimensionMismatch {
                expected: self.cols,
                got: col,
            });
        }
        Ok(())
    }
}

/// A sparse `A x = b` system with dense right-hand side
#[derive(Debug, Clone)]
pub struct SparseSystem {
    a: SparseMatrix,
    b: Vec<f64>,
}

impl SparseSystem {
    /// Create a `dim`-dimensional system with `A = ridge * I` and `b = 0`
    pub fn with_ridge(dim: usize, ridge: f64) -> Self {
        Self {
            a: SparseMatrix::diagonal(dim, ridge),
            b: vec![0.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.b.len()
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.a
    }

    pub fn rhs(&self) -> &[f64] {
        &self.b
    }

    /// Accumulate `delta` into `A[row, col]`
    pub fn update(&mut self, row: usize, col: usize, delta: f64) -> Result<()> {
        self.a.update(row, col, delta)
    }

    /// Accumulate `delta` into `b[row]`
    pub fn update_rhs(&mut self, row: usize, delta: f64) -> Result<()> {
        let dim = self.b.len();
        let entry = self
            .b
            .get_mut(row)
            .ok_or(LspiError::DimensionMismatch { expected: dim, got: row })?;
        *entry += delta;
        Ok(())
    }

    /// Solve the system iteratively starting from `initial`
    pub fn solve(&self, solver: &dyn IterativeSolver, initial: &[f64]) -> Result<Solution> {
        solver.solve(&self.a, &self.b, initial)
    }
}
