use approx::abs_diff_ne;
use faer::{Mat, linalg::solvers::DenseSolveCore};
use log::{debug, warn};

use super::{RIDGE, check_gamma, dense};
use crate::error::Result;
use crate::policy::Policy;
use crate::sample::Sample;

/// Exact LSTDQ with an incrementally maintained inverse (historical)
///
/// Keeps `B = A^-1` up to date with one Sherman-Morrison rank-one update
/// per sample, so no solve is needed at the end. Each update costs O(k^2)
/// time and `B` is dense, and rounding errors accumulate across updates;
/// prefer [`lstdq_exact`](super::lstdq_exact) for large `k` and
/// [`lstdq`](super::lstdq) for small `k`. Falls back to dense LSTDQ for
/// non-exact feature maps.
pub fn lstdq_opt_exact(
    samples: &[Sample],
    policy: &Policy,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<Vec<f64>> {
    let Some(basis) = policy.basis().as_exact() else {
        warn!("Inverse-update LSTDQ requires an exact basis, running dense LSTDQ instead");
        return dense::lstdq(samples, policy, gamma, rng);
    };
    check_gamma(gamma)?;

    let mut inverse = IncrementalInverse::new(basis.size(), RIDGE);
    let mut b_vector = Mat::<f64>::zeros(basis.size(), 1);

    for sample in samples {
        let next_action = policy.evaluate_exact(basis, sample.next_state(), rng)?;
        let i = basis.state_action_index(sample.state(), sample.action())?;
        let j = basis.state_action_index(sample.next_state(), next_action)?;

        inverse.update(i, j, gamma);
        b_vector[(i, 0)] += sample.reward();
    }

    let solution = &inverse.a_inv * &b_vector;
    Ok((0..solution.nrows()).map(|i| solution[(i, 0)]).collect())
}

/// `A` and `A^-1` for one-hot updates `A += e_i (e_i - gamma e_j)^T`
#[derive(Debug, Clone)]
struct IncrementalInverse {
    a_matrix: Mat<f64>,
    a_inv: Mat<f64>,
    dim: usize,
}

impl IncrementalInverse {
    fn new(dim: usize, ridge: f64) -> Self {
        let mut a_matrix = Mat::<f64>::zeros(dim, dim);
        let mut a_inv = Mat::<f64>::zeros(dim, dim);
        for i in 0..dim {
            a_matrix[(i, i)] = ridge;
            a_inv[(i, i)] = 1.0 / ridge;
        }
        Self {
            a_matrix,
            a_inv,
            dim,
        }
    }

    /// Apply `A += u v^T` with `u = e_i`, `v = e_i - gamma e_j`
    ///
    /// `i == j` is the same update with `v = (1 - gamma) e_i`.
    fn update(&mut self, i: usize, j: usize, gamma: f64) {
        self.a_matrix[(i, i)] += 1.0;
        self.a_matrix[(i, j)] -= gamma;

        // B u = B[:, i], v^T B = B[i, :] - gamma B[j, :]
        let b_u: Vec<f64> = (0..self.dim).map(|x| self.a_inv[(x, i)]).collect();
        let v_b: Vec<f64> = (0..self.dim)
            .map(|y| self.a_inv[(i, y)] - gamma * self.a_inv[(j, y)])
            .collect();
        let denominator = 1.0 + v_b[i];

        if abs_diff_ne!(denominator, 0.0, epsilon = 1e-10) {
            for (x, &bu_x) in b_u.iter().enumerate() {
                if bu_x == 0.0 {
                    continue;
                }
                for (y, &vb_y) in v_b.iter().enumerate() {
                    self.a_inv[(x, y)] -= bu_x * vb_y / denominator;
                }
            }
        } else {
            debug!("Sherman-Morrison denominator vanished, re-inverting A");
            self.a_inv = self.a_matrix.partial_piv_lu().inverse();
        }
    }
}
