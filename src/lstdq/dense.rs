use faer::{Mat, linalg::solvers::DenseSolveCore};
use log::debug;

use super::{RIDGE, check_gamma, features};
use crate::error::{LspiError, Result};
use crate::policy::Policy;
use crate::sample::Sample;

/// Dense LSTDQ
///
/// Accumulates `A += phi (phi - gamma phi')^T` and `b += r phi` over all
/// samples, where `phi' = phi(s', pi(s'))` under the current policy, and
/// solves `A w = b` directly. Costs O(N k^2) time and O(k^2) memory.
pub fn lstdq(
    samples: &[Sample],
    policy: &Policy,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<Vec<f64>> {
    accumulate_and_solve(samples, None, policy, gamma, rng)
}

/// Dense accumulation with an optional per-sample weight
pub(crate) fn accumulate_and_solve(
    samples: &[Sample],
    sample_weights: Option<&[f64]>,
    policy: &Policy,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<Vec<f64>> {
    check_gamma(gamma)?;
    if let Some(weights) = sample_weights {
        if weights.len() != samples.len() {
            return Err(LspiError::DimensionMismatch {
                expected: samples.len(),
                got: weights.len(),
            });
        }
    }

    let k = policy.basis().size();
    let mut a_matrix = Mat::<f64>::zeros(k, k);
    for i in 0..k {
        a_matrix[(i, i)] = RIDGE;
    }
    let mut b_vector = Mat::<f64>::zeros(k, 1);

    debug!("Accumulating dense LSTDQ system over {} samples", samples.len());
    for (n, sample) in samples.iter().enumerate() {
        let weight = sample_weights.map_or(1.0, |weights| weights[n]);
        if weight == 0.0 {
            continue;
        }

        let next_action = policy.evaluate(sample.next_state(), rng)?;
        let phi = features(policy, sample.state(), sample.action())?;
        let phi_next = features(policy, sample.next_state(), next_action)?;

        // phi - gamma * phi'
        let diff: Vec<f64> = phi
            .iter()
            .zip(&phi_next)
            .map(|(p, q)| p - gamma * q)
            .collect();

        for (i, &phi_i) in phi.iter().enumerate() {
            if phi_i == 0.0 {
                continue;
            }
            let scaled = weight * phi_i;
            for (j, &d) in diff.iter().enumerate() {
                a_matrix[(i, j)] += scaled * d;
            }
            b_vector[(i, 0)] += scaled * sample.reward();
        }
    }

    solve_dense(&a_matrix, &b_vector)
}

/// Direct solve of a dense system
///
/// A singular `A` shows up as non-finite entries in the solution and is
/// reported as [`LspiError::SingularSystem`].
pub(crate) fn solve_dense(a_matrix: &Mat<f64>, b_vector: &Mat<f64>) -> Result<Vec<f64>> {
    let a_inv = a_matrix.partial_piv_lu().inverse();
    let solution = &a_inv * b_vector;

    let weights: Vec<f64> = (0..solution.nrows()).map(|i| solution[(i, 0)]).collect();
    if let Some(i) = weights.iter().position(|w| !w.is_finite()) {
        return Err(LspiError::SingularSystem {
            message: format!("solution component {} is {}", i, weights[i]),
        });
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{ExactBasis, FeatureMap, PolynomialBasis};
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::Arc;

    #[test]
    fn test_single_absorbing_sample() {
        let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[1], 2).unwrap());
        let policy = Policy::with_zero_weights(0.0, 2, basis).unwrap();
        let samples = vec![Sample::with_absorb(vec![0.0], 0, 1.0, vec![0.0], true); 10];
        let mut rng = StdRng::seed_from_u64(42);

        let weights = lstdq(&samples, &policy, 0.9, &mut rng).unwrap();

        // A[0,0] = 0.01 + 10 * (1 - 0.9), b[0] = 10
        assert_abs_diff_eq!(weights[0], 10.0 / 1.01, epsilon = 1e-9);
        assert_abs_diff_eq!(weights[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_samples_gives_zero_weights() {
        let basis: Arc<dyn FeatureMap> = Arc::new(PolynomialBasis::new(3, 2).unwrap());
        let policy = Policy::with_zero_weights(0.0, 2, basis).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let weights = lstdq(&[], &policy, 0.9, &mut rng).unwrap();
        assert_eq!(weights, vec![0.0; 6]);
    }

    #[test]
    fn test_generic_basis() {
        // state x in {1, 2}; only action 0 is ever taken and it always pays 1
        let basis: Arc<dyn FeatureMap> = Arc::new(PolynomialBasis::new(1, 2).unwrap());
        let policy = Policy::new(0.0, 2, basis, vec![1.0, 0.0]).unwrap();
        let samples = vec![
            Sample::new(vec![1.0], 0, 1.0, vec![2.0]),
            Sample::new(vec![2.0], 0, 1.0, vec![1.0]),
        ];
        let mut rng = StdRng::seed_from_u64(42);

        let weights = lstdq(&samples, &policy, 0.5, &mut rng).unwrap();

        // A[0,0] = 0.01 + 2 * (1 - 0.5), b[0] = 2
        assert_abs_diff_eq!(weights[0], 2.0 / 1.01, epsilon = 1e-9);
        assert_abs_diff_eq!(weights[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_invalid_gamma() {
        let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[1], 2).unwrap());
        let policy = Policy::with_zero_weights(0.0, 2, basis).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(lstdq(&[], &policy, 1.5, &mut rng).is_err());
    }

    #[test]
    fn test_singular_system_is_reported() {
        let a_matrix = Mat::<f64>::zeros(2, 2);
        let b_vector = Mat::from_fn(2, 1, |_, _| 1.0);
        assert!(matches!(
            solve_dense(&a_matrix, &b_vector),
            Err(LspiError::SingularSystem { .. })
        ));
    }
}
