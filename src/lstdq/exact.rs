use log::{debug, warn};

use super::{Evaluation, RIDGE, check_gamma, dense};
use crate::basis::ExactFeatureMap;
use crate::error::{LspiError, Result};
use crate::model::TransitionModel;
use crate::policy::Policy;
use crate::sample::Sample;
use crate::solver::IterativeSolver;
use crate::sparse::SparseSystem;

/// Sparse LSTDQ for one-hot feature maps
///
/// With one-hot features the outer-product update collapses to at most two
/// entries per sample, so `A` is kept sparse and solved with `solver`,
/// warm-started from the policy's current weights. If the policy's feature
/// map is not exact, this logs a warning and falls back to dense
/// [`lstdq`](super::lstdq).
///
/// The returned [`Evaluation::converged`] is false when the solver gave up,
/// both from the warm start and from zero.
pub fn lstdq_exact(
    samples: &[Sample],
    policy: &Policy,
    gamma: f64,
    solver: &dyn IterativeSolver,
    rng: &mut dyn rand::RngCore,
) -> Result<Evaluation> {
    let Some(basis) = policy.basis().as_exact() else {
        warn!("Exact LSTDQ requires an exact basis, running dense LSTDQ instead");
        return dense::lstdq(samples, policy, gamma, rng).map(Evaluation::direct);
    };

    debug!("Evaluating {} samples", samples.len());
    let system = build_exact_system(samples, policy, basis, gamma, rng)?;

    debug!("Solving {}-dimensional sparse system", system.dim());
    solve_from(&system, solver, policy.weights())
}

/// Model-based sparse LSTDQ
///
/// Builds the system from the aggregated transition probabilities and mean
/// rewards of `model` instead of raw samples. Fails with
/// [`LspiError::BasisMismatch`] when the policy's feature map is not exact.
pub fn lstdq_model_exact(
    model: &TransitionModel,
    policy: &Policy,
    gamma: f64,
    solver: &dyn IterativeSolver,
    rng: &mut dyn rand::RngCore,
) -> Result<Evaluation> {
    let basis = policy
        .basis()
        .as_exact()
        .ok_or_else(|| LspiError::BasisMismatch {
            message: "model-based LSTDQ requires an exact basis".to_string(),
        })?;

    let system = build_model_system(model, policy, basis, gamma, rng)?;
    debug!("Solving {}-dimensional sparse system", system.dim());
    solve_from(&system, solver, policy.weights())
}

/// Solve warm-started from `initial`, retrying from zero if that fails
///
/// Keeps whichever attempt converged, or else the one with the smaller
/// residual.
fn solve_from(
    system: &SparseSystem,
    solver: &dyn IterativeSolver,
    initial: &[f64],
) -> Result<Evaluation> {
    let warm = system.solve(solver, initial)?;
    if warm.converged || initial.iter().all(|w| *w == 0.0) {
        return Ok(warm.into());
    }

    debug!(
        "Warm-started solve stopped after {} iterations with residual {:e}, retrying from zero",
        warm.iterations, warm.residual_norm
    );
    let cold = system.solve(solver, &vec![0.0; system.dim()])?;
    if cold.converged || cold.residual_norm < warm.residual_norm {
        Ok(cold.into())
    } else {
        Ok(warm.into())
    }
}

/// Accumulate the sparse LSTDQ system for `samples`
///
/// For `i = index(s, a)` and `j = index(s', pi(s'))`: if `i == j`,
/// `A[i,i] += 1 - gamma`; otherwise `A[i,i] += 1` and `A[i,j] -= gamma`.
/// In both cases `b[i] += r`.
pub fn build_exact_system(
    samples: &[Sample],
    policy: &Policy,
    basis: &dyn ExactFeatureMap,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<SparseSystem> {
    check_gamma(gamma)?;
    let k = check_size(policy, basis)?;

    let mut system = SparseSystem::with_ridge(k, RIDGE);
    for sample in samples {
        let next_action = policy.evaluate_exact(basis, sample.next_state(), rng)?;
        let i = basis.state_action_index(sample.state(), sample.action())?;
        let j = basis.state_action_index(sample.next_state(), next_action)?;

        if i == j {
            system.update(i, i, 1.0 - gamma)?;
        } else {
            system.update(i, i, 1.0)?;
            system.update(i, j, -gamma)?;
        }
        system.update_rhs(i, sample.reward())?;
    }
    Ok(system)
}

/// Accumulate the sparse LSTDQ system for an aggregated model
///
/// For every observed pair `i = index(s, a)`: `A[i,i] += 1`,
/// `A[i,j] -= gamma * p(s')` for each next state `s'` with
/// `j = index(s', pi(s'))`, and `b[i] += mean reward`.
pub fn build_model_system(
    model: &TransitionModel,
    policy: &Policy,
    basis: &dyn ExactFeatureMap,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<SparseSystem> {
    check_gamma(gamma)?;
    let k = check_size(policy, basis)?;

    let mut system = SparseSystem::with_ridge(k, RIDGE);
    for entry in model.state_actions() {
        let state = entry.state.to_vec();
        let i = basis.state_action_index(&state, entry.action)?;
        system.update(i, i, 1.0)?;

        for (next_state, probability) in &entry.transitions {
            let next_state = next_state.to_vec();
            let next_action = policy.evaluate_exact(basis, &next_state, rng)?;
            let j = basis.state_action_index(&next_state, next_action)?;
            system.update(i, j, -gamma * probability)?;
        }
        system.update_rhs(i, entry.reward)?;
    }
    Ok(system)
}

fn check_size(policy: &Policy, basis: &dyn ExactFeatureMap) -> Result<usize> {
    let k = basis.size();
    if policy.weights().len() != k {
        return Err(LspiError::DimensionMismatch {
            expected: k,
            got: policy.weights().len(),
        });
    }
    Ok(k)
}
