//! Least-squares policy iteration.
use log::{debug, info, warn};

use crate::config::LspiConfig;
use crate::error::Result;
use crate::lstdq::{Evaluation, lstdq_model_exact};
use crate::model::TransitionModel;
use crate::policy::Policy;
use crate::sample::Sample;
use crate::solver::IterativeSolver;

/// Why a policy-iteration run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The weight change dropped to `epsilon` or below after a converged
    /// evaluation
    Converged,
    /// `max_iterations` steps ran without converging
    MaxIterationsReached,
}

/// Result of [`Lspi::learn`] and [`Lspi::learn_model`]
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    /// Final policy; shares the feature map of the initial policy
    pub policy: Policy,
    /// Number of evaluate-and-improve steps performed
    pub iterations: usize,
    /// Infinity norm of the last weight change
    pub distance: f64,
    pub termination: Termination,
}

impl LearnOutcome {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Policy-iteration driver
///
/// Each step evaluates the current policy with the configured LSTDQ variant
/// and replaces its weights with the solution, which makes the policy greedy
/// with respect to the newly estimated Q-function.
#[derive(Debug)]
pub struct Lspi {
    config: LspiConfig,
    solver: Box<dyn IterativeSolver>,
}

impl Lspi {
    /// Create a driver, building the solver from `config.solver`
    pub fn new(config: LspiConfig) -> Result<Self> {
        let solver = config.solver.build()?;
        Self::with_solver(config, solver)
    }

    /// Create a driver with a caller-supplied sparse solver
    pub fn with_solver(config: LspiConfig, solver: Box<dyn IterativeSolver>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    pub fn config(&self) -> &LspiConfig {
        &self.config
    }

    /// Run policy iteration on a fixed batch of samples
    ///
    /// `policy` is the starting point and is left untouched; the returned
    /// outcome carries the improved policy.
    pub fn learn(
        &self,
        samples: &[Sample],
        policy: &Policy,
        rng: &mut dyn rand::RngCore,
    ) -> Result<LearnOutcome> {
        info!(
            "Starting policy iteration with {:?} on {} samples",
            self.config.improver,
            samples.len()
        );
        self.iterate(policy, rng, |current, rng| {
            self.config.improver.evaluate(
                samples,
                current,
                self.config.gamma,
                self.solver.as_ref(),
                rng,
            )
        })
    }

    /// Run policy iteration on an aggregated transition model
    ///
    /// Always evaluates with model-based sparse LSTDQ, so the policy's
    /// feature map must be exact.
    pub fn learn_model(
        &self,
        model: &TransitionModel,
        policy: &Policy,
        rng: &mut dyn rand::RngCore,
    ) -> Result<LearnOutcome> {
        info!(
            "Starting model-based policy iteration on {} state-action pairs",
            model.len()
        );
        self.iterate(policy, rng, |current, rng| {
            lstdq_model_exact(model, current, self.config.gamma, self.solver.as_ref(), rng)
        })
    }

    fn iterate<F>(
        &self,
        policy: &Policy,
        rng: &mut dyn rand::RngCore,
        mut evaluate: F,
    ) -> Result<LearnOutcome>
    where
        F: FnMut(&Policy, &mut dyn rand::RngCore) -> Result<Evaluation>,
    {
        let mut current = policy.clone();
        let mut iterations = 0;

        loop {
            let old = current.clone();
            let evaluation = evaluate(&old, &mut *rng)?;
            current.set_weights(evaluation.weights)?;
            iterations += 1;

            let (distance, distance_l2) = weight_distance(old.weights(), current.weights());
            info!(
                "Iteration {}: weight change {:.6e} (inf), {:.6e} (l2)",
                iterations, distance, distance_l2
            );
            if !evaluation.converged {
                warn!(
                    "Iteration {}: policy evaluation did not converge, weights are approximate",
                    iterations
                );
            }

            if evaluation.converged && distance <= self.config.epsilon {
                debug!("Converged after {} iterations", iterations);
                return Ok(LearnOutcome {
                    policy: current,
                    iterations,
                    distance,
                    termination: Termination::Converged,
                });
            }
            if iterations >= self.config.max_iterations {
                warn!(
                    "Policy iteration stopped after {} iterations with weight change {:.6e} (epsilon {:.6e})",
                    iterations, distance, self.config.epsilon
                );
                return Ok(LearnOutcome {
                    policy: current,
                    iterations,
                    distance,
                    termination: Termination::MaxIterationsReached,
                });
            }
        }
    }
}

/// Infinity and Euclidean norms of `new - old`
fn weight_distance(old: &[f64], new: &[f64]) -> (f64, f64) {
    let (max, squares) = old
        .iter()
        .zip(new)
        .map(|(o, n)| (n - o).abs())
        .fold((0.0_f64, 0.0), |(max, sq), d| (max.max(d), sq + d * d));
    (max, squares.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{ExactBasis, FeatureMap};
    use crate::lstdq::PolicyImprover;
    use crate::solver::SteepestDescent;
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::Arc;

    fn one_state_policy() -> Policy {
        let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[1], 2).unwrap());
        Policy::with_zero_weights(0.0, 2, basis).unwrap()
    }

    #[test]
    fn test_weight_distance() {
        let (inf, l2) = weight_distance(&[0.0, 0.0], &[3.0, -4.0]);
        assert_eq!(inf, 4.0);
        assert_eq!(l2, 5.0);
    }

    #[test]
    fn test_single_state_converges() {
        // action 0 pays 1 and loops; action 1 is never sampled
        let samples = vec![Sample::new(vec![0.0], 0, 1.0, vec![0.0]); 10];
        let lspi = Lspi::new(LspiConfig::default().max_iterations(20)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = lspi.learn(&samples, &one_state_policy(), &mut rng).unwrap();

        assert!(outcome.converged());
        assert_eq!(outcome.iterations, 2);
        assert_abs_diff_eq!(outcome.policy.weights()[0], 10.0 / 1.01, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.policy.weights()[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stops_at_max_iterations() {
        let samples = vec![Sample::new(vec![0.0], 0, 1.0, vec![0.0]); 10];
        let lspi = Lspi::new(LspiConfig::default().max_iterations(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = lspi.learn(&samples, &one_state_policy(), &mut rng).unwrap();

        assert_eq!(outcome.termination, Termination::MaxIterationsReached);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.distance > 1.0);
    }

    #[test]
    fn test_learn_leaves_initial_policy_untouched() {
        let samples = vec![Sample::new(vec![0.0], 1, 2.0, vec![0.0]); 4];
        let policy = one_state_policy();
        let lspi = Lspi::new(LspiConfig::default().improver(PolicyImprover::LstdqOptExact)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = lspi.learn(&samples, &policy, &mut rng).unwrap();

        assert_eq!(policy.weights(), &[0.0, 0.0]);
        assert!(outcome.policy.weights()[1] > 0.0);
        assert!(Arc::ptr_eq(policy.basis(), outcome.policy.basis()));
    }

    #[test]
    fn test_solver_breakdown_is_not_convergence() {
        // warm start where steepest descent breaks down on its first step
        let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[2], 1).unwrap());
        let initial = Policy::new(0.0, 1, basis, vec![-88.2, -100.0]).unwrap();
        let samples = vec![Sample::new(vec![0.0], 0, 1.0, vec![1.0])];
        let config = LspiConfig::default().improver(PolicyImprover::LstdqExact);
        let solver = SteepestDescent::new(1e-10, 1000).unwrap();
        let lspi = Lspi::with_solver(config, Box::new(solver)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = lspi.learn(&samples, &initial, &mut rng).unwrap();

        assert!(outcome.converged());
        assert!(outcome.iterations >= 2);
        assert_abs_diff_eq!(outcome.policy.weights()[0], 1.0 / 1.01, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.policy.weights()[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unconverged_evaluations_never_terminate_as_converged() {
        // a solver with no budget leaves the weights where they are
        let samples = vec![Sample::new(vec![0.0], 0, 1.0, vec![0.0]); 10];
        let config = LspiConfig::default()
            .improver(PolicyImprover::LstdqExact)
            .max_iterations(3);
        let solver = SteepestDescent::new(1e-10, 0).unwrap();
        let lspi = Lspi::with_solver(config, Box::new(solver)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = lspi.learn(&samples, &one_state_policy(), &mut rng).unwrap();

        assert_eq!(outcome.termination, Termination::MaxIterationsReached);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.distance, 0.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Lspi::new(LspiConfig::default().gamma(2.0)).is_err());
    }
}
