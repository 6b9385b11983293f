//! LSTDQ policy evaluation.
//!
//! Every evaluator builds a linear system whose solution approximates the
//! Q-function of the given policy and returns that solution as the new
//! weight vector. All systems start from a ridge term `0.01 * I` so that
//! state-action pairs never reached by a transition keep `A` non-singular.
mod dense;
mod exact;
mod inverse;
mod weighting;

use serde::{Deserialize, Serialize};

use crate::error::{LspiError, Result};
use crate::policy::Policy;
use crate::sample::Sample;
use crate::solver::{IterativeSolver, Solution};

pub use dense::lstdq;
pub use exact::{build_exact_system, build_model_system, lstdq_exact, lstdq_model_exact};
pub use inverse::lstdq_opt_exact;
pub use weighting::{lstdq_exact_with_weighting, visitation_weights};

/// Diagonal seed of every LSTDQ system
pub const RIDGE: f64 = 0.01;

/// New weights from one policy evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub weights: Vec<f64>,
    /// False when an iterative solve stopped short of its tolerance; direct
    /// solves always report true
    pub converged: bool,
}

impl Evaluation {
    /// Result of a direct solve
    pub fn direct(weights: Vec<f64>) -> Self {
        Self {
            weights,
            converged: true,
        }
    }
}

impl From<Solution> for Evaluation {
    fn from(solution: Solution) -> Self {
        Self {
            weights: solution.x,
            converged: solution.converged,
        }
    }
}

/// Which LSTDQ variant a policy-iteration run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolicyImprover {
    /// Dense LSTDQ; works with any feature map
    #[default]
    Lstdq,
    /// Sparse LSTDQ for one-hot feature maps, solved iteratively
    LstdqExact,
    /// Dense LSTDQ with samples reweighted by inverse action-visitation
    /// frequency (legacy)
    LstdqExactWithWeighting,
    /// Incremental Sherman-Morrison update of `A^-1` (historical; O(k^2) per sample)
    LstdqOptExact,
}

impl PolicyImprover {
    /// Evaluate `policy` on `samples` with this variant
    pub fn evaluate(
        self,
        samples: &[Sample],
        policy: &Policy,
        gamma: f64,
        solver: &dyn IterativeSolver,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Evaluation> {
        match self {
            PolicyImprover::Lstdq => lstdq(samples, policy, gamma, rng).map(Evaluation::direct),
            PolicyImprover::LstdqExact => lstdq_exact(samples, policy, gamma, solver, rng),
            PolicyImprover::LstdqExactWithWeighting => {
                lstdq_exact_with_weighting(samples, policy, gamma, rng).map(Evaluation::direct)
            }
            PolicyImprover::LstdqOptExact => {
                lstdq_opt_exact(samples, policy, gamma, rng).map(Evaluation::direct)
            }
        }
    }
}

/// Features of `(state, action)`, checked against the policy's weight length
pub(crate) fn features(policy: &Policy, state: &[f64], action: usize) -> Result<Vec<f64>> {
    let phi = policy.basis().evaluate(state, action)?;
    if phi.len() != policy.weights().len() {
        return Err(LspiError::DimensionMismatch {
            expected: policy.weights().len(),
            got: phi.len(),
        });
    }
    Ok(phi)
}

pub(crate) fn check_gamma(gamma: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(LspiError::invalid("gamma must be between 0 and 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_improver_default_and_serde() {
        assert_eq!(PolicyImprover::default(), PolicyImprover::Lstdq);

        let yaml = serde_yaml::to_string(&PolicyImprover::LstdqExact).unwrap();
        let parsed: PolicyImprover = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, PolicyImprover::LstdqExact);
    }

    #[test]
    fn test_evaluation_from_solution() {
        let solution = Solution {
            x: vec![1.0, 2.0],
            iterations: 3,
            converged: false,
            residual_norm: 0.5,
        };
        let evaluation = Evaluation::from(solution);
        assert_eq!(evaluation.weights, vec![1.0, 2.0]);
        assert!(!evaluation.converged);
        assert!(Evaluation::direct(vec![0.0]).converged);
    }

    #[test]
    fn test_check_gamma() {
        assert!(check_gamma(0.9).is_ok());
        assert!(check_gamma(1.0).is_ok());
        assert!(check_gamma(1.1).is_err());
        assert!(check_gamma(-0.1).is_err());
    }
}
