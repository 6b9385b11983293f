//! Linear epsilon-greedy policy over a shared feature map.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::basis::{ExactFeatureMap, FeatureMap};
use crate::error::{LspiError, Result};

/// Greedy policy with respect to a linear action-value function
///
/// `Q(s, a) = phi(s, a) . w`, where `phi` is a shared [`FeatureMap`] and `w`
/// the policy's weight vector. With probability `explore` an action is
/// drawn uniformly at random instead.
///
/// Cloning a policy deep-copies the weights but shares the feature map.
#[derive(Clone)]
pub struct Policy {
    explore: f64,
    num_actions: usize,
    basis: Arc<dyn FeatureMap>,
    weights: Vec<f64>,
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("explore", &self.explore)
            .field("num_actions", &self.num_actions)
            .field("basis", &self.basis)
            .field("weights", &self.weights)
            .finish()
    }
}

impl Policy {
    /// Create a new policy
    ///
    /// # Arguments
    /// * `explore` - Probability of choosing a random action (0 follows the policy exactly)
    /// * `num_actions` - Number of actions
    /// * `basis` - Feature map shared with other policies
    /// * `weights` - Initial weights, one per feature
    pub fn new(
        explore: f64,
        num_actions: usize,
        basis: Arc<dyn FeatureMap>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&explore) {
            return Err(LspiError::invalid("explore must be between 0 and 1"));
        }
        if num_actions == 0 {
            return Err(LspiError::invalid("number of actions must be positive"));
        }
        if weights.len() != basis.size() {
            return Err(LspiError::DimensionMismatch {
                expected: basis.size(),
                got: weights.len(),
            });
        }

        Ok(Self {
            explore,
            num_actions,
            basis,
            weights,
        })
    }

    /// Create a policy with all weights set to zero
    pub fn with_zero_weights(
        explore: f64,
        num_actions: usize,
        basis: Arc<dyn FeatureMap>,
    ) -> Result<Self> {
        let weights = vec![0.0; basis.size()];
        Self::new(explore, num_actions, basis, weights)
    }

    /// Create a policy with weights drawn uniformly from `[0, 1)`
    pub fn with_random_weights(
        explore: f64,
        num_actions: usize,
        basis: Arc<dyn FeatureMap>,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Self> {
        let weights = (0..basis.size()).map(|_| rng.random::<f64>()).collect();
        Self::new(explore, num_actions, basis, weights)
    }

    pub fn explore(&self) -> f64 {
        self.explore
    }

    /// Set the exploration probability, clamped to `[0, 1]`
    pub fn set_explore(&mut self, explore: f64) {
        self.explore = explore.clamp(0.0, 1.0);
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn basis(&self) -> &Arc<dyn FeatureMap> {
        &self.basis
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Replace the weight vector
    ///
    /// Fails if the new weights do not match the feature map's size.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        if weights.len() != self.basis.size() {
            return Err(LspiError::DimensionMismatch {
                expected: self.basis.size(),
                got: weights.len(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Select an action for a state
    ///
    /// Explores uniformly with probability `explore`, otherwise returns the
    /// action with the largest Q-value. Ties go to the lowest action index.
    pub fn evaluate(&self, state: &[f64], rng: &mut dyn rand::RngCore) -> Result<usize> {
        self.select(rng, |action| self.state_action_value(state, action))
    }

    /// Select an action using the one-hot shortcut of an exact basis
    ///
    /// `Q(s, a)` reduces to `w[state_action_index(s, a)]`, so no feature
    /// vector is materialised.
    pub fn evaluate_exact(
        &self,
        basis: &dyn ExactFeatureMap,
        state: &[f64],
        rng: &mut dyn rand::RngCore,
    ) -> Result<usize> {
        self.select(rng, |action| {
            let index = basis.state_action_index(state, action)?;
            self.weights
                .get(index)
                .copied()
                .ok_or(LspiError::DimensionMismatch {
                    expected: self.weights.len(),
                    got: index + 1,
                })
        })
    }

    /// Q-value of a state-action pair
    pub fn state_action_value(&self, state: &[f64], action: usize) -> Result<f64> {
        let phi = self.basis.evaluate(state, action)?;
        if phi.len() != self.weights.len() {
            return Err(LspiError::DimensionMismatch {
                expected: self.weights.len(),
                got: phi.len(),
            });
        }

        Ok(phi.iter().zip(&self.weights).map(|(p, w)| p * w).sum())
    }

    fn select<F>(&self, rng: &mut dyn rand::RngCore, q_value: F) -> Result<usize>
    where
        F: Fn(usize) -> Result<f64>,
    {
        if rng.random::<f64>() < self.explore {
            return Ok(rng.random_range(0..self.num_actions));
        }

        let mut best_action = 0;
        let mut best_q = f64::NEG_INFINITY;
        for action in 0..self.num_actions {
            let q = q_value(action)?;
            if q > best_q {
                best_q = q;
                best_action = action;
            }
        }
        Ok(best_action)
    }
}
