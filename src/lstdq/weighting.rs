use std::collections::HashMap;

use log::debug;

use super::dense;
use crate::error::{LspiError, Result};
use crate::policy::Policy;
use crate::sample::Sample;
use crate::state_key::StateKey;

/// Per-sample weights that even out biased action sampling (legacy)
///
/// For each state, every taken action gets weight `total / count(action)`,
/// normalised so the weights of that state sum to 1. Actions never taken in
/// a state contribute nothing. The returned vector is parallel to `samples`.
pub fn visitation_weights(samples: &[Sample], num_actions: usize) -> Result<Vec<f64>> {
    let mut counts: HashMap<StateKey, Vec<f64>> = HashMap::new();
    for sample in samples {
        if sample.action() >= num_actions {
            return Err(LspiError::invalid(format!(
                "action {} out of range for {} actions",
                sample.action(),
                num_actions
            )));
        }
        counts
            .entry(StateKey::from(sample.state()))
            .or_insert_with(|| vec![0.0; num_actions])[sample.action()] += 1.0;
    }

    for per_action in counts.values_mut() {
        let total: f64 = per_action.iter().sum();
        for count in per_action.iter_mut() {
            if *count != 0.0 {
                *count = total / *count;
            }
        }
        let norm: f64 = per_action.iter().sum();
        for weight in per_action.iter_mut() {
            *weight /= norm;
        }
    }

    Ok(samples
        .iter()
        .map(|sample| counts[&StateKey::from(sample.state())][sample.action()])
        .collect())
}

/// Dense LSTDQ on samples reweighted by [`visitation_weights`] (legacy)
///
/// Not part of the default pipeline; kept for comparison with runs that
/// collected samples under a strongly biased behaviour policy.
pub fn lstdq_exact_with_weighting(
    samples: &[Sample],
    policy: &Policy,
    gamma: f64,
    rng: &mut dyn rand::RngCore,
) -> Result<Vec<f64>> {
    let weights = visitation_weights(samples, policy.num_actions())?;
    debug!("Reweighted {} samples by action visitation", samples.len());
    dense::accumulate_and_solve(samples, Some(&weights), policy, gamma, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_visitation_weights() {
        // state 0: action 0 three times, action 1 once
        let mut samples = vec![Sample::new(vec![0.0], 0, 0.0, vec![0.0]); 3];
        samples.push(Sample::new(vec![0.0], 1, 0.0, vec![0.0]));
        // state 1: only action 1
        samples.push(Sample::new(vec![1.0], 1, 0.0, vec![1.0]));

        let weights = visitation_weights(&samples, 2).unwrap();

        // raw weights 4/3 and 4, normalised to 0.25 and 0.75
        assert_abs_diff_eq!(weights[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[3], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[4], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_visitation_weights_rejects_bad_action() {
        let samples = vec![Sample::new(vec![0.0], 3, 0.0, vec![0.0])];
        assert!(visitation_weights(&samples, 2).is_err());
    }
}
