//! Episodic sample collection from simulated environments.
use log::debug;

use crate::error::{LspiError, Result};
use crate::policy::Policy;
use crate::sample::Sample;

/// A discrete-action environment that can be stepped by a policy.
///
/// Stochastic simulators own their random source so that rollouts are
/// reproducible independently of the policy's exploration.
pub trait Simulator {
    /// Return to an initial state.
    fn reset(&mut self);

    /// Apply `action` and return the transition it produced.
    ///
    /// The sample is absorbing when the state it leads to is terminal.
    fn step(&mut self, action: usize) -> Result<Sample>;

    /// Current state vector.
    fn state(&self) -> Vec<f64>;

    /// Overwrite the current state.
    fn set_state(&mut self, state: &[f64]) -> Result<()>;

    /// Number of discrete values per state component.
    fn num_states(&self) -> Vec<usize>;

    fn num_actions(&self) -> usize;

    fn is_goal(&self) -> bool {
        false
    }

    fn is_non_goal_terminal(&self) -> bool {
        false
    }

    fn is_terminal(&self) -> bool {
        self.is_goal() || self.is_non_goal_terminal()
    }

    fn state_str(&self) -> String {
        format!("{:?}", self.state())
    }

    fn action_str(&self, action: usize) -> String {
        action.to_string()
    }
}

/// Roll out `episodes` episodes of at most `episode_length` steps each
///
/// Every episode starts from [`Simulator::reset`] and ends early once the
/// simulator reaches a terminal state.
pub fn collect_samples<S: Simulator + ?Sized>(
    sim: &mut S,
    episodes: usize,
    episode_length: usize,
    policy: &Policy,
    rng: &mut dyn rand::RngCore,
) -> Result<Vec<Sample>> {
    check_actions(sim, policy)?;

    let mut samples = Vec::with_capacity(episodes * episode_length);
    for episode in 0..episodes {
        sim.reset();
        for _ in 0..episode_length {
            if sim.is_terminal() {
                break;
            }
            let action = policy.evaluate(&sim.state(), rng)?;
            samples.push(sim.step(action)?);
        }
        debug!("Episode {}: {} samples collected", episode, samples.len());
    }
    Ok(samples)
}

/// Average total reward per episode when following `policy`
pub fn evaluate_policy<S: Simulator + ?Sized>(
    sim: &mut S,
    episodes: usize,
    episode_length: usize,
    policy: &Policy,
    rng: &mut dyn rand::RngCore,
) -> Result<f64> {
    if episodes == 0 {
        return Err(LspiError::invalid("need at least one episode"));
    }
    check_actions(sim, policy)?;

    let mut total = 0.0;
    for _ in 0..episodes {
        sim.reset();
        for _ in 0..episode_length {
            if sim.is_terminal() {
                break;
            }
            let action = policy.evaluate(&sim.state(), rng)?;
            total += sim.step(action)?.reward();
        }
    }
    Ok(total / episodes as f64)
}

fn check_actions<S: Simulator + ?Sized>(sim: &S, policy: &Policy) -> Result<()> {
    if sim.num_actions() != policy.num_actions() {
        return Err(LspiError::DimensionMismatch {
            expected: sim.num_actions(),
            got: policy.num_actions(),
        });
    }
    Ok(())
}
