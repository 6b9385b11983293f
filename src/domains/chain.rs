use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{LspiError, Result};
use crate::sample::Sample;
use crate::sampling::Simulator;

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Chain walk
///
/// States `0..num_states` on a line. Action 0 moves left and action 1 moves
/// right; with probability `1 - success_prob` the move goes the other way.
/// Moves are clamped at the ends. Entering either end pays 1, every other
/// transition pays 0. Episodes start in a uniformly random state and never
/// terminate.
#[derive(Debug, Clone)]
pub struct Chain {
    num_states: usize,
    success_prob: f64,
    state: usize,
    rng: StdRng,
}

impl Chain {
    pub fn new(num_states: usize, success_prob: f64, seed: u64) -> Result<Self> {
        if num_states < 2 {
            return Err(LspiError::invalid("chain needs at least two states"));
        }
        if !(0.0..=1.0).contains(&success_prob) {
            return Err(LspiError::invalid("success probability must be between 0 and 1"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let state = rng.random_range(0..num_states);
        Ok(Self {
            num_states,
            success_prob,
            state,
            rng,
        })
    }

    pub fn position(&self) -> usize {
        self.state
    }

    fn is_reward_state(&self, state: usize) -> bool {
        state == 0 || state == self.num_states - 1
    }
}

impl Simulator for Chain {
    fn reset(&mut self) {
        self.state = self.rng.random_range(0..self.num_states);
    }

    fn step(&mut self, action: usize) -> Result<Sample> {
        let succeeded = self.rng.random::<f64>() < self.success_prob;
        let go_right = match action {
            LEFT => !succeeded,
            RIGHT => succeeded,
            _ => {
                return Err(LspiError::invalid(format!(
                    "action {} out of range for 2 actions",
                    action
                )));
            }
        };

        let state = self.state();
        self.state = if go_right {
            (self.state + 1).min(self.num_states - 1)
        } else {
            self.state.saturating_sub(1)
        };

        let reward = if self.is_reward_state(self.state) {
            1.0
        } else {
            0.0
        };
        Ok(Sample::new(state, action, reward, self.state()))
    }

    fn state(&self) -> Vec<f64> {
        vec![self.state as f64]
    }

    fn set_state(&mut self, state: &[f64]) -> Result<()> {
        let &[value] = state else {
            return Err(LspiError::DimensionMismatch {
                expected: 1,
                got: state.len(),
            });
        };
        let index = value.round();
        if index < 0.0 || index >= self.num_states as f64 {
            return Err(LspiError::invalid(format!(
                "state {} out of range for {} states",
                value, self.num_states
            )));
        }
        self.state = index as usize;
        Ok(())
    }

    fn num_states(&self) -> Vec<usize> {
        vec![self.num_states]
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn action_str(&self, action: usize) -> String {
        match action {
            LEFT => "left".to_string(),
            RIGHT => "right".to_string(),
            _ => action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_chain() {
        let mut chain = Chain::new(5, 1.0, 0).unwrap();
        chain.set_state(&[2.0]).unwrap();

        let sample = chain.step(RIGHT).unwrap();
        assert_eq!(sample, Sample::new(vec![2.0], RIGHT, 0.0, vec![3.0]));
        assert_eq!(chain.position(), 3);
        assert_eq!(chain.step(RIGHT).unwrap().reward(), 1.0);
        assert_eq!(chain.position(), 4);
        // clamped at the right end, still rewarded
        let sample = chain.step(RIGHT).unwrap();
        assert_eq!(sample.reward(), 1.0);
        assert_eq!(sample.state(), sample.next_state());
        assert!(!sample.absorb());

        chain.set_state(&[1.0]).unwrap();
        assert_eq!(chain.step(LEFT).unwrap().reward(), 1.0);
        assert_eq!(chain.step(LEFT).unwrap().reward(), 1.0);
        assert_eq!(chain.state(), vec![0.0]);
        assert!(!chain.is_terminal());
    }

    #[test]
    fn test_failed_actions_move_the_other_way() {
        let mut chain = Chain::new(5, 0.0, 0).unwrap();
        chain.set_state(&[2.0]).unwrap();
        chain.step(RIGHT).unwrap();
        assert_eq!(chain.position(), 1);
        chain.step(LEFT).unwrap();
        assert_eq!(chain.position(), 2);
    }

    #[test]
    fn test_probabilistic_chain_is_reproducible() {
        let run = |seed| {
            let mut chain = Chain::new(10, 0.9, seed).unwrap();
            (0..50)
                .map(|i| {
                    chain.step(i % 2).unwrap();
                    chain.position()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_success_rate() {
        let mut chain = Chain::new(1000, 0.9, 1).unwrap();
        let mut right = 0;
        for _ in 0..1000 {
            chain.set_state(&[500.0]).unwrap();
            chain.step(RIGHT).unwrap();
            if chain.position() == 501 {
                right += 1;
            }
        }
        assert!(right > 850 && right < 950, "moved right {} times", right);
    }

    #[test]
    fn test_invalid_input() {
        assert!(Chain::new(1, 0.9, 0).is_err());
        assert!(Chain::new(5, 1.5, 0).is_err());

        let mut chain = Chain::new(5, 0.9, 0).unwrap();
        assert!(chain.step(2).is_err());
        assert!(chain.set_state(&[5.0]).is_err());
        assert!(chain.set_state(&[1.0, 2.0]).is_err());
        assert_eq!(chain.num_states(), vec![5]);
        assert_eq!(chain.action_str(0), "left");
    }
}
