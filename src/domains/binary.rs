use crate::error::{LspiError, Result};
use crate::sample::Sample;
use crate::sampling::Simulator;

const STEP_REWARD: f64 = -1.0;
const GOAL_REWARD: f64 = 100.0;

/// Bit-setting task
///
/// The state is a vector of `num_bits` bits, all clear after a reset. Action
/// `i` sets bit `i`. Every step pays -1 except the one that sets the last
/// clear bit, which pays 100. The all-set state is the goal and absorbing.
#[derive(Debug, Clone)]
pub struct Binary {
    bits: Vec<bool>,
}

impl Binary {
    pub fn new(num_bits: usize) -> Result<Self> {
        if num_bits == 0 {
            return Err(LspiError::invalid("binary domain needs at least one bit"));
        }
        Ok(Self {
            bits: vec![false; num_bits],
        })
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }
}

impl Simulator for Binary {
    fn reset(&mut self) {
        self.bits.fill(false);
    }

    fn step(&mut self, action: usize) -> Result<Sample> {
        let state = self.state();
        let num_bits = self.bits.len();
        let bit = self.bits.get_mut(action).ok_or_else(|| {
            LspiError::invalid(format!(
                "action {} out of range for {} bits",
                action, num_bits
            ))
        })?;

        let was_set = std::mem::replace(bit, true);
        let reward = if !was_set && self.is_goal() {
            GOAL_REWARD
        } else {
            STEP_REWARD
        };
        Ok(Sample::with_absorb(state, action, reward, self.state(), self.is_goal()))
    }

    fn state(&self) -> Vec<f64> {
        self.bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
    }

    fn set_state(&mut self, state: &[f64]) -> Result<()> {
        if state.len() != self.bits.len() {
            return Err(LspiError::DimensionMismatch {
                expected: self.bits.len(),
                got: state.len(),
            });
        }
        for (bit, &value) in self.bits.iter_mut().zip(state) {
            *bit = value > 0.5;
        }
        Ok(())
    }

    fn num_states(&self) -> Vec<usize> {
        vec![2; self.bits.len()]
    }

    fn num_actions(&self) -> usize {
        self.bits.len()
    }

    fn is_goal(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    fn state_str(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_all_bits_reaches_goal() {
        let mut binary = Binary::new(3).unwrap();
        assert_eq!(binary.state(), vec![0.0, 0.0, 0.0]);

        assert_eq!(binary.step(1).unwrap().reward(), -1.0);
        assert_eq!(binary.state_str(), "010");
        // setting a bit twice costs a step
        assert_eq!(binary.step(1).unwrap().reward(), -1.0);
        assert_eq!(binary.step(0).unwrap().reward(), -1.0);
        assert!(!binary.is_terminal());

        let sample = binary.step(2).unwrap();
        assert_eq!(
            sample,
            Sample::with_absorb(vec![1.0, 1.0, 0.0], 2, 100.0, vec![1.0, 1.0, 1.0], true)
        );
        assert!(binary.is_goal());
        assert!(binary.is_terminal());
        assert!(!binary.is_non_goal_terminal());

        // absorbing: further steps do not pay the goal reward again
        assert_eq!(binary.step(0).unwrap().reward(), -1.0);

        binary.reset();
        assert_eq!(binary.state(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_set_state_and_bounds() {
        let mut binary = Binary::new(2).unwrap();
        binary.set_state(&[1.0, 0.0]).unwrap();
        assert_eq!(binary.step(1).unwrap().reward(), 100.0);

        assert!(binary.set_state(&[1.0]).is_err());
        assert!(binary.step(2).is_err());
        assert!(Binary::new(0).is_err());
        assert_eq!(binary.num_states(), vec![2, 2]);
        assert_eq!(binary.num_actions(), 2);
    }
}
