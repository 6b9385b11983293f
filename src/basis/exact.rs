use super::{ExactFeatureMap, FeatureMap};
use crate::error::{LspiError, Result};

/// Indicator basis over a discrete, multi-dimensional state space.
///
/// Each state component `i` takes integer values in `0..num_states[i]`.
/// Indices are laid out in mixed radix: one block of `prod(num_states)`
/// entries per action, and within a block the first state component varies
/// fastest.
///
/// # Examples
///
/// ```
/// use lspi::basis::{ExactBasis, ExactFeatureMap, FeatureMap};
///
/// // A 10x10 grid with four actions
/// let basis = ExactBasis::new(&[10, 10], 4).unwrap();
/// assert_eq!(basis.size(), 400);
/// assert_eq!(basis.state_action_index(&[3.0, 2.0], 1).unwrap(), 100 + 23);
/// ```
#[derive(Debug, Clone)]
pub struct ExactBasis {
    num_states: Vec<usize>,
    offsets: Vec<usize>,
    num_actions: usize,
    states_per_action: usize,
}

impl ExactBasis {
    /// Create an exact basis
    ///
    /// # Arguments
    /// * `num_states` - Number of values each state component can take
    /// * `num_actions` - Number of actions
    pub fn new(num_states: &[usize], num_actions: usize) -> Result<Self> {
        if num_states.is_empty() {
            return Err(LspiError::invalid("exact basis needs at least one state dimension"));
        }
        if num_states.contains(&0) {
            return Err(LspiError::invalid("every state dimension needs at least one value"));
        }
        if num_actions == 0 {
            return Err(LspiError::invalid("number of actions must be positive"));
        }

        let mut offsets = Vec::with_capacity(num_states.len());
        let mut stride = 1;
        for &n in num_states {
            offsets.push(stride);
            stride *= n;
        }

        Ok(Self {
            num_states: num_states.to_vec(),
            offsets,
            num_actions,
            states_per_action: stride,
        })
    }

    /// Number of values per state dimension
    pub fn num_states(&self) -> &[usize] {
        &self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }
}

impl FeatureMap for ExactBasis {
    fn evaluate(&self, state: &[f64], action: usize) -> Result<Vec<f64>> {
        let index = self.state_action_index(state, action)?;
        let mut phi = vec![0.0; self.size()];
        phi[index] = 1.0;
        Ok(phi)
    }

    fn size(&self) -> usize {
        self.states_per_action * self.num_actions
    }

    fn as_exact(&self) -> Option<&dyn ExactFeatureMap> {
        Some(self)
    }
}

impl ExactFeatureMap for ExactBasis {
    fn state_action_index(&self, state: &[f64], action: usize) -> Result<usize> {
        if state.len() != self.num_states.len() {
            return Err(LspiError::DimensionMismatch {
                expected: self.num_states.len(),
                got: state.len(),
            });
        }
        if action >= self.num_actions {
            return Err(LspiError::invalid(format!(
                "action {} out of range for {} actions",
                action, self.num_actions
            )));
        }

        let mut offset = 0;
        for ((&value, &n), &stride) in state.iter().zip(&self.num_states).zip(&self.offsets) {
            let v = value.round();
            if !(0.0..n as f64).contains(&v) {
                return Err(LspiError::invalid(format!(
                    "state component {} out of range 0..{}",
                    value, n
                )));
            }
            offset += v as usize * stride;
        }

        Ok(action * self.states_per_action + offset)
    }
}
