//! Transition samples.

/// One observed transition `(s, a, r, s', absorb)`.
///
/// Samples are immutable once built; evaluators only read them.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    state: Vec<f64>,
    action: usize,
    reward: f64,
    next_state: Vec<f64>,
    absorb: bool,
}

impl Sample {
    /// Creates a non-absorbing sample.
    pub fn new(state: Vec<f64>, action: usize, reward: f64, next_state: Vec<f64>) -> Self {
        Self::with_absorb(state, action, reward, next_state, false)
    }

    /// Creates a sample, marking whether `next_state` is terminal.
    pub fn with_absorb(
        state: Vec<f64>,
        action: usize,
        reward: f64,
        next_state: Vec<f64>,
        absorb: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            absorb,
        }
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn action(&self) -> usize {
        self.action
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn next_state(&self) -> &[f64] {
        &self.next_state
    }

    /// True if the transition ended in a terminal state.
    pub fn absorb(&self) -> bool {
        self.absorb
    }
}
