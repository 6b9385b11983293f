//! Counts-based transition model aggregated from samples.

use indexmap::IndexMap;

use crate::sample::Sample;
use crate::state_key::StateKey;

#[derive(Clone, Debug, Default)]
struct TransitionStats {
    count: usize,
    reward_sum: f64,
    next_states: IndexMap<StateKey, usize>,
}

/// Empirical model of the environment built from transition samples
///
/// For every observed `(state, action)` pair the model keeps the visit
/// count, the summed reward and the count of each observed next state. The
/// next-state counts of a pair always sum to its visit count. States are
/// compared by value.
///
/// Iteration follows first-observation order, so evaluators that walk the
/// model are deterministic.
#[derive(Clone, Debug, Default)]
pub struct TransitionModel {
    stats: IndexMap<(StateKey, usize), TransitionStats>,
}

impl TransitionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from a batch of samples
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut model = Self::new();
        for sample in samples {
            model.add_sample(sample);
        }
        model
    }

    /// Record one transition
    pub fn add_sample(&mut self, sample: &Sample) {
        let key = (StateKey::from(sample.state()), sample.action());
        let stats = self.stats.entry(key).or_default();
        stats.count += 1;
        stats.reward_sum += sample.reward();
        *stats
            .next_states
            .entry(StateKey::from(sample.next_state()))
            .or_insert(0) += 1;
    }

    /// Number of distinct `(state, action)` pairs
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// How often `(state, action)` was observed
    pub fn count(&self, state: &[f64], action: usize) -> usize {
        self.stats
            .get(&(StateKey::from(state), action))
            .map_or(0, |stats| stats.count)
    }

    /// Mean observed reward of `(state, action)`, or 0 if it was never seen
    pub fn reward(&self, state: &[f64], action: usize) -> f64 {
        self.stats
            .get(&(StateKey::from(state), action))
            .map_or(0.0, |stats| stats.reward_sum / stats.count as f64)
    }

    /// Empirical probability of reaching `next_state` from `(state, action)`
    pub fn transition_probability(&self, state: &[f64], action: usize, next_state: &[f64]) -> f64 {
        self.stats
            .get(&(StateKey::from(state), action))
            .map_or(0.0, |stats| {
                let next = stats
                    .next_states
                    .get(&StateKey::from(next_state))
                    .copied()
                    .unwrap_or(0);
                next as f64 / stats.count as f64
            })
    }

    /// Empirical next-state distribution of `(state, action)`
    ///
    /// Empty if the pair was never observed.
    pub fn transition_probabilities(&self, state: &[f64], action: usize) -> Vec<(StateKey, f64)> {
        self.stats
            .get(&(StateKey::from(state), action))
            .map(Self::distribution)
            .unwrap_or_default()
    }

    /// Iterate over every observed pair with its mean reward and next-state
    /// distribution
    pub fn state_actions(&self) -> impl Iterator<Item = ModelEntry<'_>> + '_ {
        self.stats.iter().map(|((state, action), stats)| ModelEntry {
            state,
            action: *action,
            reward: stats.reward_sum / stats.count as f64,
            transitions: Self::distribution(stats),
        })
    }

    fn distribution(stats: &TransitionStats) -> Vec<(StateKey, f64)> {
        stats
            .next_states
            .iter()
            .map(|(next, &n)| (next.clone(), n as f64 / stats.count as f64))
            .collect()
    }
}

/// One aggregated `(state, action)` pair of a [`TransitionModel`]
#[derive(Clone, Debug)]
pub struct ModelEntry<'a> {
    pub state: &'a StateKey,
    pub action: usize,
    /// Mean observed reward
    pub reward: f64,
    /// Next states with their empirical probabilities
    pub transitions: Vec<(StateKey, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn build_model() -> TransitionModel {
        let s0 = vec![0.0];
        let s1 = vec![1.0];
        let mut model = TransitionModel::new();

        let mut add = |state: &Vec<f64>, action, next: &Vec<f64>, reward, times| {
            for _ in 0..times {
                model.add_sample(&Sample::new(state.clone(), action, reward, next.clone()));
            }
        };
        add(&s0, 0, &s0, -1.0, 4);
        add(&s0, 0, &s1, 1.0, 8);
        add(&s0, 1, &s0, -1.0, 13);
        add(&s0, 1, &s1, 1.0, 1);
        add(&s1, 0, &s0, -1.0, 6);
        add(&s1, 0, &s1, 1.0, 4);
        add(&s1, 1, &s0, -1.0, 4);
        add(&s1, 1, &s1, 1.0, 10);
        model
    }

    #[test]
    fn test_transition_probabilities() {
        let model = build_model();
        assert_eq!(model.len(), 4);

        assert_abs_diff_eq!(model.transition_probability(&[0.0], 0, &[0.0]), 0.33, epsilon = 0.01);
        assert_abs_diff_eq!(model.transition_probability(&[0.0], 0, &[1.0]), 0.67, epsilon = 0.01);
        assert_abs_diff_eq!(model.transition_probability(&[0.0], 1, &[0.0]), 0.93, epsilon = 0.01);
        assert_abs_diff_eq!(model.transition_probability(&[1.0], 0, &[0.0]), 0.6, epsilon = 0.01);
        assert_abs_diff_eq!(model.transition_probability(&[1.0], 1, &[1.0]), 0.71, epsilon = 0.01);

        let probs = model.transition_probabilities(&[0.0], 1);
        assert_eq!(probs.len(), 2);
        let total: f64 = probs.iter().map(|(_, p)| p).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rewards() {
        let model = build_model();
        assert_abs_diff_eq!(model.reward(&[0.0], 0), 0.33, epsilon = 0.01);
        assert_abs_diff_eq!(model.reward(&[0.0], 1), -0.86, epsilon = 0.01);
        assert_abs_diff_eq!(model.reward(&[1.0], 0), -0.2, epsilon = 0.01);
        assert_abs_diff_eq!(model.reward(&[1.0], 1), 0.43, epsilon = 0.01);
    }

    #[test]
    fn test_unseen_pairs() {
        let model = build_model();
        assert_eq!(model.count(&[5.0], 0), 0);
        assert_eq!(model.reward(&[5.0], 0), 0.0);
        assert_eq!(model.transition_probability(&[5.0], 0, &[0.0]), 0.0);
        assert!(model.transition_probabilities(&[5.0], 0).is_empty());
    }

    #[test]
    fn test_counts_are_consistent() {
        let model = build_model();
        assert_eq!(model.count(&[0.0], 1), 14);

        for entry in model.state_actions() {
            let total: f64 = entry.transitions.iter().map(|(_, p)| p).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }

        let first = model.state_actions().next().unwrap();
        assert_eq!(first.state, &StateKey::from(vec![0.0]));
        assert_eq!(first.action, 0);
    }
}
