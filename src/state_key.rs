//! Hashable state vectors.
//!
//! States are plain `f64` vectors, which are neither `Eq` nor `Hash`. The
//! `StateKey` wrapper compares and hashes states by value so they can key the
//! aggregation maps of a [`TransitionModel`](crate::TransitionModel).

use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::Hash;

/// A state vector compared and hashed by value.
///
/// # Examples
///
/// ```
/// use lspi::StateKey;
///
/// let a = StateKey::from(&[1.0, 2.0][..]);
/// let b = StateKey::from(vec![1.0, 2.0]);
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Vec<OrderedFloat<f64>>);

impl StateKey {
    /// Returns the state as a plain vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.iter().map(|v| v.into_inner()).collect()
    }

    /// Number of state components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the state has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

impl From<&[f64]> for StateKey {
    fn from(value: &[f64]) -> Self {
        StateKey(value.iter().copied().map(OrderedFloat).collect())
    }
}

impl From<Vec<f64>> for StateKey {
    fn from(value: Vec<f64>) -> Self {
        StateKey(value.into_iter().map(OrderedFloat).collect())
    }
}

impl From<&Vec<f64>> for StateKey {
    fn from(value: &Vec<f64>) -> Self {
        StateKey::from(value.as_slice())
    }
}
