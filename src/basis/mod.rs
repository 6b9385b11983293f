//! Feature maps (basis functions) over state-action pairs.
mod exact;
mod polynomial;
mod rbf;

use std::fmt;

use crate::error::Result;

pub use exact::ExactBasis;
pub use polynomial::PolynomialBasis;
pub use rbf::GaussianRbf;

/// Maps a `(state, action)` pair to a feature vector of fixed length.
///
/// The value function of a [`Policy`](crate::Policy) is linear in these
/// features. Feature maps are shared between policies through an `Arc`, so
/// implementations must be immutable after construction.
pub trait FeatureMap: Send + Sync + fmt::Debug {
    /// Evaluate the features for a state-action pair
    ///
    /// The returned vector always has length [`size`](FeatureMap::size).
    fn evaluate(&self, state: &[f64], action: usize) -> Result<Vec<f64>>;

    /// Number of features `k`
    fn size(&self) -> usize;

    /// Downcast hook for one-hot feature maps
    ///
    /// Evaluators that can exploit one-hot features call this instead of
    /// inspecting the concrete type. The default is `None`.
    fn as_exact(&self) -> Option<&dyn ExactFeatureMap> {
        None
    }
}

/// A feature map whose output is always a one-hot vector.
///
/// `evaluate(s, a)` must equal the indicator vector with a single `1.0` at
/// `state_action_index(s, a)`, and the index must be a bijection between the
/// enumerated state-action space and `0..size()`.
pub trait ExactFeatureMap: FeatureMap {
    /// Index of the single non-zero feature for a state-action pair
    fn state_action_index(&self, state: &[f64], action: usize) -> Result<usize>;
}
