//! lspi: Least-Squares Policy Iteration for discrete-action control.
//!
//! Learns a linear action-value function `Q(s, a) = phi(s, a) . w` from a
//! fixed batch of transition samples, alternating LSTDQ policy evaluation
//! with greedy policy improvement until the weights stop changing.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use lspi::prelude::*;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut chain = Chain::new(10, 0.9, 0).unwrap();
//! let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[10], 2).unwrap());
//!
//! // Explore uniformly to gather samples
//! let random = Policy::with_random_weights(1.0, 2, basis.clone(), &mut rng).unwrap();
//! let samples = collect_samples(&mut chain, 10, 500, &random, &mut rng).unwrap();
//!
//! // Learn a greedy policy from them
//! let lspi = Lspi::new(LspiConfig::default().improver(PolicyImprover::LstdqExact)).unwrap();
//! let initial = Policy::with_zero_weights(0.0, 2, basis).unwrap();
//! let outcome = lspi.learn(&samples, &initial, &mut rng).unwrap();
//! assert!(outcome.iterations >= 1);
//! ```

// #![warn(missing_docs)]
// #![warn(clippy::all)]

pub mod basis;
mod config;
pub mod domains;
mod error;
mod lspi;
pub mod lstdq;
mod model;
mod policy;
mod sample;
pub mod sampling;
pub mod solver;
pub mod sparse;
mod state_key;

// Re-export main types
pub use config::{LspiConfig, SolverConfig, SolverKind};
pub use error::{LspiError, Result};
pub use lspi::{LearnOutcome, Lspi, Termination};
pub use lstdq::{Evaluation, PolicyImprover};
pub use model::{ModelEntry, TransitionModel};
pub use policy::Policy;
pub use sample::Sample;
pub use state_key::StateKey;

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use lspi::prelude::*;
/// ```
pub mod prelude {
    pub use crate::basis::{ExactBasis, ExactFeatureMap, FeatureMap, GaussianRbf, PolynomialBasis};
    pub use crate::domains::{Binary, Chain, Pendulum};
    pub use crate::sampling::{Simulator, collect_samples, evaluate_policy};
    pub use crate::solver::{BiCgStab, IterationMonitor, IterativeSolver, SteepestDescent};
    pub use crate::{
        LearnOutcome, Lspi, LspiConfig, LspiError, Policy, PolicyImprover, Result, Sample,
        SolverConfig, SolverKind, Termination, TransitionModel,
    };
}
