//! Small benchmark environments.
mod binary;
mod chain;
mod pendulum;

pub use binary::Binary;
pub use chain::Chain;
pub use pendulum::Pendulum;
